use crate::types::Identity;

/// Caller-identity capability. The hosting application (web session,
/// service token, CLI flag) decides who the caller is; repositories only
/// ask.
pub trait AuthProvider {
    fn current_identity(&self) -> Option<Identity>;
}

/// Fixed-identity provider used by the CLI and by tests.
#[derive(Clone, Debug, Default)]
pub struct StaticAuth {
    identity: Option<Identity>,
}

impl StaticAuth {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn anonymous() -> Self {
        Self { identity: None }
    }
}

impl AuthProvider for StaticAuth {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_auth_yields_its_identity() {
        let auth = StaticAuth::new(Identity::new("user-1"));
        assert_eq!(auth.current_identity(), Some(Identity::new("user-1")));
        assert_eq!(StaticAuth::anonymous().current_identity(), None);
    }
}
