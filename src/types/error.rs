use thiserror::Error;

/// Failure taxonomy for repository and storage operations.
///
/// Not-found and not-visible single-item reads are not errors; they collapse
/// into `Ok(None)` so callers cannot distinguish rows they may not see from
/// rows that do not exist.
#[derive(Debug, Error)]
pub enum DocStoreError {
    #[error("no authenticated identity for write operation")]
    Unauthenticated,
    #[error("access denied")]
    AccessDenied,
    #[error("unknown schema version: got {0}")]
    UnknownVersion(i64),
    #[error("schema violation: {0}")]
    SchemaViolation(String),
    #[error("invalid field name: {0}")]
    InvalidField(String),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl DocStoreError {
    /// True for the migration/validation half of the taxonomy, which the
    /// bulk job records per row instead of aborting on.
    pub fn is_migration_failure(&self) -> bool {
        matches!(
            self,
            DocStoreError::UnknownVersion(_) | DocStoreError::SchemaViolation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DocStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_version_names_the_offender() {
        let err = DocStoreError::UnknownVersion(99);
        assert_eq!(err.to_string(), "unknown schema version: got 99");
    }

    #[test]
    fn migration_failures_are_classified() {
        assert!(DocStoreError::UnknownVersion(7).is_migration_failure());
        assert!(DocStoreError::SchemaViolation("bad".into()).is_migration_failure());
        assert!(!DocStoreError::AccessDenied.is_migration_failure());
        assert!(!DocStoreError::Unauthenticated.is_migration_failure());
    }
}
