use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{decode_shape, detect_version, validate_current, Entity, Migratable};
use crate::types::Result;

/// Per-user settings, one document per owner (v2).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserSettings {
    pub theme: String,
    pub locale: String,
    pub notifications: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: "system".into(),
            locale: "en".into(),
            notifications: true,
        }
    }
}

/// v1: theme only.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UserSettingsV1 {
    theme: String,
}

impl From<UserSettingsV1> for UserSettings {
    fn from(s: UserSettingsV1) -> Self {
        UserSettings {
            theme: s.theme,
            locale: "en".into(),
            notifications: true,
        }
    }
}

enum SettingsPayload {
    V1(UserSettingsV1),
    V2(UserSettings),
}

fn upgrade(mut payload: SettingsPayload) -> UserSettings {
    loop {
        payload = match payload {
            SettingsPayload::V1(s) => SettingsPayload::V2(s.into()),
            SettingsPayload::V2(s) => return s,
        };
    }
}

impl Entity for UserSettings {
    const TYPE_NAME: &'static str = "user_settings";
    const CURRENT_VERSION: u32 = 2;
}

impl Migratable for UserSettings {
    fn migrate(raw: Value) -> Result<Self> {
        let version = detect_version(&raw, Self::CURRENT_VERSION)?;
        let payload = match version {
            1 => SettingsPayload::V1(decode_shape(raw, Self::TYPE_NAME)?),
            _ => SettingsPayload::V2(validate_current(raw)?),
        };
        Ok(upgrade(payload))
    }
}
