use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{decode_shape, detect_version, validate_current, Entity, Migratable};
use crate::types::Result;

/// Current note schema (v2). Notes can be shared read-only or opened up
/// for collaborative editing through the payload flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Note {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub public_read: bool,
    pub public_update: bool,
}

impl Note {
    pub fn new<S: Into<String>, B: Into<String>>(title: S, body: B) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tags: Vec::new(),
            public_read: false,
            public_update: false,
        }
    }
}

/// v1: plain private notes, before tags and sharing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct NoteV1 {
    title: String,
    body: String,
}

impl From<NoteV1> for Note {
    fn from(n: NoteV1) -> Self {
        Note {
            title: n.title,
            body: n.body,
            tags: Vec::new(),
            public_read: false,
            public_update: false,
        }
    }
}

enum NotePayload {
    V1(NoteV1),
    V2(Note),
}

fn upgrade(mut payload: NotePayload) -> Note {
    loop {
        payload = match payload {
            NotePayload::V1(n) => NotePayload::V2(n.into()),
            NotePayload::V2(n) => return n,
        };
    }
}

impl Entity for Note {
    const TYPE_NAME: &'static str = "notes";
    const CURRENT_VERSION: u32 = 2;

    fn public_read(&self) -> bool {
        self.public_read
    }

    fn public_update(&self) -> bool {
        self.public_update
    }
}

impl Migratable for Note {
    fn migrate(raw: Value) -> Result<Self> {
        let version = detect_version(&raw, Self::CURRENT_VERSION)?;
        let payload = match version {
            1 => NotePayload::V1(decode_shape(raw, Self::TYPE_NAME)?),
            _ => NotePayload::V2(validate_current(raw)?),
        };
        Ok(upgrade(payload))
    }
}
