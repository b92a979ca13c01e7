use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{decode_shape, detect_version, validate_current, Entity, Migratable};
use crate::types::Result;

/// Current project schema (v3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Project {
    pub title: String,
    pub members: Vec<String>,
    pub description: String,
    pub priority: u32,
    pub tags: Vec<String>,
}

/// v1: a single `owner` instead of a member list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ProjectV1 {
    title: String,
    owner: String,
    description: String,
}

/// v2: members introduced; no priority or tags yet.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ProjectV2 {
    title: String,
    members: Vec<String>,
    description: String,
}

impl From<ProjectV1> for ProjectV2 {
    fn from(p: ProjectV1) -> Self {
        ProjectV2 {
            title: p.title,
            members: vec![p.owner],
            description: p.description,
        }
    }
}

impl From<ProjectV2> for Project {
    fn from(p: ProjectV2) -> Self {
        Project {
            title: p.title,
            members: p.members,
            description: p.description,
            priority: 5,
            tags: Vec::new(),
        }
    }
}

/// One variant per schema revision. The upgrade loop matches exhaustively,
/// so adding a variant without its transform refuses to compile.
enum ProjectPayload {
    V1(ProjectV1),
    V2(ProjectV2),
    V3(Project),
}

fn upgrade(mut payload: ProjectPayload) -> Project {
    loop {
        payload = match payload {
            ProjectPayload::V1(p) => ProjectPayload::V2(p.into()),
            ProjectPayload::V2(p) => ProjectPayload::V3(p.into()),
            ProjectPayload::V3(p) => return p,
        };
    }
}

impl Entity for Project {
    const TYPE_NAME: &'static str = "projects";
    const CURRENT_VERSION: u32 = 3;
}

impl Migratable for Project {
    fn migrate(raw: Value) -> Result<Self> {
        let version = detect_version(&raw, Self::CURRENT_VERSION)?;
        let payload = match version {
            1 => ProjectPayload::V1(decode_shape(raw, Self::TYPE_NAME)?),
            2 => ProjectPayload::V2(decode_shape(raw, Self::TYPE_NAME)?),
            _ => ProjectPayload::V3(validate_current(raw)?),
        };
        Ok(upgrade(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocStoreError;
    use serde_json::json;

    #[test]
    fn v1_payload_without_version_migrates_to_v3() {
        let raw = json!({
            "title": "Test Project",
            "owner": "user-123",
            "description": "Test"
        });
        let project = Project::migrate(raw).unwrap();
        assert_eq!(
            project,
            Project {
                title: "Test Project".into(),
                members: vec!["user-123".into()],
                description: "Test".into(),
                priority: 5,
                tags: vec![],
            }
        );
    }

    #[test]
    fn v2_payload_gains_priority_and_tags() {
        let raw = json!({
            "version": 2,
            "typeName": "projects",
            "title": "Mid",
            "members": ["a", "b"],
            "description": "two members"
        });
        let project = Project::migrate(raw).unwrap();
        assert_eq!(project.members, vec!["a", "b"]);
        assert_eq!(project.priority, 5);
        assert!(project.tags.is_empty());
    }

    #[test]
    fn current_payload_is_a_fixed_point() {
        let raw = json!({
            "version": 3,
            "typeName": "projects",
            "title": "Test",
            "members": ["user-1"],
            "description": "Test",
            "priority": 8,
            "tags": ["important"]
        });
        let project = Project::migrate(raw).unwrap();
        assert_eq!(
            project,
            Project {
                title: "Test".into(),
                members: vec!["user-1".into()],
                description: "Test".into(),
                priority: 8,
                tags: vec!["important".into()],
            }
        );
    }

    #[test]
    fn unknown_version_is_rejected_by_name() {
        let raw = json!({"version": 99, "typeName": "projects", "title": "x"});
        match Project::migrate(raw) {
            Err(DocStoreError::UnknownVersion(99)) => {}
            other => panic!("expected UnknownVersion(99), got {:?}", other),
        }
    }

    #[test]
    fn current_payload_with_wrong_shape_is_a_violation() {
        // Claims v3 but still carries the v1 field set.
        let raw = json!({
            "version": 3,
            "typeName": "projects",
            "title": "x",
            "owner": "user-1",
            "description": "y"
        });
        assert!(matches!(
            Project::migrate(raw),
            Err(DocStoreError::SchemaViolation(_))
        ));
    }

    #[test]
    fn mismatched_type_name_is_a_violation() {
        let raw = json!({
            "version": 3,
            "typeName": "notes",
            "title": "x",
            "members": [],
            "description": "",
            "priority": 1,
            "tags": []
        });
        assert!(matches!(
            Project::migrate(raw),
            Err(DocStoreError::SchemaViolation(_))
        ));
    }

    #[test]
    fn migration_is_total_over_supported_versions() {
        let shapes = [
            json!({"title": "t", "owner": "o", "description": "d"}),
            json!({"version": 2, "title": "t", "members": ["o"], "description": "d"}),
            json!({"version": 3, "title": "t", "members": ["o"], "description": "d", "priority": 1, "tags": []}),
        ];
        for raw in shapes {
            let project = Project::migrate(raw).unwrap();
            // Every supported shape lands on the full current field set.
            let value = serde_json::to_value(&project).unwrap();
            let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
            keys.sort();
            assert_eq!(
                keys,
                vec!["description", "members", "priority", "tags", "title"]
            );
        }
    }
}
