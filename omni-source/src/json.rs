//! Single-document JSON source.
//!
//! Accepted layouts:
//!
//! ```text
//! [ {user}, ... ]                     bare array
//! { "Resources": [ {user}, ... ] }    SCIM list export
//! { "users": [ {user}, ... ] }
//! ```
//!
//! Each user carries its own `groups` list of `{display, value}` objects and,
//! optionally, custom attributes under the Omni extension schema URN.

use std::path::PathBuf;

use omni_core::USER_ATTRIBUTE_SCHEMA;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{ensure_exists, io_err, SourceError};
use crate::resolver::{DesiredGroupsResolver, EmbeddedGroups};
use crate::{DataSource, SourceKind, SourceUser};

/// Users (with embedded membership) from one JSON file.
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        ensure_exists("users", &path)?;
        Ok(Self { path })
    }

    fn document(&self) -> Result<Value, SourceError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| io_err(&self.path, e))?;
        serde_json::from_str(&contents).map_err(|source| SourceError::Json {
            path: self.path.clone(),
            source,
        })
    }
}

impl DataSource for JsonSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Json
    }

    fn users(&self) -> Result<Vec<SourceUser>, SourceError> {
        let document = self.document()?;
        let records = match document {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("Resources").or_else(|| map.remove("users")) {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(SourceError::Shape {
                        path: self.path.clone(),
                        message: "expected a 'Resources' or 'users' array".to_string(),
                    })
                }
            },
            _ => {
                return Err(SourceError::Shape {
                    path: self.path.clone(),
                    message: "expected an array of users".to_string(),
                })
            }
        };

        let mut users = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            match record {
                Value::Object(map) => match user_from_object(map) {
                    Some(user) => users.push(user),
                    None => warn!("user #{index} has no userName, skipping"),
                },
                _ => warn!("user #{index} is not an object, skipping"),
            }
        }
        Ok(users)
    }

    fn resolver(&self) -> Result<Box<dyn DesiredGroupsResolver>, SourceError> {
        Ok(Box::new(EmbeddedGroups))
    }
}

fn user_from_object(mut map: Map<String, Value>) -> Option<SourceUser> {
    let user_name = string_field(&map, "userName")?;
    let attributes = match map.remove(USER_ATTRIBUTE_SCHEMA) {
        Some(Value::Object(attrs)) => Some(attrs),
        Some(Value::Null) | None => None,
        Some(_) => {
            warn!("{USER_ATTRIBUTE_SCHEMA} for {user_name} is not an object, ignoring");
            None
        }
    };
    Some(SourceUser {
        id: string_field(&map, "id"),
        display_name: string_field(&map, "displayName"),
        groups: map.remove("groups").unwrap_or(Value::Null),
        attributes,
        user_name,
    })
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use omni_core::UserId;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn source_with(doc: &Value) -> (TempDir, JsonSource) {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("users.json");
        fs::write(&path, serde_json::to_string(doc).expect("encode")).expect("write");
        let source = JsonSource::open(&path).expect("open");
        (dir, source)
    }

    #[test]
    fn reads_scim_resources_export() {
        let (_dir, source) = source_with(&json!({
            "Resources": [{
                "userName": "ann@example.com",
                "id": "u1",
                "groups": [{"display": "Sales", "value": "g1"}],
                "urn:omni:params:1.0:UserAttribute": {"region": "emea"}
            }]
        }));
        let users = source.users().expect("users");
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id.as_deref(), Some("u1"));
        assert_eq!(
            users[0].attributes.as_ref().and_then(|a| a.get("region")),
            Some(&json!("emea"))
        );

        let resolver = source.resolver().expect("resolver");
        let r = resolver.desired_groups(&users[0], &UserId::from("u1"));
        assert_eq!(r.groups.len(), 1);
    }

    #[test]
    fn skips_records_without_username() {
        let (_dir, source) = source_with(&json!([
            {"userName": "ann@example.com"},
            {"id": "u2"},
            "not an object",
            {"userName": "  "}
        ]));
        let users = source.users().expect("users");
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].groups, Value::Null);
    }

    #[test]
    fn rejects_documents_without_a_user_list() {
        let (_dir, source) = source_with(&json!({"people": []}));
        let err = source.users().unwrap_err();
        assert!(matches!(err, SourceError::Shape { .. }), "got: {err}");
    }

    #[test]
    fn open_reports_missing_file() {
        let dir = TempDir::new().expect("tempdir");
        let err = JsonSource::open(dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("users file not found"));
    }
}
