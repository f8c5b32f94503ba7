//! Group-membership normalization.
//!
//! Membership reaches us in three encodings:
//!
//! 1. a JSON array embedded in a CSV cell, possibly with doubled quotes
//!    (`"[""g1"",""g2""]"`);
//! 2. a list of `{display, value}` objects from a JSON document;
//! 3. a group's `members` list, scanned for a user ID (CSV groups file).
//!
//! Every function here is total. Malformed input degrades to an empty value
//! and a [`NormalizeError`] the caller logs as a warning; one bad record must
//! never stop a batch.

use serde_json::Value;

use crate::error::NormalizeError;
use crate::types::{Attributes, GroupId, GroupIdSet};

/// A normalized group set plus the warning raised while reading it, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub ids: GroupIdSet,
    pub warning: Option<NormalizeError>,
}

impl Normalized {
    fn ok(ids: GroupIdSet) -> Self {
        Self { ids, warning: None }
    }

    fn warn(warning: NormalizeError) -> Self {
        Self {
            ids: GroupIdSet::new(),
            warning: Some(warning),
        }
    }
}

// ---------------------------------------------------------------------------
// Embedded JSON text
// ---------------------------------------------------------------------------

/// Undo one level of CSV quote escaping: `""` → `"`, then drop surrounding quotes.
///
/// Only a single level is unescaped; nested escaping is not supported.
pub fn unescape_embedded(raw: &str) -> String {
    raw.trim().replace("\"\"", "\"").trim_matches('"').to_string()
}

fn decode_embedded(raw: &str) -> Result<Option<Value>, NormalizeError> {
    let cleaned = unescape_embedded(raw);
    if cleaned.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&cleaned)
        .map(Some)
        .map_err(|e| NormalizeError::InvalidJson {
            raw: raw.to_string(),
            message: e.to_string(),
        })
}

/// Decode an embedded JSON array. Blank text is an empty list.
pub fn decode_embedded_list(raw: &str) -> Result<Vec<Value>, NormalizeError> {
    match decode_embedded(raw)? {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(NormalizeError::NotAList {
            raw: raw.to_string(),
        }),
    }
}

/// Decode an embedded JSON object (e.g. a `userAttributes` CSV cell).
///
/// Blank text yields `Ok(None)`.
pub fn decode_embedded_object(raw: &str) -> Result<Option<Attributes>, NormalizeError> {
    match decode_embedded(raw)? {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(NormalizeError::NotAnObject {
            raw: raw.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Desired groups
// ---------------------------------------------------------------------------

/// Normalize a desired-state group field to a set of group IDs.
///
/// - string: embedded JSON array of IDs (non-string elements are dropped);
/// - list: `{value}` objects, anything else in the list is skipped;
/// - any other shape: empty set.
pub fn normalize_groups(raw: &Value) -> Normalized {
    match raw {
        Value::String(s) => match decode_embedded_list(s) {
            Ok(items) => Normalized::ok(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(GroupId::from)
                    .collect(),
            ),
            Err(e) => Normalized::warn(e),
        },
        Value::Array(items) => Normalized::ok(
            items
                .iter()
                .filter_map(|item| item.as_object()?.get("value")?.as_str())
                .map(GroupId::from)
                .collect(),
        ),
        _ => Normalized::default(),
    }
}

// ---------------------------------------------------------------------------
// Observed groups and member lists
// ---------------------------------------------------------------------------

/// The ID carried by a membership entry: a bare string or a `{value}` object.
fn entry_id(entry: &Value) -> Option<&str> {
    match entry {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("value")?.as_str(),
        _ => None,
    }
}

/// Group IDs from a user record returned by the API, which may use either
/// `{value}` objects or bare ID strings.
pub fn observed_group_ids(groups: &[Value]) -> GroupIdSet {
    groups.iter().filter_map(entry_id).map(GroupId::from).collect()
}

/// Member IDs listed in a group's `members` field.
///
/// Accepts an embedded JSON array string or a list; entries may be bare IDs
/// or `{value}` objects. `null` means no members.
pub fn parse_member_ids(raw: &Value) -> Result<Vec<String>, NormalizeError> {
    let owned;
    let items: &[Value] = match raw {
        Value::String(s) => {
            owned = decode_embedded_list(s)?;
            &owned
        }
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        Value::Bool(_) => return Err(NormalizeError::UnsupportedShape { kind: "boolean" }),
        Value::Number(_) => return Err(NormalizeError::UnsupportedShape { kind: "number" }),
        Value::Object(_) => return Err(NormalizeError::UnsupportedShape { kind: "object" }),
    };
    Ok(items.iter().filter_map(entry_id).map(str::to_string).collect())
}
