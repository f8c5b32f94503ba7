//! Domain types for users, groups, and group-membership writes.
//!
//! Wire-facing structs follow the SCIM 2.0 JSON shape (camelCase field names).
//! Unknown attributes on users and member entries are carried through
//! untouched so whole-list replacement never drops data the API returned.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::normalize;

/// SCIM core group schema URI, sent with every group replacement.
pub const GROUP_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";

/// SCIM PATCH request schema URI.
pub const PATCH_OP_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// Omni's extension schema holding custom user attributes.
pub const USER_ATTRIBUTE_SCHEMA: &str = "urn:omni:params:1.0:UserAttribute";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identity-platform ID of a user. Opaque; the platform is the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identity-platform ID of a group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for GroupId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Ordered set of group IDs. Ordering keeps plans and logs deterministic.
pub type GroupIdSet = BTreeSet<GroupId>;

/// Custom user attributes (the body of the [`USER_ATTRIBUTE_SCHEMA`] extension).
pub type Attributes = Map<String, Value>;

// ---------------------------------------------------------------------------
// Members and groups
// ---------------------------------------------------------------------------

/// One entry of a group's `members` list: `{display, value}` plus whatever
/// else the API attached (`$ref`, `type`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MemberRef {
    /// A member entry pointing at `user_id`, labelled with `display`.
    pub fn new(display: impl Into<String>, user_id: &UserId) -> Self {
        Self {
            display: Some(display.into()),
            value: Some(user_id.0.clone()),
            extra: Map::new(),
        }
    }

    /// `true` when this entry's identity value is `user_id`.
    pub fn refers_to(&self, user_id: &UserId) -> bool {
        self.value.as_deref() == Some(user_id.0.as_str())
    }
}

/// A group as returned by the identity API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub members: Vec<MemberRef>,
}

/// Whole-list replacement payload for a single group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdate {
    pub schemas: Vec<String>,
    pub id: GroupId,
    pub display_name: String,
    pub members: Vec<MemberRef>,
}

impl GroupUpdate {
    pub fn new(id: GroupId, display_name: impl Into<String>, members: Vec<MemberRef>) -> Self {
        Self {
            schemas: vec![GROUP_SCHEMA.to_string()],
            id,
            display_name: display_name.into(),
            members,
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A user as observed from the identity API.
///
/// `groups` keeps the raw JSON entries because the API may mirror either
/// `{value}` objects or bare ID strings; use [`User::group_ids`] to read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<Value>,
    #[serde(
        rename = "urn:omni:params:1.0:UserAttribute",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub attributes: Option<Attributes>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Group IDs this user currently belongs to.
    pub fn group_ids(&self) -> GroupIdSet {
        normalize::observed_group_ids(&self.groups)
    }

    /// Name used when this user is appended to a group's member list.
    pub fn member_display(&self) -> &str {
        &self.user_name
    }
}

// ---------------------------------------------------------------------------
// Group catalog
// ---------------------------------------------------------------------------

/// Group ID → group record, fetched fresh each run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupCatalog {
    groups: BTreeMap<GroupId, Group>,
}

impl GroupCatalog {
    pub fn new(groups: impl IntoIterator<Item = Group>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
        }
    }

    pub fn get(&self, id: &GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Record a member list the API has accepted, so later plans build on it.
    ///
    /// Returns `false` if the group is not in the catalog.
    pub fn replace_members(&mut self, id: &GroupId, members: Vec<MemberRef>) -> bool {
        match self.groups.get_mut(id) {
            Some(group) => {
                group.members = members;
                true
            }
            None => false,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
