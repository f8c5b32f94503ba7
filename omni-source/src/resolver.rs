//! Desired group membership for a single user.
//!
//! JSON documents embed membership in each user record; the CSV pair inverts
//! it, so membership is found by scanning every group's `members` list for the
//! user's platform ID. Both are [`DesiredGroupsResolver`] implementations and
//! the orchestrator never branches on the source kind.

use omni_core::{normalize_groups, parse_member_ids, GroupId, GroupIdSet, NormalizeError, UserId};
use thiserror::Error;

use crate::{SourceGroup, SourceUser};

/// A non-fatal problem met while resolving desired groups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveWarning {
    /// The user's own `groups` field was malformed.
    #[error("could not parse groups for user: {0}")]
    UserGroups(NormalizeError),

    /// A group's `members` field was malformed; that group was skipped.
    #[error("could not process group {group}: {reason}")]
    GroupMembers { group: String, reason: NormalizeError },

    /// A group row has no `members` field at all.
    #[error("could not process group {group}: no members field")]
    MissingMembers { group: String },

    /// A group row has no `id`.
    #[error("could not process group unknown: no id field")]
    MissingGroupId,
}

/// The desired group set for a user plus anything worth warning about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub groups: GroupIdSet,
    pub warnings: Vec<ResolveWarning>,
}

/// Computes the groups a user should belong to.
///
/// `user_id` is the platform ID of the matched user; resolvers that derive
/// membership from group rows need it, embedded resolvers ignore it.
pub trait DesiredGroupsResolver {
    fn desired_groups(&self, user: &SourceUser, user_id: &UserId) -> Resolution;
}

// ---------------------------------------------------------------------------
// Embedded (JSON)
// ---------------------------------------------------------------------------

/// Reads membership from the user record's own `groups` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedGroups;

impl DesiredGroupsResolver for EmbeddedGroups {
    fn desired_groups(&self, user: &SourceUser, _user_id: &UserId) -> Resolution {
        let normalized = normalize_groups(&user.groups);
        Resolution {
            groups: normalized.ids,
            warnings: normalized
                .warning
                .map(ResolveWarning::UserGroups)
                .into_iter()
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Group scan (CSV)
// ---------------------------------------------------------------------------

/// Derives membership by scanning group rows for the user's ID.
#[derive(Debug, Clone, Default)]
pub struct GroupScan {
    groups: Vec<SourceGroup>,
}

impl GroupScan {
    pub fn new(groups: Vec<SourceGroup>) -> Self {
        Self { groups }
    }
}

impl DesiredGroupsResolver for GroupScan {
    fn desired_groups(&self, _user: &SourceUser, user_id: &UserId) -> Resolution {
        groups_for_user(user_id, &self.groups)
    }
}

/// Every group whose `members` list contains `user_id`.
///
/// A group with a missing or unparseable `members` field is reported and
/// skipped; the remaining groups are still checked.
pub fn groups_for_user(user_id: &UserId, groups: &[SourceGroup]) -> Resolution {
    let mut resolution = Resolution::default();
    for group in groups {
        let Some(id) = group.id.as_deref() else {
            resolution.warnings.push(ResolveWarning::MissingGroupId);
            continue;
        };
        let Some(members) = group.members.as_ref() else {
            resolution.warnings.push(ResolveWarning::MissingMembers {
                group: id.to_string(),
            });
            continue;
        };
        match parse_member_ids(members) {
            Ok(ids) => {
                if ids.iter().any(|m| *m == user_id.0) {
                    resolution.groups.insert(GroupId::from(id));
                }
            }
            Err(reason) => resolution.warnings.push(ResolveWarning::GroupMembers {
                group: id.to_string(),
                reason,
            }),
        }
    }
    resolution
}
