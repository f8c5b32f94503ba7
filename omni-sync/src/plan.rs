//! Per-user membership diff and group mutation plan.
//!
//! [`plan`] is pure: it reads the user, the desired set, and the group
//! catalog, and returns the whole-list replacements that would converge the
//! user. No network calls happen here.

use std::fmt;

use omni_core::{GroupCatalog, GroupId, GroupIdSet, GroupUpdate, MemberRef, User};
use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Delta
// ---------------------------------------------------------------------------

/// `to_add = desired − current`, `to_remove = current − desired`.
///
/// The two sets are disjoint by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDelta {
    pub to_add: GroupIdSet,
    pub to_remove: GroupIdSet,
}

impl MembershipDelta {
    pub fn between(current: &GroupIdSet, desired: &GroupIdSet) -> Self {
        Self {
            to_add: desired.difference(current).cloned().collect(),
            to_remove: current.difference(desired).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Direction of a single membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipChange {
    Add,
    Remove,
}

impl fmt::Display for MembershipChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipChange::Add => write!(f, "add"),
            MembershipChange::Remove => write!(f, "remove"),
        }
    }
}

/// One group write: the full replacement member list for `group_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMutation {
    pub group_id: GroupId,
    pub display_name: String,
    pub change: MembershipChange,
    pub members: Vec<MemberRef>,
}

impl GroupMutation {
    /// The API payload for this mutation.
    pub fn to_update(&self) -> GroupUpdate {
        GroupUpdate::new(
            self.group_id.clone(),
            self.display_name.clone(),
            self.members.clone(),
        )
    }
}

/// A group the plan had to skip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanWarning {
    #[error("unknown group ID: {0}")]
    UnknownGroup(GroupId),
}

/// Everything needed to converge one user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub current: GroupIdSet,
    pub desired: GroupIdSet,
    pub delta: MembershipDelta,
    pub mutations: Vec<GroupMutation>,
    pub warnings: Vec<PlanWarning>,
}

impl Plan {
    /// `true` when current and desired membership differ, even if every
    /// affected group had to be skipped.
    pub fn needs_update(&self) -> bool {
        !self.delta.is_empty()
    }
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

/// Compute the group mutations that move `user` to `desired`.
///
/// - equal sets: empty plan, checked before anything else;
/// - a group missing from `catalog`: [`PlanWarning::UnknownGroup`], skipped;
/// - leaving a group: current member list minus entries whose value is the user's ID;
/// - joining a group: current member list plus `{display: userName, value: id}`.
///
/// A step that would leave the member list unchanged is not emitted.
pub fn plan(user: &User, desired: &GroupIdSet, catalog: &GroupCatalog) -> Plan {
    let current = user.group_ids();
    if current == *desired {
        return Plan {
            desired: desired.clone(),
            current,
            ..Plan::default()
        };
    }

    let delta = MembershipDelta::between(&current, desired);
    let mut mutations = Vec::new();
    let mut warnings = Vec::new();

    for group_id in current.union(desired) {
        let Some(group) = catalog.get(group_id) else {
            warnings.push(PlanWarning::UnknownGroup(group_id.clone()));
            continue;
        };

        let (change, members) = if delta.to_remove.contains(group_id) {
            let kept: Vec<MemberRef> = group
                .members
                .iter()
                .filter(|m| !m.refers_to(&user.id))
                .cloned()
                .collect();
            (MembershipChange::Remove, kept)
        } else if delta.to_add.contains(group_id) {
            if group.members.iter().any(|m| m.refers_to(&user.id)) {
                continue;
            }
            let mut extended = group.members.clone();
            extended.push(MemberRef::new(user.member_display(), &user.id));
            (MembershipChange::Add, extended)
        } else {
            continue;
        };

        if members == group.members {
            continue;
        }
        mutations.push(GroupMutation {
            group_id: group_id.clone(),
            display_name: group.display_name.clone(),
            change,
            members,
        });
    }

    Plan {
        current,
        desired: desired.clone(),
        delta,
        mutations,
        warnings,
    }
}
