//! # omni-sync
//!
//! Reconciliation of platform users against a desired-state source.
//!
//! - [`plan`] — pure per-user membership diff and group mutation plan
//! - [`attributes`] — pure custom-attribute diff
//! - [`engine`] — sequential orchestration with per-write outcomes
//! - [`pipeline`] — source + catalog setup, then [`engine::sync_users`]

pub mod attributes;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod plan;
pub mod report;

pub use attributes::{plan_attributes, AttributeChange};
pub use engine::{sync_users, SyncOptions};
pub use error::SyncError;
pub use plan::{plan, GroupMutation, MembershipChange, MembershipDelta, Plan, PlanWarning};
pub use report::{
    ApplyStatus, AttributeOutcome, GroupOutcome, MutationOutcome, SyncMode, SyncReport,
    UserOutcome, WriteCounts,
};
