//! Per-user outcomes and the aggregate sync report.
//!
//! Every unit of work ends as a value here: nothing is swallowed silently and
//! nothing per-user escapes as an error. Counters are derived from outcomes
//! as they are recorded.

use std::fmt;

use chrono::{DateTime, Utc};
use omni_core::{GroupId, UserId};
use serde::Serialize;

use crate::plan::MembershipChange;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// What a sync run reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Group memberships, then custom attributes.
    #[default]
    All,
    Groups,
    Attributes,
}

impl SyncMode {
    pub fn syncs_groups(self) -> bool {
        matches!(self, SyncMode::All | SyncMode::Groups)
    }

    pub fn syncs_attributes(self) -> bool {
        matches!(self, SyncMode::All | SyncMode::Attributes)
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::All => write!(f, "all"),
            SyncMode::Groups => write!(f, "groups"),
            SyncMode::Attributes => write!(f, "attributes"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of one API write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApplyStatus {
    Applied,
    /// Dry run: the write was computed but not sent.
    Planned,
    Failed {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

/// One group mutation and what became of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationOutcome {
    pub group_id: GroupId,
    pub display_name: String,
    pub change: MembershipChange,
    #[serde(flatten)]
    pub status: ApplyStatus,
}

/// Group reconciliation for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupOutcome {
    pub current: Vec<GroupId>,
    pub desired: Vec<GroupId>,
    /// Current and desired membership differ.
    pub needs_update: bool,
    pub warnings: Vec<String>,
    pub mutations: Vec<MutationOutcome>,
}

/// Attribute reconciliation for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeOutcome {
    pub changed_keys: Vec<String>,
    #[serde(flatten)]
    pub status: ApplyStatus,
}

/// Terminal state of one desired-state user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum UserOutcome {
    /// No platform user has this `userName`; nothing was attempted.
    NotFound { user_name: String },
    /// The lookup itself failed; nothing was attempted.
    LookupFailed { user_name: String, reason: String },
    Processed {
        user_name: String,
        user_id: UserId,
        #[serde(skip_serializing_if = "Option::is_none")]
        groups: Option<GroupOutcome>,
        /// `None` when attributes were not reconciled or needed no write.
        #[serde(skip_serializing_if = "Option::is_none")]
        attributes: Option<AttributeOutcome>,
    },
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Aggregate write counters for one side of the sync.
///
/// `succeeded <= attempted` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteCounts {
    /// Users whose current state differed from the desired state.
    pub users_needing_update: usize,
    /// Writes computed but not sent (dry run).
    pub planned: usize,
    pub attempted: usize,
    pub succeeded: usize,
}

impl WriteCounts {
    fn record(&mut self, status: &ApplyStatus) {
        match status {
            ApplyStatus::Applied => {
                self.attempted += 1;
                self.succeeded += 1;
            }
            ApplyStatus::Failed { .. } => self.attempted += 1,
            ApplyStatus::Planned => self.planned += 1,
        }
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.attempted
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything a sync run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub users_processed: usize,
    pub users_not_found: usize,
    pub users_failed: usize,
    pub groups: WriteCounts,
    pub attributes: WriteCounts,
    pub outcomes: Vec<UserOutcome>,
}

impl SyncReport {
    pub fn new(mode: SyncMode, dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            mode,
            dry_run,
            started_at: now,
            finished_at: now,
            users_processed: 0,
            users_not_found: 0,
            users_failed: 0,
            groups: WriteCounts::default(),
            attributes: WriteCounts::default(),
            outcomes: Vec::new(),
        }
    }

    /// Fold one user's outcome into the counters and keep it.
    pub fn record(&mut self, outcome: UserOutcome) {
        self.users_processed += 1;
        match &outcome {
            UserOutcome::NotFound { .. } => self.users_not_found += 1,
            UserOutcome::LookupFailed { .. } => self.users_failed += 1,
            UserOutcome::Processed {
                groups, attributes, ..
            } => {
                if let Some(groups) = groups {
                    if groups.needs_update {
                        self.groups.users_needing_update += 1;
                    }
                    for mutation in &groups.mutations {
                        self.groups.record(&mutation.status);
                    }
                }
                if let Some(attributes) = attributes {
                    self.attributes.users_needing_update += 1;
                    self.attributes.record(&attributes.status);
                }
            }
        }
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// Every attempted write succeeded. Reported, not enforced.
    pub fn is_success(&self) -> bool {
        self.groups.all_succeeded() && self.attributes.all_succeeded()
    }

    pub fn failed_writes(&self) -> usize {
        self.groups.failed() + self.attributes.failed()
    }
}
