//! Desired-state data sources for `omni-user-manager`.
//!
//! A source turns flat files into [`SourceUser`] records and supplies the
//! [`DesiredGroupsResolver`] that matches its membership encoding:
//!
//! - [`CsvSource`] — `users.csv` + `groups.csv`, membership found by group scan
//! - [`JsonSource`] — one JSON document, membership embedded per user

use std::fmt;

use omni_core::Attributes;
use serde_json::Value;

pub mod csv;
mod error;
pub mod json;
pub mod resolver;

pub use crate::csv::CsvSource;
pub use crate::json::JsonSource;
pub use error::SourceError;
pub use resolver::{
    groups_for_user, DesiredGroupsResolver, EmbeddedGroups, GroupScan, Resolution, ResolveWarning,
};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A user as declared in the desired-state file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUser {
    /// Login name; the key used to look the user up on the platform.
    pub user_name: String,
    pub id: Option<String>,
    pub display_name: Option<String>,
    /// Raw membership field, `Value::Null` when absent.
    pub groups: Value,
    /// Desired custom attributes. `None` leaves attributes untouched.
    pub attributes: Option<Attributes>,
}

/// A group row from `groups.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceGroup {
    pub id: Option<String>,
    pub display_name: Option<String>,
    /// Raw `members` field, `None` when the column is absent or empty.
    pub members: Option<Value>,
}

// ---------------------------------------------------------------------------
// Source capability
// ---------------------------------------------------------------------------

/// Which file layout a source reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Json,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Csv => write!(f, "CSV"),
            SourceKind::Json => write!(f, "JSON"),
        }
    }
}

/// A desired-state file set.
pub trait DataSource {
    fn kind(&self) -> SourceKind;

    /// Every user record in the source, in file order.
    fn users(&self) -> Result<Vec<SourceUser>, SourceError>;

    /// The membership rule for this source.
    fn resolver(&self) -> Result<Box<dyn DesiredGroupsResolver>, SourceError>;
}
