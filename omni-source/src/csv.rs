//! CSV pair source: `users.csv` and `groups.csv`.
//!
//! ```text
//! users.csv:  userName,id,displayName,groups,userAttributes
//! groups.csv: id,displayName,members
//! ```
//!
//! `members` holds a JSON array of user IDs, usually quote-doubled by the
//! spreadsheet that wrote it. `userName` (users) and `id` (groups) are the
//! only required columns.

use std::fs::File;
use std::path::{Path, PathBuf};

use omni_core::normalize::decode_embedded_object;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{ensure_exists, io_err, SourceError};
use crate::resolver::{DesiredGroupsResolver, GroupScan};
use crate::{DataSource, SourceGroup, SourceKind, SourceUser};

#[derive(Debug, Deserialize)]
struct UserRow {
    #[serde(rename = "userName", default)]
    user_name: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(default)]
    groups: Option<String>,
    #[serde(rename = "userAttributes", default)]
    user_attributes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroupRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(default)]
    members: Option<String>,
}

/// Users and groups from two CSV files.
#[derive(Debug, Clone)]
pub struct CsvSource {
    users_path: PathBuf,
    groups_path: PathBuf,
}

impl CsvSource {
    /// Open a CSV pair. Both files must exist.
    pub fn open(users: impl Into<PathBuf>, groups: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let users_path = users.into();
        let groups_path = groups.into();
        ensure_exists("users", &users_path)?;
        ensure_exists("groups", &groups_path)?;
        Ok(Self {
            users_path,
            groups_path,
        })
    }

    /// Every group row in `groups.csv`.
    pub fn groups(&self) -> Result<Vec<SourceGroup>, SourceError> {
        let rows: Vec<GroupRow> = read_rows(&self.groups_path, "id")?;
        Ok(rows
            .into_iter()
            .map(|row| SourceGroup {
                id: non_blank(row.id),
                display_name: non_blank(row.display_name),
                members: row.members.map(Value::String),
            })
            .collect())
    }
}

impl DataSource for CsvSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Csv
    }

    fn users(&self) -> Result<Vec<SourceUser>, SourceError> {
        let rows: Vec<UserRow> = read_rows(&self.users_path, "userName")?;
        let mut users = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            // Header is line 1.
            let line = index + 2;
            let Some(user_name) = non_blank(row.user_name) else {
                warn!("{}:{line}: row has no userName, skipping", self.users_path.display());
                continue;
            };
            let attributes = match row.user_attributes.as_deref().map(decode_embedded_object) {
                None => None,
                Some(Ok(attrs)) => attrs,
                Some(Err(e)) => {
                    warn!("could not parse userAttributes for {user_name}: {e}");
                    None
                }
            };
            users.push(SourceUser {
                user_name,
                id: non_blank(row.id),
                display_name: non_blank(row.display_name),
                groups: row.groups.map(Value::String).unwrap_or(Value::Null),
                attributes,
            });
        }
        Ok(users)
    }

    fn resolver(&self) -> Result<Box<dyn DesiredGroupsResolver>, SourceError> {
        Ok(Box::new(GroupScan::new(self.groups()?)))
    }
}

fn read_rows<T>(path: &Path, required: &'static str) -> Result<Vec<T>, SourceError>
where
    T: for<'de> Deserialize<'de>,
{
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(::csv::Trim::Headers)
        .from_reader(file);

    let csv_err = |source| SourceError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let headers = reader.headers().map_err(csv_err)?;
    if !headers.iter().any(|h| h == required) {
        return Err(SourceError::MissingColumn {
            path: path.to_path_buf(),
            column: required,
        });
    }

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(csv_err)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
