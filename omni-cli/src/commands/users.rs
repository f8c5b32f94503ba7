//! Read-only user commands.

use anyhow::{bail, Context, Result};
use clap::Args;
use omni_core::{User, UserId};
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

use super::{connect, print_json, QueryArgs};

#[derive(Args, Debug)]
pub struct UserIdArg {
    /// Omni user ID.
    pub user_id: String,
}

#[derive(Args, Debug)]
pub struct OptionalUserIdArg {
    /// Omni user ID; omit to list every user.
    pub user_id: Option<String>,
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "userName")]
    user_name: String,
    #[tabled(rename = "displayName")]
    display_name: String,
    #[tabled(rename = "groups")]
    groups: usize,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            user_name: user.user_name.clone(),
            display_name: user.display_name.clone().unwrap_or_default(),
            groups: user.group_ids().len(),
        }
    }
}

pub fn get_by_id(args: OptionalUserIdArg) -> Result<()> {
    let client = connect()?;
    match args.user_id {
        Some(id) => print_json(&fetch(&client, &id)?),
        None => {
            let users = client.list_users().context("failed to list users")?;
            print_json(&users)
        }
    }
}

pub fn search(args: QueryArgs) -> Result<()> {
    let client = connect()?;
    let users = client
        .search_users(&args.query)
        .with_context(|| format!("failed to search users for '{}'", args.query))?;
    if args.json {
        return print_json(&users);
    }

    if users.is_empty() {
        println!("No users match '{}'.", args.query);
        return Ok(());
    }
    let mut table = Table::new(users.iter().map(UserRow::from));
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

pub fn attributes(args: UserIdArg) -> Result<()> {
    let client = connect()?;
    let user = fetch(&client, &args.user_id)?;
    match user.attributes {
        Some(attrs) => print_json(&attrs),
        None => print_json(&Value::Object(Default::default())),
    }
}

pub fn export() -> Result<()> {
    let client = connect()?;
    let users = client.list_users().context("failed to export users")?;
    print_json(&users)
}

fn fetch(client: &omni_client::OmniClient, id: &str) -> Result<User> {
    let user_id = UserId::from(id);
    match client
        .get_user_by_id(&user_id)
        .with_context(|| format!("failed to fetch user {id}"))?
    {
        Some(user) => Ok(user),
        None => bail!("user not found: {id}"),
    }
}
