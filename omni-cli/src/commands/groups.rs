//! Read-only group commands.

use anyhow::{bail, Context, Result};
use clap::Args;
use omni_client::{IdentityApi, OmniClient};
use omni_core::{Group, MemberRef};
use tabled::{settings::Style, Table, Tabled};

use super::{connect, print_json, QueryArgs};

#[derive(Args, Debug)]
pub struct GroupIdArg {
    /// Omni group ID.
    pub group_id: String,

    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct OptionalGroupIdArg {
    /// Omni group ID; omit to list every group.
    pub group_id: Option<String>,
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "displayName")]
    display_name: String,
    #[tabled(rename = "members")]
    members: usize,
}

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "value")]
    value: String,
    #[tabled(rename = "display")]
    display: String,
}

impl From<&MemberRef> for MemberRow {
    fn from(member: &MemberRef) -> Self {
        Self {
            value: member.value.clone().unwrap_or_default(),
            display: member.display.clone().unwrap_or_default(),
        }
    }
}

pub fn get_by_id(args: OptionalGroupIdArg) -> Result<()> {
    let client = connect()?;
    match args.group_id {
        Some(id) => print_json(&fetch(&client, &id)?),
        None => export_with(&client),
    }
}

pub fn search(args: QueryArgs) -> Result<()> {
    let client = connect()?;
    let groups = client
        .search_groups(&args.query)
        .with_context(|| format!("failed to search groups for '{}'", args.query))?;
    if args.json {
        return print_json(&groups);
    }

    if groups.is_empty() {
        println!("No groups match '{}'.", args.query);
        return Ok(());
    }
    let rows = groups.iter().map(|g| GroupRow {
        id: g.id.to_string(),
        display_name: g.display_name.clone(),
        members: g.members.len(),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

pub fn members(args: GroupIdArg) -> Result<()> {
    let client = connect()?;
    let group = fetch(&client, &args.group_id)?;
    if args.json {
        return print_json(&group.members);
    }

    println!("{} ({} members)", group.display_name, group.members.len());
    if !group.members.is_empty() {
        let mut table = Table::new(group.members.iter().map(MemberRow::from));
        table.with(Style::rounded());
        println!("{table}");
    }
    Ok(())
}

pub fn export() -> Result<()> {
    export_with(&connect()?)
}

fn export_with(client: &OmniClient) -> Result<()> {
    let groups = client.get_groups().context("failed to list groups")?;
    print_json(&groups)
}

fn fetch(client: &OmniClient, id: &str) -> Result<Group> {
    match client
        .get_group_by_id(id)
        .with_context(|| format!("failed to fetch group {id}"))?
    {
        Some(group) => Ok(group),
        None => bail!("group not found: {id}"),
    }
}
