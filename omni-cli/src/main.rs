//! omni-user-manager — reconcile Omni users and groups with CSV or JSON files.
//!
//! # Usage
//!
//! ```text
//! omni-user-manager sync --source csv --users users.csv --groups groups.csv [--mode all|groups|attributes] [--dry-run] [--json]
//! omni-user-manager sync --source json --users users.json
//! omni-user-manager get-user-by-id [ID]
//! omni-user-manager search-users --query <Q> [--json]
//! omni-user-manager get-user-attributes <ID>
//! omni-user-manager get-group-by-id [ID]
//! omni-user-manager search-groups --query <Q> [--json]
//! omni-user-manager get-group-members <ID> [--json]
//! omni-user-manager export-users-json
//! omni-user-manager export-groups-json
//! ```
//!
//! `OMNI_BASE_URL` and `OMNI_API_KEY` are read from the environment or a
//! `.env` file in the working directory.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    groups::{GroupIdArg, OptionalGroupIdArg},
    sync::SyncArgs,
    users::{OptionalUserIdArg, UserIdArg},
    QueryArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "omni-user-manager",
    version,
    about = "Synchronize Omni users, groups and attributes from CSV or JSON files",
    long_about = None,
)]
struct Cli {
    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synchronize group memberships and attributes with Omni.
    Sync(SyncArgs),

    /// Get a user by ID, or every user when no ID is given.
    GetUserById(OptionalUserIdArg),

    /// Search users whose userName contains a query string.
    SearchUsers(QueryArgs),

    /// Print a user's custom attributes.
    GetUserAttributes(UserIdArg),

    /// Get a group by ID, or every group when no ID is given.
    GetGroupById(OptionalGroupIdArg),

    /// Search groups whose displayName contains a query string.
    SearchGroups(QueryArgs),

    /// List the members of a group.
    GetGroupMembers(GroupIdArg),

    /// Export every user as JSON (readable by `sync --source json`).
    ExportUsersJson,

    /// Export every group as JSON.
    ExportGroupsJson,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::GetUserById(args) => commands::users::get_by_id(args),
        Commands::SearchUsers(args) => commands::users::search(args),
        Commands::GetUserAttributes(args) => commands::users::attributes(args),
        Commands::GetGroupById(args) => commands::groups::get_by_id(args),
        Commands::SearchGroups(args) => commands::groups::search(args),
        Commands::GetGroupMembers(args) => commands::groups::members(args),
        Commands::ExportUsersJson => commands::users::export(),
        Commands::ExportGroupsJson => commands::groups::export(),
    }
}

/// Log to stderr so stdout stays clean for reports and JSON.
///
/// `--debug` forces the `debug` level; otherwise `RUST_LOG` applies, with
/// `info` as the fallback.
fn init_tracing(debug: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
