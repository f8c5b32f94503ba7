//! `omni-user-manager sync` — reconcile Omni against a CSV or JSON source.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use omni_client::OmniClient;
use omni_source::{CsvSource, DataSource, JsonSource};
use omni_sync::{pipeline, SyncMode, SyncOptions, SyncReport, WriteCounts};

use super::{load_config, print_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ModeArg {
    #[default]
    All,
    Groups,
    Attributes,
}

impl From<ModeArg> for SyncMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::All => SyncMode::All,
            ModeArg::Groups => SyncMode::Groups,
            ModeArg::Attributes => SyncMode::Attributes,
        }
    }
}

/// Arguments for `omni-user-manager sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Desired-state file format.
    #[arg(long, value_enum)]
    pub source: SourceArg,

    /// Users file (CSV or JSON).
    #[arg(long)]
    pub users: PathBuf,

    /// Groups CSV file; required with `--source csv`.
    #[arg(long)]
    pub groups: Option<PathBuf>,

    /// What to reconcile.
    #[arg(long, value_enum, default_value_t = ModeArg::All)]
    pub mode: ModeArg,

    /// Compute every change without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the full sync report as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config()?;
        let source = self.open_source()?;
        let options = SyncOptions {
            mode: self.mode.into(),
            dry_run: self.dry_run,
        };

        if !self.json {
            println!("Using {} data source", source.kind());
            println!("{}", banner(options).cyan());
        }

        let client = OmniClient::new(config);
        let report = pipeline::run(&client, source.as_ref(), options).context("sync failed")?;

        if self.json {
            print_json(&report)?;
        } else {
            print_summary(&report);
        }
        // Per-write failures are reported above; they do not change the exit code.
        Ok(())
    }

    fn open_source(&self) -> Result<Box<dyn DataSource>> {
        match self.source {
            SourceArg::Csv => {
                let Some(groups) = self.groups.as_ref() else {
                    bail!("--groups is required when using CSV source");
                };
                let source = CsvSource::open(&self.users, groups)
                    .context("failed to open CSV data source")?;
                Ok(Box::new(source))
            }
            SourceArg::Json => {
                let source =
                    JsonSource::open(&self.users).context("failed to open JSON data source")?;
                Ok(Box::new(source))
            }
        }
    }
}

fn banner(options: SyncOptions) -> String {
    let scope = match options.mode {
        SyncMode::All => "full sync (groups and attributes)",
        SyncMode::Groups => "groups-only sync",
        SyncMode::Attributes => "attributes-only sync",
    };
    if options.dry_run {
        format!("Running {scope} [dry-run]")
    } else {
        format!("Running {scope}")
    }
}

fn print_summary(report: &SyncReport) {
    println!();
    println!("{}", "Sync summary".bold());
    println!("  Total users processed: {}", report.users_processed);
    if report.users_not_found > 0 {
        println!(
            "  Users not found in Omni: {}",
            report.users_not_found.to_string().yellow()
        );
    }
    if report.users_failed > 0 {
        println!(
            "  Users that could not be looked up: {}",
            report.users_failed.to_string().red()
        );
    }
    if report.mode.syncs_groups() {
        print_counts("group", &report.groups, report.dry_run);
    }
    if report.mode.syncs_attributes() {
        print_counts("attribute", &report.attributes, report.dry_run);
    }
    println!();

    if report.dry_run {
        println!("{}", "Dry run: no changes were written.".cyan());
    } else if report.is_success() {
        println!("{}", "All updates completed successfully!".green());
    } else {
        println!(
            "{}",
            format!("{} updates failed", report.failed_writes()).red()
        );
    }
}

fn print_counts(kind: &str, counts: &WriteCounts, dry_run: bool) {
    println!(
        "  Users needing {kind} updates: {}",
        counts.users_needing_update
    );
    if dry_run {
        println!("  Planned {kind} updates: {}", counts.planned);
        return;
    }
    println!("  Attempted {kind} updates: {}", counts.attempted);
    let succeeded = counts.succeeded.to_string();
    let succeeded = if counts.all_succeeded() {
        succeeded.green()
    } else {
        succeeded.red()
    };
    println!("  Successful {kind} updates: {succeeded}");
}
