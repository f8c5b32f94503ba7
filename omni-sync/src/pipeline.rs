//! Sync pipeline entrypoint used by the CLI.

use omni_client::IdentityApi;
use omni_core::GroupCatalog;
use omni_source::DataSource;
use tracing::{info, warn};

use crate::engine::{sync_users, SyncOptions};
use crate::{SyncError, SyncReport};

/// Load the source, fetch the group catalog, and reconcile every user.
///
/// Setup problems (unreadable files, catalog fetch failure) are returned as
/// [`SyncError`]. Once processing starts, the run always yields a report.
pub fn run(
    api: &dyn IdentityApi,
    source: &dyn DataSource,
    options: SyncOptions,
) -> Result<SyncReport, SyncError> {
    let users = source.users()?;
    info!("found {} users in {} data source", users.len(), source.kind());
    let resolver = source.resolver()?;

    let mut catalog = if options.mode.syncs_groups() {
        let catalog = GroupCatalog::new(api.get_groups()?);
        if catalog.is_empty() {
            warn!("Omni returned no groups; every desired group will be reported unknown");
        } else {
            info!("fetched {} groups from Omni", catalog.len());
        }
        catalog
    } else {
        GroupCatalog::default()
    };

    Ok(sync_users(
        api,
        &users,
        resolver.as_ref(),
        &mut catalog,
        options,
    ))
}
