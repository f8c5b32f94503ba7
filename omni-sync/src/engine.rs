//! Sync orchestration: drive the planner over every desired-state user.
//!
//! ## Per-user protocol
//!
//! 1. Look the user up on the platform by `userName` (not found → skip).
//! 2. Resolve desired groups with the source's resolver.
//! 3. [`plan`] the group mutations; apply each one, recording the result.
//! 4. [`plan_attributes`] and apply the attribute write, if any.
//!
//! Failures are recorded per write and per user; the loop always continues.
//! Users and writes are processed sequentially, and the group catalog is
//! updated after every accepted write so later users build on it.

use omni_client::{ApiError, IdentityApi};
use omni_core::{GroupCatalog, User};
use omni_source::{DesiredGroupsResolver, SourceUser};
use tracing::{debug, error, info, warn};

use crate::attributes::plan_attributes;
use crate::plan::plan;
use crate::report::{
    ApplyStatus, AttributeOutcome, GroupOutcome, MutationOutcome, SyncMode, SyncReport,
    UserOutcome,
};

/// Knobs for one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOptions {
    pub mode: SyncMode,
    /// Compute and report every write without sending it.
    pub dry_run: bool,
}

/// Reconcile every user in `users` against the platform.
pub fn sync_users(
    api: &dyn IdentityApi,
    users: &[SourceUser],
    resolver: &dyn DesiredGroupsResolver,
    catalog: &mut GroupCatalog,
    options: SyncOptions,
) -> SyncReport {
    let mut report = SyncReport::new(options.mode, options.dry_run);
    for source_user in users {
        let outcome = sync_user(api, source_user, resolver, catalog, options);
        report.record(outcome);
    }
    report.finish();
    report
}

fn sync_user(
    api: &dyn IdentityApi,
    source_user: &SourceUser,
    resolver: &dyn DesiredGroupsResolver,
    catalog: &mut GroupCatalog,
    options: SyncOptions,
) -> UserOutcome {
    let user_name = source_user.user_name.clone();
    let current = match api.get_user(&user_name) {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("user not found in Omni: {user_name}");
            return UserOutcome::NotFound { user_name };
        }
        Err(err) => {
            error!("error processing user {user_name}: {err}");
            return UserOutcome::LookupFailed {
                user_name,
                reason: err.to_string(),
            };
        }
    };

    let groups = options
        .mode
        .syncs_groups()
        .then(|| sync_groups(api, source_user, &current, resolver, catalog, options.dry_run));
    let attributes = if options.mode.syncs_attributes() {
        sync_attributes(api, source_user, &current, options.dry_run)
    } else {
        None
    };

    UserOutcome::Processed {
        user_name,
        user_id: current.id,
        groups,
        attributes,
    }
}

fn sync_groups(
    api: &dyn IdentityApi,
    source_user: &SourceUser,
    current: &User,
    resolver: &dyn DesiredGroupsResolver,
    catalog: &mut GroupCatalog,
    dry_run: bool,
) -> GroupOutcome {
    let resolution = resolver.desired_groups(source_user, &current.id);
    let mut warnings: Vec<String> = Vec::new();
    for warning in &resolution.warnings {
        warn!("{}: {warning}", current.user_name);
        warnings.push(warning.to_string());
    }

    let plan = plan(current, &resolution.groups, catalog);
    let mut outcome = GroupOutcome {
        current: plan.current.iter().cloned().collect(),
        desired: plan.desired.iter().cloned().collect(),
        needs_update: plan.needs_update(),
        warnings,
        mutations: Vec::with_capacity(plan.mutations.len()),
    };
    if !outcome.needs_update {
        debug!("{}: groups already in sync", current.user_name);
        return outcome;
    }

    info!(
        "updating {} (current: {:?}, desired: {:?})",
        current.user_name, outcome.current, outcome.desired
    );
    for warning in &plan.warnings {
        warn!("  {warning}");
        outcome.warnings.push(warning.to_string());
    }

    for mutation in plan.mutations {
        let status = if dry_run {
            info!("  [dry-run] would {} {} ({})", mutation.change, current.user_name, mutation.display_name);
            ApplyStatus::Planned
        } else {
            match api.update_group(&mutation.to_update()) {
                Ok(()) => {
                    info!("  updated group: {}", mutation.display_name);
                    catalog.replace_members(&mutation.group_id, mutation.members.clone());
                    ApplyStatus::Applied
                }
                Err(err) => failed("update group", &mutation.display_name, err),
            }
        };
        outcome.mutations.push(MutationOutcome {
            group_id: mutation.group_id,
            display_name: mutation.display_name,
            change: mutation.change,
            status,
        });
    }
    outcome
}

fn sync_attributes(
    api: &dyn IdentityApi,
    source_user: &SourceUser,
    current: &User,
    dry_run: bool,
) -> Option<AttributeOutcome> {
    let change = plan_attributes(current.attributes.as_ref(), source_user.attributes.as_ref())?;
    info!(
        "updating attributes for {}: {}",
        current.user_name,
        change.changed_keys.join(", ")
    );

    let status = if dry_run {
        ApplyStatus::Planned
    } else {
        match api.update_user_attributes(&current.id, &change.merged) {
            Ok(()) => ApplyStatus::Applied,
            Err(err) => failed("update attributes for", &current.user_name, err),
        }
    };
    Some(AttributeOutcome {
        changed_keys: change.changed_keys,
        status,
    })
}

fn failed(action: &str, target: &str, err: ApiError) -> ApplyStatus {
    error!("  failed to {action} {target}: {err}");
    let detail = err.response_detail().map(str::to_string);
    if let Some(detail) = &detail {
        error!("  response: {detail}");
    }
    ApplyStatus::Failed {
        reason: err.to_string(),
        detail,
    }
}
