//! Batch driver: applies a property set to every repository in an
//! organization, one request at a time.
//!
//! The run moves through [`Stage`]s in a fixed order. Organization and
//! listing failures abort the run; a failed update only marks its
//! repository as failed and the run continues.

use std::fmt;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::client::PropertyHost;
use crate::error::ClientError;
use crate::properties::PropertySet;
use crate::repository::RepositoryRecord;

/// Errors that end a run before any property is applied.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to connect to organization {org}: {source}")]
    Connection {
        org: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to list repositories for {org}: {source}")]
    Listing {
        org: String,
        #[source]
        source: ClientError,
    },
}

/// Progress of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Connected,
    Listing,
    Filtering,
    Applying,
    Summarized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Connected => "connected",
            Self::Listing => "listing",
            Self::Filtering => "filtering",
            Self::Applying => "applying",
            Self::Summarized => "summarized",
        };
        f.write_str(name)
    }
}

/// Run modifiers.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Report intended changes without issuing updates.
    pub dry_run: bool,

    /// Case-insensitive substring a repository name must contain.
    pub filter: Option<String>,
}

/// Per-repository outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub dry_run: bool,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    /// True when no repository failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Human-readable summary block.
    pub fn report(&self) -> Vec<String> {
        let rule = "=".repeat(60);
        let mut lines = vec![rule.clone(), "SUMMARY".to_string(), rule];
        if self.dry_run {
            lines.push(format!("Repositories that would be updated: {}", self.skipped));
        } else {
            lines.push(format!("Successfully updated: {}", self.succeeded));
            lines.push(format!("Failed to update: {}", self.failed));
        }
        lines
    }
}

/// Keeps repositories whose short name contains `filter`, ignoring case.
///
/// `None` and the empty string keep everything.
pub fn filter_repositories(
    repos: Vec<RepositoryRecord>,
    filter: Option<&str>,
) -> Vec<RepositoryRecord> {
    match filter {
        Some(pattern) if !pattern.is_empty() => {
            repos.into_iter().filter(|r| r.name_contains(pattern)).collect()
        }
        _ => repos,
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    debug!(from = %stage, to = %next, "stage transition");
    *stage = next;
}

/// Applies every property to every matching repository in `org`.
pub async fn run_batch<H: PropertyHost>(
    host: &H,
    org: &str,
    properties: &PropertySet,
    options: &BatchOptions,
) -> Result<RunSummary, RunError> {
    let mut stage = Stage::Init;

    host.verify_organization(org)
        .await
        .map_err(|source| RunError::Connection {
            org: org.to_string(),
            source,
        })?;
    info!("Successfully connected to organization: {org}");
    enter(&mut stage, Stage::Connected);

    enter(&mut stage, Stage::Listing);
    let repos = host
        .list_repositories(org)
        .await
        .map_err(|source| RunError::Listing {
            org: org.to_string(),
            source,
        })?;
    info!("Found {} repositories in {org}", repos.len());

    enter(&mut stage, Stage::Filtering);
    let repos = match options.filter.as_deref() {
        Some(pattern) if !pattern.is_empty() => {
            let filtered = filter_repositories(repos, Some(pattern));
            info!("Filtered to {} repositories matching '{pattern}'", filtered.len());
            filtered
        }
        _ => repos,
    };

    enter(&mut stage, Stage::Applying);
    let mut summary = RunSummary {
        dry_run: options.dry_run,
        ..RunSummary::default()
    };

    if options.dry_run {
        info!("DRY RUN MODE - No changes will be made");
        for repo in &repos {
            info!("[DRY RUN] Would set properties on {}:", repo.full_name);
            for (name, value) in properties.iter() {
                info!("  {name} = {value}");
            }
            summary.skipped += 1;
        }
    } else {
        for repo in &repos {
            if apply_all(host, repo, properties).await {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
        }
    }

    enter(&mut stage, Stage::Summarized);
    debug_assert_eq!(summary.total(), repos.len());
    Ok(summary)
}

/// Applies every property to one repository. Later properties are still
/// attempted after a failure; nothing is rolled back.
async fn apply_all<H: PropertyHost>(host: &H, repo: &RepositoryRecord, properties: &PropertySet) -> bool {
    let mut all_ok = true;
    for (name, value) in properties.iter() {
        match host.set_property(repo, name, value).await {
            Ok(()) => info!("✓ Set {name}={value} on {}", repo.full_name),
            Err(failure) => {
                error!(
                    repository = %repo.full_name,
                    property = name,
                    "✗ Failed to set property on {}: {failure}",
                    repo.full_name
                );
                all_ok = false;
            }
        }
    }
    all_ok
}
