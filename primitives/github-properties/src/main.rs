//! GitHub Properties - Organization-wide Custom Property Setter
//!
//! Applies custom properties to every repository in a GitHub organization.
//! Requests are issued one at a time with no retries; a failed update is
//! reported and the run moves on to the next repository.
//!
//! # Usage
//!
//! ```bash
//! # Set a single property on all repos
//! set-custom-properties --org myorg --property "team=backend"
//!
//! # Set multiple properties
//! set-custom-properties --org myorg -p "team=backend" -p "env=prod"
//!
//! # Load properties from a JSON file
//! set-custom-properties --org myorg --properties-file properties.json
//!
//! # Dry run, limited to repositories whose name contains "frontend"
//! set-custom-properties --org myorg -p "team=web" --filter frontend --dry-run
//! ```
//!
//! # Exit Codes
//!
//! - `0` - every repository updated, or dry run
//! - `1` - any repository failed, or configuration/connection error

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use github_common::client::DEFAULT_API_URL;
use github_common::{BatchOptions, ClientConfig, ConfigError, GithubClient, PropertySet, RunSummary, run_batch};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Sets custom properties on all repositories in a GitHub organization.
#[derive(Parser, Debug)]
#[command(name = "set-custom-properties")]
#[command(about = "Set custom properties on all repositories in a GitHub organization")]
struct Args {
    /// GitHub organization name.
    #[arg(long, env = "GITHUB_ORG")]
    org: String,

    /// GitHub personal access token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Custom property in "name=value" form (repeatable).
    #[arg(short, long = "property", value_name = "NAME=VALUE")]
    properties: Vec<String>,

    /// JSON file mapping property names to string values.
    #[arg(long, value_name = "PATH")]
    properties_file: Option<PathBuf>,

    /// Show what would be done without making any changes.
    #[arg(long)]
    dry_run: bool,

    /// Only touch repositories whose name contains this (case-insensitive).
    #[arg(long)]
    filter: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// GitHub API root, e.g. https://ghe.example.com/api/v3 for Enterprise.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Per-request timeout in seconds.
    #[arg(
        long,
        env = "GITHUB_PROPERTIES_TIMEOUT",
        default_value = "30",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,
}

/// Installs the tracing subscriber. `RUST_LOG` takes precedence over
/// `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Validates configuration, then runs the batch. Nothing touches the
/// network until both the token and the property set are valid.
async fn run(args: Args) -> anyhow::Result<RunSummary> {
    let token = args
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or(ConfigError::MissingToken)?;

    let properties = PropertySet::from_sources(&args.properties, args.properties_file.as_deref())?;
    let listed: Vec<String> = properties.iter().map(|(k, v)| format!("{k}={v}")).collect();
    info!("Properties to set: {}", listed.join(", "));

    let config = ClientConfig::new(token)
        .with_api_url(args.api_url)
        .with_timeout(Duration::from_secs(args.timeout));
    debug!(?config, "building GitHub client");
    let client = GithubClient::new(config).context("failed to initialize GitHub client")?;

    let options = BatchOptions {
        dry_run: args.dry_run,
        filter: args.filter,
    };

    Ok(run_batch(&client, &args.org, &properties, &options).await?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(summary) => {
            for line in summary.report() {
                info!("{line}");
            }
            if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("set-custom-properties").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn repeatable_properties_and_modifiers() {
        let args = parse(&[
            "--org", "acme", "--token", "t", "-p", "team=backend", "--property", "env=prod", "--dry-run",
            "--filter", "web", "-v",
        ]);
        assert_eq!(args.org, "acme");
        assert_eq!(args.properties, vec!["team=backend", "env=prod"]);
        assert!(args.dry_run);
        assert!(args.verbose);
        assert_eq!(args.filter.as_deref(), Some("web"));
    }

    fn arg(id: &str) -> clap::Arg {
        Args::command()
            .get_arguments()
            .find(|a| a.get_id() == id)
            .cloned()
            .unwrap()
    }

    #[test]
    fn org_is_required() {
        let org = arg("org");
        assert!(org.is_required_set());
        assert_eq!(org.get_env().and_then(|e| e.to_str()), Some("GITHUB_ORG"));
    }

    #[test]
    fn timeout_defaults_to_thirty_seconds() {
        let defaults: Vec<String> = arg("timeout")
            .get_default_values()
            .iter()
            .map(|v| v.to_string_lossy().into_owned())
            .collect();
        assert_eq!(defaults, vec!["30"]);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = Args::try_parse_from([
            "set-custom-properties", "--org", "acme", "--token", "t", "-p", "a=b", "--timeout", "0",
        ]);
        assert!(result.is_err());

        let args = parse(&["--org", "acme", "--token", "t", "-p", "a=b", "--timeout", "1"]);
        assert_eq!(args.timeout, 1);
    }

    #[tokio::test]
    async fn missing_token_is_rejected_before_network() {
        let mut args = parse(&["--org", "acme", "-p", "team=backend"]);
        args.token = None;
        let err = run(args).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::MissingToken)));
    }

    #[tokio::test]
    async fn empty_property_set_is_rejected_before_network() {
        // An unroutable API root would fail loudly if reached.
        let args = parse(&["--org", "acme", "--token", "t", "--api-url", "http://127.0.0.1:9"]);
        let err = run(args).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::NoProperties)));
    }

    #[tokio::test]
    async fn malformed_property_is_rejected() {
        let args = parse(&["--org", "acme", "--token", "t", "-p", "team", "--api-url", "http://127.0.0.1:9"]);
        let err = run(args).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MalformedProperty(_))
        ));
    }
}
