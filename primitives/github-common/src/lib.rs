//! GitHub Common - Custom Property Plumbing
//!
//! Shared logic for applying GitHub custom properties across an organization:
//! an API client, the property set parsed from user input, and the sequential
//! batch driver that ties them together.
//!
//! # Example
//!
//! ```rust,no_run
//! use github_common::{BatchOptions, ClientConfig, GithubClient, PropertySet, run_batch};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GithubClient::new(ClientConfig::new("ghp_your_token_here"))?;
//! let properties = PropertySet::from_sources(&["team=backend".to_string()], None)?;
//!
//! let summary = run_batch(&client, "my-org", &properties, &BatchOptions::default()).await?;
//! println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod driver;
pub mod error;
pub mod properties;
pub mod repository;

pub use client::{ClientConfig, GithubClient, PropertyHost};
pub use driver::{BatchOptions, RunError, RunSummary, Stage, filter_repositories, run_batch};
pub use error::{ClientError, UpdateFailure};
pub use properties::{ConfigError, PropertySet, parse_pair};
pub use repository::RepositoryRecord;
