//! Connectivity gate for data platform source connectors.
//!
//! This crate probes the source systems registered in a YAML catalog
//! (warehouses, lakehouse APIs, SaaS endpoints) for one environment and
//! aggregates the outcomes into a deterministic pass/fail report that
//! deployment pipelines can gate on.
//!
//! # Example
//!
//! ```rust,ignore
//! use connection_probe::config::SourceCatalog;
//! use connection_probe::report::ProbeReport;
//! use connection_probe::runner::{run_probes, DEFAULT_CONCURRENCY};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = SourceCatalog::load("source-connectors.yaml".as_ref())?;
//!     let results = run_probes("dev", &catalog, DEFAULT_CONCURRENCY).await?;
//!
//!     let report = ProbeReport::from_results("dev", results);
//!     report.write_to("out".as_ref())?;
//!
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod dispatch;
pub mod probes;
pub mod report;
pub mod runner;
pub mod secrets;

pub use config::{
    ConfigError, ConnectionSpec, EnvironmentConfig, ProbeSpec, SourceCatalog, SourceSpec,
};
pub use dispatch::{ProbeDispatcher, ProbeMode, SourceKind};
pub use probes::ProbeOutcome;
pub use report::{ProbeReport, ProbeResult};
pub use runner::run_probes;
pub use secrets::{KeyVaultClient, SecretError, SecretStore};
