//! Connection probe CLI.
//!
//! Deployment gate that probes every active source connector for one
//! environment, writes `connection_probe_<env>.json` into the output
//! directory and prints the same report to stdout. Exits 0 when every
//! probe passes, 2 when at least one fails, and non-zero with an error
//! message when the catalog itself cannot be loaded.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use connection_probe::config::SourceCatalog;
use connection_probe::report::ProbeReport;
use connection_probe::runner::{run_probes, DEFAULT_CONCURRENCY};

/// Exit code when at least one probe failed.
const EXIT_PROBE_FAILURES: i32 = 2;

/// Deployment tier to probe.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Environment {
    Dev,
    Test,
    Prod,
}

impl Environment {
    fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Prod => "prod",
        }
    }
}

/// Probe source connector reachability and authentication.
#[derive(Parser)]
#[command(
    name = "connection-probe",
    version,
    about = "Connectivity gate for data platform source connectors",
    long_about = "Probe every active source connector for one environment.\n\n\
                  Secrets are resolved from the environment's Key Vault, each\n\
                  source is probed exactly once, and the aggregated report is\n\
                  written as JSON for pipeline consumption. The process exits 2\n\
                  when any probe fails so deployments can gate on it."
)]
struct Cli {
    /// Environment whose sources and vault are probed.
    #[arg(long, value_enum)]
    env: Environment,

    /// Path to the source connector catalog.
    #[arg(long, default_value = "source-connectors.yaml")]
    config: PathBuf,

    /// Directory the JSON report is written into.
    #[arg(long, default_value = "out")]
    output: PathBuf,

    /// Maximum number of in-flight probes (1 probes sequentially).
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the JSON report.
    let filter = if cli.verbose {
        EnvFilter::new("info,connection_probe=debug")
    } else {
        EnvFilter::new("warn,connection_probe=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let env = cli.env.as_str();
    let catalog = SourceCatalog::load(&cli.config)?;

    let results = run_probes(env, &catalog, cli.concurrency).await?;
    let report = ProbeReport::from_results(env, results);

    let path = report.write_to(&cli.output)?;
    info!(
        report = %path.display(),
        passed = report.passed,
        failed = report.failed,
        "Probe report written"
    );

    println!("{}", report.to_json()?);

    if !report.all_passed() {
        std::process::exit(EXIT_PROBE_FAILURES);
    }

    Ok(())
}
