//! Probe orchestration for one environment run.

use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, info};

use crate::config::{ConfigError, SourceCatalog};
use crate::dispatch::ProbeDispatcher;
use crate::report::ProbeResult;
use crate::secrets::{KeyVaultClient, SecretStore};

/// Default number of in-flight probes.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Connect timeout for the shared API probe client. Per-request timeouts
/// are applied by the prober.
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Probe every active, probe-enabled source in `catalog` against `env`.
///
/// Results come back in catalog order regardless of completion order, one
/// per probed source, and a failing source never stops the remainder of
/// the catalog from being probed. `concurrency` bounds the number of
/// in-flight probes; `1` probes strictly sequentially.
///
/// # Errors
///
/// Returns a [`ConfigError`] if `env` is not declared in the catalog or a
/// shared client cannot be constructed. Per-source problems are not
/// errors; they surface as failing [`ProbeResult`]s.
pub async fn run_probes(
    env: &str,
    catalog: &SourceCatalog,
    concurrency: usize,
) -> Result<Vec<ProbeResult>, ConfigError> {
    let env_config = catalog.environment(env)?;

    let vault = match env_config.key_vault_uri.as_deref() {
        Some(uri) => Some(KeyVaultClient::new(uri).map_err(|e| ConfigError::Vault {
            uri: uri.to_string(),
            source: e,
        })?),
        None => None,
    };
    let store = vault.as_ref().map(|v| v as &dyn SecretStore);

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .build()?;

    let dispatcher = ProbeDispatcher::new(env, &http, store);

    let mut targets = Vec::new();
    for spec in &catalog.sources {
        if spec.should_probe() {
            targets.push(spec);
        } else {
            debug!(
                source_id = %spec.source_id,
                active = spec.active,
                probe_enabled = spec.probe.enabled,
                "Skipping source"
            );
        }
    }

    info!(
        environment = %env,
        sources = targets.len(),
        concurrency,
        vault = env_config.key_vault_uri.as_deref().unwrap_or("none"),
        "Probing sources"
    );

    let results = futures::stream::iter(targets)
        .map(|spec| dispatcher.dispatch(spec))
        .buffered(concurrency.max(1))
        .collect::<Vec<ProbeResult>>()
        .await;

    Ok(results)
}
