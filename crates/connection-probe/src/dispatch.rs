//! Per-source probe dispatch.
//!
//! The dispatcher is the only place that understands probe modes and
//! source families. It resolves whatever secrets a source needs, invokes
//! the matching prober and stamps the source's identity onto the outcome.
//! Dispatch never returns an error: anything that goes wrong for one
//! source (bad mode, missing endpoint, vault trouble, network failure)
//! becomes a failing result so the rest of the catalog still gets probed.

use tracing::{debug, info, warn};

use crate::config::SourceSpec;
use crate::probes::{self, ProbeOutcome, API_TIMEOUT, TCP_TIMEOUT};
use crate::report::ProbeResult;
use crate::secrets::{resolve_secret, SecretStore};

/// Port assumed for tcp probes when the catalog omits one.
const DEFAULT_TCP_PORT: u16 = 443;

/// Path probed when an api source omits one.
const DEFAULT_PROBE_PATH: &str = "/";

/// Logical secret key for the Databricks personal access token.
const DATABRICKS_PAT_KEY: &str = "databricks_pat";

/// Logical secret key for generic API bearer tokens.
const API_TOKEN_KEY: &str = "api_token";

/// Probe mechanism declared on a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMode {
    /// Raw socket reachability.
    Tcp,
    /// Authenticated HTTP GET.
    Api,
}

impl ProbeMode {
    /// Parse a declared mode string. Matching is exact: anything other
    /// than `tcp` or `api` is unsupported.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "tcp" => Some(Self::Tcp),
            "api" => Some(Self::Api),
            _ => None,
        }
    }
}

/// Source families with dedicated probe policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Databricks SQL workspace API; a PAT is mandatory.
    DatabricksSqlApi,
    /// Every other api source; bearer token optional.
    Generic,
}

impl SourceKind {
    /// Classify a catalog `source_type`.
    #[must_use]
    pub fn parse(source_type: &str) -> Self {
        match source_type {
            "databricks_sql_api" => Self::DatabricksSqlApi,
            _ => Self::Generic,
        }
    }
}

/// Maps one source to exactly one probe invocation.
pub struct ProbeDispatcher<'a> {
    env: &'a str,
    http: &'a reqwest::Client,
    secrets: Option<&'a dyn SecretStore>,
}

impl<'a> ProbeDispatcher<'a> {
    /// Create a dispatcher for one run.
    #[must_use]
    pub fn new(
        env: &'a str,
        http: &'a reqwest::Client,
        secrets: Option<&'a dyn SecretStore>,
    ) -> Self {
        Self { env, http, secrets }
    }

    /// Probe one source and return its stamped result.
    pub async fn dispatch(&self, spec: &SourceSpec) -> ProbeResult {
        let outcome = self.probe_source(spec).await;

        if outcome.ok {
            info!(source_id = %spec.source_id, "Probe passed");
        } else {
            warn!(source_id = %spec.source_id, details = %outcome.details, "Probe failed");
        }

        ProbeResult::new(spec, outcome)
    }

    async fn probe_source(&self, spec: &SourceSpec) -> ProbeOutcome {
        let declared = spec.probe.mode.as_deref();

        match declared.and_then(ProbeMode::parse) {
            Some(ProbeMode::Tcp) => self.probe_tcp_source(spec).await,
            Some(ProbeMode::Api) => self.probe_api_source(spec).await,
            None => ProbeOutcome::fail(format!(
                "Unsupported probe mode '{}'",
                declared.unwrap_or("none")
            )),
        }
    }

    async fn probe_tcp_source(&self, spec: &SourceSpec) -> ProbeOutcome {
        let Some(host) = spec.connection.endpoint.as_deref() else {
            return ProbeOutcome::fail(
                "TCP probe failed for <missing endpoint> -> connection.endpoint not configured",
            );
        };

        let port = spec.connection.port.unwrap_or(DEFAULT_TCP_PORT);
        probes::probe_tcp(host, port, TCP_TIMEOUT).await
    }

    async fn probe_api_source(&self, spec: &SourceSpec) -> ProbeOutcome {
        match SourceKind::parse(&spec.source_type) {
            SourceKind::DatabricksSqlApi => self.probe_databricks(spec).await,
            SourceKind::Generic => self.probe_generic_api(spec).await,
        }
    }

    /// The PAT is mandatory: absent or empty values fail the source
    /// without any network call.
    async fn probe_databricks(&self, spec: &SourceSpec) -> ProbeOutcome {
        let resolved = resolve_secret(
            self.secrets,
            &spec.connection.secret_refs,
            DATABRICKS_PAT_KEY,
            self.env,
        )
        .await;

        let pat = match resolved {
            Ok(Some(pat)) => pat,
            Ok(None) => {
                debug!(source_id = %spec.source_id, "No Databricks PAT available");
                return ProbeOutcome::fail("Missing Databricks PAT secret reference or value.");
            }
            Err(e) => {
                return ProbeOutcome::fail(format!(
                    "Secret lookup failed for '{DATABRICKS_PAT_KEY}' -> {e}"
                ))
            }
        };

        let url = join_url(
            spec.connection.workspace_url.as_deref(),
            spec.probe.path.as_deref(),
        );
        probes::probe_api(self.http, &url, Some(&pat), API_TIMEOUT).await
    }

    async fn probe_generic_api(&self, spec: &SourceSpec) -> ProbeOutcome {
        let resolved = resolve_secret(
            self.secrets,
            &spec.connection.secret_refs,
            API_TOKEN_KEY,
            self.env,
        )
        .await;

        let token = match resolved {
            Ok(token) => token,
            Err(e) => {
                return ProbeOutcome::fail(format!(
                    "Secret lookup failed for '{API_TOKEN_KEY}' -> {e}"
                ))
            }
        };

        let url = join_url(spec.connection.base_url.as_deref(), spec.probe.path.as_deref());
        probes::probe_api(self.http, &url, token.as_deref(), API_TIMEOUT).await
    }
}

/// Join a base URL with a probe path.
///
/// A missing base yields a relative URL, which the API prober turns into a
/// failing outcome when the request is built.
fn join_url(base: Option<&str>, path: Option<&str>) -> String {
    let base = base.unwrap_or("").trim_end_matches('/');
    let path = path.unwrap_or(DEFAULT_PROBE_PATH);
    format!("{base}{path}")
}
