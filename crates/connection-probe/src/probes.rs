//! Protocol probers.
//!
//! Probers are deliberately source-agnostic: they take fully resolved
//! coordinates, make exactly one attempt, and report a bare
//! [`ProbeOutcome`]. Attaching source identity is the dispatcher's job.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

/// Timeout for TCP reachability probes.
pub const TCP_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for API probes.
pub const API_TIMEOUT: Duration = Duration::from_secs(15);

/// Outcome of a single probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Whether the source answered within bounds.
    pub ok: bool,
    /// Human-readable outcome, embedded verbatim in the report.
    pub details: String,
}

impl ProbeOutcome {
    /// A passing outcome.
    #[must_use]
    pub fn pass(details: impl Into<String>) -> Self {
        Self {
            ok: true,
            details: details.into(),
        }
    }

    /// A failing outcome.
    #[must_use]
    pub fn fail(details: impl Into<String>) -> Self {
        Self {
            ok: false,
            details: details.into(),
        }
    }
}

/// Probe raw TCP reachability of `host:port`.
///
/// Passes iff a connection completes within `timeout`. One attempt, no
/// retries; refusals, resolution failures and timeouts all land in the
/// failure details.
pub async fn probe_tcp(host: &str, port: u16, timeout: Duration) -> ProbeOutcome {
    let addr = format!("{host}:{port}");
    debug!(addr = %addr, "TCP probe");

    match tokio::time::timeout(timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(_stream)) => ProbeOutcome::pass(format!("TCP reachable on {addr}")),
        Ok(Err(e)) => ProbeOutcome::fail(format!("TCP probe failed for {addr} -> {e}")),
        Err(_elapsed) => ProbeOutcome::fail(format!(
            "TCP probe failed for {addr} -> timed out after {}s",
            timeout.as_secs()
        )),
    }
}

/// Probe an HTTP endpoint with a single GET.
///
/// Passes iff the response status is in `200..300`. When `bearer` is set it
/// is sent as an `Authorization: Bearer` header. Transport errors (DNS,
/// TLS, timeouts, unusable URLs) become failing outcomes rather than
/// panics or retries.
pub async fn probe_api(
    client: &reqwest::Client,
    url: &str,
    bearer: Option<&str>,
    timeout: Duration,
) -> ProbeOutcome {
    debug!(url = %url, authenticated = bearer.is_some(), "API probe");

    let mut request = client.get(url).timeout(timeout);
    if let Some(token) = bearer {
        request = request.header("Authorization", format!("Bearer {token}"));
    }

    match request.send().await {
        Ok(response) => {
            let status = response.status();
            let details = format!("API probe {url} -> HTTP {}", status.as_u16());
            ProbeOutcome {
                ok: status.is_success(),
                details,
            }
        }
        Err(e) => ProbeOutcome::fail(format!("API probe failed for {url} -> {e}")),
    }
}
