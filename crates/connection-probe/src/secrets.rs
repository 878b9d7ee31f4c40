//! Secret resolution against Azure Key Vault.
//!
//! Secret names in the catalog are templates with a literal `<env>`
//! placeholder; resolution substitutes the environment name and fetches the
//! current value through the [`SecretStore`] capability. Values are fetched
//! fresh for every source so a rotated secret is picked up mid-run.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::debug;

/// Placeholder substituted with the environment name in secret templates.
const ENV_PLACEHOLDER: &str = "<env>";

/// Key Vault secrets REST API version.
const API_VERSION: &str = "7.4";

/// Timeout for vault requests.
const VAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable consulted for a pre-acquired vault token.
const TOKEN_ENV_VAR: &str = "AZURE_KEYVAULT_TOKEN";

/// OAuth resource for vault data-plane tokens.
const VAULT_RESOURCE: &str = "https://vault.azure.net";

/// Errors raised by the vault capability.
#[derive(Error, Debug)]
pub enum SecretError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Vault answered with a non-success status.
    #[error("Key Vault returned {status} for secret '{name}': {message}")]
    Api {
        name: String,
        status: u16,
        message: String,
    },

    /// No usable credential for the vault data plane.
    #[error("No Azure credential available: {0}")]
    Credentials(String),
}

/// Capability that fetches the current value of a named secret.
///
/// Implementations must be shareable across concurrent probes.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the current value of the secret called `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretError`] if the value cannot be retrieved.
    async fn fetch(&self, name: &str) -> Result<String, SecretError>;
}

/// Payload returned by the Key Vault secrets endpoint.
#[derive(Debug, Deserialize)]
struct SecretBundle {
    value: String,
}

/// Azure Key Vault client for the secrets data plane.
///
/// The bearer token is acquired lazily on first use, from
/// `AZURE_KEYVAULT_TOKEN` or a single `az account get-access-token` call,
/// and reused for the rest of the run.
pub struct KeyVaultClient {
    client: reqwest::Client,
    vault_uri: String,
    token: OnceCell<String>,
}

impl KeyVaultClient {
    /// Create a client for the given vault endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(vault_uri: impl Into<String>) -> Result<Self, SecretError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(VAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            vault_uri: vault_uri.into().trim_end_matches('/').to_string(),
            token: OnceCell::new(),
        })
    }

    /// Create a client with a pre-acquired bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_token(
        vault_uri: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, SecretError> {
        let client = Self::new(vault_uri)?;
        // Cannot fail on a freshly created cell.
        let _ = client.token.set(token.into());
        Ok(client)
    }

    async fn bearer_token(&self) -> Result<&str, SecretError> {
        self.token
            .get_or_try_init(acquire_access_token)
            .await
            .map(String::as_str)
    }
}

#[async_trait]
impl SecretStore for KeyVaultClient {
    async fn fetch(&self, name: &str) -> Result<String, SecretError> {
        let token = self.bearer_token().await?;
        let url = format!(
            "{}/secrets/{name}?api-version={API_VERSION}",
            self.vault_uri
        );
        debug!(secret = %name, "Fetching secret from Key Vault");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let bundle: SecretBundle = response.json().await?;
            Ok(bundle.value)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(SecretError::Api {
                name: name.to_string(),
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Acquire a vault data-plane token.
///
/// Prefers `AZURE_KEYVAULT_TOKEN`; otherwise shells out once to
/// `az account get-access-token`.
async fn acquire_access_token() -> Result<String, SecretError> {
    if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
        let token = token.trim();
        if !token.is_empty() {
            debug!("Using vault token from {TOKEN_ENV_VAR}");
            return Ok(token.to_string());
        }
    }

    let output = tokio::process::Command::new("az")
        .args([
            "account",
            "get-access-token",
            "--resource",
            VAULT_RESOURCE,
            "--query",
            "accessToken",
            "--output",
            "tsv",
        ])
        .output()
        .await
        .map_err(|e| {
            SecretError::Credentials(format!("failed to run 'az account get-access-token': {e}"))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SecretError::Credentials(format!(
            "'az account get-access-token' failed: {}",
            stderr.trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(SecretError::Credentials(
            "'az account get-access-token' returned an empty token".to_string(),
        ));
    }

    Ok(token)
}

/// Substitute the `<env>` placeholder in a secret-name template.
///
/// Pure string substitution: no vault round-trip, no validation of the
/// resulting name.
#[must_use]
pub fn resolve_secret_name(template: &str, env: &str) -> String {
    template.replace(ENV_PLACEHOLDER, env)
}

/// Resolve the value behind a logical secret key for one source.
///
/// Returns `Ok(None)` when the secret is genuinely absent: no store is
/// configured, the source declares no reference under `key`, or the stored
/// value is empty. A failed fetch is an error so the caller can record it
/// against the source instead of treating the secret as missing.
///
/// # Errors
///
/// Returns a [`SecretError`] if the vault fetch itself fails.
pub async fn resolve_secret(
    store: Option<&dyn SecretStore>,
    secret_refs: &HashMap<String, String>,
    key: &str,
    env: &str,
) -> Result<Option<String>, SecretError> {
    let Some(store) = store else {
        return Ok(None);
    };
    let Some(template) = secret_refs.get(key) else {
        return Ok(None);
    };

    let name = resolve_secret_name(template, env);
    let value = store.fetch(&name).await?;

    Ok(Some(value).filter(|v| !v.is_empty()))
}
