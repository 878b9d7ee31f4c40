//! Source catalog and environment configuration.
//!
//! The catalog is a YAML document with two top-level sections: the
//! environments the platform deploys to (each pointing at the Key Vault
//! holding that tier's secrets) and the ordered list of source connectors
//! to probe. Catalog order is load-bearing: results are reported in the
//! order sources appear here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::secrets::SecretError;

/// Errors raised while loading or interrogating the catalog.
///
/// All of these abort the run before any probing starts; per-source
/// problems are recorded as failing results instead.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Catalog file could not be read.
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog file is not valid YAML for the expected schema.
    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The requested environment is not declared in the catalog.
    #[error("Environment '{name}' not found in config. Available: {available:?}")]
    UnknownEnvironment { name: String, available: Vec<String> },

    /// The vault client for the environment could not be constructed.
    #[error("Failed to initialize Key Vault client for {uri}: {source}")]
    Vault {
        uri: String,
        #[source]
        source: SecretError,
    },

    /// The shared HTTP client for API probes could not be constructed.
    #[error("Failed to initialize HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Top-level catalog: environments plus the ordered source list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceCatalog {
    /// Deployment tiers, keyed by environment name.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
    /// Source connectors, probed in the order they appear here.
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
}

impl SourceCatalog {
    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it does not match the catalog schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Look up a declared environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownEnvironment`] naming the declared
    /// environments if `name` is not one of them.
    pub fn environment(&self, name: &str) -> Result<&EnvironmentConfig, ConfigError> {
        self.environments.get(name).ok_or_else(|| {
            let mut available: Vec<String> = self.environments.keys().cloned().collect();
            available.sort();
            ConfigError::UnknownEnvironment {
                name: name.to_string(),
                available,
            }
        })
    }
}

/// Per-environment settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Key Vault endpoint for this tier. Absent means secrets cannot be
    /// resolved and secret-backed probes fail accordingly.
    pub key_vault_uri: Option<String>,
}

/// One source connector entry in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Stable identifier, carried verbatim into results.
    pub source_id: String,
    /// Owning system label for reporting.
    pub system: String,
    /// Connector family, e.g. `databricks_sql_api` or `azure_sql`.
    pub source_type: String,
    /// Inactive sources are skipped entirely and never appear in results.
    #[serde(default)]
    pub active: bool,
    /// Endpoint coordinates and secret references.
    #[serde(default)]
    pub connection: ConnectionSpec,
    /// Probe settings.
    #[serde(default)]
    pub probe: ProbeSpec,
}

impl SourceSpec {
    /// Whether this source participates in a probe run.
    #[must_use]
    pub fn should_probe(&self) -> bool {
        self.active && self.probe.enabled
    }
}

/// Endpoint coordinates for a source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionSpec {
    /// Host name for tcp probes.
    pub endpoint: Option<String>,
    /// Port for tcp probes; defaults to 443 when omitted.
    pub port: Option<u16>,
    /// Base URL for generic api probes.
    pub base_url: Option<String>,
    /// Workspace URL for Databricks api probes.
    pub workspace_url: Option<String>,
    /// Logical secret keys mapped to vault secret-name templates. Templates
    /// may contain a literal `<env>` placeholder.
    #[serde(default)]
    pub secret_refs: HashMap<String, String>,
}

/// Probe settings for a source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeSpec {
    /// Disabled probes are skipped without emitting a result.
    #[serde(default)]
    pub enabled: bool,
    /// Probe mechanism (`tcp` or `api`). Kept as declared so an unknown
    /// value fails the one source instead of the whole catalog parse.
    pub mode: Option<String>,
    /// Request path for api probes; defaults to `/` when omitted.
    pub path: Option<String>,
}
