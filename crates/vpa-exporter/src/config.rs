//! Exporter configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `VPA_EXPORTER_API_PORT`
const ENV_PREFIX: &str = "VPA_EXPORTER";

/// Exporter configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExporterConfig {
    /// Namespace to watch, empty for all namespaces
    pub namespace: String,

    /// API server port for health/metrics
    pub api_port: u16,

    /// Kubeconfig file; in-cluster or default discovery when unset
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    pub context: Option<String>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            api_port: 8080,
            kubeconfig: None,
            context: None,
        }
    }
}

/// Values given on the command line, taking precedence over file and environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub namespace: Option<String>,
    pub api_port: Option<u16>,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

impl ExporterConfig {
    /// Load configuration from an optional file and the environment
    pub fn load(file: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("namespace", defaults.namespace)?
            .set_default("api_port", i64::from(defaults.api_port))?;

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read exporter configuration")?;

        let mut loaded: Self = config
            .try_deserialize()
            .context("Invalid exporter configuration")?;
        loaded.apply(overrides);
        Ok(loaded)
    }

    fn apply(&mut self, overrides: Overrides) {
        if let Some(namespace) = overrides.namespace {
            self.namespace = namespace;
        }
        if let Some(port) = overrides.api_port {
            self.api_port = port;
        }
        if overrides.kubeconfig.is_some() {
            self.kubeconfig = overrides.kubeconfig;
        }
        if overrides.context.is_some() {
            self.context = overrides.context;
        }
    }
}
