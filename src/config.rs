//! Layered settings: an optional TOML file under `EQWATCH_*` environment
//! variables.
//!
//! ```toml
//! [storage]
//! root = "./buckets"
//! bucket = "my-bucket"
//! prefix = "training-data"
//!
//! [service]
//! region = "eu-west-1"
//! ```
//!
//! Nested keys are set from the environment with a double underscore, e.g.
//! `EQWATCH_STORAGE__BUCKET=my-bucket`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::TimeDelta;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::UnresolvedPolicy;
use crate::plot::RenderOptions;
use crate::store::LocalStore;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "eqwatch.toml";

const ENV_PREFIX: &str = "EQWATCH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub service: ServiceSettings,
    pub diagnostics: DiagnosticsSettings,
    pub plot: PlotSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding local buckets.
    pub root: PathBuf,
    pub bucket: Option<String>,
    pub prefix: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./buckets"),
            bucket: None,
            prefix: "training-data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub region: Option<String>,
    pub model_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsSettings {
    pub step_minutes: i64,
    pub top: usize,
    pub policy: UnresolvedPolicy,
}

impl Default for DiagnosticsSettings {
    fn default() -> Self {
        Self {
            step_minutes: 1,
            top: 5,
            policy: UnresolvedPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    pub width: u32,
    pub height: u32,
    pub bins: usize,
}

impl Default for PlotSettings {
    fn default() -> Self {
        let render = RenderOptions::default();
        Self {
            width: render.width,
            height: render.height,
            bins: 30,
        }
    }
}

impl Settings {
    /// Load settings from `path` (required if given) or from
    /// [`DEFAULT_CONFIG_FILE`] when it exists, then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false)),
        };

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| match path {
                Some(p) => format!("Failed to load config from {}", p.display()),
                None => "Failed to load config".to_string(),
            })?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// The configured bucket, or an error saying how to set it.
    pub fn require_bucket(&self) -> Result<&str> {
        self.storage
            .bucket
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| missing("storage.bucket"))
    }

    pub fn require_model_name(&self) -> Result<&str> {
        self.service
            .model_name
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| missing("service.model_name"))
    }

    /// Store for the configured bucket.
    pub fn store(&self) -> Result<LocalStore> {
        Ok(LocalStore::new(&self.storage.root, self.require_bucket()?))
    }

    pub fn step(&self) -> Result<TimeDelta> {
        match self.diagnostics.step_minutes {
            m if m > 0 => TimeDelta::try_minutes(m)
                .ok_or_else(|| anyhow!("diagnostics.step_minutes is too large, got {m}")),
            m => Err(anyhow!("diagnostics.step_minutes must be positive, got {m}")),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            width: self.plot.width,
            height: self.plot.height,
        }
    }
}

fn env_var(key: &str) -> String {
    format!("{ENV_PREFIX}_{}", key.replace('.', "__").to_ascii_uppercase())
}

fn missing(key: &str) -> anyhow::Error {
    anyhow!(
        "missing configuration value `{key}`: set it in {DEFAULT_CONFIG_FILE} or export {}",
        env_var(key)
    )
}
