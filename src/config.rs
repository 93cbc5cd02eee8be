//! Processor configuration.
//!
//! Loaded from `view_arch.yaml` in the config directory. The directory is
//! resolved from `VIEW_ARCH_CONFIG_DIR`, falling back to `./config`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ViewError;

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "VIEW_ARCH_CONFIG_DIR";

/// File name of the processor config inside the config directory.
pub const CONFIG_FILE: &str = "view_arch.yaml";

/// Rendering options of the view processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Also render `modifiers` on non-field elements carrying `attrs`
    /// (groups, pages, buttons).
    pub container_modifiers: bool,
    /// Keep the `attrs` declarations in the rendered arch.
    pub keep_attrs: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            container_modifiers: false,
            keep_attrs: true,
        }
    }
}

impl ProcessorConfig {
    /// Config matching what web clients expect: every `attrs`-bearing
    /// element gets modifiers and the declarations themselves are dropped.
    pub fn client() -> Self {
        Self {
            container_modifiers: true,
            keep_attrs: false,
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ViewError> {
        serde_yaml::from_str(yaml).map_err(|e| ViewError::Config(e.to_string()))
    }
}

pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Create loader from VIEW_ARCH_CONFIG_DIR or default to "config"
    pub fn from_env() -> Self {
        match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => Self::new(dir),
            Err(_) => Self::new("config"),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load the processor config. A missing file yields the defaults.
    pub fn load_processor_config(&self) -> Result<ProcessorConfig, ViewError> {
        let path = self.config_dir.join(CONFIG_FILE);
        if !path.exists() {
            info!(path = %path.display(), "no processor config, using defaults");
            return Ok(ProcessorConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ViewError::Config(format!("reading {}: {}", path.display(), e)))?;
        let config = ProcessorConfig::from_yaml(&content)?;
        info!(path = %path.display(), ?config, "loaded processor config");
        Ok(config)
    }

    /// Path of the model definition file for `model` (`models/<model>.yaml`).
    pub fn model_path(&self, model: &str) -> PathBuf {
        self.config_dir.join("models").join(format!("{}.yaml", model))
    }
}
