//! User configuration.
//!
//! Stored as JSON. Every field has a default, so an empty object is a
//! valid configuration that auto-selects a model from the standard ROM
//! directories.

use crate::engine::EngineSettings;
use crate::error::Result;
use crate::rom::{ModelCatalog, ModelSelector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings that pick and configure the emulated device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Model to use, or `auto` to prefer CM-32L when both families are
    /// installed.
    pub model: ModelSelector,

    /// Directory holding the ROMs. Empty means `mt32-roms`, followed by
    /// the platform's standard locations.
    pub romdir: String,

    /// Emulation and output settings passed to the engine.
    pub engine: EngineSettings,
}

impl BridgeConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Writes the configuration to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    /// Checks that the selected model exists in `catalog`.
    pub fn validate(&self, catalog: &ModelCatalog) -> Result<()> {
        catalog.validate(&self.model)
    }
}
