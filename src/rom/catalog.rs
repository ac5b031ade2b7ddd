//! The model registry and resolver.
//!
//! The catalog is built once at startup and is read-only afterwards; only
//! each model's presence cache changes. Its order is the order in which
//! `auto` tries models, so the preferred device family comes first.

use super::file::{RomFile, RomSet};
use super::model::Model;
use crate::engine::{RomIdentifier, SynthService};
use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The wildcard selector value.
pub const AUTO: &str = "auto";

/// Which model the user asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelSelector {
    /// Pick the first usable model in catalog order.
    #[default]
    Auto,
    /// Use only the model with this name. Stored lowercase.
    Named(String),
}

impl ModelSelector {
    /// Returns true if `model` is a candidate under this selector.
    pub fn accepts(&self, model: &Model) -> bool {
        match self {
            Self::Auto => true,
            Self::Named(name) => model.name() == name,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl From<String> for ModelSelector {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(AUTO) {
            Self::Auto
        } else {
            Self::Named(trimmed.to_ascii_lowercase())
        }
    }
}

impl From<ModelSelector> for String {
    fn from(value: ModelSelector) -> Self {
        value.to_string()
    }
}

impl FromStr for ModelSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "{}", AUTO),
            Self::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A model and the directory its ROMs were loaded from.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    pub model: &'a Model,
    pub dir: &'a str,
}

/// Ordered collection of known models.
#[derive(Debug)]
pub struct ModelCatalog {
    models: Vec<Model>,
}

impl ModelCatalog {
    /// Creates a catalog from models already in priority order.
    pub fn new(models: Vec<Model>) -> Self {
        Self { models }
    }

    /// The Roland LA models with their traditional and MAME ROM names.
    ///
    /// CM-32L variants come first so that `auto` prefers them when both
    /// families are installed.
    pub fn builtin() -> Result<Self> {
        // Traditional ROMs
        let mt32_pcm = RomFile::new("pcm_mt32", "MT32_PCM.ROM");
        let mt32_ctrl = RomFile::new("ctrl_mt32", "MT32_CONTROL.ROM");
        let cm32l_pcm = RomFile::new("pcm_cm32l", "CM32L_PCM.ROM");
        let cm32l_ctrl = RomFile::new("ctrl_cm32l", "CM32L_CONTROL.ROM");

        // MAME ROMs
        let mame_mt32_pcm = RomFile::new("pcm_mt32", "r15449121.ic37.bin");
        let mame_mt32_pcm_l = RomFile::new("pcm_mt32_l", "r15179844.ic21.bin");
        let mame_mt32_pcm_h = RomFile::new("pcm_mt32_h", "r15179845.ic22.bin");
        let mame_cm32l_pcm_h = RomFile::new("pcm_cm32l_h", "r15179945.ic8.bin");
        let mame_mt32_pcm_set = || {
            RomSet::full_or_pair(
                mame_mt32_pcm.clone(),
                mame_mt32_pcm_l.clone(),
                mame_mt32_pcm_h.clone(),
            )
        };
        let mame_cm32l_pcm_set = || {
            RomSet::full_or_pair(
                cm32l_pcm.clone(),
                mame_mt32_pcm.clone(),
                mame_cm32l_pcm_h.clone(),
            )
        };
        let mt32_ctrl_pair = |version: &str, label: &str| {
            RomSet::pair(
                RomFile::new(
                    format!("ctrl_mt32_{}_a", version),
                    format!("{}.ic27.bin", label),
                ),
                RomFile::new(
                    format!("ctrl_mt32_{}_b", version),
                    format!("{}.ic26.bin", label),
                ),
            )
        };

        let models = vec![
            Model::new(
                "cm32l",
                RomSet::full(cm32l_pcm.clone()),
                RomSet::full(cm32l_ctrl),
            )?,
            Model::new(
                "cm32l_1_02",
                mame_cm32l_pcm_set(),
                RomSet::full(RomFile::new("ctrl_cm32l_1_02", "cm32l_control.rom")),
            )?,
            Model::new(
                "cm32l_1_00",
                mame_cm32l_pcm_set(),
                RomSet::full(RomFile::new("ctrl_cm32l_1_00", "lapc-i.v1.0.0.ic3.bin")),
            )?,
            Model::new("mt32", RomSet::full(mt32_pcm), RomSet::full(mt32_ctrl))?,
            Model::new(
                "mt32_2_04",
                mame_mt32_pcm_set(),
                mt32_ctrl_pair("2_04", "mt32_2.0.4"),
            )?,
            Model::new(
                "mt32_bluer",
                mame_mt32_pcm_set(),
                RomSet::pair(
                    RomFile::new("ctrl_mt32_bluer_a", "blue_ridge__mt32a.bin"),
                    RomFile::new("ctrl_mt32_bluer_b", "blue_ridge__mt32b.bin"),
                ),
            )?,
            Model::new(
                "mt32_1_07",
                mame_mt32_pcm_set(),
                mt32_ctrl_pair("1_07", "mt32_1.0.7"),
            )?,
            Model::new(
                "mt32_1_06",
                mame_mt32_pcm_set(),
                mt32_ctrl_pair("1_06", "mt32_1.0.6"),
            )?,
            Model::new(
                "mt32_1_05",
                mame_mt32_pcm_set(),
                mt32_ctrl_pair("1_05", "mt32_1.0.5"),
            )?,
            Model::new(
                "mt32_1_04",
                mame_mt32_pcm_set(),
                mt32_ctrl_pair("1_04", "mt32_1.0.4"),
            )?,
        ];
        Ok(Self::new(models))
    }

    /// Models in priority order.
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Looks up a model by name.
    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name() == name)
    }

    /// Model names in priority order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(Model::name)
    }

    /// Checks that a named selector refers to a known model.
    pub fn validate(&self, selector: &ModelSelector) -> Result<()> {
        match selector {
            ModelSelector::Auto => Ok(()),
            ModelSelector::Named(name) if self.get(name).is_some() => Ok(()),
            ModelSelector::Named(name) => Err(BridgeError::UnknownModel(name.clone())),
        }
    }

    /// Models whose ROMs are all present in `dir`, in catalog order.
    pub fn models_in<'a>(
        &'a self,
        identifier: &dyn RomIdentifier,
        dir: &str,
    ) -> Vec<&'a Model> {
        self.models
            .iter()
            .filter(|m| m.is_present_in(identifier, dir))
            .collect()
    }

    /// Finds the first usable model and loads it into `service`.
    ///
    /// Candidates are tried in catalog order, and for each candidate the
    /// directories in `search_order`. The first (model, directory) pair that
    /// is present and loads completely wins. A candidate that loads only
    /// partly is discarded from the service before moving on.
    ///
    /// # Errors
    ///
    /// [`BridgeError::ConfigurationNotFound`] if no pair qualifies.
    pub fn resolve<'a, S: SynthService>(
        &'a self,
        service: &mut S,
        selector: &ModelSelector,
        search_order: &'a [String],
    ) -> Result<Resolved<'a>> {
        for model in self.models.iter().filter(|m| selector.accepts(m)) {
            for dir in search_order {
                if !model.is_present_in(&*service, dir) {
                    continue;
                }
                if model.load(service, dir) {
                    tracing::debug!("Loaded model {} from {}", model.name(), dir);
                    return Ok(Resolved { model, dir });
                }
                tracing::debug!("Model {} present in {} but failed to load", model.name(), dir);
                service.discard_roms();
            }
        }

        Err(BridgeError::ConfigurationNotFound {
            selector: selector.to_string(),
            search_order: search_order.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_priority_order() {
        let catalog = ModelCatalog::builtin().unwrap();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(
            names,
            vec![
                "cm32l",
                "cm32l_1_02",
                "cm32l_1_00",
                "mt32",
                "mt32_2_04",
                "mt32_bluer",
                "mt32_1_07",
                "mt32_1_06",
                "mt32_1_05",
                "mt32_1_04",
            ]
        );
    }

    #[test]
    fn test_builtin_rom_layout() {
        let catalog = ModelCatalog::builtin().unwrap();

        let mt32_1_07 = catalog.get("mt32_1_07").unwrap();
        assert_eq!(
            mt32_1_07.pcm().full.as_ref().unwrap().filename,
            "r15449121.ic37.bin"
        );
        let (a, b) = mt32_1_07.ctrl().halves().unwrap();
        assert_eq!(a.id, "ctrl_mt32_1_07_a");
        assert_eq!(a.filename, "mt32_1.0.7.ic27.bin");
        assert_eq!(b.filename, "mt32_1.0.7.ic26.bin");
        assert!(mt32_1_07.ctrl().full.is_none());

        let cm32l_1_02 = catalog.get("cm32l_1_02").unwrap();
        assert_eq!(
            cm32l_1_02.ctrl().full.as_ref().unwrap().filename,
            "cm32l_control.rom"
        );
        assert_eq!(cm32l_1_02.version(), "1_02");
        assert_eq!(catalog.get("mt32_bluer").unwrap().version(), "bluer");
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("auto".parse::<ModelSelector>().unwrap(), ModelSelector::Auto);
        assert_eq!("AUTO".parse::<ModelSelector>().unwrap(), ModelSelector::Auto);
        assert_eq!("".parse::<ModelSelector>().unwrap(), ModelSelector::Auto);
        assert_eq!(
            " MT32 ".parse::<ModelSelector>().unwrap(),
            ModelSelector::Named("mt32".to_string())
        );
        assert_eq!(ModelSelector::Named("cm32l".into()).to_string(), "cm32l");
    }

    #[test]
    fn test_validate_selector() {
        let catalog = ModelCatalog::builtin().unwrap();
        assert!(catalog.validate(&ModelSelector::Auto).is_ok());
        assert!(catalog
            .validate(&ModelSelector::Named("mt32_1_05".into()))
            .is_ok());
        assert!(matches!(
            catalog.validate(&ModelSelector::Named("sc55".into())),
            Err(BridgeError::UnknownModel(name)) if name == "sc55"
        ));
    }
}
