//! ROM discovery and model resolution.
//!
//! This module knows which ROM files make up each supported synthesizer
//! model, where to look for them, and how to pick and load a usable model:
//! - [`file`]: ROM file roles
//! - [`model`]: models and their per-directory presence cache
//! - [`catalog`]: the ordered model registry and the resolver
//! - [`search`]: the platform directory search order
//! - [`listing`]: the presence matrix shown to users

pub mod catalog;
pub mod file;
pub mod listing;
pub mod model;
pub mod probe;
pub mod search;

pub use catalog::{ModelCatalog, ModelSelector, Resolved};
pub use file::{RomFile, RomSet};
pub use listing::render_listing;
pub use model::Model;
pub use probe::FilenameProbe;
pub use search::{search_order, Platform, SearchEnv};
