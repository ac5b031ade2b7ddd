//! mt32bridge - Roland MT-32 / CM-32L emulation as a mixer channel.
//!
//! This library resolves a synthesizer model from installed ROM images,
//! drives an emulation engine on a dedicated render thread and hands the
//! rendered audio to a host mixer through a pull callback.

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod rom;

// Re-export commonly used types
pub use audio::{Mixer, MixerChannel, Pipeline, PipelineConfig, RodioMixer};
pub use config::BridgeConfig;
pub use engine::{EngineSettings, RomIdentifier, RomInfo, RomKind, SynthService};
pub use error::{BridgeError, Result};
pub use handler::{Mt32Handler, ShutdownReport};
pub use rom::{ModelCatalog, ModelSelector};
