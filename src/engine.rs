//! Synthesis engine collaborator.
//!
//! The MT-32 emulator itself lives outside this crate. These traits describe
//! the narrow set of capabilities the bridge needs from it, so the pipeline
//! can be driven by a real emulator binding or by a test double.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the engine reports after identifying a ROM file.
///
/// A file identifies as either a control ROM or a PCM ROM, so at most one
/// of the two ids is set in practice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomInfo {
    /// Id of the control ROM this file contains, if any.
    pub control_rom_id: Option<String>,
    /// Id of the PCM ROM this file contains, if any.
    pub pcm_rom_id: Option<String>,
}

impl RomInfo {
    /// Info for a file identified as a control ROM.
    pub fn control(id: impl Into<String>) -> Self {
        Self {
            control_rom_id: Some(id.into()),
            pcm_rom_id: None,
        }
    }

    /// Info for a file identified as a PCM ROM.
    pub fn pcm(id: impl Into<String>) -> Self {
        Self {
            control_rom_id: None,
            pcm_rom_id: Some(id.into()),
        }
    }

    /// Returns true if either reported id equals `id`.
    pub fn matches(&self, id: &str) -> bool {
        self.control_rom_id.as_deref() == Some(id) || self.pcm_rom_id.as_deref() == Some(id)
    }
}

/// The role a ROM took when it was added to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomKind {
    Control,
    Pcm,
}

/// Identifies ROM files without loading them.
///
/// Split out from [`SynthService`] so presence checks and the diagnostic
/// listing can run against something that cannot synthesize.
pub trait RomIdentifier {
    /// Validates the file at `path` and reports which ROM it is.
    ///
    /// Returns `None` if the file is unreadable or not a known ROM.
    fn identify_rom(&self, path: &Path) -> Option<RomInfo>;
}

/// Analogue circuit emulation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalogOutputMode {
    DigitalOnly,
    Coarse,
    Accurate,
    Oversampled,
}

/// DAC input emulation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DacInputMode {
    Nice,
    Pure,
    Generation1,
    Generation2,
}

/// Quality of the engine's internal sample-rate conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateConversionQuality {
    Fastest,
    Fast,
    Good,
    Best,
}

/// Output and emulation settings applied before the synth is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub analog_mode: AnalogOutputMode,
    pub dac_mode: DacInputMode,
    pub rate_conversion_quality: RateConversionQuality,
    /// Smoother volume ramps.
    pub nice_amp_ramp: bool,
    pub nice_panning: bool,
    pub nice_partial_mixing: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            analog_mode: AnalogOutputMode::Accurate,
            dac_mode: DacInputMode::Nice,
            rate_conversion_quality: RateConversionQuality::Best,
            nice_amp_ramp: true,
            nice_panning: true,
            nice_partial_mixing: true,
        }
    }
}

/// A synthesis context that can load ROMs, open, render and accept events.
///
/// Every call must be made under exclusive access; the bridge wraps the
/// service in a mutex and never holds it across a queue wait.
pub trait SynthService: RomIdentifier + Send {
    /// Adds a single full ROM file. Returns the role it was accepted as.
    fn add_rom_file(&mut self, path: &Path) -> Option<RomKind>;

    /// Merges two half ROM files and adds the result as one ROM.
    fn merge_and_add_rom_files(&mut self, path_a: &Path, path_b: &Path) -> Option<RomKind>;

    /// Forgets any ROMs added so far.
    fn discard_roms(&mut self);

    /// Human readable description of the loaded control ROM.
    fn rom_description(&self) -> Option<String>;

    /// Applies output settings. Must be called before [`open`](Self::open).
    fn configure(&mut self, settings: &EngineSettings, sample_rate: u32);

    /// Opens the synth. On failure returns the engine's status code.
    fn open(&mut self) -> std::result::Result<(), i32>;

    /// Renders `frames` interleaved stereo frames into `out`.
    fn render(&mut self, out: &mut [f32], frames: usize);

    /// Queues a short MIDI message at the given synth timestamp.
    fn play_msg_at(&mut self, msg: u32, timestamp: u32);

    /// Queues a system-exclusive message at the given synth timestamp.
    fn play_sysex_at(&mut self, sysex: &[u8], timestamp: u32);

    /// Converts a count of output frames into the engine's timestamp domain.
    fn convert_output_to_synth_timestamp(&self, output_frames: u64) -> u32;

    /// Scales the synth's output level.
    fn set_output_gain(&mut self, gain: f32);

    /// Closes the synth and frees its context.
    fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rom_info_matches_either_id() {
        let ctrl = RomInfo::control("ctrl_mt32_1_07_a");
        assert!(ctrl.matches("ctrl_mt32_1_07_a"));
        assert!(!ctrl.matches("ctrl_mt32_1_07_b"));

        let pcm = RomInfo::pcm("pcm_mt32");
        assert!(pcm.matches("pcm_mt32"));
        assert!(!RomInfo::default().matches("pcm_mt32"));
    }

    #[test]
    fn test_engine_settings_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.analog_mode, AnalogOutputMode::Accurate);
        assert_eq!(settings.dac_mode, DacInputMode::Nice);
        assert_eq!(settings.rate_conversion_quality, RateConversionQuality::Best);
        assert!(settings.nice_amp_ramp && settings.nice_panning && settings.nice_partial_mixing);
    }
}
