//! Soft limiter converting rendered float audio to the playback range.
//!
//! The engine renders floats in -1..1. The limiter scales them by the
//! per-channel mixer levels into the i16 range, and when a block would clip
//! it attenuates the whole block so its peak lands on the limit. The
//! attenuation then eases back toward unity over the following blocks.

/// How much of the remaining gap to unity is recovered per block.
const RELEASE_PER_BLOCK: f32 = 0.1;

/// Upper bound of the playback numeric range.
pub const PLAYBACK_LIMIT: f32 = i16::MAX as f32;

/// Stereo soft limiter with clip statistics.
#[derive(Debug, Clone)]
pub struct SoftLimiter {
    name: String,
    /// Per-channel scale from engine range to playback range.
    range_multiplier: [f32; 2],
    /// Current whole-block attenuation, 1.0 when not limiting.
    attenuation: f32,
    total_blocks: u64,
    limited_blocks: u64,
    peak: f32,
}

impl SoftLimiter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range_multiplier: [PLAYBACK_LIMIT; 2],
            attenuation: 1.0,
            total_blocks: 0,
            limited_blocks: 0,
            peak: 0.0,
        }
    }

    /// Sets the per-channel levels and the range they scale into.
    ///
    /// # Arguments
    ///
    /// * `levels` - Left and right level ratios, 1.0 being unity
    /// * `range` - The magnitude that a full-scale input maps to
    pub fn update_levels(&mut self, levels: [f32; 2], range: f32) {
        self.range_multiplier = levels.map(|level| {
            if level.is_finite() {
                level.max(0.0) * range
            } else {
                0.0
            }
        });
    }

    /// Current per-channel levels as ratios of the playback range.
    pub fn levels(&self) -> [f32; 2] {
        self.range_multiplier.map(|m| m / PLAYBACK_LIMIT)
    }

    /// Limits `frames` interleaved stereo frames from `input` into `output`.
    pub fn process(&mut self, input: &[f32], frames: usize, output: &mut [i16]) {
        let samples = frames * 2;
        let input = &input[..samples];
        let output = &mut output[..samples];

        let mut block_peak = 0.0f32;
        for frame in input.chunks_exact(2) {
            block_peak = block_peak
                .max((frame[0] * self.range_multiplier[0]).abs())
                .max((frame[1] * self.range_multiplier[1]).abs());
        }
        self.peak = self.peak.max(block_peak);
        self.total_blocks += 1;

        if block_peak * self.attenuation > PLAYBACK_LIMIT {
            self.attenuation = PLAYBACK_LIMIT / block_peak;
            self.limited_blocks += 1;
        }

        for (out, frame) in output.chunks_exact_mut(2).zip(input.chunks_exact(2)) {
            for ch in 0..2 {
                let scaled = frame[ch] * self.range_multiplier[ch] * self.attenuation;
                out[ch] = scaled.round().clamp(i16::MIN as f32, PLAYBACK_LIMIT) as i16;
            }
        }

        self.attenuation += (1.0 - self.attenuation) * RELEASE_PER_BLOCK;
    }

    /// Fraction of processed blocks that needed limiting.
    pub fn limited_ratio(&self) -> f32 {
        if self.total_blocks == 0 {
            0.0
        } else {
            self.limited_blocks as f32 / self.total_blocks as f32
        }
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    /// Logs how often the limiter engaged since the last reset.
    pub fn log_stats(&self) {
        if self.limited_blocks == 0 {
            tracing::debug!("{}: No limiting needed over {} blocks", self.name, self.total_blocks);
            return;
        }
        tracing::info!(
            "{}: Limited {} of {} blocks ({:.1}%), peak {:.0} ({:.1}x the playback range)",
            self.name,
            self.limited_blocks,
            self.total_blocks,
            self.limited_ratio() * 100.0,
            self.peak,
            self.peak / PLAYBACK_LIMIT
        );
    }

    /// Clears statistics and attenuation, keeping the current levels.
    pub fn reset(&mut self) {
        self.attenuation = 1.0;
        self.total_blocks = 0;
        self.limited_blocks = 0;
        self.peak = 0.0;
    }
}
