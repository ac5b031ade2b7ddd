//! State shared between the render thread and playback.

use super::queue::RecyclingQueue;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Frames rendered per engine call.
pub const FRAMES_PER_BUFFER: usize = 1024;

/// Number of buffers in circulation, and the capacity of each queue.
pub const BUFFER_CAPACITY: usize = 4;

/// One render quantum of interleaved stereo samples.
pub type AudioBuffer = Vec<i16>;

/// Sizing of the buffer pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Frames per buffer (the render quantum).
    pub frames_per_buffer: usize,
    /// Buffers in circulation. At least 2: one playing, one rendering.
    pub capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frames_per_buffer: FRAMES_PER_BUFFER,
            capacity: BUFFER_CAPACITY,
        }
    }
}

/// The two recycling queues, the stop flag and the published play position.
///
/// Exactly `capacity` buffers exist for the lifetime of a pipeline. Each one
/// is at any time in backstock, owned by the render thread, in the playable
/// queue, or owned by playback.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    /// Spent buffers waiting to be rendered into.
    pub backstock: RecyclingQueue<AudioBuffer>,
    /// Rendered buffers waiting to be played.
    pub playable: RecyclingQueue<AudioBuffer>,
    keep_rendering: AtomicBool,
    played_frames: AtomicU64,
}

impl Pipeline {
    /// # Panics
    ///
    /// Panics if the capacity is below 2 or the quantum is empty.
    pub fn new(config: PipelineConfig) -> Self {
        assert!(config.capacity >= 2, "pipeline needs at least two buffers");
        assert!(config.frames_per_buffer > 0, "render quantum must not be empty");
        Self {
            config,
            backstock: RecyclingQueue::new(config.capacity),
            playable: RecyclingQueue::new(config.capacity),
            keep_rendering: AtomicBool::new(true),
            played_frames: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    pub fn frames_per_buffer(&self) -> usize {
        self.config.frames_per_buffer
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// A silent buffer of one quantum.
    pub fn new_buffer(&self) -> AudioBuffer {
        vec![0; self.config.frames_per_buffer * 2]
    }

    pub fn keep_rendering(&self) -> bool {
        self.keep_rendering.load(Ordering::Acquire)
    }

    /// Asks the render thread to exit after its current quantum and wakes
    /// any playback waiting for a buffer that will never come.
    pub fn stop(&self) {
        self.keep_rendering.store(false, Ordering::Release);
        self.playable.interrupt();
    }

    /// Total frames handed to the mixer so far.
    pub fn played_frames(&self) -> u64 {
        self.played_frames.load(Ordering::Acquire)
    }

    pub(crate) fn publish_played_frames(&self, frames: u64) {
        self.played_frames.store(frames, Ordering::Release);
    }

    /// Empties both queues and returns how many buffers they held.
    pub fn reclaim(&self) -> usize {
        self.backstock.drain().len() + self.playable.drain().len()
    }
}
