//! Mixer backed by rodio.
//!
//! Each channel is played as an endless stereo source that asks its pull
//! callback for one quantum at a time.
//!
//! Library API for hosts that link an emulator binding: such a host opens
//! a [`RodioMixer`] and passes it to `Mt32Handler::open`. The bundled
//! binary has no engine and only inspects ROMs, so it never plays audio.

use super::mixer::{LevelCallback, Mixer, MixerChannel, PullCallback};
use super::pipeline::FRAMES_PER_BUFFER;
use anyhow::{Context, Result};
use rodio::{OutputStream, OutputStreamHandle, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Sample rate for audio output (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;

/// Shared between a channel handle and its playing source.
#[derive(Default)]
struct ChannelState {
    enabled: AtomicBool,
    removed: AtomicBool,
    level_callback: Mutex<Option<LevelCallback>>,
}

/// Audio source that pulls samples from a channel's callback.
/// Implements rodio's Source trait for playback.
pub struct PullSource {
    pull: PullCallback,
    state: Arc<ChannelState>,
    /// Interleaved stereo samples of the last pull.
    buffer: Vec<i16>,
    /// Current position in the buffer.
    pos: usize,
    sample_rate: u32,
}

impl PullSource {
    fn new(pull: PullCallback, state: Arc<ChannelState>, frames: usize, sample_rate: u32) -> Self {
        let buffer = vec![0; frames * 2];
        Self {
            pull,
            state,
            pos: buffer.len(), // Start at end to trigger first pull
            buffer,
            sample_rate,
        }
    }
}

impl Iterator for PullSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.state.removed.load(Ordering::Acquire) {
            return None;
        }

        if self.pos >= self.buffer.len() {
            // A disabled channel plays silence without consuming audio.
            if self.state.enabled.load(Ordering::Acquire) {
                (self.pull)(&mut self.buffer);
            } else {
                self.buffer.fill(0);
            }
            self.pos = 0;
        }

        let sample = self.buffer[self.pos] as f32 / 32768.0;
        self.pos += 1;
        Some(sample)
    }
}

impl Source for PullSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        2 // Stereo
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite stream
    }
}

/// A channel playing through rodio.
pub struct RodioChannel {
    state: Arc<ChannelState>,
    sample_rate: u32,
}

impl RodioChannel {
    /// Changes the channel volume, notifying the registered level callback.
    pub fn set_level(&self, left: f32, right: f32) {
        let callback = self
            .state
            .level_callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(callback) = callback.as_ref() {
            callback(left, right);
        }
    }
}

impl MixerChannel for RodioChannel {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn enable(&mut self, enabled: bool) {
        self.state.enabled.store(enabled, Ordering::Release);
    }

    fn register_level_callback(&mut self, callback: LevelCallback) {
        *self
            .state
            .level_callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }
}

impl Drop for RodioChannel {
    fn drop(&mut self) {
        self.state.enabled.store(false, Ordering::Release);
        self.state.removed.store(true, Ordering::Release);
    }
}

/// Mixer that plays every channel on the default output device.
pub struct RodioMixer {
    /// Audio output stream (must be kept alive).
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sample_rate: u32,
}

impl RodioMixer {
    /// Opens the default audio output.
    ///
    /// # Errors
    ///
    /// Returns error if no output device can be opened.
    pub fn try_default() -> Result<Self> {
        let (stream, stream_handle) =
            OutputStream::try_default().context("Failed to open audio output")?;
        Ok(Self {
            _stream: stream,
            stream_handle,
            sample_rate: SAMPLE_RATE,
        })
    }

    /// Adds a channel and returns the concrete rodio handle.
    pub fn add_rodio_channel(&self, name: &str, pull: PullCallback) -> Result<RodioChannel> {
        let state = Arc::new(ChannelState::default());
        let source = PullSource::new(pull, Arc::clone(&state), FRAMES_PER_BUFFER, self.sample_rate);
        self.stream_handle
            .play_raw(source)
            .with_context(|| format!("Failed to start playback of channel {}", name))?;
        tracing::debug!("Added mixer channel {}", name);
        Ok(RodioChannel {
            state,
            sample_rate: self.sample_rate,
        })
    }
}

impl Mixer for RodioMixer {
    fn add_channel(&self, name: &str, pull: PullCallback) -> Box<dyn MixerChannel> {
        match self.add_rodio_channel(name, pull) {
            Ok(channel) => Box::new(channel),
            Err(e) => {
                // The channel still works as a handle; it just is never heard.
                tracing::error!("{:#}", e);
                Box::new(RodioChannel {
                    state: Arc::new(ChannelState::default()),
                    sample_rate: self.sample_rate,
                })
            }
        }
    }
}
