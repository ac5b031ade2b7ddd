//! Mixer collaborator.
//!
//! The host mixer owns the audio device. The bridge registers a channel
//! with a pull callback and is asked for frames on the mixer's schedule.

/// Fills the given interleaved stereo region completely.
pub type PullCallback = Box<dyn FnMut(&mut [i16]) + Send>;

/// Receives new left and right volume ratios, 1.0 being unity.
pub type LevelCallback = Box<dyn Fn(f32, f32) + Send + Sync>;

/// Something that can host audio channels.
pub trait Mixer {
    /// Adds a channel that obtains its audio from `pull`.
    ///
    /// The channel starts disabled.
    fn add_channel(&self, name: &str, pull: PullCallback) -> Box<dyn MixerChannel>;
}

/// A registered mixer channel. Dropping it removes the channel.
pub trait MixerChannel: Send {
    /// Output sample rate the channel is mixed at.
    fn sample_rate(&self) -> u32;

    /// Starts or stops calls to the pull callback.
    fn enable(&mut self, enabled: bool);

    /// Registers the callback invoked when the channel's volume changes.
    fn register_level_callback(&mut self, callback: LevelCallback);
}
