//! Audio pipeline between the synthesis engine and the mixer.
//!
//! A background thread renders fixed-size quanta while the mixer pulls
//! frames on its own schedule. The two sides are decoupled by a closed loop
//! of two bounded queues:
//! - Rendering: engine → limiter → playable queue
//! - Playback: playable queue → mixer, spent buffers back to backstock
//! - Output: a rodio-backed mixer for standalone use

pub mod limiter;
pub mod mixer;
pub mod pipeline;
pub mod playback;
pub mod queue;
pub mod renderer;
pub mod rodio_mixer;

pub use limiter::SoftLimiter;
pub use mixer::{LevelCallback, Mixer, MixerChannel, PullCallback};
pub use pipeline::{AudioBuffer, Pipeline, PipelineConfig, BUFFER_CAPACITY, FRAMES_PER_BUFFER};
pub use playback::{PlaybackCursor, Player};
pub use queue::RecyclingQueue;
pub use renderer::RenderThread;
pub use rodio_mixer::RodioMixer;
