//! Background thread that keeps the playable queue full.

use super::limiter::SoftLimiter;
use super::pipeline::Pipeline;
use crate::engine::SynthService;
use crate::error::{BridgeError, Result};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

const THREAD_NAME: &str = "mt32bridge:render";

/// Handle to the running render thread.
#[derive(Debug)]
pub struct RenderThread {
    handle: JoinHandle<()>,
}

impl RenderThread {
    /// Starts rendering into `pipeline`.
    ///
    /// The thread first fills backstock with `capacity - 1` fresh buffers;
    /// the remaining buffer is the one playback starts out holding.
    pub fn spawn<S: SynthService + 'static>(
        pipeline: Arc<Pipeline>,
        service: Arc<Mutex<Option<S>>>,
        limiter: Arc<Mutex<SoftLimiter>>,
    ) -> Result<Self> {
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || render_loop(&pipeline, &service, &limiter))
            .map_err(BridgeError::ThreadSpawn)?;
        Ok(Self { handle })
    }

    /// Waits for the thread to exit. The pipeline must already be stopped.
    pub fn join(self) {
        if self.handle.join().is_err() {
            tracing::error!("Render thread panicked");
        }
    }
}

/// Renders quanta until the pipeline is stopped.
///
/// Each pass renders one quantum under the service lock, takes an idle
/// buffer from backstock, limits the render into it and queues it for
/// playback. The stop flag is checked once per pass, so a quantum in
/// progress is always finished.
pub fn render_loop<S: SynthService>(
    pipeline: &Pipeline,
    service: &Mutex<Option<S>>,
    limiter: &Mutex<SoftLimiter>,
) {
    let frames = pipeline.frames_per_buffer();
    let mut render_buffer = vec![0.0f32; frames * 2];

    for _ in 0..pipeline.capacity() - 1 {
        pipeline.backstock.enqueue(pipeline.new_buffer());
    }
    tracing::debug!(
        "Render thread started: {} buffers of {} frames",
        pipeline.capacity(),
        frames
    );

    let mut rendered: u64 = 0;
    while pipeline.keep_rendering() {
        {
            let mut service = service.lock().unwrap_or_else(PoisonError::into_inner);
            match service.as_mut() {
                Some(service) => service.render(&mut render_buffer, frames),
                None => render_buffer.fill(0.0),
            }
        }

        let Some(mut buffer) = pipeline.backstock.dequeue_interruptible() else {
            break;
        };
        limiter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .process(&render_buffer, frames, &mut buffer);
        pipeline.playable.enqueue(buffer);
        rendered += 1;
    }

    tracing::debug!("Render thread stopped after {} quanta", rendered);
}
