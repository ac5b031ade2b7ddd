//! The playback side of the pipeline, driven by the mixer's pull callback.

use super::pipeline::{AudioBuffer, Pipeline};
use std::sync::Arc;

/// Position of playback within the stream of rendered buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackCursor {
    /// Buffers fully played since the pipeline was primed.
    pub buffers_played: u64,
    /// Frames already played from the current buffer.
    pub frame_offset: usize,
}

impl PlaybackCursor {
    /// Total frames played, given the frames per buffer.
    pub fn played_frames(&self, frames_per_buffer: usize) -> u64 {
        self.buffers_played * frames_per_buffer as u64 + self.frame_offset as u64
    }
}

/// Drains rendered buffers into the mixer's output.
///
/// Owns exactly one buffer at a time. When it is used up, the spent buffer
/// goes back to backstock and the next one is taken from the playable
/// queue, waiting for the renderer if none is ready.
#[derive(Debug)]
pub struct Player {
    pipeline: Arc<Pipeline>,
    current: Option<AudioBuffer>,
    cursor: PlaybackCursor,
}

impl Player {
    /// Creates a player holding one silent, already exhausted buffer.
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let current = Some(pipeline.new_buffer());
        let cursor = PlaybackCursor {
            buffers_played: 0,
            frame_offset: pipeline.frames_per_buffer(),
        };
        Self {
            pipeline,
            current,
            cursor,
        }
    }

    /// Swaps the initial buffer for the first rendered one.
    ///
    /// Blocks until the renderer has produced it. The swap does not count as
    /// a played buffer.
    pub fn prime(&mut self) {
        self.next_buffer();
        self.cursor = PlaybackCursor::default();
        self.publish();
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    /// Returns true if the player currently holds a buffer.
    pub fn has_buffer(&self) -> bool {
        self.current.is_some()
    }

    /// Hands the current buffer over, leaving the player empty.
    pub fn take_buffer(&mut self) -> Option<AudioBuffer> {
        self.current.take()
    }

    /// Fills `out` with interleaved stereo frames.
    ///
    /// `out.len() / 2` frames are delivered. If the pipeline stops while
    /// waiting for a buffer, the rest of `out` is filled with silence, as is
    /// a trailing half frame.
    pub fn pull(&mut self, out: &mut [i16]) {
        let mut requested = out.len() / 2;
        let mut written = 0;

        while requested > 0 {
            let frames = self.remaining_frames().min(requested);
            let Some(buffer) = self.current.as_ref().filter(|_| frames > 0) else {
                break;
            };
            let from = self.cursor.frame_offset * 2;
            out[written * 2..(written + frames) * 2]
                .copy_from_slice(&buffer[from..from + frames * 2]);

            self.cursor.frame_offset += frames;
            written += frames;
            requested -= frames;
        }

        // Frames never delivered, and the odd sample of an uneven `out`.
        out[written * 2..].fill(0);
        self.publish();
    }

    /// Frames left in the current buffer, moving to the next buffer first if
    /// the current one is used up. Zero only if playback has stopped.
    fn remaining_frames(&mut self) -> usize {
        let frames_per_buffer = self.pipeline.frames_per_buffer();
        if self.current.is_some() && self.cursor.frame_offset < frames_per_buffer {
            return frames_per_buffer - self.cursor.frame_offset;
        }
        if !self.next_buffer() {
            return 0;
        }
        self.cursor.buffers_played += 1;
        self.cursor.frame_offset = 0;
        frames_per_buffer
    }

    fn next_buffer(&mut self) -> bool {
        if let Some(spent) = self.current.take() {
            self.pipeline.backstock.enqueue(spent);
        }
        self.current = self.pipeline.playable.dequeue_interruptible();
        self.current.is_some()
    }

    fn publish(&self) {
        let frames = self.cursor.played_frames(self.pipeline.frames_per_buffer());
        self.pipeline.publish_played_frames(frames);
    }
}
