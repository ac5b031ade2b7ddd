//! MT-32 MIDI handler.
//!
//! Ties everything together: resolves and loads a model, opens the engine,
//! starts the render thread and registers a mixer channel. MIDI events may
//! be injected from any thread while the pipeline runs.

use crate::audio::limiter::{SoftLimiter, PLAYBACK_LIMIT};
use crate::audio::mixer::{Mixer, MixerChannel};
use crate::audio::pipeline::{Pipeline, PipelineConfig};
use crate::audio::playback::Player;
use crate::audio::renderer::RenderThread;
use crate::config::BridgeConfig;
use crate::engine::SynthService;
use crate::error::{BridgeError, Result};
use crate::rom::{render_listing, search_order, ModelCatalog, ModelSelector, Platform, SearchEnv};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Name of the mixer channel and prefix of limiter statistics.
pub const CHANNEL_NAME: &str = "MT32";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State reachable from the mixer's callbacks and from event injection.
struct Shared<S> {
    service: Arc<Mutex<Option<S>>>,
    limiter: Arc<Mutex<SoftLimiter>>,
    player: Mutex<Option<Player>>,
    pipeline: Mutex<Option<Arc<Pipeline>>>,
}

impl<S: SynthService> Shared<S> {
    fn mixer_callback(&self, out: &mut [i16]) {
        match lock(&self.player).as_mut() {
            Some(player) => player.pull(out),
            None => out.fill(0),
        }
    }

    /// Applies the mixer's left/right volume.
    ///
    /// The engine takes a single gain, so the louder side becomes the
    /// engine gain and the limiter scales each side down by its ratio to
    /// it. A zero or invalid gain silences both rather than dividing by it.
    fn set_mixer_level(&self, left: f32, right: f32) {
        let gain = left.max(right);
        let (gain, desired) = if gain.is_finite() && gain > f32::EPSILON {
            (gain, [left / gain, right / gain])
        } else {
            (0.0, [0.0, 0.0])
        };

        if let Some(service) = lock(&self.service).as_mut() {
            service.set_output_gain(gain);
        }
        lock(&self.limiter).update_levels(desired, PLAYBACK_LIMIT);
    }

    fn played_frames(&self) -> u64 {
        lock(&self.pipeline)
            .as_ref()
            .map_or(0, |pipeline| pipeline.played_frames())
    }
}

/// Everything that exists only while the handler is open.
struct OpenState {
    channel: Box<dyn MixerChannel>,
    renderer: RenderThread,
    pipeline: Arc<Pipeline>,
    model: String,
    dir: String,
}

/// What [`Mt32Handler::close`] found while tearing down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Buffers accounted for after the render thread exited.
    pub buffers_recovered: usize,
    /// Buffers that were in circulation.
    pub capacity: usize,
    /// Frames handed to the mixer during the session.
    pub frames_played: u64,
}

/// Bridges a synthesis engine to a mixer channel.
pub struct Mt32Handler<S: SynthService + 'static> {
    catalog: Arc<ModelCatalog>,
    config: BridgeConfig,
    platform: Platform,
    search_env: SearchEnv,
    pipeline_config: PipelineConfig,
    factory: Box<dyn Fn() -> S + Send + Sync>,
    shared: Arc<Shared<S>>,
    open: Mutex<Option<OpenState>>,
}

impl<S: SynthService + 'static> Mt32Handler<S> {
    /// Creates a closed handler.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Models to choose from, in priority order
    /// * `config` - Model selector, ROM directory and engine settings
    /// * `factory` - Creates a fresh engine context for each open
    pub fn new(
        catalog: Arc<ModelCatalog>,
        config: BridgeConfig,
        factory: impl Fn() -> S + Send + Sync + 'static,
    ) -> Self {
        Self {
            catalog,
            config,
            platform: Platform::current(),
            search_env: SearchEnv::from_process(),
            pipeline_config: PipelineConfig::default(),
            factory: Box::new(factory),
            shared: Arc::new(Shared {
                service: Arc::new(Mutex::new(None)),
                limiter: Arc::new(Mutex::new(SoftLimiter::new(CHANNEL_NAME))),
                player: Mutex::new(None),
                pipeline: Mutex::new(None),
            }),
            open: Mutex::new(None),
        }
    }

    /// Replaces the platform and environment used to plan the search.
    pub fn with_search_env(mut self, platform: Platform, env: SearchEnv) -> Self {
        self.platform = platform;
        self.search_env = env;
        self
    }

    pub fn with_pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline_config = config;
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Directories searched for ROMs, the configured one first.
    pub fn search_order(&self) -> Vec<String> {
        search_order(self.platform, &self.search_env, &self.config.romdir)
    }

    pub fn is_open(&self) -> bool {
        lock(&self.open).is_some()
    }

    /// The model and directory in use while open.
    pub fn loaded_model(&self) -> Option<(String, String)> {
        lock(&self.open)
            .as_ref()
            .map(|open| (open.model.clone(), open.dir.clone()))
    }

    /// Frames handed to the mixer since the pipeline was opened.
    pub fn played_frames(&self) -> u64 {
        self.shared.played_frames()
    }

    /// Resolves a model, opens the engine and starts playback.
    ///
    /// Any previous session is closed first. On failure the handler stays
    /// closed and may be opened again later.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::ConfigurationNotFound`] if no model could be loaded
    /// - [`BridgeError::EngineOpen`] if the engine refused to open
    /// - [`BridgeError::ThreadSpawn`] if the render thread could not start
    pub fn open(&self, mixer: &dyn Mixer) -> Result<()> {
        let mut state = lock(&self.open);
        self.close_locked(&mut state);

        let mut service = (self.factory)();
        let dirs = self.search_order();
        let (model, dir) = match self.catalog.resolve(&mut service, &self.config.model, &dirs) {
            Ok(resolved) => (resolved.model.name().to_string(), resolved.dir.to_string()),
            Err(e) => {
                tracing::warn!(
                    "{}: Could not find ROMs for model {} in directories:",
                    CHANNEL_NAME,
                    self.config.model
                );
                for dir in &dirs {
                    tracing::warn!("{}:  - {}", CHANNEL_NAME, dir);
                }
                return Err(e);
            }
        };
        tracing::info!(
            "{}: Initialized {} from {}",
            CHANNEL_NAME,
            service.rom_description().unwrap_or_else(|| model.clone()),
            dir
        );

        let mut channel = {
            let shared = Arc::clone(&self.shared);
            mixer.add_channel(
                CHANNEL_NAME,
                Box::new(move |out: &mut [i16]| shared.mixer_callback(out)),
            )
        };
        {
            let shared = Arc::clone(&self.shared);
            channel.register_level_callback(Box::new(move |left: f32, right: f32| {
                shared.set_mixer_level(left, right)
            }));
        }

        service.configure(&self.config.engine, channel.sample_rate());
        if let Err(code) = service.open() {
            tracing::error!("{}: Error initialising emulation: {}", CHANNEL_NAME, code);
            service.close();
            return Err(BridgeError::EngineOpen { code });
        }

        let pipeline = Arc::new(Pipeline::new(self.pipeline_config));
        *lock(&self.shared.service) = Some(service);
        *lock(&self.shared.pipeline) = Some(Arc::clone(&pipeline));

        let renderer = match RenderThread::spawn(
            Arc::clone(&pipeline),
            Arc::clone(&self.shared.service),
            Arc::clone(&self.shared.limiter),
        ) {
            Ok(renderer) => renderer,
            Err(e) => {
                if let Some(mut service) = lock(&self.shared.service).take() {
                    service.close();
                }
                lock(&self.shared.pipeline).take();
                return Err(e);
            }
        };

        let mut player = Player::new(Arc::clone(&pipeline));
        player.prime();
        *lock(&self.shared.player) = Some(player);

        channel.enable(true);
        *state = Some(OpenState {
            channel,
            renderer,
            pipeline,
            model,
            dir,
        });
        Ok(())
    }

    /// Stops playback, joins the render thread and closes the engine.
    ///
    /// Does nothing if the handler is not open, so it is safe to call at
    /// any time and any number of times.
    pub fn close(&self) -> Option<ShutdownReport> {
        let mut state = lock(&self.open);
        self.close_locked(&mut state)
    }

    fn close_locked(&self, state: &mut Option<OpenState>) -> Option<ShutdownReport> {
        let OpenState {
            mut channel,
            renderer,
            pipeline,
            model,
            ..
        } = state.take()?;

        // No new pulls, and none left waiting on the playable queue.
        channel.enable(false);
        pipeline.stop();

        let mut recovered = 0;
        let frames_played = {
            let mut player = lock(&self.shared.player).take();
            // The render thread may be waiting for an idle buffer.
            if pipeline.backstock.is_empty() {
                if let Some(buffer) = player.as_mut().and_then(Player::take_buffer) {
                    pipeline.backstock.enqueue(buffer);
                }
            }
            if player.as_ref().is_some_and(Player::has_buffer) {
                recovered += 1;
            }
            // Keep the render thread from blocking on a full playable queue.
            recovered += pipeline.playable.drain().len();
            pipeline.played_frames()
        };

        renderer.join();

        if let Some(mut service) = lock(&self.shared.service).take() {
            service.close();
        }
        lock(&self.shared.pipeline).take();
        drop(channel);

        recovered += pipeline.reclaim();
        if recovered != pipeline.capacity() {
            tracing::warn!(
                "{}: Recovered {} of {} buffers on close",
                CHANNEL_NAME,
                recovered,
                pipeline.capacity()
            );
        }

        {
            let mut limiter = lock(&self.shared.limiter);
            limiter.log_stats();
            limiter.reset();
        }
        tracing::debug!("{}: Closed {} after {} frames", CHANNEL_NAME, model, frames_played);

        Some(ShutdownReport {
            buffers_recovered: recovered,
            capacity: pipeline.capacity(),
            frames_played,
        })
    }

    /// Sends a short MIDI message (up to four bytes, status byte first).
    ///
    /// The message is timestamped with the current play position so the
    /// engine places it after the audio already rendered but not yet heard.
    /// Dropped while the handler is closed.
    pub fn play_msg(&self, msg: &[u8]) {
        let mut packed = [0u8; 4];
        let len = msg.len().min(4);
        packed[..len].copy_from_slice(&msg[..len]);
        let msg = u32::from_le_bytes(packed);

        let mut service = lock(&self.shared.service);
        let Some(service) = service.as_mut() else {
            tracing::debug!("{}: Dropped message {:08x} while closed", CHANNEL_NAME, msg);
            return;
        };
        let timestamp = service.convert_output_to_synth_timestamp(self.shared.played_frames());
        service.play_msg_at(msg, timestamp);
    }

    /// Sends a system-exclusive message, timestamped like [`play_msg`](Self::play_msg).
    pub fn play_sysex(&self, sysex: &[u8]) {
        let mut service = lock(&self.shared.service);
        let Some(service) = service.as_mut() else {
            tracing::debug!(
                "{}: Dropped {} byte sysex while closed",
                CHANNEL_NAME,
                sysex.len()
            );
            return;
        };
        let timestamp = service.convert_output_to_synth_timestamp(self.shared.played_frames());
        service.play_sysex_at(sysex, timestamp);
    }

    /// Fills `out` with interleaved stereo frames, as the mixer's pull
    /// callback does.
    pub fn mixer_callback(&self, out: &mut [i16]) {
        self.shared.mixer_callback(out);
    }

    /// Applies left/right mixer volume ratios, as the level callback does.
    pub fn set_mixer_level(&self, left: f32, right: f32) {
        self.shared.set_mixer_level(left, right);
    }

    /// Current limiter levels, as ratios of the playback range.
    pub fn limiter_levels(&self) -> [f32; 2] {
        lock(&self.shared.limiter).levels()
    }

    /// Renders the model × directory presence matrix for the search order.
    ///
    /// Uses a fresh engine context for identification, so it has no effect
    /// on a running session.
    pub fn list_all(&self, term_width: usize) -> String {
        let identifier = (self.factory)();
        let selected = match self.loaded_model() {
            Some((model, _)) => ModelSelector::Named(model),
            None => self.config.model.clone(),
        };
        render_listing(
            &self.catalog,
            &identifier,
            &selected,
            &self.search_order(),
            term_width,
        )
    }
}

impl<S: SynthService + 'static> Drop for Mt32Handler<S> {
    fn drop(&mut self) {
        self.close();
    }
}
