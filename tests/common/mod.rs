//! Test doubles for the engine and the mixer.

#![allow(dead_code)]

use mt32bridge::audio::{LevelCallback, PullCallback};
use mt32bridge::engine::EngineSettings;
use mt32bridge::rom::{Platform, SearchEnv};
use mt32bridge::{
    BridgeConfig, Mixer, MixerChannel, ModelCatalog, ModelSelector, Mt32Handler, RomIdentifier,
    RomInfo, RomKind, SynthService,
};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Internal rate the fake engine keeps its timestamps in.
pub const SYNTH_RATE: u64 = 32000;

/// Everything the fake engines created by one factory did.
#[derive(Debug, Default)]
pub struct FakeLog {
    pub created: usize,
    pub opened: usize,
    pub closed: usize,
    pub discards: usize,
    /// Ids of ROMs accepted by `add_rom_file` or `merge_and_add_rom_files`.
    pub loaded: Vec<String>,
    pub sample_rate: Option<u32>,
    pub settings: Option<EngineSettings>,
    pub messages: Vec<(u32, u32)>,
    pub sysex: Vec<(Vec<u8>, u32)>,
    pub gain: Option<f32>,
    pub rendered_frames: u64,
}

/// How the fake engine behaves.
#[derive(Debug, Clone)]
pub struct FakeBehavior {
    /// ROM ids the engine refuses to load even though they identify.
    pub reject_ids: Vec<String>,
    /// Status returned from `open`, if it should fail.
    pub open_error: Option<i32>,
    /// Constant value rendered into every sample.
    pub sample: f32,
}

impl Default for FakeBehavior {
    fn default() -> Self {
        Self {
            reject_ids: Vec::new(),
            open_error: None,
            sample: 0.25,
        }
    }
}

/// An engine that identifies a ROM file by its text content, which is the
/// ROM id.
pub struct FakeSynth {
    behavior: FakeBehavior,
    log: Arc<Mutex<FakeLog>>,
    control_id: Option<String>,
    sample_rate: u32,
}

impl FakeSynth {
    fn identify(&self, path: &Path) -> Option<(String, RomKind)> {
        let id = fs::read_to_string(path).ok()?.trim().to_string();
        if id.is_empty() {
            return None;
        }
        let kind = if id.starts_with("ctrl") {
            RomKind::Control
        } else {
            RomKind::Pcm
        };
        Some((id, kind))
    }

    fn accept(&mut self, id: String, kind: RomKind) -> Option<RomKind> {
        if self.behavior.reject_ids.contains(&id) {
            return None;
        }
        if kind == RomKind::Control {
            self.control_id = Some(id.clone());
        }
        self.log.lock().unwrap().loaded.push(id);
        Some(kind)
    }
}

impl RomIdentifier for FakeSynth {
    fn identify_rom(&self, path: &Path) -> Option<RomInfo> {
        let (id, kind) = self.identify(path)?;
        Some(match kind {
            RomKind::Control => RomInfo::control(id),
            RomKind::Pcm => RomInfo::pcm(id),
        })
    }
}

impl SynthService for FakeSynth {
    fn add_rom_file(&mut self, path: &Path) -> Option<RomKind> {
        let (id, kind) = self.identify(path)?;
        self.accept(id, kind)
    }

    fn merge_and_add_rom_files(&mut self, path_a: &Path, path_b: &Path) -> Option<RomKind> {
        let (id_a, kind_a) = self.identify(path_a)?;
        let (id_b, kind_b) = self.identify(path_b)?;
        if kind_a != kind_b || self.behavior.reject_ids.contains(&id_b) {
            return None;
        }
        self.accept(id_a, kind_a)
    }

    fn discard_roms(&mut self) {
        self.control_id = None;
        self.log.lock().unwrap().discards += 1;
    }

    fn rom_description(&self) -> Option<String> {
        self.control_id.as_ref().map(|id| format!("Fake {}", id))
    }

    fn configure(&mut self, settings: &EngineSettings, sample_rate: u32) {
        self.sample_rate = sample_rate;
        let mut log = self.log.lock().unwrap();
        log.sample_rate = Some(sample_rate);
        log.settings = Some(settings.clone());
    }

    fn open(&mut self) -> Result<(), i32> {
        if let Some(code) = self.behavior.open_error {
            return Err(code);
        }
        self.log.lock().unwrap().opened += 1;
        Ok(())
    }

    fn render(&mut self, out: &mut [f32], frames: usize) {
        out[..frames * 2].fill(self.behavior.sample);
        self.log.lock().unwrap().rendered_frames += frames as u64;
    }

    fn play_msg_at(&mut self, msg: u32, timestamp: u32) {
        self.log.lock().unwrap().messages.push((msg, timestamp));
    }

    fn play_sysex_at(&mut self, sysex: &[u8], timestamp: u32) {
        self.log.lock().unwrap().sysex.push((sysex.to_vec(), timestamp));
    }

    fn convert_output_to_synth_timestamp(&self, output_frames: u64) -> u32 {
        (output_frames * SYNTH_RATE / u64::from(self.sample_rate)) as u32
    }

    fn set_output_gain(&mut self, gain: f32) {
        self.log.lock().unwrap().gain = Some(gain);
    }

    fn close(&mut self) {
        self.log.lock().unwrap().closed += 1;
    }
}

/// Returns a factory producing fake engines that all report to one log.
pub fn fake_factory(
    behavior: FakeBehavior,
) -> (impl Fn() -> FakeSynth + Send + Sync + 'static, Arc<Mutex<FakeLog>>) {
    let log = Arc::new(Mutex::new(FakeLog::default()));
    let shared = Arc::clone(&log);
    let factory = move || {
        shared.lock().unwrap().created += 1;
        FakeSynth {
            behavior: behavior.clone(),
            log: Arc::clone(&shared),
            control_id: None,
            sample_rate: SYNTH_RATE as u32,
        }
    };
    (factory, log)
}

/// Writes every file `model` needs into `dir`, using full dumps where the
/// model offers them.
pub fn install_model(catalog: &ModelCatalog, model: &str, dir: &Path) {
    let model = catalog.get(model).unwrap();
    for set in [model.pcm(), model.ctrl()] {
        match &set.full {
            Some(rom) => fs::write(dir.join(&rom.filename), &rom.id).unwrap(),
            None => {
                let (a, b) = set.halves().unwrap();
                fs::write(dir.join(&a.filename), &a.id).unwrap();
                fs::write(dir.join(&b.filename), &b.id).unwrap();
            }
        }
    }
}

/// A search environment whose standard directories all live under `root`,
/// so only ROMs a test installs are ever found.
pub fn isolated_env(root: &Path) -> SearchEnv {
    let under = |name: &str| Some(root.join(name).to_string_lossy().into_owned());
    SearchEnv {
        home: under("home"),
        config_dir: under("config"),
        xdg_data_home: under("data"),
        xdg_data_dirs: under("shared"),
    }
}

/// A handler over the builtin catalog that searches `romdir` first.
pub fn fake_handler(
    romdir: &Path,
    model: &str,
    behavior: FakeBehavior,
) -> (Mt32Handler<FakeSynth>, Arc<Mutex<FakeLog>>) {
    let catalog = Arc::new(ModelCatalog::builtin().unwrap());
    let config = BridgeConfig {
        model: ModelSelector::from(model.to_string()),
        romdir: romdir.to_string_lossy().into_owned(),
        ..BridgeConfig::default()
    };
    let (factory, log) = fake_factory(behavior);
    let handler = Mt32Handler::new(catalog, config, factory)
        .with_search_env(Platform::Xdg, isolated_env(&romdir.join("unused")));
    (handler, log)
}

#[derive(Default)]
struct ChannelSlot {
    pull: Mutex<Option<PullCallback>>,
    level: Mutex<Option<LevelCallback>>,
    enabled: AtomicBool,
}

/// A mixer that only plays when a test asks it to.
pub struct FakeMixer {
    sample_rate: u32,
    slot: Arc<ChannelSlot>,
    added: AtomicUsize,
}

impl FakeMixer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            slot: Arc::new(ChannelSlot::default()),
            added: AtomicUsize::new(0),
        }
    }

    /// Requests `frames` stereo frames the way a mixer tick would.
    ///
    /// Disabled or removed channels produce silence without being asked.
    pub fn pull(&self, frames: usize) -> Vec<i16> {
        let mut out = vec![0i16; frames * 2];
        if self.slot.enabled.load(Ordering::SeqCst) {
            if let Some(pull) = self.slot.pull.lock().unwrap().as_mut() {
                pull(&mut out);
            }
        }
        out
    }

    pub fn set_level(&self, left: f32, right: f32) {
        if let Some(callback) = self.slot.level.lock().unwrap().as_ref() {
            callback(left, right);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.slot.enabled.load(Ordering::SeqCst)
    }

    pub fn has_channel(&self) -> bool {
        self.slot.pull.lock().unwrap().is_some()
    }

    pub fn channels_added(&self) -> usize {
        self.added.load(Ordering::SeqCst)
    }
}

impl Mixer for FakeMixer {
    fn add_channel(&self, _name: &str, pull: PullCallback) -> Box<dyn MixerChannel> {
        self.added.fetch_add(1, Ordering::SeqCst);
        *self.slot.pull.lock().unwrap() = Some(pull);
        Box::new(FakeChannel {
            slot: Arc::clone(&self.slot),
            sample_rate: self.sample_rate,
        })
    }
}

struct FakeChannel {
    slot: Arc<ChannelSlot>,
    sample_rate: u32,
}

impl MixerChannel for FakeChannel {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn enable(&mut self, enabled: bool) {
        self.slot.enabled.store(enabled, Ordering::SeqCst);
    }

    fn register_level_callback(&mut self, callback: LevelCallback) {
        *self.slot.level.lock().unwrap() = Some(callback);
    }
}

impl Drop for FakeChannel {
    fn drop(&mut self) {
        self.slot.enabled.store(false, Ordering::SeqCst);
        self.slot.pull.lock().unwrap().take();
        self.slot.level.lock().unwrap().take();
    }
}
