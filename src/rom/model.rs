//! Synthesizer models.
//!
//! A model is one emulated device identity: a PCM ROM and a control ROM,
//! each either as one full dump or as a pair of half dumps.

use super::file::{RomFile, RomSet};
use crate::engine::{RomIdentifier, RomKind, SynthService};
use crate::error::{BridgeError, Result};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

/// A named bundle of ROMs defining one device.
///
/// The only mutable state is the per-directory presence cache. ROM
/// directories are not expected to change while the process runs, so a
/// directory is checked once and the answer reused.
#[derive(Debug)]
pub struct Model {
    name: String,
    pcm: RomSet,
    ctrl: RomSet,
    in_dir: Mutex<HashMap<String, bool>>,
    version: OnceLock<String>,
}

impl Model {
    /// Creates a model from its PCM and control ROM roles.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidModel`] if the name is empty or if
    /// either role has neither a full file nor a complete pair.
    pub fn new(name: impl Into<String>, pcm: RomSet, ctrl: RomSet) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: &str| BridgeError::InvalidModel {
            name: name.clone(),
            reason: reason.to_string(),
        };
        if name.is_empty() {
            return Err(invalid("model name is empty"));
        }
        if !pcm.is_complete() {
            return Err(invalid("needs a full PCM ROM or a PCM ROM pair"));
        }
        if !ctrl.is_complete() {
            return Err(invalid("needs a full control ROM or a control ROM pair"));
        }
        Ok(Self {
            name,
            pcm,
            ctrl,
            in_dir: Mutex::new(HashMap::new()),
            version: OnceLock::new(),
        })
    }

    /// The model's configuration name, e.g. `mt32_1_07`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The short label shown in listings.
    ///
    /// Everything after the first underscore of the name, or the whole name
    /// when there is none.
    pub fn version(&self) -> &str {
        self.version.get_or_init(|| match self.name.split_once('_') {
            Some((_, rest)) => rest.to_string(),
            None => self.name.clone(),
        })
    }

    pub fn pcm(&self) -> &RomSet {
        &self.pcm
    }

    pub fn ctrl(&self) -> &RomSet {
        &self.ctrl
    }

    /// Returns true if every ROM this model needs is present and valid in
    /// `dir`.
    ///
    /// The first call for a directory inspects the files through
    /// `identifier`; later calls return the cached answer.
    pub fn is_present_in(&self, identifier: &dyn RomIdentifier, dir: &str) -> bool {
        let mut cache = self.in_dir.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&present) = cache.get(dir) {
            return present;
        }

        let have_pcm = role_present(identifier, dir, &self.pcm);
        let have_ctrl = role_present(identifier, dir, &self.ctrl);
        let present = have_pcm && have_ctrl;
        cache.insert(dir.to_string(), present);
        present
    }

    /// Loads both ROM roles from `dir` into `service`.
    ///
    /// Returns true only if the model is present in `dir` and both the PCM
    /// and control ROM were accepted in their expected roles.
    pub fn load<S: SynthService>(&self, service: &mut S, dir: &str) -> bool {
        if !self.is_present_in(&*service, dir) {
            return false;
        }
        let loaded_pcm = load_role(service, dir, &self.pcm, RomKind::Pcm);
        let loaded_ctrl = load_role(service, dir, &self.ctrl, RomKind::Control);
        loaded_pcm && loaded_ctrl
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Model {}

impl PartialOrd for Model {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Model {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

fn rom_present(identifier: &dyn RomIdentifier, dir: &str, rom: &RomFile) -> bool {
    let path = rom.path_in(dir);
    if !path.exists() {
        return false;
    }
    let Some(info) = identifier.identify_rom(&path) else {
        return false;
    };
    if rom.is_versioned() {
        return info.matches(&rom.id);
    }
    true
}

fn role_present(identifier: &dyn RomIdentifier, dir: &str, set: &RomSet) -> bool {
    let full = set
        .full
        .as_ref()
        .is_some_and(|rom| rom_present(identifier, dir, rom));
    full || set
        .halves()
        .is_some_and(|(a, b)| rom_present(identifier, dir, a) && rom_present(identifier, dir, b))
}

fn load_role<S: SynthService>(
    service: &mut S,
    dir: &str,
    set: &RomSet,
    expected: RomKind,
) -> bool {
    let full = set
        .full
        .as_ref()
        .is_some_and(|rom| service.add_rom_file(&rom.path_in(dir)) == Some(expected));
    full || set.halves().is_some_and(|(a, b)| {
        service.merge_and_add_rom_files(&a.path_in(dir), &b.path_in(dir)) == Some(expected)
    })
}
