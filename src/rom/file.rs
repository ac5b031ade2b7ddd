//! ROM file definitions.

use std::path::{Path, PathBuf};

/// A named ROM role and the filename it is expected under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RomFile {
    /// Engine id, e.g. `ctrl_mt32_1_07_a`.
    pub id: String,
    /// Filename looked up inside a ROM directory.
    pub filename: String,
}

impl RomFile {
    pub fn new(id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
        }
    }

    /// Returns true if the id carries a version suffix.
    ///
    /// `pcm_mt32` is unversioned while `ctrl_mt32_1_07_a` is versioned:
    /// a versioned id has more than one underscore.
    pub fn is_versioned(&self) -> bool {
        self.id.find('_') != self.id.rfind('_')
    }

    /// Full path of this ROM inside `dir`.
    pub fn path_in(&self, dir: &str) -> PathBuf {
        Path::new(dir).join(&self.filename)
    }
}

/// A ROM role satisfied either by one full file or by a pair of halves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomSet {
    pub full: Option<RomFile>,
    pub a: Option<RomFile>,
    pub b: Option<RomFile>,
}

impl RomSet {
    /// A role satisfied only by a single full file.
    pub fn full(rom: RomFile) -> Self {
        Self {
            full: Some(rom),
            a: None,
            b: None,
        }
    }

    /// A role satisfied only by a pair of half files.
    pub fn pair(a: RomFile, b: RomFile) -> Self {
        Self {
            full: None,
            a: Some(a),
            b: Some(b),
        }
    }

    /// A role satisfied by a full file or, failing that, a pair.
    pub fn full_or_pair(full: RomFile, a: RomFile, b: RomFile) -> Self {
        Self {
            full: Some(full),
            a: Some(a),
            b: Some(b),
        }
    }

    /// Returns true if at least one way of satisfying the role is defined.
    pub fn is_complete(&self) -> bool {
        self.full.is_some() || (self.a.is_some() && self.b.is_some())
    }

    /// The pair of halves, if both are defined.
    pub fn halves(&self) -> Option<(&RomFile, &RomFile)> {
        match (&self.a, &self.b) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }
}
