//! Offline ROM identification by filename.
//!
//! Used when no emulator is linked in, for example by the CLI listing. It
//! trusts the catalog's filenames: a non-empty file whose name matches a
//! catalog ROM identifies as that ROM's id.

use super::catalog::ModelCatalog;
use super::file::RomFile;
use crate::engine::{RomIdentifier, RomInfo};
use std::collections::HashMap;
use std::path::Path;

/// Identifies ROMs by matching their filename against a catalog.
#[derive(Debug, Clone, Default)]
pub struct FilenameProbe {
    by_filename: HashMap<String, RomInfo>,
}

impl FilenameProbe {
    /// Builds the filename table from every ROM referenced by `catalog`.
    pub fn from_catalog(catalog: &ModelCatalog) -> Self {
        let mut by_filename = HashMap::new();
        for model in catalog.models() {
            for set in [model.pcm(), model.ctrl()] {
                let roms = [&set.full, &set.a, &set.b];
                for rom in roms.into_iter().flatten() {
                    by_filename
                        .entry(rom.filename.clone())
                        .or_insert_with(|| info_for(rom));
                }
            }
        }
        Self { by_filename }
    }
}

fn info_for(rom: &RomFile) -> RomInfo {
    if rom.id.starts_with("ctrl") {
        RomInfo::control(rom.id.clone())
    } else {
        RomInfo::pcm(rom.id.clone())
    }
}

impl RomIdentifier for FilenameProbe {
    fn identify_rom(&self, path: &Path) -> Option<RomInfo> {
        let filename = path.file_name()?.to_str()?;
        let info = self.by_filename.get(filename)?;
        let metadata = std::fs::metadata(path).ok()?;
        (metadata.is_file() && metadata.len() > 0).then(|| info.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_identifies_catalog_files() {
        let catalog = ModelCatalog::builtin().unwrap();
        let probe = FilenameProbe::from_catalog(&catalog);
        let tmp = tempfile::tempdir().unwrap();

        std::fs::write(tmp.path().join("mt32_1.0.7.ic27.bin"), b"rom").unwrap();
        std::fs::write(tmp.path().join("MT32_PCM.ROM"), b"rom").unwrap();
        std::fs::write(tmp.path().join("empty.bin"), b"").unwrap();
        std::fs::write(tmp.path().join("CM32L_PCM.ROM"), b"").unwrap();

        assert_eq!(
            probe.identify_rom(&tmp.path().join("mt32_1.0.7.ic27.bin")),
            Some(RomInfo::control("ctrl_mt32_1_07_a"))
        );
        assert_eq!(
            probe.identify_rom(&tmp.path().join("MT32_PCM.ROM")),
            Some(RomInfo::pcm("pcm_mt32"))
        );
        assert_eq!(probe.identify_rom(&tmp.path().join("empty.bin")), None);
        assert_eq!(probe.identify_rom(&tmp.path().join("CM32L_PCM.ROM")), None);
        assert_eq!(probe.identify_rom(&tmp.path().join("missing.bin")), None);
    }

    #[test]
    fn test_probe_finds_traditional_mt32() {
        let catalog = ModelCatalog::builtin().unwrap();
        let probe = FilenameProbe::from_catalog(&catalog);
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("MT32_PCM.ROM"), b"rom").unwrap();
        std::fs::write(tmp.path().join("MT32_CONTROL.ROM"), b"rom").unwrap();
        let dir = format!("{}/", tmp.path().display());

        let names: Vec<_> = catalog
            .models_in(&probe, &dir)
            .into_iter()
            .map(|m| m.name())
            .collect();
        assert_eq!(names, vec!["mt32"]);
    }
}
