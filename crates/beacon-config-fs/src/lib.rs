// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore` for mirror clients (uses platform config dir).

use beacon_app_core::config::{ConfigError, ConfigStore};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Store configs as JSON files under a base directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Create a store rooted at the user config directory (e.g., `~/.config/Beacon`).
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "Beacon")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Self::at(proj.config_dir())
    }

    /// Create a store rooted at `base`, creating the directory if needed.
    pub fn at(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// Directory holding the config files.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_app_core::config::ConfigService;
    use beacon_app_core::prefs::{ViewerPrefs, VIEWER_PREFS_KEY};
    use beacon_mirror::MirrorOptions;

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsConfigStore::at(dir.path()).expect("store");
        assert!(matches!(store.load_raw("absent"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn options_persist_as_json_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let svc = ConfigService::new(FsConfigStore::at(dir.path().join("nested")).expect("store"));
        let options = MirrorOptions {
            initial_patch_count: Some(289),
            ..MirrorOptions::quiet()
        };
        svc.save_mirror_options(&options).expect("save");
        assert!(dir.path().join("nested").join("mirror.json").is_file());

        let reopened = ConfigService::new(FsConfigStore::at(dir.path().join("nested")).expect("store"));
        assert_eq!(reopened.load_mirror_options().expect("load"), options);
    }

    #[test]
    fn viewer_prefs_round_trip_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let svc = ConfigService::new(FsConfigStore::at(dir.path()).expect("store"));
        let mut prefs = ViewerPrefs::default();
        prefs.view.patch_size = 9.0;
        prefs.view.width_px = 640;
        svc.save(VIEWER_PREFS_KEY, &prefs).expect("save");
        let loaded: Option<ViewerPrefs> = svc.load(VIEWER_PREFS_KEY).expect("load");
        assert_eq!(loaded, Some(prefs));
    }
}
