use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::store::StoreError;

/// Display profile. Picks the speed and zoom ranges a session is clamped to.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Profile {
    #[default]
    Desktop,
    /// Narrow screens: same speeds, smaller maximum zoom
    Compact,
}

impl Profile {
    pub fn limits(self) -> PlaybackLimits {
        match self {
            Profile::Desktop => PlaybackLimits {
                min_wpm: 60,
                max_wpm: 1000,
                min_font_scale: 12.0,
                max_font_scale: 400.0,
            },
            Profile::Compact => PlaybackLimits {
                min_wpm: 60,
                max_wpm: 1000,
                min_font_scale: 12.0,
                max_font_scale: 180.0,
            },
        }
    }
}

/// Bounds a session clamps speed and zoom into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackLimits {
    pub min_wpm: u32,
    pub max_wpm: u32,
    pub min_font_scale: f64,
    pub max_font_scale: f64,
}

impl PlaybackLimits {
    pub fn clamp_wpm(&self, wpm: i64) -> u32 {
        wpm.clamp(i64::from(self.min_wpm), i64::from(self.max_wpm)) as u32
    }

    /// `None` for NaN, which has no meaningful place in the range.
    pub fn clamp_font_scale(&self, scale: f64) -> Option<f64> {
        if scale.is_nan() {
            None
        } else {
            Some(scale.clamp(self.min_font_scale, self.max_font_scale))
        }
    }
}

impl Default for PlaybackLimits {
    fn default() -> Self {
        Profile::default().limits()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub profile: Profile,
    pub wpm: u32,
    pub font_scale: f64,
    pub wpm_step: u32,
    pub font_scale_step: f64,
    pub max_words: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: Profile::Desktop,
            wpm: 300,
            font_scale: 48.0,
            wpm_step: 50,
            font_scale_step: 2.0,
            max_words: 10_000,
        }
    }
}

impl Config {
    pub fn limits(&self) -> PlaybackLimits {
        self.profile.limits()
    }

    /// Initial speed for new sessions, already inside the profile's range
    pub fn initial_wpm(&self) -> u32 {
        self.limits().clamp_wpm(i64::from(self.wpm))
    }

    pub fn initial_font_scale(&self) -> f64 {
        let limits = self.limits();
        limits
            .clamp_font_scale(self.font_scale)
            .unwrap_or(limits.min_font_scale)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "glance") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("glance_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            profile: Profile::Compact,
            wpm: 450,
            font_scale: 96.0,
            wpm_step: 25,
            font_scale_step: 4.0,
            max_words: 500,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_or_corrupt_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "wpm": 500, "profile": "compact" }"#).unwrap();

        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(loaded.wpm, 500);
        assert_eq!(loaded.profile, Profile::Compact);
        assert_eq!(loaded.max_words, 10_000);
    }

    #[test]
    fn clamp_wpm_to_profile_bounds() {
        let limits = Profile::Desktop.limits();
        assert_eq!(limits.clamp_wpm(5), 60);
        assert_eq!(limits.clamp_wpm(5000), 1000);
        assert_eq!(limits.clamp_wpm(-20), 60);
        assert_eq!(limits.clamp_wpm(350), 350);
    }

    #[test]
    fn clamp_font_scale_per_profile() {
        assert_eq!(
            Profile::Desktop.limits().clamp_font_scale(300.0),
            Some(300.0)
        );
        assert_eq!(
            Profile::Compact.limits().clamp_font_scale(300.0),
            Some(180.0)
        );
        assert_eq!(Profile::Compact.limits().clamp_font_scale(1.0), Some(12.0));
        assert_eq!(
            Profile::Desktop.limits().clamp_font_scale(f64::INFINITY),
            Some(400.0)
        );
        assert_eq!(Profile::Desktop.limits().clamp_font_scale(f64::NAN), None);
    }

    #[test]
    fn initial_values_are_clamped() {
        let cfg = Config {
            wpm: 5,
            font_scale: 900.0,
            profile: Profile::Compact,
            ..Config::default()
        };
        assert_eq!(cfg.initial_wpm(), 60);
        assert_eq!(cfg.initial_font_scale(), 180.0);
    }

    #[test]
    fn profile_names_are_lowercase() {
        assert_eq!(Profile::Compact.to_string(), "compact");
        assert_eq!(
            serde_json::to_string(&Profile::Desktop).unwrap(),
            "\"desktop\""
        );
    }
}
