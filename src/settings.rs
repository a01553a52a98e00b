//! Persistent application settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::field::MissingFieldPolicy;
use crate::heightmap::{RevertMode, DEFAULT_SCALE};
use crate::playback::{clamp_rate, clamp_step, DEFAULT_RATE};
use crate::record::{RecordOptions, MAX_RECORD_SIZE};
use crate::render::colormap::DEFAULT_COLOR_MAP;
use crate::render::{builtin, ShadingParams};
use crate::util::{Error, Result};

/// Application settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Playback
    pub playback_rate: f32,
    pub step: usize,

    // Height map
    pub height_scale: f32,
    pub revert_mode: RevertMode,

    // Display
    pub missing_field: MissingFieldPolicy,
    pub color_map: String,
    /// Fixed color range `[min, max]`; per-frame range when unset
    pub fixed_range: Option<[f32; 2]>,
    pub background_color: [u8; 4],

    // Recording
    pub record_width: u32,
    pub record_height: u32,
    pub last_recording: Option<PathBuf>,

    // Window
    pub window_width: f32,
    pub window_height: f32,

    // Last opened directory
    pub last_dir: Option<PathBuf>,

    // Recent directories (most recent first, max 10)
    pub recent_dirs: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playback_rate: DEFAULT_RATE,
            step: 1,
            height_scale: DEFAULT_SCALE,
            revert_mode: RevertMode::default(),
            missing_field: MissingFieldPolicy::default(),
            color_map: DEFAULT_COLOR_MAP.to_string(),
            fixed_range: None,
            background_color: ShadingParams::default().background,
            record_width: 800,
            record_height: 600,
            last_recording: None,
            window_width: 1280.0,
            window_height: 800.0,
            last_dir: None,
            recent_dirs: Vec::new(),
        }
    }
}

const MAX_RECENT_DIRS: usize = 10;

impl Settings {
    /// Get settings file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("simview");
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the config dir, defaults on any error
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default()
    }

    /// Save settings to the config dir, logging failures
    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Err(e) = self.save_to(&path) {
                log::warn!("{}", e);
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Settings(format!("{}: {}", path.display(), e)))?;
        let settings: Self = serde_json::from_str(&text)
            .map_err(|e| Error::Settings(format!("{}: {}", path.display(), e)))?;
        Ok(settings.sanitized())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Settings(format!("{}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Settings(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| Error::Settings(format!("{}: {}", path.display(), e)))
    }

    /// Clamp values a hand-edited file may have broken
    fn sanitized(mut self) -> Self {
        self.playback_rate = clamp_rate(self.playback_rate);
        self.step = clamp_step(self.step);
        if !self.height_scale.is_finite() {
            self.height_scale = DEFAULT_SCALE;
        }
        if builtin::by_name(&self.color_map).is_none() {
            log::warn!("unknown color map '{}', using {}", self.color_map, DEFAULT_COLOR_MAP);
            self.color_map = DEFAULT_COLOR_MAP.to_string();
        }
        self.record_width = self.record_width.clamp(1, MAX_RECORD_SIZE);
        self.record_height = self.record_height.clamp(1, MAX_RECORD_SIZE);
        self
    }

    /// Add directory to recent list (moves to top if already present)
    pub fn add_recent(&mut self, path: PathBuf) {
        self.recent_dirs.retain(|p| p != &path);
        self.recent_dirs.insert(0, path.clone());
        self.recent_dirs.truncate(MAX_RECENT_DIRS);
        self.last_dir = Some(path);
    }

    /// Get recent directories (filters out non-existent)
    pub fn recent_dirs(&self) -> Vec<&PathBuf> {
        self.recent_dirs.iter().filter(|p| p.is_dir()).collect()
    }

    pub fn shading_params(&self) -> ShadingParams {
        ShadingParams {
            color_map: builtin::by_name(&self.color_map).unwrap_or_else(builtin::viridis),
            range: self.fixed_range.map(|[lo, hi]| lo..hi),
            background: self.background_color,
            ..Default::default()
        }
    }

    pub fn record_options(&self) -> RecordOptions {
        RecordOptions {
            width: self.record_width,
            height: self.record_height,
            fps: self.playback_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = Settings {
            playback_rate: 12.0,
            revert_mode: RevertMode::Flatten,
            fixed_range: Some([0.0, 2.0]),
            ..Default::default()
        };
        settings.add_recent(PathBuf::from("/data/run1"));
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_missing_and_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"height_scale": 2.5, "no_such_key": true}"#).unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.height_scale, 2.5);
        assert_eq!(settings.step, 1);
        assert_eq!(settings.color_map, DEFAULT_COLOR_MAP);
    }

    #[test]
    fn test_invalid_values_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"playback_rate": -1.0, "step": 0, "color_map": "jet", "record_width": 100000}"#,
        )
        .unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert!(settings.playback_rate > 0.0);
        assert_eq!(settings.step, 1);
        assert_eq!(settings.color_map, DEFAULT_COLOR_MAP);
        assert_eq!(settings.record_width, MAX_RECORD_SIZE);
    }

    #[test]
    fn test_bad_file_is_settings_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Settings(_))));
        assert!(matches!(
            Settings::load_from(&dir.path().join("absent.json")),
            Err(Error::Settings(_))
        ));
    }

    #[test]
    fn test_recent_dirs() {
        let mut settings = Settings::default();
        for i in 0..12 {
            settings.add_recent(PathBuf::from(format!("/d{}", i)));
        }
        settings.add_recent(PathBuf::from("/d5"));
        assert_eq!(settings.recent_dirs.len(), MAX_RECENT_DIRS);
        assert_eq!(settings.recent_dirs[0], PathBuf::from("/d5"));
        assert_eq!(settings.last_dir, Some(PathBuf::from("/d5")));
    }

    #[test]
    fn test_shading_params() {
        let settings = Settings {
            color_map: "coolwarm".into(),
            fixed_range: Some([-1.0, 1.0]),
            ..Default::default()
        };
        let params = settings.shading_params();
        assert_eq!(params.color_map.name, "coolwarm");
        assert_eq!(params.range, Some(-1.0..1.0));
    }
}
