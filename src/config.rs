//! Application configuration management.
//!
//! This module handles the persistent preferences for tracklane: the display
//! refresh rate of the lane loop, the color theme, default and step sizes for
//! per-track volume, the seek step used by the arrow keys, where the player
//! writes its log, and which directory the file picker scans. Configuration
//! is stored in the user's config directory (typically
//! ~/.config/tracklane/config.toml). Loaded tracks are never persisted.

use crate::constants::APP_DIR_NAME;
use crate::render::Palette;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette::LIGHT,
            Theme::Dark => Palette::DARK,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme '{other}', expected 'light' or 'dark'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_volume")]
    pub default_volume: f32,
    #[serde(default = "default_volume_step")]
    pub volume_step: f32,
    #[serde(default = "default_seek_step")]
    pub seek_step: f32,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_scan_dir")]
    pub scan_dir: String,
}

/// Keys accepted by `set_value`
pub const CONFIG_KEYS: &[&str] = &[
    "frame_rate",
    "theme",
    "default_volume",
    "volume_step",
    "seek_step",
    "log_file",
    "scan_dir",
];

fn default_frame_rate() -> u32 {
    60
}

fn default_volume() -> f32 {
    1.0
}

fn default_volume_step() -> f32 {
    0.05
}

fn default_seek_step() -> f32 {
    0.05
}

fn default_log_file() -> String {
    std::env::temp_dir()
        .join("tracklane.log")
        .to_string_lossy()
        .to_string()
}

fn default_scan_dir() -> String {
    ".".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            theme: Theme::default(),
            default_volume: default_volume(),
            volume_step: default_volume_step(),
            seek_step: default_seek_step(),
            log_file: default_log_file(),
            scan_dir: default_scan_dir(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join(APP_DIR_NAME)
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join(APP_DIR_NAME)
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            // Return default config instead of error
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;
        log::info!("Saved configuration to {}", config_path.display());

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    /// Reject values the player cannot work with
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if !(1..=240).contains(&self.frame_rate) {
            return Err(format!("frame_rate must be 1-240, got {}", self.frame_rate).into());
        }
        for (key, value) in [
            ("default_volume", self.default_volume),
            ("volume_step", self.volume_step),
            ("seek_step", self.seek_step),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{key} must be between 0.0 and 1.0, got {value}").into());
            }
        }
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let mut updated = self.clone();
        match key {
            "frame_rate" => {
                updated.frame_rate = value
                    .parse::<u32>()
                    .map_err(|_| "Value must be a whole number")?;
            }
            "theme" => updated.theme = value.parse::<Theme>()?,
            "default_volume" => updated.default_volume = parse_unit(value)?,
            "volume_step" => updated.volume_step = parse_unit(value)?,
            "seek_step" => updated.seek_step = parse_unit(value)?,
            "log_file" => updated.log_file = value.to_string(),
            "scan_dir" => updated.scan_dir = value.to_string(),
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Time between two lane refreshes
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }

    /// Log file path with `~` expanded
    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.log_file).as_ref())
    }

    /// File picker root with `~` expanded
    pub fn scan_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.scan_dir).as_ref())
    }
}

fn parse_unit(value: &str) -> Result<f32, Box<dyn Error>> {
    Ok(value
        .parse::<f32>()
        .map_err(|_| "Value must be a number between 0.0 and 1.0")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Use a mutex to ensure tests that modify environment variables don't run concurrently
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.default_volume, 1.0);
        assert_eq!(config.volume_step, 0.05);
        assert_eq!(config.seek_step, 0.05);
        assert_eq!(config.scan_dir, ".");
        assert!(config.log_file.ends_with("tracklane.log"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = toml::from_str("theme = \"dark\"\n").unwrap();
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.default_volume, 1.0);
    }

    #[test]
    fn test_theme_parse_and_toggle() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(" light ".parse::<Theme>().unwrap(), Theme::Light);
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Dark.palette(), Palette::DARK);
        assert_eq!(Theme::Dark.to_string(), "dark");
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::new();

        config.set_value("frame_rate", "30").unwrap();
        assert_eq!(config.frame_rate, 30);

        config.set_value("theme", "dark").unwrap();
        assert_eq!(config.theme, Theme::Dark);

        config.set_value("default_volume", "0.8").unwrap();
        assert_eq!(config.default_volume, 0.8);

        config.set_value("scan_dir", "~/music").unwrap();
        assert_eq!(config.scan_dir, "~/music");

        // Invalid values leave the config untouched
        assert!(config.set_value("frame_rate", "0").is_err());
        assert!(config.set_value("frame_rate", "fast").is_err());
        assert!(config.set_value("volume_step", "1.5").is_err());
        assert!(config.set_value("theme", "neon").is_err());
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.theme, Theme::Dark);

        // Unknown key
        assert!(config.set_value("unknown_key", "value").is_err());
    }

    #[test]
    fn test_config_keys_are_settable() {
        let samples = [
            ("frame_rate", "24"),
            ("theme", "light"),
            ("default_volume", "0.5"),
            ("volume_step", "0.1"),
            ("seek_step", "0.2"),
            ("log_file", "/tmp/x.log"),
            ("scan_dir", "."),
        ];
        assert_eq!(samples.len(), CONFIG_KEYS.len());
        let mut config = Config::new();
        for (key, value) in samples {
            assert!(CONFIG_KEYS.contains(&key));
            config.set_value(key, value).unwrap();
        }
    }

    #[test]
    fn test_frame_interval() {
        let mut config = Config::new();
        config.frame_rate = 50;
        assert_eq!(config.frame_interval(), Duration::from_millis(20));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = Config::new();
        config.default_volume = -0.1;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.frame_rate = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let mut config = Config::new();
        config.theme = Theme::Dark;
        config.frame_rate = 30;
        config.save().unwrap();

        // The path should be under temp_dir/tracklane/config.toml
        let config_path = Config::config_path().unwrap();
        assert!(config_path.exists());
        assert!(config_path.starts_with(temp_dir.path().join(APP_DIR_NAME)));

        let loaded = Config::load().unwrap();
        assert_eq!(loaded, config);

        // Clean up - restore original value if it existed
        unsafe {
            if let Some(original) = original_xdg {
                std::env::set_var("XDG_CONFIG_HOME", original);
            } else {
                std::env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let dir = temp_dir.path().join(APP_DIR_NAME);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), "frame_rate = 0\n").unwrap();
        assert!(Config::load().is_err());

        unsafe {
            if let Some(original) = original_xdg {
                std::env::set_var("XDG_CONFIG_HOME", original);
            } else {
                std::env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }
}
