use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::canvas::Size;
use crate::widget::DashboardOptions;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub single_flight: bool,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default)]
    pub widget: WidgetConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WidgetConfig {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default = "default_min_width")]
    pub min_width: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            single_flight: false,
            frame_interval_ms: default_frame_interval_ms(),
            widget: WidgetConfig::default(),
        }
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            min_width: default_min_width(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse YAML in {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if SocketAddr::from_str(self.listen.trim()).is_err() {
            return Err(ConfigError::Validation(
                "listen must be a host:port socket address".to_string(),
            ));
        }
        let base_url = self.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(
                "base_url must start with http:// or https://".to_string(),
            ));
        }
        if self.poll_interval_ms < 100 {
            return Err(ConfigError::Validation(
                "poll_interval_ms must be >= 100".to_string(),
            ));
        }
        if self.frame_interval_ms < 1 {
            return Err(ConfigError::Validation(
                "frame_interval_ms must be >= 1".to_string(),
            ));
        }
        validate_widget(&self.widget)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            size: Size::new(self.widget.width, self.widget.height),
            min_width: self.widget.min_width,
            poll_interval: self.poll_interval(),
            single_flight: self.single_flight,
        }
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn validate_widget(cfg: &WidgetConfig) -> Result<(), ConfigError> {
    if !(cfg.width.is_finite() && cfg.width > 0.0) {
        return Err(ConfigError::Validation(
            "widget.width must be > 0".to_string(),
        ));
    }
    if !(cfg.height.is_finite() && cfg.height > 0.0) {
        return Err(ConfigError::Validation(
            "widget.height must be > 0".to_string(),
        ));
    }
    if !(cfg.min_width.is_finite() && cfg.min_width >= 0.0) {
        return Err(ConfigError::Validation(
            "widget.min_width must be >= 0".to_string(),
        ));
    }
    Ok(())
}

fn default_listen() -> String {
    "127.0.0.1:8188".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:8188".to_string()
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

const fn default_frame_interval_ms() -> u64 {
    16
}

const fn default_width() -> f32 {
    560.0
}

const fn default_height() -> f32 {
    360.0
}

const fn default_min_width() -> f32 {
    520.0
}
