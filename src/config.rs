//! Configuration management for the panel daemon.
//!
//! Handles loading and validating configuration from JSON files. Panel
//! properties (`rotation`, `fps`, compatible string) are handed to the driver
//! core at probe time, which performs its own checks on them.

use crate::init::InitPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "/etc/st7735r-dbi/config.json";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Panel properties consumed by probe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelConfig {
    /// Compatible string or SPI id selecting the panel profile
    #[serde(default = "default_compatible")]
    pub compatible: String,

    /// Display rotation in degrees (multiple of 90)
    #[serde(default)]
    pub rotation: u32,

    /// Frame pump rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Behaviour on command failures during bring-up
    #[serde(default)]
    pub init_policy: InitPolicy,

    /// Largest single SPI write in bytes; 0 disables chunking
    #[serde(default = "default_max_transfer_size")]
    pub max_transfer_size: usize,
}

/// SPI bus selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpiConfig {
    #[serde(default)]
    pub bus: u8,

    #[serde(default)]
    pub slave_select: u8,

    #[serde(default = "default_clock_hz")]
    pub clock_hz: u32,
}

/// GPIO pin assignments (BCM numbering)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpioConfig {
    /// Data/Command select
    #[serde(default = "default_dc_pin")]
    pub dc: u8,

    #[serde(default = "default_reset_pin")]
    pub reset: u8,

    /// Backlight enable; `None` when the backlight is always on
    #[serde(default = "default_backlight_pin")]
    pub backlight: Option<u8>,
}

fn default_compatible() -> String {
    "yyh,tft18019".to_string()
}

fn default_fps() -> u32 {
    30
}

fn default_max_transfer_size() -> usize {
    // spidev's default bufsiz
    4096
}

fn default_clock_hz() -> u32 {
    32_000_000
}

fn default_dc_pin() -> u8 {
    25
}

fn default_reset_pin() -> u8 {
    27
}

fn default_backlight_pin() -> Option<u8> {
    Some(18)
}

impl PanelConfig {
    /// Maximum transfer size, `None` when chunking is disabled
    pub fn max_transfer(&self) -> Option<usize> {
        match self.max_transfer_size {
            0 => None,
            n => Some(n),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            compatible: default_compatible(),
            rotation: 0,
            fps: default_fps(),
            init_policy: InitPolicy::default(),
            max_transfer_size: default_max_transfer_size(),
        }
    }
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            bus: 0,
            slave_select: 0,
            clock_hz: default_clock_hz(),
        }
    }
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            dc: default_dc_pin(),
            reset: default_reset_pin(),
            backlight: default_backlight_pin(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub panel: PanelConfig,

    #[serde(default)]
    pub spi: SpiConfig,

    #[serde(default)]
    pub gpio: GpioConfig,

    /// Image shown on the panel; colour bars when unset
    #[serde(default)]
    pub image_path: Option<String>,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.panel.compatible.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "panel.compatible cannot be empty".to_string(),
            ));
        }

        if self.panel.fps == 0 {
            return Err(ConfigError::ValidationError(
                "panel.fps must be greater than 0".to_string(),
            ));
        }

        if self.spi.clock_hz == 0 {
            return Err(ConfigError::ValidationError(
                "spi.clock_hz must be greater than 0".to_string(),
            ));
        }

        if self.spi.bus > 6 {
            return Err(ConfigError::ValidationError(format!(
                "spi.bus {} out of range (0-6)",
                self.spi.bus
            )));
        }

        if self.spi.slave_select > 2 {
            return Err(ConfigError::ValidationError(format!(
                "spi.slave_select {} out of range (0-2)",
                self.spi.slave_select
            )));
        }

        let mut pins = HashSet::new();
        let assigned = [Some(self.gpio.dc), Some(self.gpio.reset), self.gpio.backlight];
        for pin in assigned.into_iter().flatten() {
            if !pins.insert(pin) {
                return Err(ConfigError::ValidationError(format!(
                    "GPIO {} is assigned more than once",
                    pin
                )));
            }
        }

        Ok(())
    }
}
