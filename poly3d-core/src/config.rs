//! Run loop configuration
//!
//! A [`CanvasConfig`] is built with `with_*` methods, or by applying
//! [`CanvasOptions`] read from a TOML file:
//!
//! ```toml
//! tick_rate = 30
//! renderer_flags = 6
//! window_position = "centered"
//! poll_interval_ms = 2
//! ```
use std::path::Path;
use std::time::Duration;

use bitflags::bitflags;
use log::warn;
use serde::Deserialize;

use crate::error::ConfigError;

bitflags! {
    /// Renderer capabilities requested from the platform
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RendererFlags: u32 {
        const SOFTWARE = 0x0000_0001;
        const ACCELERATED = 0x0000_0002;
        const PRESENT_VSYNC = 0x0000_0004;
        const TARGET_TEXTURE = 0x0000_0008;
    }
}

bitflags! {
    /// Window attributes requested from the platform
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WindowFlags: u32 {
        const FULLSCREEN = 0x0000_0001;
        const OPENGL = 0x0000_0002;
        const HIDDEN = 0x0000_0008;
        const BORDERLESS = 0x0000_0010;
        const RESIZABLE = 0x0000_0020;
        const MINIMIZED = 0x0000_0040;
        const MAXIMIZED = 0x0000_0080;
        const INPUT_GRABBED = 0x0000_0100;
        const FULLSCREEN_DESKTOP = 0x0000_1001;
        const ALLOW_HIGHDPI = 0x0000_2000;
        const VULKAN = 0x1000_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPosition {
    /// Let the platform decide
    #[default]
    Undefined,
    Centered,
    At(i32, i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    /// Updates per second
    pub tick_rate: u32,
    pub renderer_flags: RendererFlags,
    pub window_flags: WindowFlags,
    pub window_position: WindowPosition,
    /// Sleep between platform event drains
    pub poll_interval: Duration,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            renderer_flags: RendererFlags::ACCELERATED,
            window_flags: WindowFlags::OPENGL,
            window_position: WindowPosition::Undefined,
            poll_interval: Duration::from_millis(1),
        }
    }
}

impl CanvasConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-positive rates are ignored
    pub fn with_tick_rate(mut self, rate: i64) -> Self {
        match u32::try_from(rate) {
            Ok(rate) if rate > 0 => self.tick_rate = rate,
            _ => warn!("ignoring tick rate {rate}, keeping {}", self.tick_rate),
        }
        self
    }

    /// Unknown bits are dropped
    pub fn with_renderer_flags(mut self, bits: u32) -> Self {
        self.renderer_flags = RendererFlags::from_bits_truncate(bits);
        self
    }

    /// Unknown bits are dropped
    pub fn with_window_flags(mut self, bits: u32) -> Self {
        self.window_flags = WindowFlags::from_bits_truncate(bits);
        self
    }

    pub fn with_window_position(mut self, position: WindowPosition) -> Self {
        self.window_position = position;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    /// Overlay every option that is set
    pub fn apply(self, options: &CanvasOptions) -> Self {
        let mut config = self;
        if let Some(rate) = options.tick_rate {
            config = config.with_tick_rate(rate);
        }
        if let Some(bits) = options.renderer_flags {
            config = config.with_renderer_flags(bits);
        }
        if let Some(bits) = options.window_flags {
            config = config.with_window_flags(bits);
        }
        if let Some(position) = options.window_position {
            config = config.with_window_position(position);
        }
        if let Some(ms) = options.poll_interval_ms {
            config = config.with_poll_interval(Duration::from_millis(ms));
        }
        config
    }
}

/// Raw options as found in a config file; unset fields keep their defaults
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasOptions {
    pub tick_rate: Option<i64>,
    pub renderer_flags: Option<u32>,
    pub window_flags: Option<u32>,
    pub window_position: Option<WindowPosition>,
    pub poll_interval_ms: Option<u64>,
}

impl CanvasOptions {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

pub fn load_options(path: impl AsRef<Path>) -> Result<CanvasOptions, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    CanvasOptions::from_toml(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CanvasConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.renderer_flags, RendererFlags::ACCELERATED);
        assert_eq!(config.window_flags, WindowFlags::OPENGL);
        assert_eq!(config.window_position, WindowPosition::Undefined);
    }

    #[test]
    fn test_non_positive_tick_rate_ignored() {
        let config = CanvasConfig::new().with_tick_rate(0).with_tick_rate(-5);
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.with_tick_rate(120).tick_rate, 120);
    }

    #[test]
    fn test_flags_are_masked() {
        let config = CanvasConfig::new()
            .with_renderer_flags(0xFFFF_FFFF)
            .with_window_flags(0x0000_0200 | 0x0000_0020);
        assert_eq!(config.renderer_flags, RendererFlags::all());
        assert_eq!(config.window_flags, WindowFlags::RESIZABLE);
    }

    #[test]
    fn test_tick_interval() {
        let config = CanvasConfig::new().with_tick_rate(50);
        assert_eq!(config.tick_interval(), Duration::from_millis(20));
    }

    #[test]
    fn test_options_from_toml() {
        let options = CanvasOptions::from_toml(
            "tick_rate = 30\nrenderer_flags = 6\nwindow_position = { at = [10, 20] }\npoll_interval_ms = 5\n",
        )
        .unwrap();
        let config = CanvasConfig::new().apply(&options);
        assert_eq!(config.tick_rate, 30);
        assert_eq!(
            config.renderer_flags,
            RendererFlags::ACCELERATED | RendererFlags::PRESENT_VSYNC
        );
        assert_eq!(config.window_flags, WindowFlags::OPENGL);
        assert_eq!(config.window_position, WindowPosition::At(10, 20));
        assert_eq!(config.poll_interval, Duration::from_millis(5));
    }

    #[test]
    fn test_options_reject_unknown_keys() {
        assert!(matches!(
            CanvasOptions::from_toml("frame_rate = 30"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_options("/nonexistent/poly3d.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
