//! Program configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// Default message channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Startup options for a [`Program`](super::Program).
///
/// Validated once, before the backend is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramConfig {
    /// Window title.
    pub title: String,
    /// Initial width in pixels.
    pub width: u32,
    /// Initial height in pixels.
    pub height: u32,
    /// Font family name.
    pub font_family: String,
    /// Font size in points.
    pub font_size: u32,
    /// Frame-rate cap. 0 means uncapped.
    pub fps: i32,
    /// Capacity of the bounded message channel.
    pub channel_capacity: usize,
    /// How long the run loop waits for work when nothing else bounds it.
    pub idle_wait: Duration,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            title: "BubbleGum Application".to_string(),
            width: 800,
            height: 600,
            font_family: "Monospace".to_string(),
            font_size: 12,
            fps: 60,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            idle_wait: Duration::from_millis(100),
        }
    }
}

impl ProgramConfig {
    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the initial window size in pixels.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the font family and size.
    #[must_use]
    pub fn with_font(mut self, family: impl Into<String>, size: u32) -> Self {
        self.font_family = family.into();
        self.font_size = size;
        self
    }

    /// Set the frame-rate cap (0 = uncapped).
    #[must_use]
    pub const fn with_fps(mut self, fps: i32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the message channel capacity.
    #[must_use]
    pub const fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the idle wait of the run loop.
    #[must_use]
    pub const fn with_idle_wait(mut self, wait: Duration) -> Self {
        self.idle_wait = wait;
        self
    }

    /// Check every option, reporting the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::Width(self.width));
        }
        if self.height == 0 {
            return Err(ConfigError::Height(self.height));
        }
        if self.font_size == 0 {
            return Err(ConfigError::FontSize(self.font_size));
        }
        if self.fps < 0 {
            return Err(ConfigError::Fps(self.fps));
        }
        if self.title.is_empty() {
            return Err(ConfigError::EmptyTitle);
        }
        if self.font_family.is_empty() {
            return Err(ConfigError::EmptyFontFamily);
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ChannelCapacity);
        }
        Ok(())
    }

    /// Minimum time between renders, or `None` when uncapped.
    pub fn frame_interval(&self) -> Option<Duration> {
        u32::try_from(self.fps)
            .ok()
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::from_secs(1) / fps)
    }
}
