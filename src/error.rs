//! Error types.
//!
//! Only [`ProgramError`] ever escapes [`Program::run`](crate::Program::run).
//! Everything else is either turned into a message for the model or logged
//! and recovered from.

use std::any::Any;

use thiserror::Error;

/// An invalid startup option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Window width must be positive.
    #[error("invalid width: {0} (must be positive)")]
    Width(u32),

    /// Window height must be positive.
    #[error("invalid height: {0} (must be positive)")]
    Height(u32),

    /// Font size must be positive.
    #[error("invalid font size: {0} (must be positive)")]
    FontSize(u32),

    /// Frame-rate cap must not be negative.
    #[error("invalid FPS: {0} (must be non-negative)")]
    Fps(i32),

    /// Title must not be empty.
    #[error("title cannot be empty")]
    EmptyTitle,

    /// Font family must not be empty.
    #[error("font family cannot be empty")]
    EmptyFontFamily,

    /// The message channel needs room for at least one message.
    #[error("channel capacity must be positive")]
    ChannelCapacity,
}

/// The output surface could not be acquired.
#[derive(Debug, Error)]
pub enum BackendError {
    /// I/O error while setting up the surface.
    #[error("backend I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The surface is not available (no terminal, refused by the platform).
    #[error("backend unavailable: {message}")]
    Unavailable {
        /// What went wrong.
        message: String,
    },
}

/// A single frame failed to render.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The surface has gone away.
    #[error("no surface to render to")]
    NoSurface,

    /// The grid does not fit the surface.
    #[error("bad frame dimensions: {width}x{height}")]
    Dimensions {
        /// Grid width in cells.
        width: usize,
        /// Grid height in cells.
        height: usize,
    },

    /// Writing the frame failed.
    #[error("render I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other renderer-specific failure.
    #[error("render failed: {message}")]
    Other {
        /// What went wrong.
        message: String,
    },
}

/// Fatal errors returned by [`Program::run`](crate::Program::run).
#[derive(Debug, Error)]
pub enum ProgramError {
    /// Startup options were rejected before anything was acquired.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The backend failed to open.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// A fault reported by a model's `init`, `update` or `view`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ModelError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ModelError {
    /// A model error with a plain message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// A model error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// A failure returned by a command body.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command gave up with a message.
    #[error("command failed: {0}")]
    Failed(String),

    /// I/O performed by the command failed.
    #[error("command I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl CommandError {
    /// Wrap an arbitrary error.
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }
}

/// A glyph atlas could not be loaded or merged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AtlasError {
    /// The descriptor contains no labels.
    #[error("atlas descriptor is empty")]
    EmptyDescriptor,

    /// Pixel data length disagrees with the stated image size.
    #[error("image data has {actual} pixels, expected {expected}")]
    PixelCount {
        /// `width * height`.
        expected: usize,
        /// Pixels supplied.
        actual: usize,
    },

    /// The image does not divide evenly into the descriptor's grid.
    #[error("image {width}x{height} does not divide into {columns}x{rows} cells")]
    Geometry {
        /// Image width in pixels.
        width: usize,
        /// Image height in pixels.
        height: usize,
        /// Descriptor columns.
        columns: usize,
        /// Descriptor rows.
        rows: usize,
    },

    /// A merged atlas must use the same cell size.
    #[error("cell size {found:?} does not match atlas cell size {expected:?}")]
    CellSize {
        /// Cell size of the existing atlas.
        expected: (usize, usize),
        /// Cell size of the atlas being merged.
        found: (usize, usize),
    },
}

/// The result of isolating a call into user code.
///
/// Either the code returned an error, or it panicked and the payload was
/// captured.
#[derive(Debug, Error)]
pub enum Fault {
    /// User code returned an error.
    #[error("{0}")]
    Failed(Box<dyn std::error::Error + Send + Sync>),

    /// User code panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

impl Fault {
    /// Capture a panic payload from [`std::panic::catch_unwind`].
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::Panicked(message)
    }

    /// Whether the fault came from a panic.
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

impl From<ModelError> for Fault {
    fn from(err: ModelError) -> Self {
        Self::Failed(Box::new(err))
    }
}

impl From<CommandError> for Fault {
    fn from(err: CommandError) -> Self {
        Self::Failed(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_messages() {
        assert_eq!(
            ConfigError::Width(0).to_string(),
            "invalid width: 0 (must be positive)"
        );
        assert_eq!(ConfigError::Fps(-1).to_string(), "invalid FPS: -1 (must be non-negative)");
        let program: ProgramError = ConfigError::EmptyTitle.into();
        assert_eq!(program.to_string(), "invalid configuration: title cannot be empty");
    }

    #[test]
    fn fault_from_str_panic() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let fault = Fault::from_panic(payload.as_ref());
        assert!(fault.is_panic());
        assert_eq!(fault.to_string(), "panicked: boom");
    }

    #[test]
    fn fault_from_string_panic() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("formatted 42"));
        assert_eq!(Fault::from_panic(payload.as_ref()).to_string(), "panicked: formatted 42");
    }

    #[test]
    fn fault_from_opaque_panic() {
        let payload: Box<dyn Any + Send> = Box::new(17_u32);
        assert_eq!(Fault::from_panic(payload.as_ref()).to_string(), "panicked: unknown panic");
    }

    #[test]
    fn model_error_keeps_source() {
        use std::error::Error as _;
        let err = ModelError::with_source("load failed", std::io::Error::other("disk"));
        assert_eq!(err.to_string(), "load failed");
        assert!(err.source().is_some());
        let fault: Fault = err.into();
        assert!(!fault.is_panic());
    }
}
