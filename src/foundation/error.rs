use std::path::PathBuf;

/// Convenience result type used across factreel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Error taxonomy for one render attempt.
///
/// Only [`ReelError::CaptionRender`] is recoverable: the caller drops that single caption and
/// keeps going. Every other variant aborts the render it was raised in.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// A normalization target or clip duration was zero, negative or not finite.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// The music track is shorter than the narration it has to sit under.
    #[error(
        "insufficient music: music is {music_sec:.3}s but narration needs {narration_sec:.3}s"
    )]
    InsufficientMusic {
        /// Probed music duration in seconds.
        music_sec: f64,
        /// Narration duration in seconds.
        narration_sec: f64,
    },

    /// A converted file did not become ready before the wait timed out.
    #[error("file not ready after {waited_ms}ms: {}", path.display())]
    FileNotReady {
        /// File that was being waited on.
        path: PathBuf,
        /// Time spent waiting before giving up.
        waited_ms: u64,
    },

    /// A single caption could not be rendered, even with the truncation fallback.
    #[error("caption render error: {0}")]
    CaptionRender(String),

    /// Resize or crop math produced unusable frame dimensions.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// An input asset is missing or unusable.
    #[error("asset unavailable: {0}")]
    AssetUnavailable(String),

    /// Invalid caller-provided or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// An external media tool (`ffmpeg`, `ffprobe`, an aligner process) failed.
    #[error("media error: {0}")]
    Media(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::InvalidDuration`] value.
    pub fn invalid_duration(msg: impl Into<String>) -> Self {
        Self::InvalidDuration(msg.into())
    }

    /// Build a [`ReelError::CaptionRender`] value.
    pub fn caption_render(msg: impl Into<String>) -> Self {
        Self::CaptionRender(msg.into())
    }

    /// Build a [`ReelError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`ReelError::AssetUnavailable`] value.
    pub fn asset_unavailable(msg: impl Into<String>) -> Self {
        Self::AssetUnavailable(msg.into())
    }

    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether the render can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CaptionRender(_))
    }
}

impl From<std::io::Error> for ReelError {
    fn from(e: std::io::Error) -> Self {
        Self::Other(anyhow::Error::new(e))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
