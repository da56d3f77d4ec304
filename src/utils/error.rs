//! Error types for playview
//!
//! Internally the engine works with typed errors built on thiserror. None of
//! this hierarchy leaks to event subscribers: every failure reaches them as a
//! single `PlayerEvent::Error` carrying the `Display` text of the error.

use thiserror::Error;

/// Main error type for playview
#[derive(Error, Debug)]
pub enum PlayerError {
    /// Null or empty source locator
    #[error("source is invalid")]
    InvalidSource,

    /// Asset metadata failed to resolve, or the asset is not playable
    #[error("{0}")]
    AssetLoad(String),

    /// Underlying transport failed mid-playback
    #[error("playback failed: {0}")]
    Playback(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or unusable async runtime
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Source catalog errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// File I/O errors
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlayerError {
    /// Create an asset load error from string
    pub fn asset_load<S: Into<String>>(msg: S) -> Self {
        PlayerError::AssetLoad(msg.into())
    }
}

/// Convenience type alias for Results in playview
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Extension trait for converting other errors to PlayerError
pub trait IntoPlayerError<T> {
    /// Convert this error into a PlayerError with the given context
    fn config_err(self, context: &str) -> Result<T>;
    fn catalog_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoPlayerError<T> for std::result::Result<T, E> {
    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| PlayerError::Config(format!("{}: {}", context, e)))
    }

    fn catalog_err(self, context: &str) -> Result<T> {
        self.map_err(|e| PlayerError::Catalog(format!("{}: {}", context, e)))
    }
}
