//! Error handling for rift-music
//!
//! The two player setters return their own narrow error types so callers
//! can match on exactly what was rejected. Everything else (configuration,
//! loading, I/O) goes through [`MusicError`], which also wraps the narrow
//! types for code that just wants to bubble up with `?`.

use thiserror::Error;

/// Result type alias for rift-music operations
pub type Result<T> = std::result::Result<T, MusicError>;

/// `select_area` was given an area that is unknown or has no loaded stack
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid area: '{area}' is not a known, loaded area")]
pub struct InvalidAreaError {
    pub area: String,
}

/// `set_danger_level` was given a value outside `[0, max]`
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid danger level: {level} (expected 0 to {max})")]
pub struct InvalidDangerLevelError {
    pub level: f64,
    pub max: f64,
}

/// Main error type for rift-music operations
#[derive(Error, Debug)]
pub enum MusicError {
    // Player Errors
    #[error(transparent)]
    InvalidArea(#[from] InvalidAreaError),

    #[error(transparent)]
    InvalidDangerLevel(#[from] InvalidDangerLevelError),

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // Command Errors
    #[error("Invalid command: '{input}' ({reason})")]
    InvalidCommand { input: String, reason: String },

    // Loader Errors
    #[error("Failed to load layers for area '{area}': {reason}")]
    Load { area: String, reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MusicError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            MusicError::InvalidArea(_) => "INVALID_AREA",
            MusicError::InvalidDangerLevel(_) => "INVALID_DANGER_LEVEL",
            MusicError::InvalidConfig { .. } => "INVALID_CONFIG",
            MusicError::FileNotFound { .. } => "FILE_NOT_FOUND",
            MusicError::InvalidCommand { .. } => "INVALID_COMMAND",
            MusicError::Load { .. } => "LOAD_ERROR",
            MusicError::Io(_) => "IO_ERROR",
            MusicError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Rejected player calls leave the player untouched, so the caller can
    /// simply carry on. Setup failures happen before a player exists.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MusicError::InvalidArea(_)
                | MusicError::InvalidDangerLevel(_)
                | MusicError::InvalidCommand { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            MusicError::InvalidArea(_) => vec![
                "Check the area name against the configured areas",
                "Run 'rift-music areas' to list them",
            ],
            MusicError::InvalidDangerLevel(_) => vec![
                "Danger levels run from 0 up to the configured maximum",
                "Out-of-range values are rejected, not clamped",
            ],
            MusicError::InvalidConfig { .. } => vec![
                "Check the configuration file against the defaults",
                "max_audio_vol must be in (0, 1] and area names must be unique",
            ],
            MusicError::InvalidCommand { .. } => vec![
                "Steps look like 'area=Moras', 'area=none' or 'danger=50'",
                "Keep --layers and --render within the limits shown in the message",
            ],
            MusicError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Omit --config to use the built-in area table",
            ],
            _ => vec![],
        }
    }
}
