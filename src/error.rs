//! Error types for the approach speed calculator
//!
//! The pure calculation and parsing code never fails; errors come from the
//! edges: the config file, the weather proxy, the profile store, profile
//! files handed to the CLI, and user input.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Config file or `APPROACHSPEED_*` variables failed validation
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather proxy unreachable, non-2xx, or an envelope without `contents`.
    ///
    /// `status` is set when the proxy answered with an HTTP error.
    #[error("Weather fetch failed: {message}")]
    Api { message: String, status: Option<u16> },

    /// Bad station code, unknown profile id, or a profile that fails
    /// `AircraftProfile::validate`
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The fjall keyspace could not be opened, or stored profiles no longer decode
    #[error("Profile store error: {message}")]
    Store { message: String },

    /// Reading a saved weather page or a profile file
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Network-level weather failure without an HTTP status
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
            status: None,
        }
    }

    /// The weather proxy answered with a non-2xx status
    pub fn api_status<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Api {
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// One-line message for the CLI, without internal detail where it would
    /// not help the pilot
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file.")
            }
            AppError::Api {
                status: Some(404), ..
            } => "No weather page found for this station.".to_string(),
            AppError::Api {
                status: Some(status),
                ..
            } => format!("Weather proxy returned HTTP {status}. Try again later."),
            AppError::Api { status: None, .. } => {
                "Unable to fetch weather. Please check your internet connection or try again later."
                    .to_string()
            }
            AppError::Validation { message } => format!("Invalid input: {message}"),
            AppError::Store { message } => {
                format!("Profile storage failed ({message}). You may need to reset your profile store.")
            }
            AppError::Io { path, source } => {
                format!("Could not read {}: {source}", path.display())
            }
        }
    }
}
