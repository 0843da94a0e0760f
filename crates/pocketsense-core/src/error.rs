//! Error types for PocketSense
//!
//! The first five variants are the terminal outcomes of an inference call.
//! Callers at the HTTP boundary match on them to pick a status code, so every
//! backend failure ends up in exactly one of them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Health check failed before an attempt; never retried
    #[error("Inference service is not available")]
    ServiceUnavailable,

    #[error("Inference request timed out after {attempts} attempt(s)")]
    TimeoutExceeded { attempts: u32 },

    #[error("Failed to connect to inference service after {attempts} attempt(s): {message}")]
    ConnectionFailed { attempts: u32, message: String },

    #[error("Inference service returned HTTP {status} after {attempts} attempt(s): {body}")]
    BackendRejected {
        status: u16,
        body: String,
        attempts: u32,
    },

    #[error("Model output was not a valid insight list after {attempts} attempt(s): {reason}")]
    InvalidInsightFormat { attempts: u32, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Number of backend attempts made before this error, for inference failures
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Error::ServiceUnavailable => Some(0),
            Error::TimeoutExceeded { attempts }
            | Error::ConnectionFailed { attempts, .. }
            | Error::BackendRejected { attempts, .. }
            | Error::InvalidInsightFormat { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
