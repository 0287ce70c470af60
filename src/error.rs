//! Error types shared by the location, api and resolver modules.

use thiserror::Error;

/// Failure talking to the encyclopedia API.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("api responded with HTTP {0}")]
    Status(u16),
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for NetworkError {
    fn from(e: serde_json::Error) -> Self {
        NetworkError::Decode(e.to_string())
    }
}

/// Failure obtaining a position fix.
#[derive(Debug, Error, PartialEq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("no position fix available: {0}")]
    Unavailable(String),
    #[error("coordinates out of range: ({lat}, {lon})")]
    InvalidCoordinates { lat: f64, lon: f64 },
}

/// Outcome of a failed resolution cycle.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("no position fix after {attempts} attempts")]
    LocationUnavailable { attempts: u32 },
    #[error("provider returned an unusable fix: {0}")]
    InvalidFix(LocationError),
    #[error(transparent)]
    Network(#[from] NetworkError),
}
