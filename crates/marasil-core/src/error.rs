use std::path::PathBuf;

use thiserror::Error;

use crate::Carrier;

pub type CoreResult<T> = Result<T, CoreError>;

/// Failures from carrier profile storage and configuration checks.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed carrier file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid profile for carrier {carrier}: {reason}")]
    InvalidProfile { carrier: Carrier, reason: String },
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(carrier: &Carrier, reason: impl Into<String>) -> Self {
        Self::InvalidProfile {
            carrier: carrier.clone(),
            reason: reason.into(),
        }
    }
}
