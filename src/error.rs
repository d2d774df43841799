//! Error type for surveydb.
//!
//! Every failure raised while opening, creating or upgrading a store is fatal
//! for that open attempt; callers surface it rather than recover in place.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The store was written by a newer build than the one opening it.
    #[error("database schema v{stored} is newer than supported v{target}; downgrade is not supported")]
    UnsupportedDowngrade { stored: u32, target: u32 },

    /// The requested target is newer than any schema this build knows.
    #[error("schema v{target} is unknown; this build supports up to v{supported}")]
    UnsupportedTarget { target: u32, supported: u32 },

    #[error("migration step to v{version} failed: {source}")]
    MigrationStepFailed {
        version: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("initial schema creation failed: {0}")]
    CreationFailed(#[source] Box<Error>),

    #[error("inconsistent schema: {0}")]
    InconsistentSchema(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn inconsistent(msg: impl Into<String>) -> Self {
        Error::InconsistentSchema(msg.into())
    }

    /// Schema version of the step that failed, if this error came out of the chain.
    pub fn failed_version(&self) -> Option<u32> {
        match self {
            Error::MigrationStepFailed { version, .. } => Some(*version),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
