//! Error types.
//!
//! Policy parsing and enforcement never fail: problems in a header are
//! surfaced through [`PolicyHost`](crate::PolicyHost) and the offending
//! directive or source is dropped. The errors here cover the surfaces
//! around the engine (configuration, report bodies) and the internal
//! result of parsing a single source expression.

use thiserror::Error;

/// Errors from the fallible, non-enforcement APIs of this crate.
#[derive(Error, Debug)]
pub enum CspError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Why a source expression was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("'none' must be the only source expression")]
    NoneNotAlone,

    #[error("malformed nonce")]
    InvalidNonce,

    #[error("malformed hash")]
    InvalidHash,

    #[error("invalid scheme")]
    InvalidScheme,

    #[error("invalid host")]
    InvalidHost,

    #[error("invalid port")]
    InvalidPort,

    #[error("missing host")]
    MissingHost,
}
