//! Error types for the scoring core and its collaborators.

use thiserror::Error;

/// Raw packet could not be turned into a feature vector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    /// Neither endpoint matches a local-subnet prefix
    #[error("cannot infer direction: {src} -> {dst} matches no local prefix")]
    UnresolvedDirection { src: String, dst: String },

    #[error("invalid packet size: {0}")]
    InvalidSize(f64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScorerError {
    /// Feature slice length differs from the one the model was fit on
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("non-finite feature value at index {0}")]
    NonFinite(usize),

    #[error("invalid training: {0}")]
    InvalidTraining(String),
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("live capture unsupported on this platform")]
    Unsupported,

    #[error("live capture needs elevated privileges: {0}")]
    PermissionDenied(String),

    #[error("no capture device available")]
    NoDevice,

    #[error("pcap error: {0}")]
    Pcap(String),
}

#[derive(Error, Debug)]
pub enum MitigationError {
    #[error("no firewall backend on this platform")]
    Unsupported,

    #[error("{command} exited with {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("mitigation io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result alias for scoring operations.
pub type Result<T> = std::result::Result<T, ScorerError>;
