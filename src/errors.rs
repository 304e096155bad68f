use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Errors surfaced by the connector.
///
/// Only `Connection` and `Unpack` are part of the documented taxonomy; the
/// remaining variants carry underlying causes and are folded into one of the
/// two fatal kinds at the orchestrator boundary where needed. Non-fatal
/// conditions (missing utterance pairings, orphan intents, nothing new to
/// merge) never become errors and are surfaced through the status reporter.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Cannot reach or authenticate to the NLU provider
    #[error("agent connection failed: {0}")]
    Connection(String),

    /// Agent archive is unreadable or missing required metadata
    #[error("agent unpack failed: {0}")]
    Unpack(String),

    /// Capability map is missing a required entry
    #[error("missing capability: {0}")]
    MissingCapability(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
