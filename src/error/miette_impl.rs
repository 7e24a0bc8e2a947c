//! Miette integration for pretty error reporting.

use miette::{Diagnostic, Severity};
use thiserror::Error;

use super::BlobError;

/// A diagnostic wrapper for blob errors compatible with miette.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct BlobDiagnostic {
    /// The error message
    pub message: String,

    #[source]
    /// The underlying error source
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,

    #[help]
    /// Help text for the user
    pub help: Option<String>,

    #[diagnostic(severity)]
    /// Severity level
    pub severity: Severity,
}

impl From<BlobError> for BlobDiagnostic {
    fn from(e: BlobError) -> Self {
        let help = match &e {
            BlobError::NotAMapping => {
                Some("The blob root must be a JSON object of key/value entries")
            }
            BlobError::Malformed { .. } => Some("The blob may be truncated or not a JSON document"),
            BlobError::Payload { .. } => {
                Some("Check that the requested value type matches the stored entries")
            }
            BlobError::Configuration(_) => {
                Some("Use true/false or \"eager\"/\"lazy\" for materialize")
            }
            BlobError::Io(_) | BlobError::Encode(_) | BlobError::WorkerPanicked => None,
        };
        BlobDiagnostic {
            message: e.to_string(),
            help: help.map(str::to_owned),
            source: Some(Box::new(e)),
            severity: Severity::Error,
        }
    }
}

impl From<BlobError> for miette::Report {
    fn from(e: BlobError) -> Self {
        miette::Report::new(BlobDiagnostic::from(e))
    }
}
