use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum StatError {
    #[error("portal request failed: {0}")]
    Http(String),

    #[error("portal returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unrecognized page layout: {0}")]
    #[diagnostic(help("the portal markup may have changed"))]
    Parse(String),

    #[error("malformed catalog path: {0}")]
    MalformedPath(String),

    #[error("invalid dataset descriptor: {0}")]
    Validation(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid request header: {0}")]
    InvalidHeader(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("category not found: {0}")]
    CategoryNotFound(String),

    #[error("table not found: {0}")]
    TableNotFound(String),
}

impl StatError {
    /// Transport and status failures, i.e. anything the portal itself caused.
    pub fn is_network(&self) -> bool {
        matches!(self, StatError::Http(_) | StatError::Status { .. })
    }
}
