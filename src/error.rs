use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt ledger: {0}")]
    CorruptLedger(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Stable machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::NotFound(_) => "not_found",
            LedgerError::Io(_) => "io",
            LedgerError::CorruptLedger(_) => "corrupt_ledger",
            LedgerError::Validation(_) => "validation",
            LedgerError::Unauthorized(_) => "unauthorized",
            LedgerError::Serialization(_) => "serialization",
            LedgerError::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
