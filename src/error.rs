use std::path::PathBuf;
use thiserror::Error;

/// Failures of the ledger file; logged by the ledger, never fatal to callers
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to read ledger {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse ledger {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode ledger: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write ledger {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rejected user choices (brand code, quantity menu)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("quantity must be 1, 5 or 10, got {0}")]
    Quantity(u32),

    #[error("unknown card choice: {0}")]
    Brand(String),
}
