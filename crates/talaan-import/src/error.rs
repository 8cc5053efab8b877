//! Error types for the import engine.
//!
//! Fatal conditions abort a run with no persisted effect; recoverable
//! per-row conditions never surface here (they are recorded in the
//! [`crate::models::ReconciliationResult`] skip list instead), and a
//! needs-mapping format outcome is an enum variant, not an error.

use thiserror::Error;

/// Errors from the persistence and snapshot seams.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Field confidentiality failure while sealing or opening a value.
    #[error("Confidentiality error: {0}")]
    Crypto(#[from] talaan_crypto::CryptoError),

    /// Snapshot payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store refused the write plan (e.g. the roster changed under us).
    #[error("Store conflict: {0}")]
    Conflict(String),
}

/// Import engine errors. All fatal: the run aborts with no partial state.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Uploaded file exceeds the configured size cap.
    #[error("File too large: {0}")]
    FileTooLarge(String),

    /// Extract contains more data rows than the configured cap.
    #[error("Too many rows: {0}")]
    TooManyRows(String),

    /// The extract is structurally unusable: unreadable input, empty
    /// header row, or an explicit column mapping that still fails the
    /// required-field check.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Parsing finished with zero valid records.
    #[error("No valid records: {0}")]
    NoValidRecords(String),

    /// Unknown or expired preview token.
    #[error("Preview snapshot not found or expired")]
    SnapshotNotFound,

    /// The preview token belongs to a different sub-unit.
    #[error("Preview snapshot does not belong to this sub-unit")]
    SnapshotMismatch,

    /// Persistence failure. During Confirm the transaction has been
    /// rolled back in full.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_wraps_into_import_error() {
        fn fails() -> Result<(), ImportError> {
            Err(StoreError::Conflict("roster changed".to_string()))?;
            Ok(())
        }

        let err = fails().unwrap_err();
        assert!(err.to_string().contains("roster changed"));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ImportError::SnapshotNotFound.to_string(),
            "Preview snapshot not found or expired"
        );
        assert!(ImportError::InvalidFormat("header row is empty".to_string())
            .to_string()
            .contains("header row is empty"));
    }
}
