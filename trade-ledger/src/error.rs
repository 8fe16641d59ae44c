//! Error types for the trade ledger

use thiserror::Error;

/// Result type for trade ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Trade ledger errors
///
/// Every variant is recoverable: the operation that detects it returns it to
/// the caller and nothing is retried internally.
#[derive(Error, Debug)]
pub enum Error {
    /// Wrong number of arguments for an operation
    #[error("Incorrect number of arguments for {operation}. Expecting {expected}, got {actual}")]
    InvalidArguments {
        /// Operation name
        operation: String,
        /// Declared argument count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// Amount argument is not a base-10 integer
    #[error("{operation}: argument 3 (amount) must be a numeric string, got {value:?}")]
    InvalidAmount {
        /// Operation name
        operation: String,
        /// Offending input
        value: String,
    },

    /// Point lookup failed in the ledger
    #[error("{operation}: failed to get state for {key}: {detail}")]
    LedgerReadFailure {
        /// Operation name
        operation: String,
        /// Requested key
        key: String,
        /// Failure reported by the ledger
        detail: String,
    },

    /// Write failed in the ledger
    #[error("{operation}: failed to put state for {key}: {detail}")]
    LedgerWriteFailure {
        /// Operation name
        operation: String,
        /// Target key
        key: String,
        /// Failure reported by the ledger
        detail: String,
    },

    /// Point lookup returned no value
    #[error("{operation}: no response for trade {key}")]
    RecordNotFound {
        /// Operation name
        operation: String,
        /// Requested key
        key: String,
    },

    /// Range scan failed while opening or advancing
    #[error("{operation}: range scan failed: {detail}")]
    ScanFailure {
        /// Operation name
        operation: String,
        /// Failure reported by the ledger
        detail: String,
    },

    /// Dispatch miss
    #[error("Invalid trade ledger function name: {0:?}")]
    UnknownOperation(String),

    /// JSON encode/decode failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage adapter error (opening RocksDB, missing column family)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidArguments { .. } => "invalid_arguments",
            Error::InvalidAmount { .. } => "invalid_amount",
            Error::LedgerReadFailure { .. } => "ledger_read_failure",
            Error::LedgerWriteFailure { .. } => "ledger_write_failure",
            Error::RecordNotFound { .. } => "record_not_found",
            Error::ScanFailure { .. } => "scan_failure",
            Error::UnknownOperation(_) => "unknown_operation",
            Error::Serialization(_) => "serialization",
            Error::Storage(_) => "storage",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }

    /// Render as an `{"Error": "<message>"}` payload for hosts that return bytes
    pub fn to_payload(&self) -> Vec<u8> {
        serde_json::json!({ "Error": self.to_string() })
            .to_string()
            .into_bytes()
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
