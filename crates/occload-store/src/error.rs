//! Store error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors reported by a store client.
///
/// Every failure class the classifier recognizes has its own variant; the
/// variant *is* the structured code, so downstream code never inspects
/// message text. Backends that surface conditions outside this taxonomy
/// report them through [`StoreError::Other`] with whatever code string the
/// store gave them.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The schema or a row version changed between read and write; the
    /// store rejected the transaction rather than blocking on a lock.
    #[error("optimistic concurrency conflict on '{table}': {detail}")]
    OccConflict {
        /// Table the rejected write targeted.
        table: String,
        /// Store-reported conflict detail.
        detail: String,
    },

    /// The connection to the store dropped mid-call.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The store did not answer within the client's deadline.
    #[error("store timed out after {0:?}")]
    Timeout(Duration),

    /// The store rejected the caller's credentials or grants.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The statement could not be parsed or bound.
    #[error("malformed statement: {0}")]
    MalformedStatement(String),

    /// A constraint unrelated to concurrency rejected the batch.
    #[error("constraint violation on '{table}': {detail}")]
    ConstraintViolation {
        /// Table the rejected write targeted.
        table: String,
        /// Violated constraint detail.
        detail: String,
    },

    /// The target table does not exist.
    #[error("table not found: {0}")]
    TableMissing(String),

    /// A store condition outside the recognized taxonomy.
    #[error("store error ({code}): {message}")]
    Other {
        /// Store-reported error code, passed through verbatim.
        code: String,
        /// Store-reported message.
        message: String,
    },
}
