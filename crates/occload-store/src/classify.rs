//! Error classification at the store boundary.
//!
//! The worker state machine never looks at a [`StoreError`] directly; it
//! acts on the three-way classification produced here. The mapping is an
//! exhaustive match on the error variants, so adding a `StoreError` variant
//! forces a decision in this module.

use crate::error::StoreError;
use serde::Serialize;
use std::fmt;

/// Codes for transient conditions that are safe to retry with backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransientCode {
    /// Schema or row version changed mid-transaction.
    OccConflict,
    /// Connection dropped; a fresh attempt may land on a healthy link.
    ConnectionLost,
    /// The store was slow, not wrong.
    Timeout,
}

impl fmt::Display for TransientCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OccConflict => write!(f, "occ_conflict"),
            Self::ConnectionLost => write!(f, "connection_lost"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// The classifier's verdict on a store error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ErrorClassification {
    /// Transient conflict; safe to retry with backoff.
    Retryable {
        /// Which transient condition was recognized.
        code: TransientCode,
    },
    /// Known non-recoverable condition; retrying wastes budget.
    Fatal {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// Unrecognized condition; non-retryable by policy so unexpected
    /// failure modes surface in the dead-letter path instead of looping.
    Unknown {
        /// The raw store-reported error.
        raw: String,
    },
}

impl ErrorClassification {
    /// Whether the policy may retry this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }

    /// Short label for log records.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Retryable { .. } => "retryable",
            Self::Fatal { .. } => "fatal",
            Self::Unknown { .. } => "unknown",
        }
    }
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retryable { code } => write!(f, "retryable({code})"),
            Self::Fatal { reason } => write!(f, "fatal({reason})"),
            Self::Unknown { raw } => write!(f, "unknown({raw})"),
        }
    }
}

/// Classify a store error. Pure and deterministic; no side effects.
pub fn classify(error: &StoreError) -> ErrorClassification {
    match error {
        StoreError::OccConflict { .. } => ErrorClassification::Retryable {
            code: TransientCode::OccConflict,
        },
        StoreError::ConnectionLost(_) => ErrorClassification::Retryable {
            code: TransientCode::ConnectionLost,
        },
        StoreError::Timeout(_) => ErrorClassification::Retryable {
            code: TransientCode::Timeout,
        },
        StoreError::PermissionDenied(_)
        | StoreError::MalformedStatement(_)
        | StoreError::ConstraintViolation { .. }
        | StoreError::TableMissing(_) => ErrorClassification::Fatal {
            reason: error.to_string(),
        },
        StoreError::Other { .. } => ErrorClassification::Unknown {
            raw: error.to_string(),
        },
    }
}
