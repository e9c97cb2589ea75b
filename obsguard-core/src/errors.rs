//! Error Types for the QC Pipeline
//!
//! ## Design Philosophy
//!
//! The error system stays deliberately small:
//!
//! 1. **Two fatal classes only**: malformed input and insufficient data. Every
//!    other anomaly the pipeline encounters is *data*, not an error. A row
//!    whose rolling median cannot be computed gets a `None` median plus a
//!    fault flag; it never aborts the run.
//!
//! 2. **Copy Semantics**: errors carry no heap data, only `&'static str`
//!    reasons and counts, so they can be returned cheaply and matched on
//!    without move complications.
//!
//! 3. **No internal retries**: the detection and aggregation functions are
//!    deterministic numeric transforms. If they fail once they fail always;
//!    retry logic belongs to the orchestrator that feeds them.
//!
//! ## Error Categories
//!
//! - `MalformedInput`: structurally wrong input such as non-finite sample
//!   values or duplicate grid timestamps. The caller must fix its feed.
//! - `InsufficientData`: an empty buffer where a windowing operation needs at
//!   least one anchor timestamp. Fatal for every quantity except the
//!   documented precipitation hour-aggregation case, which degrades to an
//!   empty result instead of reaching this error.

use thiserror_no_std::Error;

/// Result type for QC operations
pub type QcResult<T> = Result<T, QcError>;

/// Fatal errors raised by the detection and aggregation stages
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QcError {
    /// Input buffer violates a structural invariant of the fixed time grid
    #[error("Malformed input: {reason}")]
    MalformedInput {
        /// What the caller fed us that the grid contract forbids
        reason: &'static str,
    },

    /// Not enough rows to anchor a windowing operation
    #[error("Insufficient data: need {required}, have {available}")]
    InsufficientData {
        /// Minimum number of rows the operation needs
        required: usize,
        /// Actual number of rows supplied
        available: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = QcError::InsufficientData {
            required: 1,
            available: 0,
        };
        assert_eq!(err.to_string(), "Insufficient data: need 1, have 0");

        let err = QcError::MalformedInput {
            reason: "non-finite sample value",
        };
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn errors_are_small() {
        // Returned in hot paths; keep them register-sized.
        assert!(core::mem::size_of::<QcError>() <= 32);
    }
}
