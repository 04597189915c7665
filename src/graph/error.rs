//! Error taxonomy for the analysis engine.
//!
//! Only structurally invalid input surfaces as an error: malformed snapshots,
//! bad link weights, unknown algorithm names, invalid configuration, and
//! interrupted computations. Soft conditions (an absent id, an unreachable
//! pair, too few snapshots for a trend) are expressed in the return types.

use thiserror::Error;

/// Hard failures raised by analysis routines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// A link weight is negative, NaN or infinite.
    #[error("invalid weight {weight} on link '{link_id}' (weights must be finite and non-negative)")]
    InvalidWeight { link_id: String, weight: f64 },

    /// Unsupported community detection algorithm identifier.
    #[error("unsupported community detection algorithm '{0}'")]
    InvalidAlgorithm(String),

    /// Duplicate ids or links referencing unknown nodes.
    #[error("malformed graph: {0}")]
    MalformedGraph(String),

    /// Configuration value out of range.
    #[error("invalid analytics configuration: {0}")]
    InvalidConfig(String),

    /// The caller raised the cancellation flag.
    #[error("analysis cancelled")]
    Cancelled,

    /// The computation ran past its deadline.
    #[error("analysis exceeded its deadline")]
    DeadlineExceeded,
}

/// Result alias used across the `graph` module.
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AnalysisError::InvalidWeight {
            link_id: "l1".to_string(),
            weight: -2.0,
        };
        assert!(err.to_string().contains("'l1'"));
        assert!(err.to_string().contains("-2"));

        let err = AnalysisError::InvalidAlgorithm("spectral".to_string());
        assert_eq!(
            err.to_string(),
            "unsupported community detection algorithm 'spectral'"
        );
    }

    #[test]
    fn test_error_converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(AnalysisError::Cancelled)?
        }
        let err = fails().unwrap_err();
        assert_eq!(err.to_string(), "analysis cancelled");
        assert!(err.downcast_ref::<AnalysisError>().is_some());
    }
}
