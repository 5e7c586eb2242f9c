//! The enumerable class of computation failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure raised inside a fallible computation's continuation.
///
/// This is an explicit, enumerable class: the fallible combinator captures
/// exactly these at its bind boundary and converts them into failed
/// instances, never arbitrary runtime panics. Faults serialize, so they can
/// ride in construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "fault", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ComputationFault {
    /// The continuation gave up on the computation.
    #[error("computation aborted: {reason}")]
    Aborted { reason: String },

    /// The wrapped value did not have the shape the continuation expected.
    #[error("malformed input: {detail}")]
    MalformedInput { detail: String },

    /// The composition engine failed while the continuation was building
    /// its next computation.
    #[error("computation infrastructure failure: {detail}")]
    Internal { detail: String },
}

impl From<engine::Error> for ComputationFault {
    fn from(err: engine::Error) -> Self {
        ComputationFault::Internal {
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faults_round_trip_through_json() {
        let fault = ComputationFault::MalformedInput {
            detail: "expected a number".into(),
        };
        let raw = serde_json::to_value(&fault).unwrap();
        let back: ComputationFault = serde_json::from_value(raw).unwrap();
        assert_eq!(back, fault);
    }
}
