/**
 * Error taxonomy
 * Sample validation, engine and configuration failures
 */

use thiserror::Error;

use crate::identity::IdentityHandle;
use crate::landmark::Axis;
use crate::store::StoreError;

/// A landmark vector that breaks the caller contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("landmark vector is empty")]
    Empty,

    #[error("expected {expected} landmarks, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("landmark {index} has a non-finite {axis} coordinate")]
    NonFinite { index: usize, axis: Axis },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid sample: {0}")]
    InvalidSample(#[from] SampleError),

    #[error("no palm sample enrolled for {0}")]
    NotEnrolled(IdentityHandle),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}: {reason}")]
    Parse {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("match threshold must be a finite value in [-1, 1], got {0}")]
    Threshold(f64),

    #[error("landmark count must be positive")]
    LandmarkCount,
}
