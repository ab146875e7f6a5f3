/**
 * Landmarks
 * Palm landmark points as handed over by the upstream hand-landmark extractor
 */

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::SampleError;

/// One normalized, image-relative 3-D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Ordered landmarks of a single capture. Serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkVector(Vec<LandmarkPoint>);

impl LandmarkVector {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self(points)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.0
    }

    /// Coordinates in (x, y, z) per point order, length 3N.
    pub fn flat(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().flat_map(|p| p.coords())
    }

    /// Checks the shape contract for a vector entering enrollment or verification.
    pub fn validate(&self, expected_len: usize) -> Result<(), SampleError> {
        if self.is_empty() {
            return Err(SampleError::Empty);
        }
        if self.len() != expected_len {
            return Err(SampleError::WrongLength {
                expected: expected_len,
                got: self.len(),
            });
        }
        for (index, point) in self.0.iter().enumerate() {
            for (axis, value) in Axis::ALL.iter().zip(point.coords()) {
                if !value.is_finite() {
                    return Err(SampleError::NonFinite { index, axis: *axis });
                }
            }
        }
        Ok(())
    }

    /// Fingerprint of the exact coordinate bits, safe to log in place of the biometric itself.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for value in self.flat() {
            hasher.update(value.to_bits().to_be_bytes());
        }
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }
}

impl From<Vec<LandmarkPoint>> for LandmarkVector {
    fn from(points: Vec<LandmarkPoint>) -> Self {
        Self(points)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}
