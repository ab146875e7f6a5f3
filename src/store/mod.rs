/**
 * Sample Store
 * Holds at most one reference sample per identity behind a swappable backend
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::IdentityHandle;
use crate::landmark::LandmarkVector;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The enrolled landmarks for one identity, in its persisted and wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSample {
    pub identity: IdentityHandle,
    pub landmarks: LandmarkVector,
    pub updated_at: DateTime<Utc>,
}

/// Backends must make `upsert` atomic per identity: a concurrent `get` sees either
/// the previous sample or the new one, never a mix.
pub trait SampleStore: Send + Sync {
    fn get(&self, identity: &IdentityHandle) -> Result<Option<ReferenceSample>, StoreError>;

    fn upsert(&self, sample: ReferenceSample) -> Result<(), StoreError>;

    /// Removing an identity that was never enrolled is not an error.
    fn delete(&self, identity: &IdentityHandle) -> Result<(), StoreError>;
}

impl<S: SampleStore + ?Sized> SampleStore for std::sync::Arc<S> {
    fn get(&self, identity: &IdentityHandle) -> Result<Option<ReferenceSample>, StoreError> {
        (**self).get(identity)
    }

    fn upsert(&self, sample: ReferenceSample) -> Result<(), StoreError> {
        (**self).upsert(sample)
    }

    fn delete(&self, identity: &IdentityHandle) -> Result<(), StoreError> {
        (**self).delete(identity)
    }
}

impl<S: SampleStore + ?Sized> SampleStore for Box<S> {
    fn get(&self, identity: &IdentityHandle) -> Result<Option<ReferenceSample>, StoreError> {
        (**self).get(identity)
    }

    fn upsert(&self, sample: ReferenceSample) -> Result<(), StoreError> {
        (**self).upsert(sample)
    }

    fn delete(&self, identity: &IdentityHandle) -> Result<(), StoreError> {
        (**self).delete(identity)
    }
}

/// A store selected at runtime from configuration.
pub type BoxedSampleStore = Box<dyn SampleStore>;
