/**
 * In-memory Sample Store
 * Process-local backend, used by default and in tests
 */

use std::collections::HashMap;
use std::sync::RwLock;

use super::{ReferenceSample, SampleStore, StoreError};
use crate::identity::IdentityHandle;

#[derive(Default)]
pub struct MemoryStore {
    samples: RwLock<HashMap<IdentityHandle, ReferenceSample>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let samples = self
            .samples
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(samples.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl SampleStore for MemoryStore {
    fn get(&self, identity: &IdentityHandle) -> Result<Option<ReferenceSample>, StoreError> {
        let samples = self
            .samples
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(samples.get(identity).cloned())
    }

    fn upsert(&self, sample: ReferenceSample) -> Result<(), StoreError> {
        let mut samples = self
            .samples
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        samples.insert(sample.identity.clone(), sample);
        Ok(())
    }

    fn delete(&self, identity: &IdentityHandle) -> Result<(), StoreError> {
        let mut samples = self
            .samples
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        samples.remove(identity);
        Ok(())
    }
}
