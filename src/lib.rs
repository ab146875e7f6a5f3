//! Palm Verify
//! Palm-landmark enrollment and 1:1 verification
//!
//! Handles:
//! - Landmark vector validation
//! - Cosine similarity scoring
//! - Reference sample storage (in-memory or file-backed)
//! - Enrollment / verification decisions against a configurable threshold

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod landmark;
pub mod scorer;
pub mod store;

pub use config::{Config, MatchConfig};
pub use engine::{Engine, VerificationOutcome};
pub use error::{ConfigError, EngineError, SampleError};
pub use identity::IdentityHandle;
pub use landmark::{LandmarkPoint, LandmarkVector};
pub use store::{
    BoxedSampleStore, FileStore, MemoryStore, ReferenceSample, SampleStore, StoreError,
};
