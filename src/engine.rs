/**
 * Enrollment/Verification Engine
 * 1:1 palm verification against the single reference sample of an identity
 *
 * An identity is Unenrolled or Enrolled depending only on whether the store
 * holds a sample for it. enroll moves it to Enrolled (overwriting), delete
 * moves it back, verify never changes it.
 */

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::MatchConfig;
use crate::error::EngineError;
use crate::identity::IdentityHandle;
use crate::landmark::LandmarkVector;
use crate::scorer;
use crate::store::{ReferenceSample, SampleStore};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VerificationOutcome {
    pub accepted: bool,
    pub score: f64,
}

pub struct Engine<S> {
    store: S,
    config: MatchConfig,
}

impl<S: SampleStore> Engine<S> {
    pub fn new(store: S, config: MatchConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stores `landmarks` as the reference for `identity`, replacing any previous one.
    pub fn enroll(
        &self,
        identity: &IdentityHandle,
        landmarks: LandmarkVector,
    ) -> Result<(), EngineError> {
        landmarks.validate(self.config.landmark_count)?;

        let digest = landmarks.digest();
        self.store.upsert(ReferenceSample {
            identity: identity.clone(),
            landmarks,
            updated_at: Utc::now(),
        })?;

        info!("Palm enrolled: identity={}, digest={}", identity, digest);
        Ok(())
    }

    /// Compares `landmarks` with the enrolled reference. The score is reported whether or not it passes.
    pub fn verify(
        &self,
        identity: &IdentityHandle,
        landmarks: &LandmarkVector,
    ) -> Result<VerificationOutcome, EngineError> {
        let reference = match self.store.get(identity)? {
            Some(reference) => reference,
            None => {
                warn!("Verification without enrollment: identity={}", identity);
                return Err(EngineError::NotEnrolled(identity.clone()));
            }
        };

        landmarks.validate(self.config.landmark_count)?;

        let score = scorer::score(landmarks, &reference.landmarks);
        let accepted = score >= self.config.threshold;

        if accepted {
            info!("Palm verified: identity={}, score={:.6}", identity, score);
        } else {
            warn!(
                "Palm rejected: identity={}, score={:.6}, threshold={}",
                identity, score, self.config.threshold
            );
        }

        Ok(VerificationOutcome { accepted, score })
    }

    pub fn status(&self, identity: &IdentityHandle) -> Result<bool, EngineError> {
        Ok(self.store.get(identity)?.is_some())
    }

    /// Administrative removal of an identity's reference sample. Idempotent.
    pub fn delete(&self, identity: &IdentityHandle) -> Result<(), EngineError> {
        self.store.delete(identity)?;
        info!("Palm sample deleted: identity={}", identity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SampleError;
    use crate::landmark::LandmarkPoint;
    use crate::store::{MemoryStore, StoreError};

    fn engine() -> Engine<MemoryStore> {
        Engine::new(MemoryStore::new(), MatchConfig::default())
    }

    fn hand(offset: f64) -> LandmarkVector {
        (0..21)
            .map(|i| {
                let t = i as f64 / 21.0;
                LandmarkPoint::new(0.2 + 0.6 * t + offset, 0.8 - 0.5 * t, 0.02 * t)
            })
            .collect::<Vec<_>>()
            .into()
    }

    // only the first point is non-zero, so scores reduce to a 2-D cosine
    fn single_direction(x: f64, y: f64, count: usize) -> LandmarkVector {
        let mut points = vec![LandmarkPoint::new(0.0, 0.0, 0.0); count];
        points[0] = LandmarkPoint::new(x, y, 0.0);
        points.into()
    }

    #[test]
    fn test_enroll_then_verify_self_accepts() {
        let engine = engine();
        let id = IdentityHandle::from("u1");
        engine.enroll(&id, hand(0.0)).unwrap();

        let outcome = engine.verify(&id, &hand(0.0)).unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.score, 1.0);
    }

    #[test]
    fn test_verify_without_enrollment() {
        let engine = engine();
        let err = engine.verify(&"u2".into(), &hand(0.0)).unwrap_err();
        assert!(matches!(err, EngineError::NotEnrolled(id) if id.as_str() == "u2"));
    }

    #[test]
    fn test_not_enrolled_takes_precedence_over_bad_sample() {
        let engine = engine();
        let err = engine
            .verify(&"u2".into(), &LandmarkVector::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::NotEnrolled(_)));
    }

    #[test]
    fn test_enroll_rejects_invalid_samples() {
        let engine = engine();
        let id = IdentityHandle::from("u");

        let err = engine.enroll(&id, LandmarkVector::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSample(SampleError::Empty)));

        let short: LandmarkVector = hand(0.0).points()[..20].to_vec().into();
        let err = engine.enroll(&id, short).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidSample(SampleError::WrongLength { expected: 21, got: 20 })
        ));

        let mut points = hand(0.0).points().to_vec();
        points[4].y = f64::NEG_INFINITY;
        let err = engine.enroll(&id, points.into()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidSample(SampleError::NonFinite { index: 4, .. })
        ));

        assert!(!engine.status(&id).unwrap());
    }

    #[test]
    fn test_verify_rejects_invalid_samples() {
        let engine = engine();
        let id = IdentityHandle::from("u");
        engine.enroll(&id, hand(0.0)).unwrap();

        let long: LandmarkVector = [hand(0.0).points(), hand(0.0).points()].concat().into();
        let err = engine.verify(&id, &long).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidSample(SampleError::WrongLength { expected: 21, got: 42 })
        ));

        let mut points = hand(0.0).points().to_vec();
        points[0].x = f64::NAN;
        let err = engine.verify(&id, &points.into()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSample(_)));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let a = single_direction(1.0, 0.0, 21);
        let b = single_direction(0.85, (1.0f64 - 0.85 * 0.85).sqrt(), 21);
        let s = scorer::score(&b, &a);

        let at = Engine::new(
            MemoryStore::new(),
            MatchConfig {
                threshold: s,
                ..MatchConfig::default()
            },
        );
        let id = IdentityHandle::from("u");
        at.enroll(&id, a.clone()).unwrap();
        let outcome = at.verify(&id, &b).unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.score, s);

        let above = Engine::new(
            MemoryStore::new(),
            MatchConfig {
                threshold: s + 1e-12,
                ..MatchConfig::default()
            },
        );
        above.enroll(&id, a).unwrap();
        assert!(!above.verify(&id, &b).unwrap().accepted);
    }

    #[test]
    fn test_exact_default_threshold_accepts() {
        // |a| = |b| = 20 and a.b = 340, so the cosine is exactly 17/20
        let mut a = vec![LandmarkPoint::new(0.0, 0.0, 0.0); 21];
        a[0] = LandmarkPoint::new(20.0, 0.0, 0.0);
        let mut b = vec![LandmarkPoint::new(0.0, 0.0, 0.0); 21];
        b[0] = LandmarkPoint::new(17.0, 9.0, 5.0);
        b[1] = LandmarkPoint::new(2.0, 1.0, 0.0);

        let engine = engine();
        let id = IdentityHandle::from("u");
        engine.enroll(&id, a.into()).unwrap();

        let outcome = engine.verify(&id, &b.into()).unwrap();
        assert_eq!(outcome.score, 0.85);
        assert!(outcome.accepted);
    }

    #[test]
    fn test_default_threshold_boundary() {
        let engine = engine();
        let id = IdentityHandle::from("u");
        engine.enroll(&id, single_direction(1.0, 0.0, 21)).unwrap();

        let near = 0.849999_f64;
        let miss = single_direction(near, (1.0 - near * near).sqrt(), 21);
        let outcome = engine.verify(&id, &miss).unwrap();
        assert!(!outcome.accepted);
        assert!((outcome.score - near).abs() < 1e-9);

        let pass = 0.850001_f64;
        let hit = single_direction(pass, (1.0 - pass * pass).sqrt(), 21);
        let outcome = engine.verify(&id, &hit).unwrap();
        assert!(outcome.accepted);
        assert!((outcome.score - pass).abs() < 1e-9);
    }

    #[test]
    fn test_rejection_still_reports_score() {
        let engine = engine();
        let id = IdentityHandle::from("u");
        engine.enroll(&id, single_direction(1.0, 0.0, 21)).unwrap();

        let outcome = engine.verify(&id, &single_direction(0.0, 1.0, 21)).unwrap();
        assert_eq!(
            outcome,
            VerificationOutcome {
                accepted: false,
                score: 0.0
            }
        );
    }

    #[test]
    fn test_reenrollment_overwrites() {
        let engine = engine();
        let id = IdentityHandle::from("u");
        let v1 = single_direction(1.0, 0.0, 21);
        let v2 = single_direction(0.0, 1.0, 21);

        engine.enroll(&id, v1.clone()).unwrap();
        engine.enroll(&id, v2.clone()).unwrap();

        assert!(!engine.verify(&id, &v1).unwrap().accepted);
        let outcome = engine.verify(&id, &v2).unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.score, 1.0);
    }

    #[test]
    fn test_verify_does_not_change_state() {
        let engine = engine();
        let id = IdentityHandle::from("u");
        engine.enroll(&id, hand(0.0)).unwrap();
        let before = engine.store().get(&id).unwrap().unwrap();

        engine.verify(&id, &hand(0.3)).unwrap();
        engine.verify(&id, &single_direction(0.0, 1.0, 21)).unwrap();

        assert_eq!(engine.store().get(&id).unwrap().unwrap(), before);
    }

    #[test]
    fn test_identities_are_independent() {
        let engine = engine();
        let alice = IdentityHandle::from("alice");
        let bob = IdentityHandle::from("bob");
        engine.enroll(&alice, single_direction(1.0, 0.0, 21)).unwrap();
        engine.enroll(&bob, single_direction(0.0, 1.0, 21)).unwrap();

        assert!(engine
            .verify(&alice, &single_direction(1.0, 0.0, 21))
            .unwrap()
            .accepted);
        assert!(!engine
            .verify(&bob, &single_direction(1.0, 0.0, 21))
            .unwrap()
            .accepted);
    }

    #[test]
    fn test_status_and_idempotent_delete() {
        let engine = engine();
        let id = IdentityHandle::from("u");

        engine.delete(&id).unwrap();
        assert!(!engine.status(&id).unwrap());

        engine.enroll(&id, hand(0.0)).unwrap();
        assert!(engine.status(&id).unwrap());

        engine.delete(&id).unwrap();
        assert!(!engine.status(&id).unwrap());
        assert!(matches!(
            engine.verify(&id, &hand(0.0)),
            Err(EngineError::NotEnrolled(_))
        ));
    }

    #[test]
    fn test_stale_reference_shape_is_a_non_match() {
        let store = MemoryStore::new();
        let id = IdentityHandle::from("u");
        store
            .upsert(ReferenceSample {
                identity: id.clone(),
                landmarks: single_direction(1.0, 0.0, 5),
                updated_at: Utc::now(),
            })
            .unwrap();

        let engine = Engine::new(store, MatchConfig::default());
        let outcome = engine.verify(&id, &single_direction(1.0, 0.0, 21)).unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.score, 0.0);
    }

    struct DownStore;

    impl SampleStore for DownStore {
        fn get(&self, _: &IdentityHandle) -> Result<Option<ReferenceSample>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn upsert(&self, _: ReferenceSample) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn delete(&self, _: &IdentityHandle) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn test_store_errors_propagate() {
        let engine = Engine::new(DownStore, MatchConfig::default());
        let id = IdentityHandle::from("u");

        assert!(matches!(
            engine.enroll(&id, hand(0.0)),
            Err(EngineError::Store(StoreError::Unavailable(_)))
        ));
        assert!(matches!(
            engine.verify(&id, &hand(0.0)),
            Err(EngineError::Store(_))
        ));
        assert!(matches!(engine.status(&id), Err(EngineError::Store(_))));
        assert!(matches!(engine.delete(&id), Err(EngineError::Store(_))));
    }
}
