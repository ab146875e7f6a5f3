/**
 * Similarity Scorer
 * Cosine similarity between two landmark vectors, independent of any accept policy
 */

use crate::landmark::LandmarkVector;

/// Cosine similarity of the flattened (x, y, z) sequences of `a` and `b`.
///
/// Vectors of different length, or with a zero magnitude, score 0.0.
/// Summation runs left to right so the result is reproducible bit for bit.
pub fn score(a: &LandmarkVector, b: &LandmarkVector) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let (Some(scale_a), Some(scale_b)) = (unit_scale(a), unit_scale(b)) else {
        return 0.0;
    };

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.flat().zip(b.flat()) {
        let x = scale_a.apply(x);
        let y = scale_b.apply(y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // sqrt(|a|^2 * |b|^2) keeps score(v, v) at exactly 1.0
    let similarity = dot / (norm_a * norm_b).sqrt();
    if similarity.is_nan() {
        return 0.0;
    }
    similarity.clamp(-1.0, 1.0)
}

/// Power-of-two factor bringing the largest coordinate near 1.0.
///
/// Scaling by a power of two is exact, so scores in the normal range are unchanged,
/// while squared norms stay bounded by a small multiple of 3N at any magnitude.
#[derive(Debug, Clone, Copy)]
struct UnitScale(f64, f64);

impl UnitScale {
    fn apply(self, value: f64) -> f64 {
        value * self.0 * self.1
    }
}

fn unit_scale(v: &LandmarkVector) -> Option<UnitScale> {
    let max = v.flat().fold(0.0_f64, |m, x| m.max(x.abs()));
    if max == 0.0 || !max.is_finite() {
        return None;
    }
    // split in two so each factor stays a normal f64 even for subnormal inputs
    let shift = -(max.log2().floor() as i32);
    let half = shift / 2;
    Some(UnitScale(pow2(half), pow2(shift - half)))
}

fn pow2(exp: i32) -> f64 {
    f64::from_bits(((exp + 1023) as u64) << 52)
}
