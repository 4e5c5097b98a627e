//! Seeded linear congruential generator for gameplay decisions
//!
//! Same seed + same call sequence = same results, which is what replays and
//! "fixed random" patterns rely on. Cosmetic randomness (erase effect spin)
//! uses a separate PCG stream so visuals never shift the gameplay sequence.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Default LCG multiplier
pub const LCG_A: u64 = 1_103_515_245;
/// Default LCG increment
pub const LCG_C: u64 = 0;
/// Default LCG modulus (2^31 - 1)
pub const LCG_M: u64 = (1 << 31) - 1;

/// Deterministic pseudo-random source
///
/// A seed that reduces to state 0 would pin a multiplicative generator at 0
/// forever, so a zero starting state is replaced by 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RngState")]
pub struct Rng {
    /// Seed the generator was created with
    seed: u64,
    /// Current LCG state
    state: u64,
    a: u64,
    c: u64,
    m: u64,
}

/// Unchecked serialized form of `Rng`
#[derive(Deserialize)]
struct RngState {
    seed: u64,
    state: u64,
    a: u64,
    c: u64,
    m: u64,
}

impl TryFrom<RngState> for Rng {
    type Error = EngineError;

    fn try_from(raw: RngState) -> Result<Self, Self::Error> {
        let mut rng = Rng::with_params(raw.seed, raw.a, raw.c, raw.m)?;
        rng.state = raw.state % raw.m;
        Ok(rng)
    }
}

impl Rng {
    /// Create a generator with the default LCG parameters
    pub fn new(seed: u64) -> Self {
        Self::build(seed, LCG_A, LCG_C, LCG_M)
    }

    /// Create a generator with a random seed in [0, 1e8)
    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u64>() % 100_000_000)
    }

    /// Create a generator with custom LCG parameters
    ///
    /// Any 64-bit `a`, `c` and `m` work; `m` must be at least 2.
    pub fn with_params(seed: u64, a: u64, c: u64, m: u64) -> Result<Self, EngineError> {
        if m < 2 {
            return Err(EngineError::InvalidRngModulus(m));
        }
        Ok(Self::build(seed, a, c, m))
    }

    fn build(seed: u64, a: u64, c: u64, m: u64) -> Self {
        let state = match seed % m {
            0 => 1,
            s => s,
        };
        Self { seed, state, a, c, m }
    }

    /// Seed this generator was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn next_raw(&mut self) -> u64 {
        let next = (self.a as u128 * self.state as u128 + self.c as u128) % self.m as u128;
        self.state = next as u64;
        self.state
    }

    fn next_unit(&mut self) -> f64 {
        self.next_raw() as f64 / self.m as f64
    }

    /// Random float in [from, to)
    pub fn float(&mut self, from: f32, to: f32) -> f32 {
        (self.next_unit() * (to as f64 - from as f64) + from as f64) as f32
    }

    /// Random integer in [from, to), truncated toward zero
    pub fn int(&mut self, from: i32, to: i32) -> i32 {
        (self.next_unit() * (to as f64 - from as f64) + from as f64) as i32
    }

    /// True with probability `prob`
    pub fn maybe(&mut self, prob: f32) -> bool {
        self.next_unit() < prob as f64
    }

    /// Pick one result by weight
    ///
    /// Returns `None` only when `choices` is empty. Rounding that pushes the
    /// roll past every bucket falls back to the last choice.
    pub fn select<'a, T>(&mut self, choices: &'a [(f32, T)]) -> Option<&'a T> {
        let total: f32 = choices.iter().map(|(w, _)| *w).sum();
        let mut r = self.float(0.0, total);
        for (weight, result) in choices {
            if r < *weight {
                return Some(result);
            }
            r -= weight;
        }
        choices.last().map(|(_, result)| result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Rng::new(12345);
        let mut b = Rng::new(12345);
        for _ in 0..100 {
            assert_eq!(a.float(0.0, 4.0), b.float(0.0, 4.0));
            assert_eq!(a.int(2, 8), b.int(2, 8));
            assert_eq!(a.maybe(0.3), b.maybe(0.3));
        }
    }

    #[test]
    fn test_ranges() {
        let mut rng = Rng::new(777);
        for _ in 0..1000 {
            let f = rng.float(5.0, 8.0);
            assert!((5.0..8.0).contains(&f));
            let i = rng.int(2, 8);
            assert!((2..8).contains(&i));
        }
    }

    #[test]
    fn test_first_value_matches_lcg() {
        let mut rng = Rng::new(1);
        let expected = LCG_A % LCG_M;
        assert_eq!(rng.next_raw(), expected);
    }

    #[test]
    fn test_zero_seed_does_not_stick() {
        let mut rng = Rng::new(0);
        let mut same = Rng::new(LCG_M * 3);
        let first = rng.float(0.0, 1.0);
        assert!(first > 0.0);
        assert_ne!(first, rng.float(0.0, 1.0));
        assert_eq!(same.float(0.0, 1.0), first);
    }

    #[test]
    fn test_custom_params_48_bit() {
        let mut rng = Rng::with_params(123_456_789, 0x5_DEEC_E66D, 11, 1 << 48).unwrap();
        let expected = ((0x5_DEEC_E66Du128 * 123_456_789 + 11) % (1u128 << 48)) as u64;
        assert_eq!(rng.next_raw(), expected);
        for _ in 0..1000 {
            let f = rng.float(-1.0, 1.0);
            assert!((-1.0..1.0).contains(&f));
        }
    }

    #[test]
    fn test_custom_params_reject_tiny_modulus() {
        assert!(matches!(Rng::with_params(1, 3, 0, 0), Err(EngineError::InvalidRngModulus(0))));
        assert!(matches!(Rng::with_params(1, 3, 0, 1), Err(EngineError::InvalidRngModulus(1))));
        let rejected: Result<Rng, _> = serde_json::from_str(r#"{"seed":1,"state":1,"a":3,"c":0,"m":0}"#);
        assert!(rejected.is_err());
    }

    #[test]
    fn test_select_weights() {
        let mut rng = Rng::new(42);
        let choices = [(1.0, "smallball"), (3.0, "ringball"), (6.0, "glowball")];
        let mut counts = [0u32; 3];
        for _ in 0..10_000 {
            match *rng.select(&choices).unwrap() {
                "smallball" => counts[0] += 1,
                "ringball" => counts[1] += 1,
                _ => counts[2] += 1,
            }
        }
        assert!(counts[0] < counts[1] && counts[1] < counts[2]);
        assert!(rng.select::<u8>(&[]).is_none());
    }

    #[test]
    fn test_state_roundtrips_through_serde() {
        let mut rng = Rng::new(99);
        rng.float(0.0, 1.0);
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: Rng = serde_json::from_str(&json).unwrap();
        assert_eq!(rng.float(0.0, 1.0), restored.float(0.0, 1.0));
    }
}
