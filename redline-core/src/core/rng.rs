//! Deterministic Random Number Generator
//!
//! Uses Xorshift128+ for the cosmetic parts of a race attempt
//! (speed jitter, opponent pace). Given the same seed an attempt
//! replays identically, which is what the tests rely on.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use redline::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create RNG for one race attempt.
    ///
    /// See [`derive_attempt_seed`].
    pub fn for_attempt(race_mode_id: &str, track_id: &str, vehicle_id: &str, attempt: u32) -> Self {
        Self::new(derive_attempt_seed(race_mode_id, track_id, vehicle_id, attempt))
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but acceptable
        (self.next_u64() % max as u64) as u32
    }

    /// Generate a random integer in range [min, max].
    #[inline]
    pub fn next_int_range(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        // Spans up to 2^32 values; computed in 64 bits so it cannot overflow
        let range = u64::from(max.abs_diff(min)) + 1;
        let offset = self.next_u64() % range;
        (i64::from(min) + offset as i64) as i32
    }

    /// Generate a float in [0, 1).
    #[inline]
    pub fn next_unit(&mut self) -> f64 {
        // 53 significant bits
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a float in [min, max).
    #[inline]
    pub fn next_f64_range(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        min + self.next_unit() * (max - min)
    }

    /// Get current state (for checkpointing/debugging).
    pub fn state(&self) -> [u64; 2] {
        self.state
    }

    /// Restore from saved state.
    pub fn set_state(&mut self, state: [u64; 2]) {
        self.state = state;
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive an attempt seed from the race configuration.
///
/// The same (mode, track, vehicle, attempt) always yields the same seed,
/// so a given attempt can be replayed. Ids are length-prefixed so that
/// `("ab", "c")` and `("a", "bc")` hash differently.
pub fn derive_attempt_seed(
    race_mode_id: &str,
    track_id: &str,
    vehicle_id: &str,
    attempt: u32,
) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"REDLINE_ATTEMPT_SEED_V1");

    for id in [race_mode_id, track_id, vehicle_id] {
        hasher.update((id.len() as u32).to_le_bytes());
        hasher.update(id.as_bytes());
    }
    hasher.update(attempt.to_le_bytes());

    let hash = hasher.finalize();

    // Take first 8 bytes as seed
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(seed)
}

// =============================================================================
// TESTS
// =============================================================================
