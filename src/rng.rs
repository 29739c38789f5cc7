// src/rng.rs
//
// Deterministic random streams.
//
// Nothing in the simulation touches a platform/global RNG. Every draw comes
// from a generator the caller constructed and passed in:
// - `seeded(seed)` gives a ChaCha8 stream that is identical on every host.
// - `trial_seed(base, i)` derives an independent per-trial stream so trials
//   can run on any thread in any order and still reproduce.
//
// The unit-interval helpers only use `next_u64`, so any `RngCore` (including
// a scripted one in tests) can stand in for the real generator.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The generator used for all seeded simulations.
pub type SimRng = ChaCha8Rng;

const UNIT_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// Create a reproducible stream from a seed.
pub fn seeded(seed: u64) -> SimRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Create a stream from OS entropy (unseeded runs).
pub fn from_entropy() -> SimRng {
    ChaCha8Rng::from_entropy()
}

/// Draw a fresh base seed from OS entropy.
///
/// Used when a run needs per-trial streams but the caller gave no seed; the
/// drawn value is reported so the run can be replayed.
pub fn entropy_seed() -> u64 {
    from_entropy().next_u64()
}

/// Seed for trial `index` given the run's base seed.
pub fn trial_seed(base: u64, index: u64) -> u64 {
    base.wrapping_add(index)
}

/// Uniform draw in `[0, 1)` from the top 53 bits of one `u64`.
pub fn unit_closed_open<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    (rng.next_u64() >> 11) as f64 * UNIT_SCALE
}

/// Uniform draw in `(0, 1]`. Never returns 0, so `ln(u)` is always finite.
pub fn unit_open_closed<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    1.0 - unit_closed_open(rng)
}
