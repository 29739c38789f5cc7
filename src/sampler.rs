// src/sampler.rs
//
// Draw one value from a Distribution.
//
// Stateless: the only side effect is consuming randomness from the injected
// generator. Per draw:
// - Normal:   two uniforms in (0,1], Box-Muller, z0 * stdDev + mean
// - Uniform:  min + r * (max - min), r in [0,1)
// - Discrete: one uniform r in [0,1), first value whose normalized
//             cumulative weight covers r

use std::f64::consts::PI;

use rand::RngCore;

use crate::distribution::{Discrete, Distribution, Normal, Uniform};
use crate::error::SimError;
use crate::rng::{unit_closed_open, unit_open_closed};
use crate::types::Scalar;

/// Draw one value from `distribution`.
///
/// Fails only with `DegenerateWeights` (a Discrete whose weights sum to zero);
/// the error carries no attribute location, callers attach it.
pub fn sample<R: RngCore + ?Sized>(
    distribution: &Distribution,
    rng: &mut R,
) -> Result<Scalar, SimError> {
    match distribution {
        Distribution::Normal(n) => Ok(Scalar::Number(sample_normal(n, rng))),
        Distribution::Uniform(u) => Ok(Scalar::Number(sample_uniform(u, rng))),
        Distribution::Discrete(d) => sample_discrete(d, rng).cloned(),
    }
}

/// Box-Muller, keeping only the cosine branch.
pub fn sample_normal<R: RngCore + ?Sized>(n: &Normal, rng: &mut R) -> f64 {
    let u1 = unit_open_closed(rng);
    let u2 = unit_open_closed(rng);
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    n.mean() + z0 * n.std_dev()
}

pub fn sample_uniform<R: RngCore + ?Sized>(u: &Uniform, rng: &mut R) -> f64 {
    let r = unit_closed_open(rng);
    let x = u.min() + r * (u.max() - u.min());
    // r is < 1 but the product can still round up onto `max`.
    if x >= u.max() {
        prev_float(u.max()).max(u.min())
    } else {
        x
    }
}

/// Returns a reference into the distribution's value list.
pub fn sample_discrete<'d, R: RngCore + ?Sized>(
    d: &'d Discrete,
    rng: &mut R,
) -> Result<&'d Scalar, SimError> {
    let total = d.weight_sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(SimError::DegenerateWeights {
            archetype: String::new(),
            attribute: String::new(),
        });
    }

    let r = unit_closed_open(rng);
    let mut cumulative = 0.0;
    let mut last_drawable = None;
    for (value, &w) in d.values().iter().zip(d.weights()) {
        if w <= 0.0 {
            continue;
        }
        cumulative += w / total;
        if cumulative >= r {
            return Ok(value);
        }
        last_drawable = Some(value);
    }

    // Rounding left the final prefix sum a hair below r.
    last_drawable.ok_or_else(|| SimError::DegenerateWeights {
        archetype: String::new(),
        attribute: String::new(),
    })
}

/// Largest float strictly below a finite `x`.
fn prev_float(x: f64) -> f64 {
    if x > 0.0 {
        f64::from_bits(x.to_bits() - 1)
    } else if x < 0.0 {
        f64::from_bits(x.to_bits() + 1)
    } else {
        -f64::from_bits(1)
    }
}
