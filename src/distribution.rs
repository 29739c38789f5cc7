// src/distribution.rs
//
// Immutable distribution value objects.
//
// A `Distribution` can only be obtained through the checked constructors
// (or through serde, which routes through the same checks), so every value
// in a profile already satisfies:
// - Normal:   stdDev > 0, parameters finite
// - Uniform:  max > min, bounds finite
// - Discrete: len(values) == len(weights), each weight in [0, 1]
//
// An all-zero weight vector is accepted here and reported as
// `DegenerateWeights` when a simulation is prepared.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::types::Scalar;

/// How to draw a random attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDistribution", into = "RawDistribution")]
pub enum Distribution {
    Normal(Normal),
    Uniform(Uniform),
    Discrete(Discrete),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    mean: f64,
    std_dev: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform {
    min: f64,
    max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Discrete {
    values: Vec<Scalar>,
    weights: Vec<f64>,
}

impl Distribution {
    pub fn normal(mean: f64, std_dev: f64) -> Result<Self, SimError> {
        if !mean.is_finite() {
            return Err(SimError::distribution(
                "normal",
                format!("mean must be finite (got {mean})"),
            ));
        }
        if !(std_dev.is_finite() && std_dev > 0.0) {
            return Err(SimError::distribution(
                "normal",
                format!("stdDev must be > 0 (got {std_dev})"),
            ));
        }
        Ok(Distribution::Normal(Normal { mean, std_dev }))
    }

    pub fn uniform(min: f64, max: f64) -> Result<Self, SimError> {
        if !(min.is_finite() && max.is_finite()) {
            return Err(SimError::distribution(
                "uniform",
                format!("bounds must be finite (got [{min}, {max}])"),
            ));
        }
        if max <= min {
            return Err(SimError::distribution(
                "uniform",
                format!("max must be > min (got min={min}, max={max})"),
            ));
        }
        Ok(Distribution::Uniform(Uniform { min, max }))
    }

    pub fn discrete(values: Vec<Scalar>, weights: Vec<f64>) -> Result<Self, SimError> {
        if values.len() != weights.len() {
            return Err(SimError::distribution(
                "discrete",
                format!(
                    "values and weights must have the same length (got {} values, {} weights)",
                    values.len(),
                    weights.len()
                ),
            ));
        }
        if let Some((i, w)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !(0.0..=1.0).contains(*w))
        {
            return Err(SimError::distribution(
                "discrete",
                format!("weight[{i}] must be in [0, 1] (got {w})"),
            ));
        }
        Ok(Distribution::Discrete(Discrete { values, weights }))
    }

    /// Short tag used in logs and serialized documents.
    pub fn kind(&self) -> &'static str {
        match self {
            Distribution::Normal(_) => "normal",
            Distribution::Uniform(_) => "uniform",
            Distribution::Discrete(_) => "discrete",
        }
    }
}

impl Normal {
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

impl Uniform {
    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

impl Discrete {
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// True when no value can ever be drawn.
    pub fn is_degenerate(&self) -> bool {
        self.weight_sum() <= 0.0
    }
}

// ---------------------------------------------------------------------------
// Serialized form: `{distribution: normal, mean: .., stdDev: ..}` etc.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "lowercase")]
enum RawDistribution {
    Normal {
        mean: f64,
        #[serde(rename = "stdDev", alias = "std_dev")]
        std_dev: f64,
    },
    Uniform {
        min: f64,
        max: f64,
    },
    Discrete {
        values: Vec<Scalar>,
        weights: Vec<f64>,
    },
}

impl TryFrom<RawDistribution> for Distribution {
    type Error = SimError;

    fn try_from(raw: RawDistribution) -> Result<Self, Self::Error> {
        match raw {
            RawDistribution::Normal { mean, std_dev } => Distribution::normal(mean, std_dev),
            RawDistribution::Uniform { min, max } => Distribution::uniform(min, max),
            RawDistribution::Discrete { values, weights } => {
                Distribution::discrete(values, weights)
            }
        }
    }
}

impl From<Distribution> for RawDistribution {
    fn from(d: Distribution) -> Self {
        match d {
            Distribution::Normal(n) => RawDistribution::Normal {
                mean: n.mean,
                std_dev: n.std_dev,
            },
            Distribution::Uniform(u) => RawDistribution::Uniform {
                min: u.min,
                max: u.max,
            },
            Distribution::Discrete(d) => RawDistribution::Discrete {
                values: d.values,
                weights: d.weights,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_invalid(r: Result<Distribution, SimError>) -> bool {
        matches!(r, Err(SimError::InvalidDistribution { .. }))
    }

    #[test]
    fn normal_requires_positive_std_dev() {
        assert!(Distribution::normal(0.0, 1.0).is_ok());
        assert!(is_invalid(Distribution::normal(0.0, 0.0)));
        assert!(is_invalid(Distribution::normal(0.0, -2.0)));
        assert!(is_invalid(Distribution::normal(f64::NAN, 1.0)));
    }

    #[test]
    fn uniform_requires_max_above_min() {
        assert!(Distribution::uniform(2.0, 5.0).is_ok());
        assert!(is_invalid(Distribution::uniform(5.0, 5.0)));
        assert!(is_invalid(Distribution::uniform(5.0, 2.0)));
    }

    #[test]
    fn discrete_rejects_mismatched_lengths() {
        let r = Distribution::discrete(vec!["a".into(), "b".into()], vec![0.5]);
        assert!(is_invalid(r));
    }

    #[test]
    fn discrete_rejects_out_of_range_weights() {
        assert!(is_invalid(Distribution::discrete(
            vec!["a".into(), "b".into()],
            vec![0.5, 1.5]
        )));
        assert!(is_invalid(Distribution::discrete(
            vec!["a".into()],
            vec![-0.1]
        )));
        assert!(is_invalid(Distribution::discrete(
            vec!["a".into()],
            vec![f64::NAN]
        )));
    }

    #[test]
    fn discrete_weights_need_not_sum_to_one() {
        let d = Distribution::discrete(vec![1.into(), 2.into()], vec![0.2, 0.2]).unwrap();
        match d {
            Distribution::Discrete(d) => {
                assert!((d.weight_sum() - 0.4).abs() < 1e-12);
                assert!(!d.is_degenerate());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn all_zero_weights_construct_but_are_degenerate() {
        let d = Distribution::discrete(vec!["a".into()], vec![0.0]).unwrap();
        let Distribution::Discrete(d) = d else {
            panic!("expected discrete");
        };
        assert!(d.is_degenerate());
    }

    #[test]
    fn parses_tagged_yaml_and_validates() {
        let d: Distribution =
            serde_yaml::from_str("distribution: normal\nmean: 10\nstdDev: 2\n").unwrap();
        assert_eq!(d, Distribution::normal(10.0, 2.0).unwrap());

        let d: Distribution =
            serde_yaml::from_str("{distribution: normal, mean: 1, std_dev: 0.5}").unwrap();
        assert_eq!(d.kind(), "normal");

        let bad = serde_yaml::from_str::<Distribution>("{distribution: uniform, min: 3, max: 1}");
        assert!(bad.is_err());
    }

    #[test]
    fn serializes_back_to_tagged_form() {
        let d = Distribution::uniform(0.0, 1.0).unwrap();
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["distribution"], "uniform");
        assert_eq!(v["max"], 1.0);
    }
}
