// src/types.rs
//
// Common shared types for the simulation core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A primitive attribute value: either fixed in a profile or drawn by a sampler.
///
/// Deserializes from a bare YAML/JSON string, number or boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Numeric view of the value.
    ///
    /// This is the one place that decides whether a value feeds numeric
    /// statistics or categorical frequencies. Booleans are categorical.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(x) => Some(*x),
            Scalar::Bool(_) | Scalar::Text(_) => None,
        }
    }

    /// Category label used in frequency tables (`"true"`, `"42"`, `"high"`).
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            // f64 Display prints 42.0 as "42" and 2.5 as "2.5".
            Scalar::Number(x) => write!(f, "{x}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Number(x)
    }
}

impl From<i32> for Scalar {
    fn from(x: i32) -> Self {
        Scalar::Number(f64::from(x))
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

/// Identity of a sampled value: which archetype (by position and label) and
/// which attribute it belongs to.
///
/// The position keeps two archetypes that share a label in separate groups.
/// Keys are shared as `Arc<AttributeKey>` so every trial can carry them
/// without reallocating the strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeKey {
    pub archetype_index: usize,
    pub archetype: String,
    pub attribute: String,
}

impl AttributeKey {
    pub fn new(archetype_index: usize, archetype: &str, attribute: &str) -> Arc<Self> {
        Arc::new(Self {
            archetype_index,
            archetype: archetype.to_string(),
            attribute: attribute.to_string(),
        })
    }

    /// True if this key names `attribute` inside an archetype labelled `archetype`.
    pub fn matches(&self, archetype: &str, attribute: &str) -> bool {
        self.archetype == archetype && self.attribute == attribute
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.archetype, self.attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_render_like_source_values() {
        assert_eq!(Scalar::from(true).label(), "true");
        assert_eq!(Scalar::from(42).label(), "42");
        assert_eq!(Scalar::from(2.5).label(), "2.5");
        assert_eq!(Scalar::from("high").label(), "high");
    }

    #[test]
    fn only_numbers_are_numeric() {
        assert_eq!(Scalar::from(7).as_number(), Some(7.0));
        assert_eq!(Scalar::from(false).as_number(), None);
        assert_eq!(Scalar::from("7").as_number(), None);
    }

    #[test]
    fn untagged_yaml_keeps_quoted_numbers_as_text() {
        let vals: Vec<Scalar> = serde_yaml::from_str("[true, 3, 1.5, \"42\", calm]").unwrap();
        assert_eq!(
            vals,
            vec![
                Scalar::Bool(true),
                Scalar::Number(3.0),
                Scalar::Number(1.5),
                Scalar::Text("42".to_string()),
                Scalar::Text("calm".to_string()),
            ]
        );
    }
}
