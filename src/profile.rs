// src/profile.rs
//
// The data being simulated: Profile -> Archetype -> Attribute.
//
// Pure data. The simulation core only ever reads it. Constructors (and serde,
// which goes through the same constructors) enforce the structural
// invariants the core relies on:
// - a profile has at least one archetype
// - an archetype has at least one attribute, with unique non-empty names
// - archetype weight, when present, is in [0, 1]
// - a clamp range, when present, has finite min <= max
//
// Anything beyond that (full schema validation) belongs to the validator
// that produced the profile.

use std::collections::HashSet;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::error::SimError;
use crate::types::Scalar;

/// Either a fixed primitive or a distribution to sample each trial.
///
/// Resolved once when the profile is built; later stages match on the tag
/// instead of inspecting value types.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Distributed(Distribution),
    Fixed(Scalar),
}

impl AttributeValue {
    pub fn is_distributed(&self) -> bool {
        matches!(self, AttributeValue::Distributed(_))
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    // A mapping is a distribution, anything else a fixed primitive. Going
    // through a generic value keeps the distribution's own error message
    // instead of serde's "did not match any variant".
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if raw.is_object() {
            serde_json::from_value::<Distribution>(raw)
                .map(AttributeValue::Distributed)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value::<Scalar>(raw)
                .map(AttributeValue::Fixed)
                .map_err(de::Error::custom)
        }
    }
}

impl From<Distribution> for AttributeValue {
    fn from(d: Distribution) -> Self {
        AttributeValue::Distributed(d)
    }
}

impl From<Scalar> for AttributeValue {
    fn from(s: Scalar) -> Self {
        AttributeValue::Fixed(s)
    }
}

/// Optional bounds applied to sampled numeric values of one attribute.
///
/// Only built through [`Clamp::new`], so `min <= max` and both are finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawClamp")]
pub struct Clamp {
    min: f64,
    max: f64,
}

impl Clamp {
    pub fn new(min: f64, max: f64) -> Result<Self, SimError> {
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(SimError::profile(format!(
                "clamp range must satisfy finite min <= max (got [{min}, {max}])"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn apply(&self, x: f64) -> f64 {
        x.clamp(self.min, self.max)
    }
}

/// A named value inside an archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAttribute")]
pub struct Attribute {
    name: String,
    value: AttributeValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clamp: Option<Clamp>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<AttributeValue>) -> Result<Self, SimError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SimError::profile("attribute name must not be empty"));
        }
        Ok(Self {
            name,
            value: value.into(),
            unit: None,
            description: None,
            clamp: None,
        })
    }

    pub fn fixed(name: impl Into<String>, value: impl Into<Scalar>) -> Result<Self, SimError> {
        Self::new(name, AttributeValue::Fixed(value.into()))
    }

    pub fn distributed(name: impl Into<String>, d: Distribution) -> Result<Self, SimError> {
        Self::new(name, AttributeValue::Distributed(d))
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_clamp(mut self, clamp: Clamp) -> Self {
        self.clamp = Some(clamp);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn clamp(&self) -> Option<Clamp> {
        self.clamp
    }
}

/// A weighted grouping of attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawArchetype")]
pub struct Archetype {
    #[serde(rename = "type")]
    category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,
    attributes: Vec<Attribute>,
}

impl Archetype {
    pub fn new(category: impl Into<String>, attributes: Vec<Attribute>) -> Result<Self, SimError> {
        let category = category.into();
        if attributes.is_empty() {
            return Err(SimError::EmptyCollection {
                owner: format!("archetype '{category}'"),
                item: "attribute",
            });
        }
        {
            let mut seen = HashSet::with_capacity(attributes.len());
            for a in &attributes {
                if !seen.insert(a.name()) {
                    return Err(SimError::profile(format!(
                        "duplicate attribute '{}' in archetype '{category}'",
                        a.name()
                    )));
                }
            }
        }
        Ok(Self {
            category,
            name: None,
            weight: None,
            attributes,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Result<Self, SimError> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(SimError::profile(format!(
                "archetype weight must be in [0, 1] (got {weight})"
            )));
        }
        self.weight = Some(weight);
        Ok(self)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn weight(&self) -> Option<f64> {
        self.weight
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Name if given, otherwise the category.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.category)
    }
}

/// Root aggregate handed to the simulation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProfile")]
pub struct Profile {
    name: String,
    archetypes: Vec<Archetype>,
}

impl Profile {
    pub fn new(name: impl Into<String>, archetypes: Vec<Archetype>) -> Result<Self, SimError> {
        let name = name.into();
        if archetypes.is_empty() {
            return Err(SimError::EmptyCollection {
                owner: format!("profile '{name}'"),
                item: "archetype",
            });
        }
        Ok(Self { name, archetypes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    /// Attributes across all archetypes, in traversal order.
    pub fn attribute_count(&self) -> usize {
        self.archetypes.iter().map(|a| a.attributes.len()).sum()
    }

    /// Attributes whose value is drawn each trial.
    pub fn distributed_count(&self) -> usize {
        self.archetypes
            .iter()
            .flat_map(|a| a.attributes.iter())
            .filter(|a| a.value.is_distributed())
            .count()
    }
}

// ---------------------------------------------------------------------------
// Serialized mirrors; conversion runs the checked constructors.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawClamp {
    min: f64,
    max: f64,
}

impl TryFrom<RawClamp> for Clamp {
    type Error = SimError;

    fn try_from(raw: RawClamp) -> Result<Self, Self::Error> {
        Clamp::new(raw.min, raw.max)
    }
}

#[derive(Debug, Deserialize)]
struct RawAttribute {
    name: String,
    value: AttributeValue,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    clamp: Option<Clamp>,
}

impl TryFrom<RawAttribute> for Attribute {
    type Error = SimError;

    fn try_from(raw: RawAttribute) -> Result<Self, Self::Error> {
        let mut attr = Attribute::new(raw.name, raw.value)?;
        attr.unit = raw.unit;
        attr.description = raw.description;
        attr.clamp = raw.clamp;
        Ok(attr)
    }
}

#[derive(Debug, Deserialize)]
struct RawArchetype {
    #[serde(rename = "type", alias = "category")]
    category: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    attributes: Vec<Attribute>,
}

impl TryFrom<RawArchetype> for Archetype {
    type Error = SimError;

    fn try_from(raw: RawArchetype) -> Result<Self, Self::Error> {
        let mut archetype = Archetype::new(raw.category, raw.attributes)?;
        archetype.name = raw.name;
        if let Some(w) = raw.weight {
            archetype = archetype.with_weight(w)?;
        }
        Ok(archetype)
    }
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    name: String,
    #[serde(default)]
    archetypes: Vec<Archetype>,
}

impl TryFrom<RawProfile> for Profile {
    type Error = SimError;

    fn try_from(raw: RawProfile) -> Result<Self, Self::Error> {
        Profile::new(raw.name, raw.archetypes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn energy() -> Attribute {
        Attribute::distributed("energy", Distribution::normal(50.0, 5.0).unwrap()).unwrap()
    }

    #[test]
    fn empty_profile_is_rejected() {
        let err = Profile::new("Kai", vec![]).unwrap_err();
        assert!(matches!(err, SimError::EmptyCollection { item: "archetype", .. }));
    }

    #[test]
    fn empty_archetype_is_rejected() {
        let err = Archetype::new("digital", vec![]).unwrap_err();
        assert!(matches!(err, SimError::EmptyCollection { item: "attribute", .. }));
    }

    #[test]
    fn duplicate_attribute_names_are_rejected() {
        let err = Archetype::new("digital", vec![energy(), energy()]).unwrap_err();
        assert!(matches!(err, SimError::InvalidProfile { .. }));
    }

    #[test]
    fn blank_attribute_name_is_rejected() {
        assert!(Attribute::fixed("  ", 1).is_err());
    }

    #[test]
    fn weight_outside_unit_interval_is_rejected() {
        let a = Archetype::new("digital", vec![energy()]).unwrap();
        assert!(a.clone().with_weight(0.4).is_ok());
        assert!(a.with_weight(1.2).is_err());
    }

    #[test]
    fn label_prefers_name_over_category() {
        let a = Archetype::new("digital", vec![energy()]).unwrap();
        assert_eq!(a.label(), "digital");
        assert_eq!(a.with_name("Explorer").label(), "Explorer");
    }

    #[test]
    fn clamp_requires_ordered_bounds() {
        assert!(Clamp::new(0.0, 100.0).is_ok());
        assert!(Clamp::new(1.0, 1.0).is_ok());
        assert!(Clamp::new(2.0, 1.0).is_err());
        assert!(Clamp::new(f64::NAN, 1.0).is_err());
        assert!(Clamp::new(0.0, f64::INFINITY).is_err());
        assert_eq!(Clamp::new(0.0, 1.0).unwrap().apply(1.7), 1.0);
    }

    #[test]
    fn deserializes_fixed_and_distributed_values() {
        let yaml = r#"
name: Kai
archetypes:
  - type: digital
    name: Explorer
    weight: 0.6
    attributes:
      - name: energy
        value: {distribution: normal, mean: 50, stdDev: 5}
        unit: points
        clamp: {min: 0, max: 100}
      - name: label
        value: stable
      - name: curious
        value: true
"#;
        let p: Profile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(p.name(), "Kai");
        assert_eq!(p.attribute_count(), 3);
        assert_eq!(p.distributed_count(), 1);

        let arch = &p.archetypes()[0];
        assert_eq!(arch.label(), "Explorer");
        assert_eq!(arch.weight(), Some(0.6));
        assert_eq!(arch.attributes()[0].unit(), Some("points"));
        assert_eq!(arch.attributes()[0].clamp(), Some(Clamp::new(0.0, 100.0).unwrap()));
        assert_eq!(
            arch.attributes()[1].value(),
            &AttributeValue::Fixed(Scalar::Text("stable".to_string()))
        );
        assert_eq!(
            arch.attributes()[2].value(),
            &AttributeValue::Fixed(Scalar::Bool(true))
        );
    }

    #[test]
    fn deserialization_surfaces_distribution_errors() {
        let yaml = r#"
name: Kai
archetypes:
  - type: digital
    attributes:
      - name: mood
        value: {distribution: discrete, values: [a, b], weights: [0.5]}
"#;
        let err = serde_yaml::from_str::<Profile>(yaml).unwrap_err().to_string();
        assert!(err.contains("same length"), "{err}");
    }

    #[test]
    fn deserialization_rejects_inverted_clamp() {
        let yaml = r#"
name: x
value: {distribution: uniform, min: 0, max: 1}
clamp: {min: 5, max: 1}
"#;
        let err = serde_yaml::from_str::<Attribute>(yaml).unwrap_err().to_string();
        assert!(err.contains("clamp range"), "{err}");
    }

    #[test]
    fn deserialization_rejects_empty_archetype_list() {
        let err = serde_yaml::from_str::<Profile>("name: Kai\narchetypes: []\n")
            .unwrap_err()
            .to_string();
        assert!(err.contains("at least one archetype"), "{err}");
    }
}
