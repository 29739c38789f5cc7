// src/aggregate.rs
//
// Reduce trial results into per-attribute statistics.
//
// Values are grouped by attribute key (archetype position + label, attribute
// name). A group is numeric only if every value in it is a number; one
// text/bool value makes the whole group categorical. Numeric groups keep
// their raw values until `finish`, so partial aggregators can be merged in
// trial order and still give the same medians and quantiles as a sequential
// pass. Categorical groups only keep per-label counts.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;

use crate::metrics::{quantile_sorted, sorted_copy, OnlineStats};
use crate::trial::TrialResult;
use crate::types::{AttributeKey, Scalar};

/// Statistics for an all-numeric group.
///
/// An empty group reports `count == 0` with every other field NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericStats {
    pub count: u64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub p05: f64,
    pub p95: f64,
}

impl NumericStats {
    pub fn from_values(values: &[f64]) -> Self {
        let online: OnlineStats = values.iter().copied().collect();
        let sorted = sorted_copy(values);
        Self {
            count: online.n(),
            mean: online.mean(),
            median: quantile_sorted(&sorted, 0.5),
            min: online.min(),
            max: online.max(),
            std_dev: online.stddev_population(),
            p05: quantile_sorted(&sorted, 0.05),
            p95: quantile_sorted(&sorted, 0.95),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Relative frequency of each distinct label in a categorical group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalStats {
    pub count: u64,
    pub relative_frequencies: BTreeMap<String, f64>,
}

impl CategoricalStats {
    pub fn from_labels<S: AsRef<str>>(labels: impl IntoIterator<Item = S>) -> Self {
        let mut counts = LabelCounts::default();
        for label in labels {
            counts.add_label(label.as_ref(), 1);
        }
        counts.into_stats()
    }

    /// Zero for a label never observed.
    pub fn frequency(&self, label: &str) -> f64 {
        self.relative_frequencies.get(label).copied().unwrap_or(0.0)
    }

    /// Labels by descending frequency; ties keep label order.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .relative_frequencies
            .iter()
            .map(|(label, f)| (label.as_str(), *f))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeStats {
    Numeric(NumericStats),
    Categorical(CategoricalStats),
}

impl AttributeStats {
    /// Numeric iff every value is a number (an empty group is numeric).
    pub fn from_scalars(values: &[Scalar]) -> Self {
        let numbers: Option<Vec<f64>> = values.iter().map(Scalar::as_number).collect();
        match numbers {
            Some(numbers) => AttributeStats::Numeric(NumericStats::from_values(&numbers)),
            None => AttributeStats::Categorical(CategoricalStats::from_labels(
                values.iter().map(Scalar::label),
            )),
        }
    }

    pub fn count(&self) -> u64 {
        match self {
            AttributeStats::Numeric(n) => n.count,
            AttributeStats::Categorical(c) => c.count,
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericStats> {
        match self {
            AttributeStats::Numeric(n) => Some(n),
            AttributeStats::Categorical(_) => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&CategoricalStats> {
        match self {
            AttributeStats::Categorical(c) => Some(c),
            AttributeStats::Numeric(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSummary {
    #[serde(flatten)]
    pub key: Arc<AttributeKey>,
    pub stats: AttributeStats,
}

/// Per-attribute statistics in profile order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub trials: u64,
    pub attributes: Vec<AttributeSummary>,
}

impl Summary {
    /// Stats for the first archetype labelled `archetype`.
    pub fn get(&self, archetype: &str, attribute: &str) -> Option<&AttributeStats> {
        self.attributes
            .iter()
            .find(|a| a.key.matches(archetype, attribute))
            .map(|a| &a.stats)
    }

    pub fn numeric(&self, archetype: &str, attribute: &str) -> Option<&NumericStats> {
        self.get(archetype, attribute)?.as_numeric()
    }

    pub fn categorical(&self, archetype: &str, attribute: &str) -> Option<&CategoricalStats> {
        self.get(archetype, attribute)?.as_categorical()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Occurrences per label, plus the total.
#[derive(Debug, Clone, Default, PartialEq)]
struct LabelCounts {
    counts: BTreeMap<String, u64>,
    total: u64,
}

impl LabelCounts {
    fn add_label(&mut self, label: &str, n: u64) {
        match self.counts.get_mut(label) {
            Some(c) => *c += n,
            None => {
                self.counts.insert(label.to_string(), n);
            }
        }
        self.total += n;
    }

    fn add(&mut self, value: &Scalar) {
        match value {
            Scalar::Text(s) => self.add_label(s, 1),
            other => self.add_label(&other.label(), 1),
        }
    }

    fn add_numbers(&mut self, numbers: &[f64]) {
        for &x in numbers {
            self.add_label(&Scalar::Number(x).label(), 1);
        }
    }

    fn absorb(&mut self, other: LabelCounts) {
        for (label, n) in other.counts {
            *self.counts.entry(label).or_default() += n;
        }
        self.total += other.total;
    }

    fn into_stats(self) -> CategoricalStats {
        let total = self.total;
        let relative_frequencies = self
            .counts
            .into_iter()
            .map(|(label, n)| (label, n as f64 / total as f64))
            .collect();
        CategoricalStats {
            count: total,
            relative_frequencies,
        }
    }
}

/// What a group has seen so far. Starts numeric and turns categorical at
/// the first non-numeric value; it never turns back.
#[derive(Debug, Clone)]
enum Observations {
    Numeric(Vec<f64>),
    Categorical(LabelCounts),
}

impl Default for Observations {
    fn default() -> Self {
        Observations::Numeric(Vec::new())
    }
}

impl Observations {
    fn push(&mut self, value: &Scalar) {
        match self {
            Observations::Numeric(xs) => match value.as_number() {
                Some(x) => xs.push(x),
                None => {
                    let mut counts = LabelCounts::default();
                    counts.add_numbers(xs);
                    counts.add(value);
                    *self = Observations::Categorical(counts);
                }
            },
            Observations::Categorical(counts) => counts.add(value),
        }
    }

    fn merge(&mut self, other: Observations) {
        match (self, other) {
            (Observations::Numeric(xs), Observations::Numeric(ys)) => xs.extend(ys),
            (this, other) => {
                let mut counts = std::mem::take(this).into_counts();
                counts.absorb(other.into_counts());
                *this = Observations::Categorical(counts);
            }
        }
    }

    fn into_counts(self) -> LabelCounts {
        match self {
            Observations::Numeric(xs) => {
                let mut counts = LabelCounts::default();
                counts.add_numbers(&xs);
                counts
            }
            Observations::Categorical(counts) => counts,
        }
    }

    fn into_stats(self) -> AttributeStats {
        match self {
            Observations::Numeric(xs) => AttributeStats::Numeric(NumericStats::from_values(&xs)),
            Observations::Categorical(counts) => AttributeStats::Categorical(counts.into_stats()),
        }
    }
}

#[derive(Debug, Clone)]
struct Group {
    key: Arc<AttributeKey>,
    observations: Observations,
}

/// Incremental grouping of trial values.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    groups: Vec<Group>,
    index: HashMap<Arc<AttributeKey>, usize>,
    trials: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator with groups declared up front, in the given order.
    pub fn with_keys<'k>(keys: impl IntoIterator<Item = &'k Arc<AttributeKey>>) -> Self {
        let mut agg = Self::new();
        for key in keys {
            agg.register(key);
        }
        agg
    }

    /// Declare a group so it appears in the summary even with no values.
    pub fn register(&mut self, key: &Arc<AttributeKey>) -> usize {
        if let Some(&slot) = self.index.get(key) {
            return slot;
        }
        let slot = self.groups.len();
        self.groups.push(Group {
            key: Arc::clone(key),
            observations: Observations::default(),
        });
        self.index.insert(Arc::clone(key), slot);
        slot
    }

    pub fn push(&mut self, trial: &TrialResult) {
        for (pos, sampled) in trial.values.iter().enumerate() {
            // Trials from one runner share key allocations and order.
            let slot = match self.groups.get(pos) {
                Some(g) if Arc::ptr_eq(&g.key, &sampled.key) => pos,
                _ => self.register(&sampled.key),
            };
            self.groups[slot].observations.push(&sampled.value);
        }
        self.trials += 1;
    }

    /// Append everything `other` observed after what this one observed.
    pub fn merge(&mut self, other: Aggregator) {
        for group in other.groups {
            let slot = self.register(&group.key);
            self.groups[slot].observations.merge(group.observations);
        }
        self.trials += other.trials;
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn finish(self) -> Summary {
        let attributes = self
            .groups
            .into_iter()
            .map(|g| AttributeSummary {
                stats: g.observations.into_stats(),
                key: g.key,
            })
            .collect();
        Summary {
            trials: self.trials,
            attributes,
        }
    }
}

/// Group and summarize a finished collection of trials.
pub fn aggregate<T: Borrow<TrialResult>>(trials: impl IntoIterator<Item = T>) -> Summary {
    let mut agg = Aggregator::new();
    for trial in trials {
        agg.push(trial.borrow());
    }
    agg.finish()
}
