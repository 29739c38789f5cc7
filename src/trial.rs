// src/trial.rs
//
// Trial runner: N independent passes over a profile.
//
// Each trial walks archetypes then attributes in profile order. Distributed
// attributes are sampled (and clamped if the attribute asks for it); fixed
// attributes pass through unchanged. Trials are produced lazily so callers
// can aggregate without keeping them, and can stop between trials.
//
// Randomness comes from one of two stream layouts:
// - Shared:   one generator consumed by every trial in order (canonical).
// - PerTrial: trial i gets `seeded(base + i)`; any slice of trials can run
//             anywhere and still produce the same values.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::error::SimError;
use crate::profile::{Attribute, AttributeValue, Profile};
use crate::rng::{seeded, trial_seed};
use crate::sampler::sample;
use crate::types::{AttributeKey, Scalar};

/// One sampled (or passed-through) value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledValue {
    pub key: Arc<AttributeKey>,
    pub value: Scalar,
}

/// Output of a single trial, in profile traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial: u64,
    pub values: Vec<SampledValue>,
}

impl TrialResult {
    pub fn get(&self, archetype: &str, attribute: &str) -> Option<&Scalar> {
        self.values
            .iter()
            .find(|v| v.key.matches(archetype, attribute))
            .map(|v| &v.value)
    }
}

/// Cooperative cancellation flag shared between a caller and running trials.
///
/// Checked before each trial starts; a trial in progress always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// How trials obtain their random streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StreamMode {
    #[default]
    Shared,
    PerTrial,
}

/// A validated plan for running trials over one profile.
///
/// Construction performs every check that could otherwise fail mid-run, so
/// the trials it yields never fail for a well-formed generator. Cloning is
/// cheap: keys are shared and attributes are borrowed from the profile.
#[derive(Debug, Clone)]
pub struct TrialRunner<'p> {
    profile: &'p Profile,
    trial_count: u64,
    slots: Vec<Slot<'p>>,
}

#[derive(Debug, Clone)]
struct Slot<'p> {
    key: Arc<AttributeKey>,
    attribute: &'p Attribute,
}

impl<'p> TrialRunner<'p> {
    /// Fails with `InvalidTrialCount` for zero trials and with
    /// `DegenerateWeights` for any discrete attribute that cannot be drawn.
    pub fn new(profile: &'p Profile, trial_count: u64) -> Result<Self, SimError> {
        if trial_count == 0 {
            return Err(SimError::InvalidTrialCount { count: 0 });
        }
        Self::build(profile, trial_count)
    }

    /// Like `new` but accepts zero trials (empty-summary mode).
    pub fn allowing_empty(profile: &'p Profile, trial_count: u64) -> Result<Self, SimError> {
        Self::build(profile, trial_count)
    }

    fn build(profile: &'p Profile, trial_count: u64) -> Result<Self, SimError> {
        let mut slots = Vec::with_capacity(profile.attribute_count());
        for (index, archetype) in profile.archetypes().iter().enumerate() {
            for attribute in archetype.attributes() {
                let key = AttributeKey::new(index, archetype.label(), attribute.name());
                if let AttributeValue::Distributed(Distribution::Discrete(d)) = attribute.value() {
                    if d.is_degenerate() {
                        return Err(SimError::DegenerateWeights {
                            archetype: key.archetype.clone(),
                            attribute: key.attribute.clone(),
                        });
                    }
                }
                slots.push(Slot { key, attribute });
            }
        }
        Ok(Self {
            profile,
            trial_count,
            slots,
        })
    }

    pub fn profile(&self) -> &'p Profile {
        self.profile
    }

    pub fn trial_count(&self) -> u64 {
        self.trial_count
    }

    /// Attribute keys in traversal order.
    pub fn keys(&self) -> impl Iterator<Item = &Arc<AttributeKey>> + '_ {
        self.slots.iter().map(|s| &s.key)
    }

    /// All trials, every one drawing from the shared generator `rng`.
    pub fn shared<R: RngCore>(&self, rng: R) -> Trials<'p, R> {
        Trials::new(self.clone(), Streams::Shared(rng), 0, self.trial_count)
    }

    /// Trials `start..end`, each on its own stream derived from `base_seed`.
    pub fn per_trial(&self, base_seed: u64, start: u64, end: u64) -> Trials<'p, NoSharedRng> {
        let end = end.min(self.trial_count);
        Trials::new(
            self.clone(),
            Streams::PerTrial { base_seed },
            start.min(end),
            end,
        )
    }

    /// Run one trial against the given generator.
    pub fn run_trial<R: RngCore + ?Sized>(
        &self,
        trial: u64,
        rng: &mut R,
    ) -> Result<TrialResult, SimError> {
        let mut values = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let value = match slot.attribute.value() {
                AttributeValue::Fixed(v) => v.clone(),
                AttributeValue::Distributed(d) => {
                    let drawn = sample(d, rng).map_err(|e| e.located(&slot.key))?;
                    match (drawn, slot.attribute.clamp()) {
                        (Scalar::Number(x), Some(c)) => Scalar::Number(c.apply(x)),
                        (other, _) => other,
                    }
                }
            };
            values.push(SampledValue {
                key: Arc::clone(&slot.key),
                value,
            });
        }
        Ok(TrialResult { trial, values })
    }
}

/// Validate and start a lazy run of `trial_count` trials over one shared
/// generator.
pub fn run_trials<R: RngCore>(
    profile: &Profile,
    trial_count: u64,
    rng: R,
) -> Result<Trials<'_, R>, SimError> {
    Ok(TrialRunner::new(profile, trial_count)?.shared(rng))
}

/// Placeholder generator type for per-trial streams, which never draw from a
/// shared generator.
#[derive(Debug)]
pub enum NoSharedRng {}

impl RngCore for NoSharedRng {
    fn next_u32(&mut self) -> u32 {
        match *self {}
    }

    fn next_u64(&mut self) -> u64 {
        match *self {}
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        match *self {}
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        match *self {}
    }
}

enum Streams<R> {
    Shared(R),
    PerTrial { base_seed: u64 },
}

/// Lazy iterator over trial results.
pub struct Trials<'p, R> {
    runner: TrialRunner<'p>,
    streams: Streams<R>,
    next: u64,
    end: u64,
    cancel: Option<CancelToken>,
    cancelled: bool,
}

impl<'p, R: RngCore> Trials<'p, R> {
    fn new(runner: TrialRunner<'p>, streams: Streams<R>, start: u64, end: u64) -> Self {
        Self {
            runner,
            streams,
            next: start,
            end,
            cancel: None,
            cancelled: false,
        }
    }

    /// Stop producing trials once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// True if generation stopped early because of cancellation.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// Trials not yet produced.
    pub fn remaining(&self) -> u64 {
        self.end - self.next
    }
}

impl<R: RngCore> Iterator for Trials<'_, R> {
    type Item = Result<TrialResult, SimError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end || self.cancelled {
            return None;
        }
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            self.cancelled = true;
            return None;
        }

        let trial = self.next;
        self.next += 1;
        let result = match &mut self.streams {
            Streams::Shared(rng) => self.runner.run_trial(trial, rng),
            Streams::PerTrial { base_seed } => {
                let mut rng = seeded(trial_seed(*base_seed, trial));
                self.runner.run_trial(trial, &mut rng)
            }
        };
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        if self.cancel.is_some() {
            (0, Some(n))
        } else {
            (n, Some(n))
        }
    }
}
