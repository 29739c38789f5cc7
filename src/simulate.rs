// src/simulate.rs
//
// Simulation entry points: validate, run trials, aggregate.
//
// Single-threaded runs follow the configured stream mode. Multi-threaded runs
// always use per-trial streams: the trial range is cut into one contiguous
// chunk per worker, each chunk aggregates on its own, and the chunk
// aggregators are merged back in trial order. The result is identical to a
// single-threaded per-trial run with the same seed.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use rayon::prelude::*;

use crate::aggregate::{Aggregator, AttributeStats, Summary};
use crate::error::SimError;
use crate::profile::Profile;
use crate::rng::{entropy_seed, from_entropy, seeded};
use crate::trial::{CancelToken, StreamMode, TrialResult, TrialRunner, Trials};

pub const DEFAULT_TRIALS: u64 = 100;

/// Knobs for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub trials: u64,
    /// `None` draws randomness from OS entropy.
    pub seed: Option<u64>,
    pub threads: usize,
    pub streams: StreamMode,
    /// Accept `trials == 0` and report NaN statistics instead of failing.
    pub allow_empty: bool,
    /// Keep every `TrialResult` in the report.
    pub retain_trials: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: None,
            threads: 1,
            streams: StreamMode::Shared,
            allow_empty: false,
            retain_trials: false,
        }
    }
}

impl SimConfig {
    pub fn new(trials: u64) -> Self {
        Self {
            trials,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_streams(mut self, streams: StreamMode) -> Self {
        self.streams = streams;
        self
    }

    pub fn allow_empty(mut self, yes: bool) -> Self {
        self.allow_empty = yes;
        self
    }

    pub fn retain_trials(mut self, yes: bool) -> Self {
        self.retain_trials = yes;
        self
    }
}

/// Everything a run produced, plus what is needed to replay it.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub profile_name: String,
    pub requested_trials: u64,
    pub completed_trials: u64,
    /// The seed actually used. Drawn from entropy for unseeded per-trial runs.
    pub seed: Option<u64>,
    pub threads: usize,
    pub stream_mode: StreamMode,
    pub cancelled: bool,
    pub checksum: String,
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_trials: Option<Vec<TrialResult>>,
}

/// Run `trial_count` trials over `profile` and summarize them.
///
/// With `seed` the result is bit-for-bit reproducible; without it the run
/// draws from OS entropy.
pub fn simulate(profile: &Profile, trial_count: u64, seed: Option<u64>) -> Result<Summary, SimError> {
    let config = SimConfig {
        trials: trial_count,
        seed,
        ..SimConfig::default()
    };
    Ok(Simulator::new(config).run(profile)?.summary)
}

#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimConfig,
}

/// What one worker (or the single sequential pass) produced.
#[derive(Default)]
struct Partial {
    aggregator: Aggregator,
    retained: Vec<TrialResult>,
    cancelled: bool,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn run(&self, profile: &Profile) -> Result<SimulationReport, SimError> {
        self.run_with_cancel(profile, &CancelToken::new())
    }

    /// Run until done or until `cancel` is set. A cancelled run summarizes
    /// only the trials that completed.
    pub fn run_with_cancel(
        &self,
        profile: &Profile,
        cancel: &CancelToken,
    ) -> Result<SimulationReport, SimError> {
        let cfg = &self.config;
        let runner = if cfg.allow_empty {
            TrialRunner::allowing_empty(profile, cfg.trials)?
        } else {
            TrialRunner::new(profile, cfg.trials)?
        };

        let threads = cfg.threads.max(1);
        let stream_mode = if threads > 1 {
            StreamMode::PerTrial
        } else {
            cfg.streams
        };
        let seed = match (stream_mode, cfg.seed) {
            (_, Some(seed)) => Some(seed),
            (StreamMode::PerTrial, None) => Some(entropy_seed()),
            (StreamMode::Shared, None) => None,
        };

        debug!(
            profile = profile.name(),
            trials = cfg.trials,
            ?seed,
            threads,
            ?stream_mode,
            "simulation start"
        );

        let partial = match (stream_mode, seed) {
            (StreamMode::PerTrial, Some(base)) if threads > 1 => {
                self.run_chunks(&runner, base, threads, cancel)?
            }
            (StreamMode::PerTrial, Some(base)) => {
                let trials = runner.per_trial(base, 0, cfg.trials);
                self.drain(&runner, trials, cancel)?
            }
            (_, Some(s)) => self.drain(&runner, runner.shared(seeded(s)), cancel)?,
            (_, None) => self.drain(&runner, runner.shared(from_entropy()), cancel)?,
        };

        let summary = partial.aggregator.finish();
        let completed = summary.trials;
        if partial.cancelled {
            warn!(
                completed,
                requested = cfg.trials,
                "simulation cancelled before all trials ran"
            );
        }
        debug!(completed, attributes = summary.len(), "simulation finished");

        Ok(SimulationReport {
            profile_name: profile.name().to_string(),
            requested_trials: cfg.trials,
            completed_trials: completed,
            seed,
            threads,
            stream_mode,
            cancelled: partial.cancelled,
            checksum: summary_checksum(&summary, seed),
            summary,
            raw_trials: cfg.retain_trials.then_some(partial.retained),
        })
    }

    fn drain<R: RngCore>(
        &self,
        runner: &TrialRunner<'_>,
        trials: Trials<'_, R>,
        cancel: &CancelToken,
    ) -> Result<Partial, SimError> {
        let mut partial = Partial {
            aggregator: Aggregator::with_keys(runner.keys()),
            ..Partial::default()
        };
        let mut trials = trials.with_cancel(cancel.clone());
        for result in trials.by_ref() {
            let trial = result?;
            partial.aggregator.push(&trial);
            if self.config.retain_trials {
                partial.retained.push(trial);
            }
        }
        partial.cancelled = trials.cancelled();
        Ok(partial)
    }

    fn run_chunks(
        &self,
        runner: &TrialRunner<'_>,
        base_seed: u64,
        threads: usize,
        cancel: &CancelToken,
    ) -> Result<Partial, SimError> {
        let ranges = chunk_ranges(self.config.trials, threads);
        let work = |&(start, end): &(u64, u64)| {
            debug!(start, end, "trial chunk");
            self.drain(runner, runner.per_trial(base_seed, start, end), cancel)
        };

        let parts: Vec<Partial> = match rayon::ThreadPoolBuilder::new()
            .num_threads(pool_size(threads, ranges.len()))
            .build()
        {
            Ok(pool) => pool.install(|| {
                ranges
                    .par_iter()
                    .map(work)
                    .collect::<Result<Vec<_>, SimError>>()
            })?,
            Err(err) => {
                warn!(%err, "thread pool unavailable; running chunks on the caller thread");
                ranges
                    .iter()
                    .map(work)
                    .collect::<Result<Vec<_>, SimError>>()?
            }
        };

        let mut merged = Partial {
            aggregator: Aggregator::with_keys(runner.keys()),
            ..Partial::default()
        };
        for part in parts {
            merged.aggregator.merge(part.aggregator);
            merged.retained.extend(part.retained);
            merged.cancelled |= part.cancelled;
        }
        Ok(merged)
    }
}

/// Workers beyond one per chunk would sit idle.
fn pool_size(threads: usize, chunks: usize) -> usize {
    threads.min(chunks).max(1)
}

/// Split `0..total` into at most `parts` contiguous, near-equal ranges.
fn chunk_ranges(total: u64, parts: usize) -> Vec<(u64, u64)> {
    let parts = (parts.max(1) as u64).min(total.max(1));
    let base = total / parts;
    let extra = total % parts;
    let mut ranges = Vec::with_capacity(parts as usize);
    let mut start = 0;
    for i in 0..parts {
        let len = base + u64::from(i < extra);
        ranges.push((start, start + len));
        start += len;
    }
    ranges
}

/// SHA-256 over the seed and every statistic in summary order.
///
/// Floats are hashed by bit pattern, so two summaries share a checksum only
/// if they are bit-identical.
pub fn summary_checksum(summary: &Summary, seed: Option<u64>) -> String {
    let mut hasher = Sha256::new();

    match seed {
        Some(s) => {
            hasher.update([1u8]);
            hasher.update(s.to_le_bytes());
        }
        None => hasher.update([0u8]),
    }
    hasher.update(summary.trials.to_le_bytes());

    for attr in &summary.attributes {
        hasher.update((attr.key.archetype_index as u64).to_le_bytes());
        hash_str(&mut hasher, &attr.key.archetype);
        hash_str(&mut hasher, &attr.key.attribute);
        match &attr.stats {
            AttributeStats::Numeric(n) => {
                hasher.update([b'n']);
                hasher.update(n.count.to_le_bytes());
                for x in [n.mean, n.median, n.min, n.max, n.std_dev, n.p05, n.p95] {
                    hasher.update(x.to_bits().to_le_bytes());
                }
            }
            AttributeStats::Categorical(c) => {
                hasher.update([b'c']);
                hasher.update(c.count.to_le_bytes());
                for (label, f) in &c.relative_frequencies {
                    hash_str(&mut hasher, label);
                    hasher.update(f.to_bits().to_le_bytes());
                }
            }
        }
    }

    hex_encode(&hasher.finalize())
}

fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
