//! tanzo_sim core library.
//!
//! Monte Carlo simulation over personality profiles: each profile holds
//! archetypes, each archetype holds attributes that are either fixed values
//! or probability distributions. A run samples every attribute once per
//! trial and reduces the trials to per-attribute statistics. The binary
//! (`src/bin/simulate.rs`) is a thin file-in / digest-out harness around
//! these components.

pub mod aggregate;
pub mod config;
pub mod distribution;
pub mod error;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod profile;
pub mod report;
pub mod rng;
pub mod sampler;
pub mod simulate;
pub mod trial;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use aggregate::{
    aggregate, Aggregator, AttributeStats, AttributeSummary, CategoricalStats, NumericStats,
    Summary,
};

pub use config::{ResolvedSettings, SettingSource, SimulationParameters};

pub use distribution::{Discrete, Distribution, Normal, Uniform};

pub use error::SimError;

pub use io::{load_profile_document, write_report, OutputFormat, ProfileDocument};

pub use profile::{Archetype, Attribute, AttributeValue, Clamp, Profile};

pub use sampler::sample;

pub use simulate::{simulate, SimConfig, SimulationReport, Simulator};

pub use trial::{run_trials, CancelToken, SampledValue, StreamMode, TrialResult, TrialRunner, Trials};

pub use types::{AttributeKey, Scalar};
