// src/config.rs
//
// Effective run settings.
//
// Each setting is taken from the first layer that provides it:
//   CLI flag > environment variable > profile document > built-in default
//
// Environment variables:
//   - TANZO_SIM_ITERATIONS  (u64, trial count)
//   - TANZO_SIM_SEED        (u64)
//   - TANZO_SIM_THREADS     (usize, >= 1)
//
// Any variable that fails to parse is ignored with a warning. Resolution
// takes the environment as a lookup function so tests never touch the real
// process environment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::simulate::{SimConfig, DEFAULT_TRIALS};

pub const ENV_ITERATIONS: &str = "TANZO_SIM_ITERATIONS";
pub const ENV_SEED: &str = "TANZO_SIM_SEED";
pub const ENV_THREADS: &str = "TANZO_SIM_THREADS";

/// Optional run parameters, as supplied by one layer (CLI flags or the
/// `simulation_parameters` block of a profile document).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    pub iterations: Option<u64>,
    pub seed: Option<u64>,
    pub threads: Option<usize>,
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingSource {
    Cli,
    Env,
    Document,
    Default,
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SettingSource::Cli => "cli",
            SettingSource::Env => "env",
            SettingSource::Document => "document",
            SettingSource::Default => "default",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Setting<T> {
    pub value: T,
    pub source: SettingSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedSettings {
    pub trials: Setting<u64>,
    pub seed: Setting<Option<u64>>,
    pub threads: Setting<usize>,
}

impl ResolvedSettings {
    /// Resolve against the real process environment.
    pub fn resolve(cli: &SimulationParameters, document: &SimulationParameters) -> Self {
        Self::resolve_with(cli, document, |key| std::env::var(key).ok())
    }

    pub fn resolve_with<F>(
        cli: &SimulationParameters,
        document: &SimulationParameters,
        env: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_trials = env_value::<u64, _>(&env, ENV_ITERATIONS, |_| true);
        let env_seed = env_value::<u64, _>(&env, ENV_SEED, |_| true);
        let env_threads = env_value::<usize, _>(&env, ENV_THREADS, |&t| t >= 1);

        let doc_threads = document.threads.filter(|&t| {
            if t == 0 {
                warn!("ignoring simulation_parameters.threads = 0 in profile document");
            }
            t >= 1
        });

        Self {
            trials: pick(cli.iterations, env_trials, document.iterations, DEFAULT_TRIALS),
            seed: pick(
                cli.seed.map(Some),
                env_seed.map(Some),
                document.seed.map(Some),
                None,
            ),
            threads: pick(cli.threads, env_threads, doc_threads, 1),
        }
    }

    /// Emit one line per setting at info level.
    pub fn log_startup(&self) {
        info!(
            value = self.trials.value,
            source = %self.trials.source,
            "setting trials"
        );
        match self.seed.value {
            Some(seed) => info!(value = seed, source = %self.seed.source, "setting seed"),
            None => info!(source = %self.seed.source, "setting seed: none (entropy)"),
        }
        info!(
            value = self.threads.value,
            source = %self.threads.source,
            "setting threads"
        );
    }

    /// Overlay the resolved values onto `base`.
    pub fn apply(&self, base: SimConfig) -> SimConfig {
        SimConfig {
            trials: self.trials.value,
            seed: self.seed.value,
            threads: self.threads.value,
            ..base
        }
    }
}

fn pick<T>(cli: Option<T>, env: Option<T>, document: Option<T>, default: T) -> Setting<T> {
    let layers = [
        (cli, SettingSource::Cli),
        (env, SettingSource::Env),
        (document, SettingSource::Document),
    ];
    for (value, source) in layers {
        if let Some(value) = value {
            return Setting { value, source };
        }
    }
    Setting {
        value: default,
        source: SettingSource::Default,
    }
}

fn env_value<T, F>(env: &F, key: &str, valid: fn(&T) -> bool) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = env(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) if valid(&v) => Some(v),
        _ => {
            warn!(key, raw = raw.as_str(), "ignoring unparseable environment override");
            None
        }
    }
}
