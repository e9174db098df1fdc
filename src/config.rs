use crate::consts::{DEFAULT_REGION, DEFAULT_WINDOW};
use crate::error::{TunerError, TunerResult};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{info, warn};

pub const ENV_VERBOSE: &str = "COALESCE_VERBOSE";
pub const ENV_WINDOW: &str = "COALESCE_WINDOW";
pub const ENV_STRATEGY: &str = "COALESCE_STRATEGY";
pub const ENV_HISTORY: &str = "COALESCE_HISTORY";
pub const ENV_SPACE: &str = "COALESCE_SPACE";
pub const ENV_SEED: &str = "COALESCE_SEED";

/// Search strategy tag. Parsing is case-insensitive.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    EnumString,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    Exhaustive,
    Random,
    #[default]
    NelderMead,
    ParallelRankOrder,
}

impl Strategy {
    /// Resolves a user-supplied strategy name. Empty or unknown names fall
    /// back to `NelderMead`; unknown names also emit a warning.
    pub fn from_setting(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            info!("Using default tuning strategy ({})", Strategy::default());
            return Strategy::default();
        }

        match trimmed.parse::<Strategy>() {
            Ok(strategy) => {
                info!("Using {} tuning strategy.", strategy);
                strategy
            }
            Err(_) => {
                warn!(
                    "Invalid tuning strategy setting: {}. Will use default of {}.",
                    trimmed,
                    Strategy::default()
                );
                Strategy::default()
            }
        }
    }
}

fn strategy_setting(raw: &str) -> Result<Strategy, String> {
    Ok(Strategy::from_setting(raw))
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Log per-dispatch decisions and the active tuning space.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    /// Trigger firings each candidate is held before it is measured.
    #[arg(long, default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    #[arg(long, default_value_t = Strategy::NelderMead, value_parser = strategy_setting)]
    pub strategy: Strategy,

    /// CSV file used to seed and record tuning outcomes.
    #[arg(long)]
    pub history_file: Option<PathBuf>,

    /// JSON document overriding the built-in tuning space.
    #[arg(long)]
    pub space_file: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_REGION)]
    pub region: String,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            window: DEFAULT_WINDOW,
            strategy: Strategy::default(),
            history_file: None,
            space_file: None,
            region: DEFAULT_REGION.to_string(),
            seed: None,
        }
    }
}

impl TunerConfig {
    /// Reads the `COALESCE_*` process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup. Malformed values
    /// are reported and replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if lookup(ENV_VERBOSE).is_some() {
            config.verbose = true;
        }

        if let Some(raw) = lookup(ENV_WINDOW) {
            config.window = parse_window(&raw);
        }
        if config.verbose {
            info!("tuning window = {}", config.window);
        }

        config.strategy = Strategy::from_setting(&lookup(ENV_STRATEGY).unwrap_or_default());

        config.history_file = lookup(ENV_HISTORY)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        config.space_file = lookup(ENV_SPACE)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        if let Some(raw) = lookup(ENV_SEED) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => config.seed = Some(seed),
                Err(_) => warn!("Invalid setting for {}: '{}'. Ignoring.", ENV_SEED, raw),
            }
        }

        config
    }

    /// History persistence is active only for a non-empty path.
    pub fn history_path(&self) -> Option<&Path> {
        self.history_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn use_history(&self) -> bool {
        self.history_path().is_some()
    }

    /// Rejects settings that bypassed environment parsing (flags, serde, or
    /// struct literals) and cannot be defaulted sensibly.
    pub fn validate(&self) -> TunerResult<()> {
        if self.window == 0 {
            return Err(TunerError::Config("window must be at least 1".to_string()));
        }
        if self.region.trim().is_empty() {
            return Err(TunerError::Config("region name must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_window(raw: &str) -> usize {
    match raw.trim().parse::<usize>() {
        Ok(w) if w >= 1 => w,
        _ => {
            warn!(
                "Invalid setting for {}: '{}'. Will use default of {}.",
                ENV_WINDOW, raw, DEFAULT_WINDOW
            );
            DEFAULT_WINDOW
        }
    }
}
