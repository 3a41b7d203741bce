//! Configuration loading from pulse.toml
//!
//! Profiler defaults can be specified in a `pulse.toml` file in the project
//! root. The file is discovered by walking up from the current directory,
//! and its values translate into a [`SettingsOverride`] that replays onto
//! the built-in defaults.

use crate::settings::{ExecutionKind, SettingsOverride};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level pulse.toml contents.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PulseConfig {
    /// Profiler defaults
    #[serde(default)]
    pub profiler: ProfilerConfig,
}

/// Profiler defaults section. Every field is optional; an absent field
/// leaves the built-in default untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfilerConfig {
    /// Run duration (e.g., "500ms", "5s")
    #[serde(default)]
    pub duration: Option<String>,
    /// Fixed iteration count; wins over `duration` when both are set
    #[serde(default)]
    pub iterations: Option<u64>,
    /// Dispatch pacing interval (e.g., "10ms")
    #[serde(default)]
    pub interval: Option<String>,
    /// Whether a warmup invocation precedes the measured run
    #[serde(default)]
    pub warmup: Option<bool>,
    /// Number of worker threads per session
    #[serde(default)]
    pub threads: Option<usize>,
}

impl PulseConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from the
    /// current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("pulse.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Translate the configured fields into a settings override.
    ///
    /// Duration is applied before iterations, so an explicit iteration
    /// count selects the iteration-bounded runner when both are present.
    pub fn to_override(&self) -> anyhow::Result<SettingsOverride> {
        let mut overrides = SettingsOverride::new();

        if let Some(duration) = &self.profiler.duration {
            overrides.set_duration(parse_duration(duration)?);
        }
        if let Some(iterations) = self.profiler.iterations {
            overrides.set_iterations(iterations);
        }
        if let Some(interval) = &self.profiler.interval {
            overrides.set_execution(ExecutionKind::Paced(parse_duration(interval)?));
        }
        if let Some(warmup) = self.profiler.warmup {
            overrides.set_warmup(warmup);
        }

        Ok(overrides)
    }

    /// Configured worker thread count, when set
    pub fn threads(&self) -> Option<usize> {
        self.profiler.threads
    }
}

/// Parse a duration string (e.g., "3s", "500ms", "2m").
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("Empty duration string"));
    }

    // Find where the number ends and unit begins
    let (num_part, unit_part) = s
        .char_indices()
        .find(|(_, c)| c.is_alphabetic())
        .map(|(i, _)| s.split_at(i))
        .unwrap_or((s, "s"));

    let value: f64 = num_part
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;

    let multiplier: u64 = match unit_part.to_lowercase().as_str() {
        "ns" => 1,
        "us" => 1_000,
        "ms" => 1_000_000,
        "s" | "" => 1_000_000_000,
        "m" | "min" => 60_000_000_000,
        _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
    };

    Ok(Duration::from_nanos((value * multiplier as f64) as u64))
}
