//! Runner configuration from environment variables.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `CONVEYOR_SEED` | from system time | RNG seed |
//! | `CONVEYOR_START_LEVEL` | 1 | First level played |
//! | `CONVEYOR_REMATCH` | `once` | `once` or `every` |
//! | `CONVEYOR_PREVIEW_MS` | 4000 | Order preview length |
//! | `CONVEYOR_FRAME_MS` | 16 | Driver frame interval |
//! | `CONVEYOR_SPEED` | 1 | Game milliseconds per wall-clock millisecond |
//! | `CONVEYOR_EVENT_LOG` | unset | JSONL event log path |
//! | `CONVEYOR_LOG` | `info` | tracing filter |
//! | `CONVEYOR_LOG_FILE` | unset | tracing output file (stderr otherwise) |
//! | `CONVEYOR_ATTEMPTS` | 5 | Attempts played by the autoplay binary |
//!
//! Values that fail to parse fall back to their defaults.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use conveyor_sorter_core::{GameOptions, RematchPolicy};
use conveyor_sorter_types::{ORDER_PREVIEW_MS, TICK_MS};

use crate::driver::DriverOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub seed: u32,
    pub start_level: u32,
    pub rematch_policy: RematchPolicy,
    pub preview_ms: u32,
    pub frame_ms: u32,
    pub speed: u32,
    pub event_log: Option<PathBuf>,
    pub log_filter: String,
    pub log_file: Option<PathBuf>,
    pub attempts: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            start_level: 1,
            rematch_policy: RematchPolicy::OncePerKind,
            preview_ms: ORDER_PREVIEW_MS,
            frame_ms: TICK_MS,
            speed: 1,
            event_log: None,
            log_filter: "info".to_string(),
            log_file: None,
            attempts: 5,
        }
    }
}

impl RunnerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let number = |key: &str| var(key).and_then(|s| s.parse::<u32>().ok());

        Self {
            seed: number("CONVEYOR_SEED").unwrap_or_else(time_seed),
            start_level: number("CONVEYOR_START_LEVEL")
                .filter(|n| *n >= 1)
                .unwrap_or(defaults.start_level),
            rematch_policy: var("CONVEYOR_REMATCH")
                .and_then(|s| RematchPolicy::from_str(&s))
                .unwrap_or(defaults.rematch_policy),
            preview_ms: number("CONVEYOR_PREVIEW_MS").unwrap_or(defaults.preview_ms),
            frame_ms: number("CONVEYOR_FRAME_MS")
                .filter(|n| *n >= 1)
                .unwrap_or(defaults.frame_ms),
            speed: number("CONVEYOR_SPEED")
                .filter(|n| *n >= 1)
                .unwrap_or(defaults.speed),
            event_log: var("CONVEYOR_EVENT_LOG").map(PathBuf::from),
            log_filter: var("CONVEYOR_LOG").unwrap_or(defaults.log_filter),
            log_file: var("CONVEYOR_LOG_FILE").map(PathBuf::from),
            attempts: number("CONVEYOR_ATTEMPTS")
                .filter(|n| *n >= 1)
                .unwrap_or(defaults.attempts),
        }
    }

    pub fn game_options(&self) -> GameOptions {
        GameOptions {
            seed: self.seed,
            start_level: self.start_level,
            rematch_policy: self.rematch_policy,
            preview_ms: self.preview_ms,
        }
    }

    pub fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            frame_ms: self.frame_ms,
            speed: self.speed,
        }
    }
}

fn time_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u32)
        .unwrap_or(1)
}
