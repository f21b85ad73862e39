//! Runtime configuration: fuel limits, animation timing, work budget.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::types::{TurtleTier, DEFAULT_ANIMATION_DURATION_TICKS};

pub const ENV_FUEL_REQUIRED: &str = "TURTLE_WORLD_FUEL_REQUIRED";
pub const ENV_FUEL_LIMIT: &str = "TURTLE_WORLD_FUEL_LIMIT";
pub const ENV_ADVANCED_FUEL_LIMIT: &str = "TURTLE_WORLD_ADVANCED_FUEL_LIMIT";
pub const ENV_TICK_BUDGET_MS: &str = "TURTLE_WORLD_TICK_BUDGET_MS";
pub const ENV_TICK_RATE_HZ: &str = "TURTLE_WORLD_TICK_RATE_HZ";

pub const DEFAULT_CONFIG_FILE_NAME: &str = "turtle_world.toml";
pub const DEFAULT_NORMAL_FUEL_LIMIT: u32 = 20_000;
pub const DEFAULT_ADVANCED_FUEL_LIMIT: u32 = 100_000;
pub const DEFAULT_MAX_FUEL_LIMIT: u32 = 1_000_000;
pub const DEFAULT_TICK_WORK_BUDGET_MS: u64 = 10;
pub const DEFAULT_EVENT_CAPACITY: usize = 256;
pub const DEFAULT_TICK_RATE_HZ: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurtleConfig {
    /// When false every fuel check passes and the level is cosmetic.
    pub fuel_required: bool,
    pub normal_fuel_limit: u32,
    pub advanced_fuel_limit: u32,
    /// Global ceiling applied on top of the per-tier limits.
    pub max_fuel_limit: u32,
    pub animation_duration_ticks: u32,
    /// Aggregate command execution time allowed per tick, across turtles.
    pub tick_work_budget_ms: u64,
    /// Events retained per turtle before slow readers start lagging.
    pub event_capacity: usize,
    pub tick_rate_hz: u32,
    /// Fuel units gained per consumed item, keyed by item id.
    pub fuel_values: BTreeMap<String, u32>,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        Self {
            fuel_required: true,
            normal_fuel_limit: DEFAULT_NORMAL_FUEL_LIMIT,
            advanced_fuel_limit: DEFAULT_ADVANCED_FUEL_LIMIT,
            max_fuel_limit: DEFAULT_MAX_FUEL_LIMIT,
            animation_duration_ticks: DEFAULT_ANIMATION_DURATION_TICKS,
            tick_work_budget_ms: DEFAULT_TICK_WORK_BUDGET_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            fuel_values: default_fuel_values(),
        }
    }
}

fn default_fuel_values() -> BTreeMap<String, u32> {
    [
        ("coal", 80),
        ("charcoal", 80),
        ("lava_bucket", 1000),
        ("planks", 15),
        ("stick", 5),
    ]
    .into_iter()
    .map(|(id, value)| (id.to_string(), value))
    .collect()
}

impl TurtleConfig {
    pub fn sanitized(mut self) -> Self {
        if self.max_fuel_limit == 0 {
            self.max_fuel_limit = DEFAULT_MAX_FUEL_LIMIT;
        }
        self.normal_fuel_limit = self.normal_fuel_limit.min(self.max_fuel_limit);
        self.advanced_fuel_limit = self.advanced_fuel_limit.min(self.max_fuel_limit);
        // ShortWait starts at half the duration, so keep it even and non-trivial.
        self.animation_duration_ticks = self.animation_duration_ticks.max(2);
        if self.animation_duration_ticks % 2 == 1 {
            self.animation_duration_ticks += 1;
        }
        self.event_capacity = self.event_capacity.max(1);
        self.tick_rate_hz = self.tick_rate_hz.max(1);
        self.fuel_values.retain(|_, value| *value > 0);
        self
    }

    pub fn fuel_limit(&self, tier: TurtleTier) -> u32 {
        let limit = match tier {
            TurtleTier::Normal => self.normal_fuel_limit,
            TurtleTier::Advanced => self.advanced_fuel_limit,
        };
        limit.min(self.max_fuel_limit)
    }

    pub fn fuel_value(&self, item_id: &str) -> Option<u32> {
        self.fuel_values.get(item_id).copied()
    }

    pub fn from_default_sources() -> Result<Self, ConfigError> {
        let config_path = Path::new(DEFAULT_CONFIG_FILE_NAME);
        if config_path.exists() {
            return Self::from_config_file(config_path);
        }
        Self::from_env()
    }

    /// Reads a TOML file; environment variables override individual keys.
    pub fn from_config_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|err| ConfigError::ReadConfigFile {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let base: TurtleConfig =
            toml::from_str(&content).map_err(|err| ConfigError::ParseConfigFile {
                path: path.display().to_string(),
                message: err.to_string(),
            })?;
        base.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides<F>(mut self, mut getter: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(value) = non_empty(&mut getter, ENV_FUEL_REQUIRED) {
            self.fuel_required = parse_bool(ENV_FUEL_REQUIRED, &value)?;
        }
        if let Some(value) = non_empty(&mut getter, ENV_FUEL_LIMIT) {
            self.normal_fuel_limit = parse_number(ENV_FUEL_LIMIT, &value)?;
        }
        if let Some(value) = non_empty(&mut getter, ENV_ADVANCED_FUEL_LIMIT) {
            self.advanced_fuel_limit = parse_number(ENV_ADVANCED_FUEL_LIMIT, &value)?;
        }
        if let Some(value) = non_empty(&mut getter, ENV_TICK_BUDGET_MS) {
            self.tick_work_budget_ms = parse_number(ENV_TICK_BUDGET_MS, &value)?;
        }
        if let Some(value) = non_empty(&mut getter, ENV_TICK_RATE_HZ) {
            self.tick_rate_hz = parse_number(ENV_TICK_RATE_HZ, &value)?;
        }
        Ok(self.sanitized())
    }
}

fn non_empty<F>(getter: &mut F, key: &str) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    getter(key).filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("failed to read config file {path}: {message}")]
    ReadConfigFile { path: String, message: String },
    #[error("failed to parse config file {path}: {message}")]
    ParseConfigFile { path: String, message: String },
}
