//! Configuration types for fetchflow
//!
//! Defines `Settings` (`.fetchflow/config.toml`) and its sections, plus the
//! conversions into the runtime types they configure.

use std::time::Duration;

use fetchflow_core::prelude::*;
use fetchflow_remote::SimulationConfig;
use serde::{Deserialize, Serialize};

use crate::controller::ControllerSettings;
use crate::repository::RepositoryConfig;
use crate::runner::RetryPolicy;

/// Application settings (.fetchflow/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub timeout: TimeoutSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub simulation: SimulationSettings,
}

impl Settings {
    /// Reject values the runtime types cannot represent
    pub fn validate(&self) -> Result<()> {
        self.retry.to_policy()?;

        if self.timeout.limit_ms == 0 {
            return Err(Error::config_invalid("timeout.limit_ms must be greater than zero"));
        }

        let rates = [
            ("stable_failure_rate", self.simulation.stable_failure_rate),
            ("unstable_failure_rate", self.simulation.unstable_failure_rate),
        ];
        for (name, rate) in rates {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::config_invalid(format!(
                    "simulation.{} must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }

        Ok(())
    }

    pub fn repository_config(&self) -> Result<RepositoryConfig> {
        Ok(RepositoryConfig {
            retry_policy: self.retry.to_policy()?,
            timeout_message: self.timeout.message.clone(),
        })
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            timeout_limit: self.timeout.limit(),
            search_debounce: Duration::from_millis(self.search.debounce_ms),
        }
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        self.simulation.to_config()
    }
}

/// `[retry]` section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
            self.backoff_factor,
        )
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_backoff_factor() -> f64 {
    2.0
}

/// `[timeout]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeoutSettings {
    #[serde(default = "default_limit_ms")]
    pub limit_ms: u64,

    #[serde(default = "default_timeout_message")]
    pub message: String,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            limit_ms: default_limit_ms(),
            message: default_timeout_message(),
        }
    }
}

impl TimeoutSettings {
    pub fn limit(&self) -> Duration {
        Duration::from_millis(self.limit_ms)
    }
}

fn default_limit_ms() -> u64 {
    3000
}

fn default_timeout_message() -> String {
    "Timeout fetching users".to_string()
}

/// `[search]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchSettings {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

/// `[simulation]` section: knobs of the simulated backend
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationSettings {
    #[serde(default = "default_stable_latency_ms")]
    pub stable_latency_ms: u64,

    #[serde(default = "default_stable_failure_rate")]
    pub stable_failure_rate: f64,

    #[serde(default = "default_unstable_latency_ms")]
    pub unstable_latency_ms: u64,

    #[serde(default = "default_unstable_failure_rate")]
    pub unstable_failure_rate: f64,

    #[serde(default = "default_slow_latency_ms")]
    pub slow_latency_ms: u64,

    #[serde(default = "default_products_latency_ms")]
    pub products_latency_ms: u64,

    /// Every n-th products call fails; 0 never fails
    #[serde(default = "default_products_fail_every")]
    pub products_fail_every: u32,

    #[serde(default = "default_search_latency_ms")]
    pub search_latency_ms: u64,

    /// Fixed seed for reproducible failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            stable_latency_ms: default_stable_latency_ms(),
            stable_failure_rate: default_stable_failure_rate(),
            unstable_latency_ms: default_unstable_latency_ms(),
            unstable_failure_rate: default_unstable_failure_rate(),
            slow_latency_ms: default_slow_latency_ms(),
            products_latency_ms: default_products_latency_ms(),
            products_fail_every: default_products_fail_every(),
            search_latency_ms: default_search_latency_ms(),
            seed: None,
        }
    }
}

impl SimulationSettings {
    pub fn to_config(&self) -> SimulationConfig {
        SimulationConfig {
            stable_latency: Duration::from_millis(self.stable_latency_ms),
            stable_failure_rate: self.stable_failure_rate,
            unstable_latency: Duration::from_millis(self.unstable_latency_ms),
            unstable_failure_rate: self.unstable_failure_rate,
            slow_latency: Duration::from_millis(self.slow_latency_ms),
            products_latency: Duration::from_millis(self.products_latency_ms),
            products_fail_every: self.products_fail_every,
            search_latency: Duration::from_millis(self.search_latency_ms),
            seed: self.seed,
        }
    }
}

fn default_stable_latency_ms() -> u64 {
    1500
}

fn default_stable_failure_rate() -> f64 {
    0.25
}

fn default_unstable_latency_ms() -> u64 {
    1000
}

fn default_unstable_failure_rate() -> f64 {
    0.70
}

fn default_slow_latency_ms() -> u64 {
    15_000
}

fn default_products_latency_ms() -> u64 {
    1200
}

fn default_products_fail_every() -> u32 {
    5
}

fn default_search_latency_ms() -> u64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_runtime_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.retry.to_policy().unwrap(), RetryPolicy::default());
        assert_eq!(settings.repository_config().unwrap(), RepositoryConfig::default());
        assert_eq!(settings.controller_settings(), ControllerSettings::default());
        assert_eq!(settings.simulation_config(), SimulationConfig::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [retry]
            max_attempts = 5

            [simulation]
            seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.initial_delay_ms, 1000);
        assert_eq!(settings.timeout.limit_ms, 3000);
        assert_eq!(settings.simulation.seed, Some(42));
        assert_eq!(settings.simulation.products_fail_every, 5);
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut settings = Settings::default();
        settings.retry.max_attempts = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.retry.backoff_factor = 0.5;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.timeout.limit_ms = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.simulation.unstable_failure_rate = 1.5;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("unstable_failure_rate"));
    }
}
