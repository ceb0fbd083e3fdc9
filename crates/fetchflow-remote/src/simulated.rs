//! Simulated remote backend with injectable latency and failures
//!
//! Stands in for a real network service. Each endpoint waits for its
//! configured latency (cancellation-aware), then either fails or returns the
//! fixed catalog:
//!
//! | Endpoint          | Latency | Failure                      |
//! |-------------------|---------|------------------------------|
//! | users (stable)    | 1500ms  | 25% random                   |
//! | users (unstable)  | 1000ms  | 70% random                   |
//! | users (slow)      | 15s     | never                        |
//! | products          | 1200ms  | every 5th call               |
//! | search            | 500ms   | never                        |

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use fetchflow_core::prelude::*;
use fetchflow_core::{Product, User};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;

use crate::catalog::{sample_products, sample_users};
use crate::clock::sleep;
use crate::source::{Endpoint, RemoteDataSource};

/// Latency and failure knobs for [`SimulatedApi`]
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub stable_latency: Duration,
    /// Probability in `[0, 1]` that a stable users call fails
    pub stable_failure_rate: f64,
    pub unstable_latency: Duration,
    /// Probability in `[0, 1]` that an unstable users call fails
    pub unstable_failure_rate: f64,
    pub slow_latency: Duration,
    pub products_latency: Duration,
    /// Every n-th products call fails (0 disables the failure)
    pub products_fail_every: u32,
    pub search_latency: Duration,
    /// Fixed RNG seed for reproducible failure sequences
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            stable_latency: Duration::from_millis(1500),
            stable_failure_rate: 0.25,
            unstable_latency: Duration::from_millis(1000),
            unstable_failure_rate: 0.70,
            slow_latency: Duration::from_millis(15_000),
            products_latency: Duration::from_millis(1200),
            products_fail_every: 5,
            search_latency: Duration::from_millis(500),
            seed: None,
        }
    }
}

/// Simulated unreliable remote service.
///
/// Shared across tasks behind an `Arc`; the RNG lock is never held across an
/// await point.
#[derive(Debug)]
pub struct SimulatedApi {
    config: SimulationConfig,
    rng: Mutex<StdRng>,
    unstable_calls: AtomicU32,
    product_calls: AtomicU32,
    users: Vec<User>,
    products: Vec<Product>,
}

impl Default for SimulatedApi {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl SimulatedApi {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
            unstable_calls: AtomicU32::new(0),
            product_calls: AtomicU32::new(0),
            users: sample_users(),
            products: sample_products(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Roll the dice for a probabilistic failure
    fn should_fail(&self, rate: f64) -> bool {
        if rate <= 0.0 {
            return false;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen::<f64>() < rate
    }
}

impl RemoteDataSource for SimulatedApi {
    async fn fetch_users_stable(&self, cancel: &CancellationToken) -> Result<Vec<User>> {
        sleep(cancel, self.config.stable_latency).await?;

        if self.should_fail(self.config.stable_failure_rate) {
            debug!("{}: simulated sporadic failure", Endpoint::UsersStable);
            return Err(Error::remote("Sporadic connection error"));
        }

        Ok(self.users.clone())
    }

    async fn fetch_users_unstable(&self, cancel: &CancellationToken) -> Result<Vec<User>> {
        sleep(cancel, self.config.unstable_latency).await?;

        let call = self.unstable_calls.fetch_add(1, Ordering::SeqCst) + 1;

        if self.should_fail(self.config.unstable_failure_rate) {
            debug!("{}: simulated failure on call #{}", Endpoint::UsersUnstable, call);
            return Err(Error::remote(format!(
                "Simulated network error (attempt #{})",
                call
            )));
        }

        Ok(self.users.clone())
    }

    async fn fetch_users_slow(&self, cancel: &CancellationToken) -> Result<Vec<User>> {
        sleep(cancel, self.config.slow_latency).await?;
        Ok(self.users.clone())
    }

    async fn fetch_products(&self, cancel: &CancellationToken) -> Result<Vec<Product>> {
        sleep(cancel, self.config.products_latency).await?;

        let call = self.product_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let every = self.config.products_fail_every;

        if every > 0 && call % every == 0 {
            debug!("{}: deterministic failure on call #{}", Endpoint::Products, call);
            return Err(Error::remote("Error fetching products"));
        }

        Ok(self.products.clone())
    }

    async fn search_users(&self, query: &str, cancel: &CancellationToken) -> Result<Vec<User>> {
        sleep(cancel, self.config.search_latency).await?;

        Ok(self
            .users
            .iter()
            .filter(|user| user.matches(query))
            .cloned()
            .collect())
    }

    fn reset(&self) {
        self.unstable_calls.store(0, Ordering::SeqCst);
        self.product_calls.store(0, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn reliable_config() -> SimulationConfig {
        SimulationConfig {
            stable_failure_rate: 0.0,
            unstable_failure_rate: 0.0,
            products_fail_every: 0,
            seed: Some(7),
            ..SimulationConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stable_users_waits_for_latency() {
        let api = SimulatedApi::new(reliable_config());
        let token = CancellationToken::new();
        let start = Instant::now();

        let users = api.fetch_users_stable(&token).await.unwrap();

        assert_eq!(users.len(), 5);
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_products_fail_every_fifth_call() {
        let api = SimulatedApi::new(SimulationConfig {
            products_fail_every: 5,
            ..reliable_config()
        });
        let token = CancellationToken::new();

        for call in 1..=4 {
            assert!(
                api.fetch_products(&token).await.is_ok(),
                "call {} should succeed",
                call
            );
        }
        let err = api.fetch_products(&token).await.unwrap_err();
        assert_eq!(err.to_string(), "Error fetching products");

        // Cadence continues: 6..9 ok, 10 fails
        for _ in 6..=9 {
            assert!(api.fetch_products(&token).await.is_ok());
        }
        assert!(api.fetch_products(&token).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_restarts_product_cadence() {
        let api = SimulatedApi::new(reliable_config_with_products_failure());
        let token = CancellationToken::new();

        for _ in 0..4 {
            api.fetch_products(&token).await.unwrap();
        }
        api.reset();

        // Would have been the 5th call without the reset
        assert!(api.fetch_products(&token).await.is_ok());
    }

    fn reliable_config_with_products_failure() -> SimulationConfig {
        SimulationConfig {
            products_fail_every: 5,
            ..reliable_config()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unstable_always_fails_at_full_rate() {
        let api = SimulatedApi::new(SimulationConfig {
            unstable_failure_rate: 1.0,
            ..reliable_config()
        });
        let token = CancellationToken::new();

        let first = api.fetch_users_unstable(&token).await.unwrap_err();
        let second = api.fetch_users_unstable(&token).await.unwrap_err();

        assert!(first.to_string().contains("attempt #1"));
        assert!(second.to_string().contains("attempt #2"));
        assert!(first.is_recoverable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_endpoint_observes_cancellation() {
        let api = SimulatedApi::new(reliable_config());
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let result = api.fetch_users_slow(&token).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_filters_by_name_and_email() {
        let api = SimulatedApi::new(reliable_config());
        let token = CancellationToken::new();

        let by_name = api.search_users("maría", &token).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, 3);

        let by_email = api.search_users("PEDRO@", &token).await.unwrap();
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].id, 4);

        let none = api.search_users("zzz", &token).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_search_returns_all() {
        let api = SimulatedApi::new(reliable_config());
        let token = CancellationToken::new();

        let all = api.search_users("  ", &token).await.unwrap();

        assert_eq!(all, sample_users());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let config = SimulationConfig {
            seed: Some(42),
            ..SimulationConfig::default()
        };
        let a = SimulatedApi::new(config.clone());
        let b = SimulatedApi::new(config);

        let rolls_a: Vec<bool> = (0..20).map(|_| a.should_fail(0.5)).collect();
        let rolls_b: Vec<bool> = (0..20).map(|_| b.should_fail(0.5)).collect();

        assert_eq!(rolls_a, rolls_b);
    }
}
