//! Test utilities for remote data source consumers
//!
//! Provides [`ScriptedSource`], a deterministic [`RemoteDataSource`] whose
//! endpoints replay queued outcomes after a configurable latency and count
//! how often they were called.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use fetchflow_core::{Error, Product, Result, User};
use tokio_util::sync::CancellationToken;

use crate::catalog::{sample_products, sample_users};
use crate::clock::sleep;
use crate::source::{Endpoint, RemoteDataSource};

/// A scripted outcome: `Ok` payload or the message of a remote failure
pub type Scripted<T> = std::result::Result<T, String>;

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Endpoint, VecDeque<Scripted<Vec<User>>>>,
    products: VecDeque<Scripted<Vec<Product>>>,
    calls: HashMap<Endpoint, u32>,
    cancelled: HashMap<Endpoint, u32>,
}

/// Deterministic remote data source for tests.
///
/// Each endpoint first waits for its latency (cancellation-aware), then pops
/// the next scripted outcome. When an endpoint's script is empty it succeeds
/// with the sample catalog.
#[derive(Debug)]
pub struct ScriptedSource {
    latencies: HashMap<Endpoint, Duration>,
    inner: Mutex<Inner>,
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSource {
    /// Creates a source with the nominal latencies of the real service
    pub fn new() -> Self {
        let latencies = HashMap::from([
            (Endpoint::UsersStable, Duration::from_millis(1500)),
            (Endpoint::UsersUnstable, Duration::from_millis(1000)),
            (Endpoint::UsersSlow, Duration::from_millis(15_000)),
            (Endpoint::Products, Duration::from_millis(1200)),
            (Endpoint::Search, Duration::from_millis(500)),
        ]);
        Self {
            latencies,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Override one endpoint's latency
    pub fn with_latency(mut self, endpoint: Endpoint, latency: Duration) -> Self {
        self.latencies.insert(endpoint, latency);
        self
    }

    /// Queue outcomes for a users endpoint (stable, unstable or slow)
    pub fn with_users_script(
        self,
        endpoint: Endpoint,
        script: impl IntoIterator<Item = Scripted<Vec<User>>>,
    ) -> Self {
        self.lock()
            .users
            .entry(endpoint)
            .or_default()
            .extend(script);
        self
    }

    /// Queue outcomes for the products endpoint
    pub fn with_products_script(
        self,
        script: impl IntoIterator<Item = Scripted<Vec<Product>>>,
    ) -> Self {
        self.lock().products.extend(script);
        self
    }

    /// Number of calls that reached the endpoint (including failed ones)
    pub fn calls(&self, endpoint: Endpoint) -> u32 {
        self.lock().calls.get(&endpoint).copied().unwrap_or(0)
    }

    /// Number of calls to the endpoint that ended by observing cancellation
    pub fn cancellations(&self, endpoint: Endpoint) -> u32 {
        self.lock().cancelled.get(&endpoint).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn latency(&self, endpoint: Endpoint) -> Duration {
        self.latencies.get(&endpoint).copied().unwrap_or_default()
    }

    async fn wait(&self, endpoint: Endpoint, cancel: &CancellationToken) -> Result<()> {
        self.lock().calls.entry(endpoint).and_modify(|c| *c += 1).or_insert(1);
        let result = sleep(cancel, self.latency(endpoint)).await;
        if result.is_err() {
            *self.lock().cancelled.entry(endpoint).or_insert(0) += 1;
        }
        result
    }

    async fn users(&self, endpoint: Endpoint, cancel: &CancellationToken) -> Result<Vec<User>> {
        self.wait(endpoint, cancel).await?;
        let next = self
            .lock()
            .users
            .get_mut(&endpoint)
            .and_then(|queue| queue.pop_front());
        match next {
            Some(outcome) => outcome.map_err(Error::remote),
            None => Ok(sample_users()),
        }
    }
}

impl RemoteDataSource for ScriptedSource {
    async fn fetch_users_stable(&self, cancel: &CancellationToken) -> Result<Vec<User>> {
        self.users(Endpoint::UsersStable, cancel).await
    }

    async fn fetch_users_unstable(&self, cancel: &CancellationToken) -> Result<Vec<User>> {
        self.users(Endpoint::UsersUnstable, cancel).await
    }

    async fn fetch_users_slow(&self, cancel: &CancellationToken) -> Result<Vec<User>> {
        self.users(Endpoint::UsersSlow, cancel).await
    }

    async fn fetch_products(&self, cancel: &CancellationToken) -> Result<Vec<Product>> {
        self.wait(Endpoint::Products, cancel).await?;
        let next = self.lock().products.pop_front();
        match next {
            Some(outcome) => outcome.map_err(Error::remote),
            None => Ok(sample_products()),
        }
    }

    async fn search_users(&self, query: &str, cancel: &CancellationToken) -> Result<Vec<User>> {
        self.wait(Endpoint::Search, cancel).await?;
        Ok(sample_users()
            .into_iter()
            .filter(|user| user.matches(query))
            .collect())
    }

    fn reset(&self) {
        let mut inner = self.lock();
        inner.calls.clear();
        inner.cancelled.clear();
    }
}

/// A script that fails `failures` times with `message`, then succeeds
pub fn fail_then_succeed(failures: usize, message: &str) -> Vec<Scripted<Vec<User>>> {
    let mut script: Vec<Scripted<Vec<User>>> = (0..failures)
        .map(|i| Err(format!("{} #{}", message, i + 1)))
        .collect();
    script.push(Ok(sample_users()));
    script
}
