//! Data access layer
//!
//! Wraps a [`RemoteDataSource`] with the resilience each load needs: plain
//! calls, retry with backoff, a time limit, and a fail-fast parallel fan-out.

use std::sync::Arc;
use std::time::Duration;

use fetchflow_core::prelude::*;
use fetchflow_core::{CombinedData, Product, User};
use fetchflow_remote::RemoteDataSource;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::runner::{with_retry_notify, with_timeout, RetryPolicy, TimeoutSpec};

/// Message of the error produced when the slow users load runs out of time
pub const DEFAULT_USERS_TIMEOUT_MESSAGE: &str = "Timeout fetching users";

/// Tunables for [`RemoteRepository`]
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryConfig {
    /// Policy for [`DataRepository::fetch_users_with_retry`]
    pub retry_policy: RetryPolicy,
    /// Message for [`DataRepository::fetch_users_with_timeout`] timeouts
    pub timeout_message: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            timeout_message: DEFAULT_USERS_TIMEOUT_MESSAGE.to_string(),
        }
    }
}

/// Loads the controller can request.
///
/// Every operation observes `cancel` and returns [`Error::Cancelled`] once it
/// fires. [`DataRepository`] is the `Send` variant the controller needs.
#[trait_variant::make(DataRepository: Send)]
pub trait LocalDataRepository {
    /// Stable endpoint, single attempt, no time limit
    async fn fetch_users(&self, cancel: &CancellationToken) -> Result<Vec<User>>;

    /// Unstable endpoint with retry and exponential backoff
    async fn fetch_users_with_retry(&self, cancel: &CancellationToken) -> Result<Vec<User>>;

    /// Slow endpoint bounded by `limit`
    async fn fetch_users_with_timeout(
        &self,
        limit: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<User>>;

    /// Products endpoint, single attempt
    async fn fetch_products(&self, cancel: &CancellationToken) -> Result<Vec<Product>>;

    /// Users and products concurrently; the first failure cancels the other
    async fn fetch_combined(&self, cancel: &CancellationToken) -> Result<CombinedData>;

    /// Remote user search; a blank query returns everyone
    async fn search_users(&self, query: &str, cancel: &CancellationToken) -> Result<Vec<User>>;
}

/// [`DataRepository`] backed by a remote data source
#[derive(Debug)]
pub struct RemoteRepository<S> {
    api: Arc<S>,
    config: RepositoryConfig,
}

impl<S> Clone for RemoteRepository<S> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            config: self.config.clone(),
        }
    }
}

impl<S> RemoteRepository<S>
where
    S: RemoteDataSource + Sync + 'static,
{
    pub fn new(api: Arc<S>, config: RepositoryConfig) -> Self {
        Self { api, config }
    }

    /// Repository with [`RepositoryConfig::default`]
    pub fn with_defaults(api: Arc<S>) -> Self {
        Self::new(api, RepositoryConfig::default())
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<S> {
        &self.api
    }
}

impl<S> DataRepository for RemoteRepository<S>
where
    S: RemoteDataSource + Sync + 'static,
{
    async fn fetch_users(&self, cancel: &CancellationToken) -> Result<Vec<User>> {
        self.api.fetch_users_stable(cancel).await
    }

    async fn fetch_users_with_retry(&self, cancel: &CancellationToken) -> Result<Vec<User>> {
        let api = &self.api;
        with_retry_notify(
            &self.config.retry_policy,
            cancel,
            |attempt, error| info!("Retry {}: {}", attempt, error),
            move |attempt_token| async move { api.fetch_users_unstable(&attempt_token).await },
        )
        .await
    }

    async fn fetch_users_with_timeout(
        &self,
        limit: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<User>> {
        let spec = TimeoutSpec::new(limit, self.config.timeout_message.as_str())?;
        let api = &self.api;
        with_timeout(&spec, cancel, move |attempt_token| async move {
            api.fetch_users_slow(&attempt_token).await
        })
        .await
    }

    async fn fetch_products(&self, cancel: &CancellationToken) -> Result<Vec<Product>> {
        self.api.fetch_products(cancel).await
    }

    async fn fetch_combined(&self, cancel: &CancellationToken) -> Result<CombinedData> {
        let started = Instant::now();

        // Both branches share one scope. Leaving this function for any reason
        // (first failure, caller dropped us) cancels whatever is still running.
        let scope = cancel.child_token();
        let _scope_guard = scope.clone().drop_guard();

        let users_task: JoinHandle<Result<Vec<User>>> = tokio::spawn({
            let api = Arc::clone(&self.api);
            let token = scope.clone();
            async move { api.fetch_users_stable(&token).await }
        });
        let products_task: JoinHandle<Result<Vec<Product>>> = tokio::spawn({
            let api = Arc::clone(&self.api);
            let token = scope.clone();
            async move { api.fetch_products(&token).await }
        });

        let (users, products) =
            tokio::try_join!(join_branch(users_task), join_branch(products_task))?;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            "Combined load: {} users, {} products in {}ms",
            users.len(),
            products.len(),
            elapsed_ms
        );

        Ok(CombinedData {
            users,
            products,
            elapsed_ms,
        })
    }

    async fn search_users(&self, query: &str, cancel: &CancellationToken) -> Result<Vec<User>> {
        debug!("Searching users for {:?}", query);
        self.api.search_users(query, cancel).await
    }
}

/// Flatten a spawned branch's join result into the crate's error taxonomy
async fn join_branch<T>(handle: JoinHandle<Result<T>>) -> Result<T> {
    match handle.await {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Err(Error::Cancelled),
        Err(e) => Err(Error::task(e.to_string())),
    }
}
