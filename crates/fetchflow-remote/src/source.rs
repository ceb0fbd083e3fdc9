//! Remote data source contract

use fetchflow_core::{Product, Result, User};
use tokio_util::sync::CancellationToken;

/// Endpoints exposed by the remote data source.
///
/// Used for logging and for per-endpoint call accounting in test doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Moderately reliable users endpoint
    UsersStable,
    /// Users endpoint that fails most of the time
    UsersUnstable,
    /// Users endpoint that never fails but takes very long
    UsersSlow,
    /// Products endpoint with a deterministic failure cadence
    Products,
    /// User search
    Search,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::UsersStable => write!(f, "users/stable"),
            Endpoint::UsersUnstable => write!(f, "users/unstable"),
            Endpoint::UsersSlow => write!(f, "users/slow"),
            Endpoint::Products => write!(f, "products"),
            Endpoint::Search => write!(f, "users/search"),
        }
    }
}

/// Contract of the unreliable remote service.
///
/// Every method is a suspension point: implementations must wait through
/// [`crate::sleep`] (or otherwise observe `cancel`) and return
/// [`fetchflow_core::Error::Cancelled`] once the token fires.
///
/// [`RemoteDataSource`] is the `Send` variant used by the repository and the
/// controller; implement that one.
#[trait_variant::make(RemoteDataSource: Send)]
pub trait LocalRemoteDataSource {
    /// Users, ~1500ms latency, fails sporadically
    async fn fetch_users_stable(&self, cancel: &CancellationToken) -> Result<Vec<User>>;

    /// Users, ~1000ms latency, fails most of the time
    async fn fetch_users_unstable(&self, cancel: &CancellationToken) -> Result<Vec<User>>;

    /// Users, 15s latency, never fails
    async fn fetch_users_slow(&self, cancel: &CancellationToken) -> Result<Vec<User>>;

    /// Products, ~1200ms latency, fails on every 5th call
    async fn fetch_products(&self, cancel: &CancellationToken) -> Result<Vec<Product>>;

    /// Case-insensitive substring search on name or email; blank returns all
    async fn search_users(&self, query: &str, cancel: &CancellationToken) -> Result<Vec<User>>;

    /// Reset call counters
    fn reset(&self);
}
