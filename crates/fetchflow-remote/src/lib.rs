//! fetchflow-remote - Remote data source contract for fetchflow
//!
//! The remote service is an external, unreliable collaborator. This crate
//! defines its contract ([`RemoteDataSource`]), a simulated backend with
//! injectable latency and failures ([`SimulatedApi`]), and the cancellation
//! aware sleep every suspension point goes through ([`sleep`]).
//!
//! Test doubles live in `test_utils` behind the `test-helpers` feature.

pub mod catalog;
pub mod clock;
pub mod simulated;
pub mod source;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use catalog::{sample_products, sample_users};
pub use clock::sleep;
pub use simulated::{SimulatedApi, SimulationConfig};
pub use source::{Endpoint, LocalRemoteDataSource, RemoteDataSource};

// Re-export the cancellation primitive so downstream crates share one type
pub use tokio_util::sync::CancellationToken;
