//! fetchflow-app - Load orchestration and UI state for fetchflow
//!
//! This crate implements the task runner (retry, timeout, both), the data
//! repository over a remote source, and the UI state controller in the TEA
//! (The Elm Architecture) style: messages, a pure `update`, and an engine task
//! that runs actions and publishes state.

pub mod actions;
pub mod config;
pub mod controller;
pub mod engine;
pub mod handler;
pub mod message;
pub mod repository;
pub mod runner;
pub mod state;

// Re-export primary types
pub use controller::{Controller, ControllerSettings};
pub use engine::Engine;
pub use handler::{UpdateAction, UpdateResult};
pub use message::Message;
pub use repository::{DataRepository, LocalDataRepository, RemoteRepository, RepositoryConfig};
pub use runner::{RetryPolicy, TimeoutSpec};
pub use state::{LoadKind, OperationId, UiData, UiState};
