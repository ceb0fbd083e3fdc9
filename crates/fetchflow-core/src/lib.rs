//! # fetchflow-core - Core Domain Types
//!
//! Foundation crate for fetchflow. Provides domain types, error handling
//! and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`User`] - A user record (id, name, email)
//! - [`Product`] - A product record (id, name, price)
//! - [`CombinedData`] - Users + products fetched in parallel, with elapsed time
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error taxonomy: remote failure, timeout, cancellation,
//!   exhausted retries, plus infrastructure errors
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use fetchflow_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all fetchflow crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use types::{CombinedData, Product, User};
