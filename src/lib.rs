//! fetchflow library
//!
//! Command-line front end over the fetchflow controller: runs one load,
//! renders its state transitions as text or NDJSON, and cancels on Ctrl-C.

pub mod headless;
pub mod render;
pub mod run;
pub mod signals;

// Re-export main entry points
pub use run::{build_controller, drive, init, run, OutputMode};
