//! Configuration file parsing for fetchflow
//!
//! Supports `.fetchflow/config.toml` (retry, timeout, search and simulation
//! settings).

pub mod settings;
pub mod types;

pub use settings::{
    config_path, init_config_dir, load_settings, save_settings, CONFIG_FILENAME, FETCHFLOW_DIR,
};
pub use types::*;
