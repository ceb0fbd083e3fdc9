//! Headless mode - JSON event output
//!
//! Every UI state transition is written to stdout as one NDJSON line, so
//! scripts can follow a load without parsing the text rendering.
//!
//! # Example Output
//!
//! ```json
//! {"event":"operation_started","operation":"retry","timestamp":1704700001000}
//! {"event":"loading","message":"Loading with automatic retries...","timestamp":1704700001001}
//! {"event":"success","data":{"kind":"users","users":[...]},"timestamp":1704700004000}
//! ```

use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

use fetchflow_app::{UiData, UiState};
use fetchflow_core::{Product, User};

/// Payload of a successful load
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataPayload {
    Users {
        users: Vec<User>,
    },
    Products {
        products: Vec<Product>,
    },
    Combined {
        users: Vec<User>,
        products: Vec<Product>,
        elapsed_ms: u64,
    },
}

impl From<&UiData> for DataPayload {
    fn from(data: &UiData) -> Self {
        match data {
            UiData::Users(users) => DataPayload::Users {
                users: users.clone(),
            },
            UiData::Products(products) => DataPayload::Products {
                products: products.clone(),
            },
            UiData::Combined(combined) => DataPayload::Combined {
                users: combined.users.clone(),
                products: combined.products.clone(),
                elapsed_ms: combined.elapsed_ms,
            },
        }
    }
}

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// A load was requested
    OperationStarted { operation: String, timestamp: i64 },

    /// Back to idle (cancelled)
    Idle { timestamp: i64 },

    Loading {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        timestamp: i64,
    },

    Success { data: DataPayload, timestamp: i64 },

    Error { message: String, timestamp: i64 },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    pub fn operation_started(operation: &str) -> Self {
        Self::OperationStarted {
            operation: operation.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn from_state(state: &UiState) -> Self {
        let timestamp = Self::now();
        match state {
            UiState::Idle => Self::Idle { timestamp },
            UiState::Loading => Self::Loading {
                message: None,
                timestamp,
            },
            UiState::LoadingWithMessage(message) => Self::Loading {
                message: Some(message.clone()),
                timestamp,
            },
            UiState::Success(data) => Self::Success {
                data: data.into(),
                timestamp,
            },
            UiState::Error(message) => Self::Error {
                message: message.clone(),
                timestamp,
            },
        }
    }
}
