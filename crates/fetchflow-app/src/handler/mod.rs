//! Handler module - TEA update function
//!
//! - `update`: the `update()` function and message dispatch
//! - `tests`: state transition tests that need no runtime

pub(crate) mod update;

#[cfg(test)]
mod tests;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::message::Message;
use crate::state::{LoadKind, OperationId};

pub use update::update;

/// Actions the engine performs after update
#[derive(Debug, Clone)]
pub enum UpdateAction {
    /// Spawn the task running operation `id`
    StartOperation {
        id: OperationId,
        kind: LoadKind,
        /// Cancelled when the operation is superseded, cancelled or disposed
        token: CancellationToken,
    },

    /// Arm a debounce timer that reports back with `SearchDebounced`
    ScheduleSearch {
        generation: u64,
        query: String,
        delay: Duration,
    },
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the engine to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }
}
