//! Message types for the controller (TEA pattern)

use crate::state::{LoadKind, OperationId, UiData};

/// All inputs the controller reacts to
#[derive(Debug, Clone)]
pub enum Message {
    /// Start a load, superseding whatever is in flight
    Load(LoadKind),

    /// User cancel: stop the in-flight load and return to idle
    Cancel,

    // ─────────────────────────────────────────────────────────
    // Operation outcomes (sent by operation tasks)
    // ─────────────────────────────────────────────────────────
    OperationSucceeded {
        id: OperationId,
        data: UiData,
    },

    /// `message` is the error's display text, before any per-kind prefix
    OperationFailed {
        id: OperationId,
        message: String,
    },

    OperationCancelled {
        id: OperationId,
    },

    // ─────────────────────────────────────────────────────────
    // Debounced search
    // ─────────────────────────────────────────────────────────
    /// The search box changed
    SearchQueryChanged(String),

    /// A debounce timer elapsed without a newer query
    SearchDebounced {
        generation: u64,
        query: String,
    },

    /// Tear down: cancel everything and stop publishing
    Dispose,
}
