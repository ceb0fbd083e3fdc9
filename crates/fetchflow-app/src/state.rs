//! Controller state (the Model)

use std::time::Duration;

use fetchflow_core::{CombinedData, Product, User};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Monotonic identifier of a started operation
pub type OperationId = u64;

/// Data carried by a successful load
#[derive(Debug, Clone, PartialEq)]
pub enum UiData {
    Users(Vec<User>),
    Products(Vec<Product>),
    Combined(CombinedData),
}

/// What the presentation layer renders.
///
/// Exactly one value is current at any time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Loading,
    LoadingWithMessage(String),
    Success(UiData),
    Error(String),
}

impl UiState {
    /// `Loading` or `LoadingWithMessage`
    pub fn is_loading(&self) -> bool {
        matches!(self, UiState::Loading | UiState::LoadingWithMessage(_))
    }

    /// `Success` or `Error`: the operation finished
    pub fn is_finished(&self) -> bool {
        matches!(self, UiState::Success(_) | UiState::Error(_))
    }

    /// Short lowercase name, used in logs and event streams
    pub fn name(&self) -> &'static str {
        match self {
            UiState::Idle => "idle",
            UiState::Loading => "loading",
            UiState::LoadingWithMessage(_) => "loading_with_message",
            UiState::Success(_) => "success",
            UiState::Error(_) => "error",
        }
    }
}

/// The kinds of load the controller can start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadKind {
    /// Stable users endpoint, no resilience
    Normal,
    /// Unstable users endpoint with retry and backoff
    WithRetry,
    /// Slow users endpoint bounded by the given limit
    WithTimeout(Duration),
    /// Users and products concurrently
    Parallel,
    /// Products endpoint
    Products,
    /// Remote user search
    Search(String),
}

impl LoadKind {
    /// State published when this kind of load starts
    pub fn loading_state(&self) -> UiState {
        match self {
            LoadKind::Normal | LoadKind::Products | LoadKind::Search(_) => UiState::Loading,
            LoadKind::WithRetry => {
                UiState::LoadingWithMessage("Loading with automatic retries...".to_string())
            }
            LoadKind::WithTimeout(limit) => UiState::LoadingWithMessage(format!(
                "Loading (timeout: {})...",
                format_limit(*limit)
            )),
            LoadKind::Parallel => UiState::LoadingWithMessage("Loading in parallel...".to_string()),
        }
    }

    /// Message shown to the user when this kind of load fails with `error`
    pub fn failure_message(&self, error: &str) -> String {
        match self {
            LoadKind::WithRetry => format!("Failed after several attempts: {}", error),
            _ => error.to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoadKind::Normal => "normal",
            LoadKind::WithRetry => "retry",
            LoadKind::WithTimeout(_) => "timeout",
            LoadKind::Parallel => "parallel",
            LoadKind::Products => "products",
            LoadKind::Search(_) => "search",
        }
    }
}

/// Whole seconds as `3s`, anything finer as `2500ms`
fn format_limit(limit: Duration) -> String {
    if limit.subsec_nanos() == 0 {
        format!("{}s", limit.as_secs())
    } else {
        format!("{}ms", limit.as_millis())
    }
}

/// Handle to the operation currently allowed to publish its outcome.
///
/// Owned by the controller state only.
#[derive(Debug)]
pub struct InFlight {
    pub id: OperationId,
    pub kind: LoadKind,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl InFlight {
    pub fn new(id: OperationId, kind: LoadKind, token: CancellationToken) -> Self {
        Self {
            id,
            kind,
            token,
            task: None,
        }
    }

    /// Attach the spawned task running this operation
    pub fn attach(&mut self, task: JoinHandle<()>) {
        self.task = Some(task);
    }

    /// True until the operation is cancelled or its task has finished
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && self.task.as_ref().map_or(true, |t| !t.is_finished())
    }

    /// Signal cancellation and stop the task at its next suspension point
    pub fn cancel(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Debounced search bookkeeping
#[derive(Debug, Default)]
pub struct SearchState {
    /// Bumped on every query change; only the newest timer may fire
    pub generation: u64,
    /// Last query that actually started a search
    pub last_query: Option<String>,
}

/// Everything the update function reads and writes
#[derive(Debug)]
pub struct ControllerState {
    pub ui: UiState,
    pub in_flight: Option<InFlight>,
    pub search: SearchState,
    pub search_debounce: Duration,
    pub disposed: bool,
    next_operation: OperationId,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}

impl ControllerState {
    pub fn new(search_debounce: Duration) -> Self {
        Self {
            ui: UiState::Idle,
            in_flight: None,
            search: SearchState::default(),
            search_debounce,
            disposed: false,
            next_operation: 0,
        }
    }

    /// Allocate the id of the next operation
    pub fn next_operation_id(&mut self) -> OperationId {
        self.next_operation += 1;
        self.next_operation
    }

    /// Whether `id` belongs to the operation currently in flight
    pub fn is_current(&self, id: OperationId) -> bool {
        self.in_flight.as_ref().is_some_and(|op| op.id == id)
    }

    /// Cancel and forget the in-flight operation, if any
    pub fn cancel_in_flight(&mut self) -> Option<OperationId> {
        let mut op = self.in_flight.take()?;
        op.cancel();
        Some(op.id)
    }

    /// Record the task handle of operation `id` if it is still current
    pub fn attach_task(&mut self, id: OperationId, task: JoinHandle<()>) {
        match self.in_flight.as_mut() {
            Some(op) if op.id == id => op.attach(task),
            // Superseded before the spawn was recorded
            _ => task.abort(),
        }
    }
}
