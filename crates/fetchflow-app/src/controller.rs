//! Public handle to a running controller
//!
//! [`Controller`] is cheap to clone. Every call returns immediately; state
//! changes arrive through [`Controller::watch`] (latest value) or
//! [`Controller::subscribe`] (every transition, in order). Dropping the last
//! clone disposes the controller.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::message::Message;
use crate::repository::DataRepository;
use crate::state::{LoadKind, UiState};

/// Default limit of [`Controller::load_with_timeout`]
pub const DEFAULT_TIMEOUT_LIMIT: Duration = Duration::from_millis(3000);

/// Default quiet period before a search query runs
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Controller tunables that are not part of the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub timeout_limit: Duration,
    pub search_debounce: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            timeout_limit: DEFAULT_TIMEOUT_LIMIT,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

struct Inner {
    msg_tx: mpsc::Sender<Message>,
    state_rx: watch::Receiver<UiState>,
    /// Never read; only used to hand out fresh receivers
    events: broadcast::Receiver<UiState>,
    shutdown: CancellationToken,
    settings: ControllerSettings,
    /// Disposes the engine when the last handle goes away
    _lifetime: DropGuard,
}

/// Handle to the UI state controller
#[derive(Clone)]
pub struct Controller {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &*self.inner.state_rx.borrow())
            .field("settings", &self.inner.settings)
            .finish()
    }
}

impl Controller {
    /// Start the engine task and return its handle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<R>(repository: Arc<R>, settings: ControllerSettings) -> Self
    where
        R: DataRepository + Sync + 'static,
    {
        let engine = Engine::new(repository, settings.search_debounce);
        let msg_tx = engine.msg_sender();
        let state_rx = engine.state_receiver();
        let events = engine.subscribe();

        let shutdown = CancellationToken::new();
        tokio::spawn(engine.run(shutdown.clone()));

        Self {
            inner: Arc::new(Inner {
                msg_tx,
                state_rx,
                events,
                shutdown: shutdown.clone(),
                settings,
                _lifetime: shutdown.drop_guard(),
            }),
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.inner.settings
    }

    /// Start a load of `kind`, cancelling the one in flight
    pub fn load(&self, kind: LoadKind) {
        self.send(Message::Load(kind));
    }

    pub fn load_normal(&self) {
        self.load(LoadKind::Normal);
    }

    pub fn load_with_retry(&self) {
        self.load(LoadKind::WithRetry);
    }

    /// Slow load bounded by the configured timeout limit
    pub fn load_with_timeout(&self) {
        self.load(LoadKind::WithTimeout(self.inner.settings.timeout_limit));
    }

    pub fn load_parallel(&self) {
        self.load(LoadKind::Parallel);
    }

    pub fn load_products(&self) {
        self.load(LoadKind::Products);
    }

    /// Feed the debounced search box
    pub fn search(&self, query: impl Into<String>) {
        self.send(Message::SearchQueryChanged(query.into()));
    }

    /// Cancel the in-flight load (if any) and return to `Idle`
    pub fn cancel(&self) {
        self.send(Message::Cancel);
    }

    /// Cancel everything and stop the engine. Nothing is published afterwards.
    pub fn dispose(&self) {
        self.inner.shutdown.cancel();
    }

    /// Snapshot of the current UI state
    pub fn state(&self) -> UiState {
        self.inner.state_rx.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state_rx.borrow().is_loading()
    }

    /// Receiver of the latest UI state
    pub fn watch(&self) -> watch::Receiver<UiState> {
        self.inner.state_rx.clone()
    }

    /// Receiver of every transition published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<UiState> {
        self.inner.events.resubscribe()
    }

    /// Resolves once the engine has stopped
    pub async fn closed(&self) {
        self.inner.msg_tx.closed().await;
    }

    fn send(&self, msg: Message) {
        match self.inner.msg_tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(msg)) => {
                warn!("Controller message queue full, dropping {:?}", msg);
            }
            Err(TrySendError::Closed(msg)) => {
                debug!("Controller disposed, ignoring {:?}", msg);
            }
        }
    }
}
