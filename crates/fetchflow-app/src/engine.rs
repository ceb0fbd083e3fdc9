//! Engine - owns the controller state and serializes every transition
//!
//! All state mutations happen inside the engine task: operation tasks and
//! debounce timers only send messages back. After each update the engine
//! publishes the UI state when it changed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::actions::handle_action;
use crate::handler;
use crate::message::Message;
use crate::repository::DataRepository;
use crate::state::{ControllerState, UiState};

/// Capacity of the message channel
const MESSAGE_CAPACITY: usize = 256;

/// Capacity of the transition broadcast; slow subscribers see `Lagged`
const EVENT_CAPACITY: usize = 256;

/// Controller engine.
///
/// Owns:
/// - the TEA state (the Model)
/// - the message channel
/// - the repository operations run against
/// - the publishers of [`UiState`]
pub struct Engine<R> {
    state: ControllerState,
    repository: Arc<R>,

    /// Sender half of the message channel. Cloned into operation tasks.
    msg_tx: mpsc::Sender<Message>,
    msg_rx: mpsc::Receiver<Message>,

    /// Current UI state, for consumers that only need the latest value
    state_tx: watch::Sender<UiState>,

    /// Every published transition, in order
    event_tx: broadcast::Sender<UiState>,
}

impl<R> Engine<R>
where
    R: DataRepository + Sync + 'static,
{
    pub fn new(repository: Arc<R>, search_debounce: Duration) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(MESSAGE_CAPACITY);
        let (state_tx, _) = watch::channel(UiState::Idle);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            state: ControllerState::new(search_debounce),
            repository,
            msg_tx,
            msg_rx,
            state_tx,
            event_tx,
        }
    }

    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    pub fn state_receiver(&self) -> watch::Receiver<UiState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to transitions published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<UiState> {
        self.event_tx.subscribe()
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn is_disposed(&self) -> bool {
        self.state.disposed
    }

    /// Process a single message through the TEA update cycle.
    ///
    /// Follow-up messages are processed in the same call. The UI state is
    /// published after every update that changed it.
    pub fn process_message(&mut self, message: Message) {
        let mut msg = Some(message);
        while let Some(m) = msg {
            let result = handler::update(&mut self.state, m);
            self.publish();

            if let Some(action) = result.action {
                handle_action(action, &mut self.state, &self.repository, &self.msg_tx);
            }

            msg = result.message;
        }
    }

    /// Drain messages until disposed, or until `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Controller engine started");
        while !self.state.disposed {
            let msg = tokio::select! {
                biased;
                _ = shutdown.cancelled() => Message::Dispose,
                msg = self.msg_rx.recv() => msg.unwrap_or(Message::Dispose),
            };
            self.process_message(msg);
        }
        info!("Controller engine stopped");
    }

    fn publish(&self) {
        if self.state.disposed {
            return;
        }
        let ui = &self.state.ui;
        let changed = self.state_tx.send_if_modified(|current| {
            if current == ui {
                false
            } else {
                *current = ui.clone();
                true
            }
        });
        if changed {
            debug!("UI state -> {}", ui.name());
            // No subscribers is fine
            let _ = self.event_tx.send(ui.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RemoteRepository;
    use crate::state::{LoadKind, UiData};
    use fetchflow_remote::test_utils::ScriptedSource;

    fn engine() -> Engine<RemoteRepository<ScriptedSource>> {
        let repo = RemoteRepository::with_defaults(Arc::new(ScriptedSource::new()));
        Engine::new(Arc::new(repo), Duration::from_millis(300))
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_message_publishes_transition() {
        let mut engine = engine();
        let mut events = engine.subscribe();
        let watcher = engine.state_receiver();

        engine.process_message(Message::Load(LoadKind::Normal));

        assert_eq!(events.recv().await.unwrap(), UiState::Loading);
        assert_eq!(*watcher.borrow(), UiState::Loading);
        assert!(engine.state().in_flight.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_state_is_not_republished() {
        let mut engine = engine();
        let mut events = engine.subscribe();

        engine.process_message(Message::Load(LoadKind::Normal));
        engine.process_message(Message::Load(LoadKind::Products));
        engine.process_message(Message::Cancel);

        // Loading -> Loading is one publication
        assert_eq!(events.recv().await.unwrap(), UiState::Loading);
        assert_eq!(events.recv().await.unwrap(), UiState::Idle);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_outcome_flows_back_through_channel() {
        let mut engine = engine();
        let mut events = engine.subscribe();

        engine.process_message(Message::Load(LoadKind::Products));
        assert_eq!(events.recv().await.unwrap(), UiState::Loading);

        let outcome = engine.msg_rx.recv().await.unwrap();
        engine.process_message(outcome);

        match events.recv().await.unwrap() {
            UiState::Success(UiData::Products(products)) => assert_eq!(products.len(), 5),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let engine = engine();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(engine.run(shutdown.clone()));

        shutdown.cancel();

        task.await.unwrap();
    }
}
