//! Main update function - handles state transitions (TEA pattern)

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::message::Message;
use crate::state::{ControllerState, InFlight, LoadKind, OperationId, UiData, UiState};

use super::{UpdateAction, UpdateResult};

/// Process a message and update state
/// Returns optional follow-up message and/or action
pub fn update(state: &mut ControllerState, message: Message) -> UpdateResult {
    if state.disposed {
        debug!("Controller disposed, dropping {:?}", message);
        return UpdateResult::none();
    }

    match message {
        Message::Load(kind) => handle_load(state, kind),

        Message::Cancel => {
            if let Some(id) = state.cancel_in_flight() {
                info!("Operation #{} cancelled by user", id);
            }
            // A pending debounce timer must not restart work after a cancel
            state.search.generation += 1;
            state.ui = UiState::Idle;
            UpdateResult::none()
        }

        Message::OperationSucceeded { id, data } => handle_success(state, id, data),

        Message::OperationFailed { id, message } => handle_failure(state, id, message),

        Message::OperationCancelled { id } => {
            if state.is_current(id) {
                state.in_flight = None;
                state.ui = UiState::Idle;
            }
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Debounced search
        // ─────────────────────────────────────────────────────────
        Message::SearchQueryChanged(query) => {
            state.search.generation += 1;
            UpdateResult::action(UpdateAction::ScheduleSearch {
                generation: state.search.generation,
                query,
                delay: state.search_debounce,
            })
        }

        Message::SearchDebounced { generation, query } => {
            if generation != state.search.generation {
                return UpdateResult::none();
            }
            if state.search.last_query.as_deref() == Some(query.as_str()) {
                debug!("Search query {:?} unchanged, not searching again", query);
                return UpdateResult::none();
            }
            state.search.last_query = Some(query.clone());
            UpdateResult::message(Message::Load(LoadKind::Search(query)))
        }

        Message::Dispose => {
            if let Some(id) = state.cancel_in_flight() {
                info!("Operation #{} cancelled on dispose", id);
            }
            state.search.generation += 1;
            state.disposed = true;
            UpdateResult::none()
        }
    }
}

/// Last writer wins: the previous operation is cancelled before the new one
/// is recorded
fn handle_load(state: &mut ControllerState, kind: LoadKind) -> UpdateResult {
    if let Some(previous) = state.cancel_in_flight() {
        debug!("Operation #{} superseded by a {} load", previous, kind.label());
    }

    let id = state.next_operation_id();
    let token = CancellationToken::new();
    info!("Starting {} load as operation #{}", kind.label(), id);

    state.ui = kind.loading_state();
    state.in_flight = Some(InFlight::new(id, kind.clone(), token.clone()));

    UpdateResult::action(UpdateAction::StartOperation { id, kind, token })
}

fn handle_success(state: &mut ControllerState, id: OperationId, data: UiData) -> UpdateResult {
    if !state.is_current(id) {
        debug!("Ignoring stale success of operation #{}", id);
        return UpdateResult::none();
    }
    state.in_flight = None;
    state.ui = UiState::Success(data);
    UpdateResult::none()
}

fn handle_failure(state: &mut ControllerState, id: OperationId, message: String) -> UpdateResult {
    if !state.is_current(id) {
        debug!("Ignoring stale failure of operation #{}", id);
        return UpdateResult::none();
    }
    let Some(op) = state.in_flight.take() else {
        return UpdateResult::none();
    };
    warn!("Operation #{} ({}) failed: {}", id, op.kind.label(), message);
    state.ui = UiState::Error(op.kind.failure_message(&message));
    UpdateResult::none()
}
