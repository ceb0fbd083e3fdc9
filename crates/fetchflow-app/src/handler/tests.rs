//! Tests for handler module

use std::time::Duration;

use super::*;
use crate::message::Message;
use crate::state::{ControllerState, LoadKind, UiData, UiState};
use fetchflow_core::User;

fn users() -> UiData {
    UiData::Users(vec![User::new(1, "Ana García", "ana@email.com")])
}

/// Apply a Load and return the id and token of the started operation
fn start(state: &mut ControllerState, kind: LoadKind) -> (u64, CancellationToken) {
    match update(state, Message::Load(kind)).action {
        Some(UpdateAction::StartOperation { id, token, .. }) => (id, token),
        other => panic!("expected StartOperation, got {:?}", other),
    }
}

#[test]
fn test_load_publishes_loading_and_starts_operation() {
    let mut state = ControllerState::default();

    let result = update(&mut state, Message::Load(LoadKind::Normal));

    assert_eq!(state.ui, UiState::Loading);
    assert!(matches!(
        result.action,
        Some(UpdateAction::StartOperation {
            kind: LoadKind::Normal,
            ..
        })
    ));
    assert!(state.in_flight.is_some());
}

#[test]
fn test_retry_load_shows_retry_message() {
    let mut state = ControllerState::default();

    update(&mut state, Message::Load(LoadKind::WithRetry));

    assert_eq!(
        state.ui,
        UiState::LoadingWithMessage("Loading with automatic retries...".into())
    );
}

#[test]
fn test_success_of_current_operation_publishes_data() {
    let mut state = ControllerState::default();
    let (id, _) = start(&mut state, LoadKind::Normal);

    update(&mut state, Message::OperationSucceeded { id, data: users() });

    assert_eq!(state.ui, UiState::Success(users()));
    assert!(state.in_flight.is_none());
}

#[test]
fn test_failure_message_is_verbatim_for_normal_load() {
    let mut state = ControllerState::default();
    let (id, _) = start(&mut state, LoadKind::Normal);

    update(
        &mut state,
        Message::OperationFailed {
            id,
            message: "Sporadic connection error".into(),
        },
    );

    assert_eq!(state.ui, UiState::Error("Sporadic connection error".into()));
    assert!(state.in_flight.is_none());
}

#[test]
fn test_failure_message_is_prefixed_for_retry_load() {
    let mut state = ControllerState::default();
    let (id, _) = start(&mut state, LoadKind::WithRetry);

    update(
        &mut state,
        Message::OperationFailed {
            id,
            message: "Simulated network error (attempt #3)".into(),
        },
    );

    assert_eq!(
        state.ui,
        UiState::Error("Failed after several attempts: Simulated network error (attempt #3)".into())
    );
}

#[test]
fn test_new_load_cancels_previous_and_ignores_its_outcome() {
    let mut state = ControllerState::default();
    let (first, first_token) = start(&mut state, LoadKind::Normal);
    let (second, second_token) = start(&mut state, LoadKind::Products);

    assert!(first_token.is_cancelled());
    assert!(!second_token.is_cancelled());
    assert_ne!(first, second);

    // A late outcome of the superseded operation changes nothing
    update(
        &mut state,
        Message::OperationSucceeded {
            id: first,
            data: users(),
        },
    );
    assert_eq!(state.ui, UiState::Loading);
    update(
        &mut state,
        Message::OperationFailed {
            id: first,
            message: "late".into(),
        },
    );
    assert_eq!(state.ui, UiState::Loading);
    assert!(state.is_current(second));
}

#[test]
fn test_cancel_returns_to_idle_and_cancels_token() {
    let mut state = ControllerState::default();
    let (id, token) = start(&mut state, LoadKind::WithTimeout(Duration::from_secs(3)));

    update(&mut state, Message::Cancel);

    assert_eq!(state.ui, UiState::Idle);
    assert!(token.is_cancelled());
    assert!(state.in_flight.is_none());

    // The cancelled operation cannot publish anymore
    update(&mut state, Message::OperationCancelled { id });
    update(
        &mut state,
        Message::OperationFailed {
            id,
            message: "late".into(),
        },
    );
    assert_eq!(state.ui, UiState::Idle);
}

#[test]
fn test_cancel_without_operation_is_idle() {
    let mut state = ControllerState::default();

    update(&mut state, Message::Cancel);

    assert_eq!(state.ui, UiState::Idle);
}

#[test]
fn test_cancelled_outcome_of_current_operation_is_idle_not_error() {
    let mut state = ControllerState::default();
    let (id, _) = start(&mut state, LoadKind::Parallel);

    update(&mut state, Message::OperationCancelled { id });

    assert_eq!(state.ui, UiState::Idle);
}

#[test]
fn test_query_change_schedules_debounce() {
    let mut state = ControllerState::new(Duration::from_millis(300));

    let result = update(&mut state, Message::SearchQueryChanged("ana".into()));

    match result.action {
        Some(UpdateAction::ScheduleSearch {
            generation,
            query,
            delay,
        }) => {
            assert_eq!(generation, state.search.generation);
            assert_eq!(query, "ana");
            assert_eq!(delay, Duration::from_millis(300));
        }
        other => panic!("expected ScheduleSearch, got {:?}", other),
    }
    // Nothing starts until the timer fires
    assert_eq!(state.ui, UiState::Idle);
}

#[test]
fn test_only_newest_debounce_timer_triggers_search() {
    let mut state = ControllerState::default();
    update(&mut state, Message::SearchQueryChanged("a".into()));
    let stale = state.search.generation;
    update(&mut state, Message::SearchQueryChanged("an".into()));
    let fresh = state.search.generation;

    let result = update(
        &mut state,
        Message::SearchDebounced {
            generation: stale,
            query: "a".into(),
        },
    );
    assert!(result.message.is_none());

    let result = update(
        &mut state,
        Message::SearchDebounced {
            generation: fresh,
            query: "an".into(),
        },
    );
    assert!(matches!(
        result.message,
        Some(Message::Load(LoadKind::Search(ref q))) if q == "an"
    ));
}

#[test]
fn test_repeated_query_is_not_searched_twice() {
    let mut state = ControllerState::default();
    update(&mut state, Message::SearchQueryChanged("ana".into()));
    let generation = state.search.generation;
    let first = update(
        &mut state,
        Message::SearchDebounced {
            generation,
            query: "ana".into(),
        },
    );
    assert!(first.message.is_some());

    update(&mut state, Message::SearchQueryChanged("ana".into()));
    let generation = state.search.generation;
    let second = update(
        &mut state,
        Message::SearchDebounced {
            generation,
            query: "ana".into(),
        },
    );
    assert!(second.message.is_none());
}

#[test]
fn test_cancel_invalidates_pending_debounce() {
    let mut state = ControllerState::default();
    update(&mut state, Message::SearchQueryChanged("ana".into()));
    let generation = state.search.generation;

    update(&mut state, Message::Cancel);
    let result = update(
        &mut state,
        Message::SearchDebounced {
            generation,
            query: "ana".into(),
        },
    );

    assert!(result.message.is_none());
}

#[test]
fn test_dispose_cancels_and_freezes_state() {
    let mut state = ControllerState::default();
    let (id, token) = start(&mut state, LoadKind::WithRetry);
    let before = state.ui.clone();

    update(&mut state, Message::Dispose);

    assert!(state.disposed);
    assert!(token.is_cancelled());
    assert_eq!(state.ui, before);

    // Nothing moves after dispose
    let result = update(&mut state, Message::Load(LoadKind::Normal));
    assert!(result.action.is_none());
    update(&mut state, Message::OperationSucceeded { id, data: users() });
    assert_eq!(state.ui, before);
}
