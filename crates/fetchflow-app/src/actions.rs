//! Action handlers: UpdateAction dispatch and background task spawning

use std::sync::Arc;
use std::time::Duration;

use fetchflow_core::prelude::*;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;

use crate::handler::UpdateAction;
use crate::message::Message;
use crate::repository::DataRepository;
use crate::state::{ControllerState, LoadKind, OperationId, UiData};

/// Execute an action by spawning a background task
pub fn handle_action<R>(
    action: UpdateAction,
    state: &mut ControllerState,
    repository: &Arc<R>,
    msg_tx: &mpsc::Sender<Message>,
) where
    R: DataRepository + Sync + 'static,
{
    match action {
        UpdateAction::StartOperation { id, kind, token } => {
            let task = spawn_operation(Arc::clone(repository), id, kind, token, msg_tx.clone());
            state.attach_task(id, task);
        }

        UpdateAction::ScheduleSearch {
            generation,
            query,
            delay,
        } => {
            spawn_search_debounce(generation, query, delay, msg_tx.clone());
        }
    }
}

/// Run one load to completion and report its outcome.
///
/// The repository call runs in its own task so a panic surfaces as
/// `OperationFailed` instead of leaving the controller loading. Aborting the
/// returned handle aborts that inner task as well.
///
/// Outcomes of operations whose token was cancelled are dropped here; the
/// update function also ignores any that slip through by id.
pub fn spawn_operation<R>(
    repository: Arc<R>,
    id: OperationId,
    kind: LoadKind,
    token: CancellationToken,
    msg_tx: mpsc::Sender<Message>,
) -> JoinHandle<()>
where
    R: DataRepository + Sync + 'static,
{
    tokio::spawn(async move {
        let operation = {
            let kind = kind.clone();
            let token = token.clone();
            AbortOnDropHandle::new(tokio::spawn(async move {
                run_operation(repository.as_ref(), &kind, &token).await
            }))
        };

        let outcome = match operation.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => Err(Error::Cancelled),
            Err(e) => {
                error!("Operation #{} ({}) panicked: {}", id, kind.label(), e);
                Err(Error::task(format!("{} load panicked", kind.label())))
            }
        };

        if token.is_cancelled() {
            debug!("Operation #{} finished after cancellation, discarding", id);
            return;
        }

        let msg = match outcome {
            Ok(data) => {
                info!("Operation #{} ({}) succeeded", id, kind.label());
                Message::OperationSucceeded { id, data }
            }
            Err(e) if e.is_cancelled() => Message::OperationCancelled { id },
            Err(e) => Message::OperationFailed {
                id,
                message: e.to_string(),
            },
        };

        if msg_tx.send(msg).await.is_err() {
            debug!("Controller gone, dropping outcome of operation #{}", id);
        }
    })
}

/// Dispatch a load kind to the matching repository operation
pub async fn run_operation<R>(
    repository: &R,
    kind: &LoadKind,
    cancel: &CancellationToken,
) -> Result<UiData>
where
    R: DataRepository + Sync,
{
    match kind {
        LoadKind::Normal => repository.fetch_users(cancel).await.map(UiData::Users),
        LoadKind::WithRetry => repository
            .fetch_users_with_retry(cancel)
            .await
            .map(UiData::Users),
        LoadKind::WithTimeout(limit) => repository
            .fetch_users_with_timeout(*limit, cancel)
            .await
            .map(UiData::Users),
        LoadKind::Parallel => repository
            .fetch_combined(cancel)
            .await
            .map(UiData::Combined),
        LoadKind::Products => repository.fetch_products(cancel).await.map(UiData::Products),
        LoadKind::Search(query) => repository
            .search_users(query, cancel)
            .await
            .map(UiData::Users),
    }
}

/// Report back after `delay`; newer generations make this one stale
fn spawn_search_debounce(
    generation: u64,
    query: String,
    delay: Duration,
    msg_tx: mpsc::Sender<Message>,
) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = msg_tx
            .send(Message::SearchDebounced { generation, query })
            .await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RemoteRepository;
    use fetchflow_remote::test_utils::ScriptedSource;
    use fetchflow_remote::Endpoint;

    fn repository(source: ScriptedSource) -> Arc<RemoteRepository<ScriptedSource>> {
        Arc::new(RemoteRepository::with_defaults(Arc::new(source)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_reports_success() {
        let (tx, mut rx) = mpsc::channel(8);
        let repo = repository(ScriptedSource::new());

        spawn_operation(repo, 7, LoadKind::Products, CancellationToken::new(), tx);

        match rx.recv().await {
            Some(Message::OperationSucceeded {
                id: 7,
                data: UiData::Products(products),
            }) => assert_eq!(products.len(), 5),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_reports_failure_text() {
        let (tx, mut rx) = mpsc::channel(8);
        let repo = repository(
            ScriptedSource::new().with_users_script(
                Endpoint::UsersStable,
                [Err("Sporadic connection error".into())],
            ),
        );

        spawn_operation(repo, 1, LoadKind::Normal, CancellationToken::new(), tx);

        match rx.recv().await {
            Some(Message::OperationFailed { id: 1, message }) => {
                assert_eq!(message, "Sporadic connection error")
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_operation_reports_nothing() {
        let (tx, mut rx) = mpsc::channel(8);
        let repo = repository(ScriptedSource::new());
        let token = CancellationToken::new();

        let task = spawn_operation(repo, 1, LoadKind::Normal, token.clone(), tx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
        task.await.unwrap();

        // Sender dropped with the task, nothing was sent
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_reports_after_delay() {
        let (tx, mut rx) = mpsc::channel(8);
        let start = tokio::time::Instant::now();

        spawn_search_debounce(3, "ana".into(), Duration::from_millis(300), tx);

        match rx.recv().await {
            Some(Message::SearchDebounced { generation: 3, query }) => assert_eq!(query, "ana"),
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
