//! Run one load from the command line and follow it to the end

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fetchflow_app::config::{self, Settings};
use fetchflow_app::{Controller, LoadKind, RemoteRepository, UiState};
use fetchflow_core::prelude::*;
use fetchflow_remote::SimulatedApi;
use tokio::sync::broadcast::error::RecvError;

use crate::headless::HeadlessEvent;
use crate::render::render;
use crate::signals;

/// How state transitions are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text on stdout
    Text,
    /// One JSON event per line on stdout
    Headless,
}

impl OutputMode {
    fn show(self, state: &UiState) {
        match self {
            OutputMode::Text => println!("{}\n", render(state)),
            OutputMode::Headless => HeadlessEvent::from_state(state).emit(),
        }
    }
}

/// Wire a controller over the simulated backend configured by `settings`
pub fn build_controller(settings: &Settings) -> Result<Controller> {
    let api = SimulatedApi::new(settings.simulation_config());
    let repository = RemoteRepository::new(Arc::new(api), settings.repository_config()?);
    Ok(Controller::spawn(
        Arc::new(repository),
        settings.controller_settings(),
    ))
}

/// Run `kind` against the simulated backend until it finishes or is
/// interrupted (Ctrl-C cancels it)
pub async fn run(settings: &Settings, kind: LoadKind, mode: OutputMode) -> Result<UiState> {
    info!("Running {} load ({:?} output)", kind.label(), mode);

    let controller = build_controller(settings)?;

    if mode == OutputMode::Headless {
        HeadlessEvent::operation_started(kind.label()).emit();
    }

    let outcome = drive(&controller, kind, signals::interrupted(), |state| {
        mode.show(state)
    })
    .await;

    controller.dispose();
    controller.closed().await;
    outcome
}

/// Start `kind` on `controller` and report every transition to `on_state`.
///
/// Returns the final state: `Success`/`Error` when the load finishes, or
/// `Idle` when `interrupt` resolved first and the load was cancelled.
pub async fn drive<I, F>(
    controller: &Controller,
    kind: LoadKind,
    interrupt: I,
    mut on_state: F,
) -> Result<UiState>
where
    I: Future<Output = ()>,
    F: FnMut(&UiState),
{
    let mut events = controller.subscribe();
    controller.load(kind);

    tokio::pin!(interrupt);
    let mut interrupted = false;

    loop {
        tokio::select! {
            _ = &mut interrupt, if !interrupted => {
                info!("Interrupted, cancelling");
                interrupted = true;
                controller.cancel();
            }
            event = events.recv() => match event {
                Ok(state) => {
                    on_state(&state);
                    if state.is_finished() || (interrupted && state == UiState::Idle) {
                        return Ok(state);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {} state transitions", skipped);
                }
                Err(RecvError::Closed) => return Err(Error::ChannelClosed),
            }
        }
    }
}

/// Write the default config file under `project_path`
pub fn init(project_path: &Path) -> Result<PathBuf> {
    config::init_config_dir(project_path)?;
    Ok(config::config_path(project_path))
}
