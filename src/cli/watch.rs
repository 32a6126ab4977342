//! Watch mode: poll the clipboard on an interval until interrupted

use std::process::ExitCode;

use tokio::time::MissedTickBehavior;

use crate::application::ports::BrowserLauncher;
use crate::application::CaptureEngine;
use crate::domain::clipboard::{CaptureOutcome, CaptureRequest};
use crate::infrastructure::ChromeLauncher;

use super::app::{build_engine, capture_kind, CaptureSettings, EXIT_ERROR, EXIT_SUCCESS};
use super::presenter::{render_json, render_snapshot, Presenter, UNAVAILABLE};
use super::signals::ShutdownSignal;

/// Run the watch loop against a local Chromium
pub async fn run_watch(request: CaptureRequest, settings: CaptureSettings, json: bool) -> ExitCode {
    let presenter = Presenter::new();

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup().await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.info(&format!(
        "Watching {} every {} (Ctrl+C to stop)",
        request, settings.interval
    ));

    let engine = build_engine(ChromeLauncher::new(), &settings);
    let polls = watch_loop(&engine, request, &settings, json, &presenter, &shutdown).await;
    tracing::debug!(polls, "watch stopped");

    if let Err(e) = engine.sessions().shutdown().await {
        tracing::debug!(error = %e, "browser shutdown failed");
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Poll until `shutdown` fires; returns the number of completed polls.
///
/// A poll in flight when shutdown fires is abandoned. Launch failures are
/// reported and retried on the next tick.
pub async fn watch_loop<L: BrowserLauncher>(
    engine: &CaptureEngine<L>,
    request: CaptureRequest,
    settings: &CaptureSettings,
    json: bool,
    presenter: &Presenter,
    shutdown: &ShutdownSignal,
) -> usize {
    let mut ticker = tokio::time::interval(settings.interval.as_std());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut polls = 0;

    while !shutdown.is_shutdown() {
        let poll = async {
            ticker.tick().await;
            capture_kind(engine, request).await
        };

        let outcome = tokio::select! {
            _ = shutdown.wait() => break,
            outcome = poll => outcome,
        };
        polls += 1;

        let label = request.as_str();
        match outcome {
            Ok(CaptureOutcome::Captured(snapshot)) if json => {
                presenter.watch_line(label, &render_json(Some(&snapshot)))
            }
            Ok(CaptureOutcome::Captured(snapshot)) => {
                presenter.watch_line(label, &render_snapshot(&snapshot))
            }
            Ok(CaptureOutcome::Unavailable) if json => {
                presenter.watch_line(label, &render_json(None))
            }
            Ok(CaptureOutcome::Unavailable) => presenter.watch_line(label, UNAVAILABLE),
            Ok(CaptureOutcome::Failed(failure)) => presenter.warn(&failure.to_string()),
            Err(e) => presenter.warn(&e.to_string()),
        }
    }

    polls
}
