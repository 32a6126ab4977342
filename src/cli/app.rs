//! App runner for one-shot capture commands

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::application::ports::{BrowserLauncher, ConfigStore, LaunchOptions};
use crate::application::{CaptureEngine, CaptureError, SessionManager};
use crate::domain::clipboard::{CaptureOutcome, CaptureRequest, ClipboardSnapshot, PasteModifier};
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::interval::Interval;
use crate::infrastructure::browser::BROWSER_ENV;
use crate::infrastructure::{ChromeLauncher, XdgConfigStore};

use super::presenter::{render_file, render_json, render_snapshot, Presenter, UNAVAILABLE};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Validated capture settings
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    pub launch: LaunchOptions,
    pub modifier: PasteModifier,
    pub capture_timeout: Option<Duration>,
    pub interval: Interval,
}

impl CaptureSettings {
    /// Validate a merged config. Unlike the lenient `*_or_default`
    /// accessors, a malformed value is an error here.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let launch_timeout = parse_or(config.launch_timeout.as_deref(), "launch_timeout")?
            .unwrap_or_else(Interval::default_launch_timeout);
        let capture_timeout = match config.capture_timeout.as_deref() {
            Some(value) if value.eq_ignore_ascii_case("none") => None,
            other => parse_or::<Interval>(other, "capture_timeout")?,
        };
        let interval =
            parse_or(config.interval.as_deref(), "interval")?.unwrap_or_else(Interval::default_poll);
        let modifier = parse_or(config.paste_modifier.as_deref(), "paste_modifier")?
            .unwrap_or_else(PasteModifier::platform_default);

        Ok(Self {
            launch: LaunchOptions {
                browser_path: config
                    .browser_path
                    .as_deref()
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from),
                start_url: config.start_url_or_default().to_string(),
                launch_timeout: launch_timeout.as_std(),
            },
            modifier,
            capture_timeout: capture_timeout.map(|t| t.as_std()),
            interval,
        })
    }
}

fn parse_or<T>(value: Option<&str>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.parse::<T>().map_err(|e| ConfigError::ValidationError {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}

/// Build a capture engine over `launcher`
pub fn build_engine<L: BrowserLauncher>(
    launcher: L,
    settings: &CaptureSettings,
) -> CaptureEngine<L> {
    CaptureEngine::new(SessionManager::new(launcher, settings.launch.clone()))
        .with_modifier(settings.modifier)
        .with_capture_timeout(settings.capture_timeout)
}

/// Run one capture through the typed operation for its kind
pub async fn capture_kind<L: BrowserLauncher>(
    engine: &CaptureEngine<L>,
    request: CaptureRequest,
) -> Result<CaptureOutcome<ClipboardSnapshot>, CaptureError> {
    Ok(match request {
        CaptureRequest::Types => engine.clipboard_types().await?.map(ClipboardSnapshot::Types),
        CaptureRequest::PlainText => engine
            .clipboard_plain_text()
            .await?
            .map(ClipboardSnapshot::Text),
        CaptureRequest::RichText => engine
            .clipboard_rich_text()
            .await?
            .map(ClipboardSnapshot::Html),
        CaptureRequest::File => engine.clipboard_file().await?.map(ClipboardSnapshot::File),
    })
}

/// How a one-shot capture is printed
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub file_output: Option<PathBuf>,
}

/// Run a one-shot capture
pub async fn run_capture(
    request: CaptureRequest,
    settings: CaptureSettings,
    output: OutputOptions,
) -> ExitCode {
    let mut presenter = Presenter::new();
    let engine = build_engine(ChromeLauncher::new(), &settings);

    presenter.start_spinner("Starting capture browser...");
    if let Err(e) = engine.sessions().ensure_ready().await {
        presenter.spinner_fail("Browser unavailable");
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }
    presenter.stop_spinner();

    let outcome = capture_kind(&engine, request).await;
    let code = present_outcome(&presenter, outcome, &output).await;

    if let Err(e) = engine.sessions().shutdown().await {
        tracing::debug!(error = %e, "browser shutdown failed");
    }
    ExitCode::from(code)
}

async fn present_outcome(
    presenter: &Presenter,
    outcome: Result<CaptureOutcome<ClipboardSnapshot>, CaptureError>,
    output: &OutputOptions,
) -> u8 {
    match outcome {
        Ok(CaptureOutcome::Captured(snapshot)) => {
            if output.json {
                presenter.output(&render_json(Some(&snapshot)));
            } else {
                presenter.output(&render_snapshot(&snapshot));
            }
            if let (Some(path), ClipboardSnapshot::File(file)) = (&output.file_output, &snapshot) {
                if let Err(e) = write_file(path, &file.content).await {
                    presenter.error(&e);
                    return EXIT_ERROR;
                }
                presenter.success(&format!("Saved {} to {}", render_file(file), path.display()));
            }
            EXIT_SUCCESS
        }
        Ok(CaptureOutcome::Unavailable) => {
            if output.json {
                presenter.output(&render_json(None));
            } else {
                presenter.output(UNAVAILABLE);
            }
            EXIT_SUCCESS
        }
        Ok(CaptureOutcome::Failed(failure)) => {
            presenter.error(&failure.to_string());
            EXIT_ERROR
        }
        Err(e) => {
            presenter.error(&e.to_string());
            EXIT_ERROR
        }
    }
}

async fn write_file(path: &Path, content: &[u8]) -> Result<(), String> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

/// Ask for an arbitrary clipboard format. Always fails.
pub async fn run_format(name: &str, settings: CaptureSettings) -> ExitCode {
    let presenter = Presenter::new();
    let engine = build_engine(ChromeLauncher::new(), &settings);

    match engine.clipboard_format(name).await {
        Ok(_) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load_or_empty().await;

    let env_config = AppConfig {
        browser_path: env::var(BROWSER_ENV).ok().filter(|s| !s.trim().is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}
