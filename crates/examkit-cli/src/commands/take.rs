//! The `examkit take` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use tokio::sync::mpsc;

use examkit_client::config::load_config_from;
use examkit_client::{FilePreferenceStore, HttpExamApi, MockExamApi};
use examkit_core::api::ExamApi;
use examkit_core::lifecycle::{channel_events, SessionDriver, SessionEvent, SubmitOutcome};
use examkit_core::notify::{Level, Notifier};
use examkit_core::route::SessionRoute;
use examkit_core::session::SessionState;

/// Prints notifications to the terminal.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: Level, message: &str) {
        eprintln!("  [{level}] {message}");
    }
}

pub async fn execute(
    route: String,
    script_path: PathBuf,
    offline: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let route = SessionRoute::parse(&route)?;
    let events = parse_script(&super::read_input(&script_path)?)?;
    tracing::info!(script = %script_path.display(), events = events.len(), "loaded event script");

    let api: Arc<dyn ExamApi> = match offline {
        Some(path) => {
            tracing::info!(exam = %path.display(), "taking exam offline");
            Arc::new(MockExamApi::new([super::load_exam(&path)?]))
        }
        None => {
            tracing::info!(base_url = %config.base_url, "using exam service");
            Arc::new(HttpExamApi::from_config(&config)?)
        }
    };
    let driver = SessionDriver::new(api, Arc::new(ConsoleNotifier), config.driver_config())
        .with_preference_store(Arc::new(FilePreferenceStore::new(&config.preferences_path)));

    let mut state = driver.open(&route).await?;
    eprintln!(
        "Session {} for {} ({} remaining, {} scripted events)",
        state.session_id(),
        route,
        state.countdown().clock(),
        events.len()
    );

    let (tx, rx) = mpsc::channel(events.len().max(1));
    let feeder = tokio::spawn(async move {
        for event in events {
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });
    let outcome = driver.run(&mut state, channel_events(rx)).await?;
    feeder.abort();
    tracing::debug!(?outcome, "session loop finished");

    print_progress(&state);
    match outcome {
        SubmitOutcome::Submitted {
            session_id,
            result_path,
            automatic,
        } => {
            println!(
                "Submitted session {session_id}{} at {}",
                if automatic { " (time up)" } else { "" },
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            );
            println!("Results: {result_path}");
        }
        SubmitOutcome::Abandoned => {
            println!("Session {} abandoned without submitting.", state.session_id());
        }
    }

    Ok(())
}

/// One JSON event per line. Blank lines and `#` comments are skipped.
fn parse_script(content: &str) -> Result<Vec<SessionEvent>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("script line {}: invalid event", i + 1))
        })
        .collect()
}

fn print_progress(state: &SessionState) {
    let mut table = Table::new();
    table.set_header(vec!["Section", "Type", "Answered", "Total"]);
    for progress in state.progress() {
        table.add_row(vec![
            Cell::new(&progress.section_id),
            Cell::new(progress.kind),
            Cell::new(progress.answered),
            Cell::new(progress.total),
        ]);
    }
    println!("{table}");
}
