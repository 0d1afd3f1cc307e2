//! Terminal host: the thin shell around the session core. Reads line
//! commands from stdin, prints narration and timer state, lists history.

use std::{path::Path, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};

use crate::{
    db::{Database, SessionRecord, SessionStats},
    models::SessionConfig,
    narration::{NarrationCoordinator, NarrationPlayer, PacedPlayer},
    schedule::{compute_reminder_offsets, compute_schedule, pomodoro_format, Phase, StrictnessLevel},
    settings::{ConfigStore, Preferences},
    timer::{
        commands::{CommandDispatcher, CommandOutcome, HostCommand, HELP},
        display::format_clock,
        SessionController, SessionEvent, SessionSnapshot, SessionStatus,
    },
};

// Set to false to keep the host quiet apart from what it prints
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const DATABASE_FILE: &str = "focusmom.sqlite3";
pub const SETTINGS_FILE: &str = "settings.json";

/// Prints a one-line timer update every this many elapsed seconds.
const PROGRESS_EVERY_SECS: u64 = 60;

pub fn render_snapshot(snapshot: &SessionSnapshot) -> String {
    let phase = match snapshot.phase {
        Phase::Work { cycle } => format!("focus {cycle}/{}", snapshot.total_cycles),
        Phase::Break { window } => format!(
            "break {} ({:.0}% done)",
            window.sequence, snapshot.break_progress
        ),
    };
    let direction = if snapshot.count_up { "up" } else { "left" };

    format!(
        "[{}] {} | {} {} | {:.0}% of {}",
        snapshot.status,
        phase,
        format_clock(snapshot.display_secs),
        direction,
        snapshot.session_progress,
        format_clock(snapshot.total_secs),
    )
}

pub fn render_record(record: &SessionRecord) -> String {
    format!(
        "{}  {:<24} {:>8} / {:>3} min  {}",
        record.started_at.format("%Y-%m-%d %H:%M"),
        record.title,
        format_clock(record.time_spent_secs),
        record.planned_duration_minutes,
        if record.completed { "completed" } else { "quit" },
    )
}

pub fn render_stats(stats: &SessionStats) -> String {
    format!(
        "{} sessions, {} completed ({:.0}%), {} focused",
        stats.total_sessions,
        stats.completed_sessions,
        stats.completion_rate(),
        format_clock(stats.total_focus_secs),
    )
}

/// Break schedule and reminder times, as `plan` prints them.
pub fn render_plan(config: &SessionConfig) -> Vec<String> {
    let config = config.sanitized();
    let format = pomodoro_format(config.duration_minutes);
    let mut lines = vec![format!(
        "{}: {} min, {}-{} rhythm, strictness {} ({})",
        config.title,
        config.duration_minutes,
        format.work_minutes,
        format.break_minutes,
        config.strictness,
        StrictnessLevel::from_strictness(config.strictness).as_str(),
    )];

    let schedule = compute_schedule(config.duration_minutes, config.breaks_enabled);
    if schedule.is_empty() {
        lines.push("no breaks".into());
    }
    for window in &schedule {
        lines.push(format!(
            "break {} at {} for {} min",
            window.sequence,
            format_clock(window.start_secs()),
            window.duration_minutes
        ));
    }

    let reminders = compute_reminder_offsets(config.duration_minutes, config.strictness);
    let times: Vec<String> = reminders
        .iter()
        .map(|secs| format_clock(u64::from(*secs)))
        .collect();
    lines.push(format!("{} reminders: {}", reminders.len(), times.join(", ")));
    lines
}

fn build_player(preferences: &Preferences, clips: Option<&Path>) -> Arc<dyn NarrationPlayer> {
    let clips = clips.or(preferences.clips_dir.as_deref());

    #[cfg(feature = "audio")]
    {
        if let Some(dir) = clips {
            log_info!("playing narration clips from {}", dir.display());
            return Arc::new(crate::narration::ClipPlayer::new(dir));
        }
    }

    #[cfg(not(feature = "audio"))]
    {
        if let Some(dir) = clips {
            log_warn!(
                "ignoring clips in {}: built without the `audio` feature",
                dir.display()
            );
        }
    }

    let hold = Duration::from_secs_f64(preferences.narration_secs.max(0.0));
    Arc::new(PacedPlayer::new(hold))
}

pub fn configure(store: &ConfigStore, config: SessionConfig) -> Result<()> {
    store.save_session_config(config.clone())?;
    for line in render_plan(&config) {
        println!("{line}");
    }
    println!("saved to {}", store.path().display());
    Ok(())
}

pub fn plan(store: &ConfigStore) -> Result<()> {
    let config = store.load_session_config()?;
    for line in render_plan(&config) {
        println!("{line}");
    }
    Ok(())
}

pub async fn history(store: &ConfigStore, db: &Database, limit: usize) -> Result<()> {
    let user_id = store.preferences()?.user_id;
    let records = db.list_sessions_for_user(&user_id).await?;
    if records.is_empty() {
        println!("no sessions yet");
        return Ok(());
    }

    for record in records.iter().take(limit) {
        println!("{}", render_record(record));
    }
    println!("{}", render_stats(&db.session_stats(&user_id).await?));
    Ok(())
}

/// Prints narration, status changes and a periodic timer line until the
/// channel closes.
async fn print_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::NarrationFinished { text, .. }) => println!("MOM: {text}"),
            Ok(SessionEvent::StatusChanged { status }) => println!("-- {status}"),
            Ok(SessionEvent::Tick { snapshot }) => {
                if snapshot.elapsed_secs > 0 && snapshot.elapsed_secs % PROGRESS_EVERY_SECS == 0 {
                    println!("{}", render_snapshot(&snapshot));
                }
            }
            Ok(SessionEvent::Finished { record }) => {
                println!("{}", render_record(&record));
                println!("type `r` to go again, or end input to leave");
            }
            Ok(SessionEvent::NarrationStarted { .. }) => {}
            Err(RecvError::Lagged(skipped)) => log_warn!("display skipped {skipped} events"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Runs one interactive session on stdin/stdout. Closing input (or Ctrl-C)
/// while the session is open counts as quitting it.
pub async fn run_session(
    store: &ConfigStore,
    db: Database,
    count_up: bool,
    clips: Option<&Path>,
) -> Result<()> {
    let config = store.load_session_config()?;
    let preferences = store.preferences()?;

    let narrator = NarrationCoordinator::new(build_player(&preferences, clips));
    let controller =
        SessionController::new(config.clone(), preferences.user_id.clone(), narrator, Arc::new(db));
    if count_up || preferences.count_up {
        controller.toggle_count_up().await;
    }

    for line in render_plan(&config) {
        println!("{line}");
    }
    println!("{HELP}");

    let printer = tokio::spawn(print_events(controller.subscribe()));
    let mut dispatcher = CommandDispatcher::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<HostCommand>() {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        match dispatcher.dispatch(&controller, command).await {
            Ok(CommandOutcome::Snapshot(snapshot)) => println!("{}", render_snapshot(&snapshot)),
            Ok(CommandOutcome::AwaitingConfirmation) => {
                println!("Quitting already? Type `y` to confirm.")
            }
            Ok(CommandOutcome::CountUp(up)) => {
                println!("counting {}", if up { "up" } else { "down" })
            }
            Ok(CommandOutcome::Help) => println!("{HELP}"),
            Ok(CommandOutcome::Stopped(_)) | Ok(CommandOutcome::Ignored) => {}
            Err(err) => println!("{err}"),
        }
    }

    if matches!(
        controller.status().await,
        SessionStatus::Running | SessionStatus::Paused
    ) {
        log_info!("input closed with the session open; stopping it");
        let record = controller.stop().await?;
        println!("{}", render_record(&record));
    }

    drop(controller);
    printer.abort();
    Ok(())
}
