use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{
    engine::{SessionCue, SessionEngine},
    SessionAction, SessionEvent, SessionSnapshot, SessionStatus,
};
use crate::{
    db::{SessionRecord, SessionStore},
    error::{SessionError, SessionResult},
    models::SessionConfig,
    narration::{NarrationCategory, NarrationCoordinator},
    schedule::BreakWindow,
};

// Set to true to log every cue the tick loop handles
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

const EVENT_CAPACITY: usize = 256;
const TICK_INTERVAL: Duration = Duration::from_secs(1);

struct Ticker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Owns one session: user operations, the tick loop, narration sequencing
/// and the hand-off of the finished record to the store.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    engine: Arc<Mutex<SessionEngine>>,
    narrator: NarrationCoordinator,
    store: Arc<dyn SessionStore>,
    /// Serializes every operation that narrates. The tick loop only tries it
    /// and skips the tick when a user operation is in flight.
    ops: Arc<Mutex<()>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        user_id: impl Into<String>,
        narrator: NarrationCoordinator,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine: Arc::new(Mutex::new(SessionEngine::new(config, user_id))),
            narrator,
            store,
            ops: Arc::new(Mutex::new(())),
            ticker: Arc::new(Mutex::new(None)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn status(&self) -> SessionStatus {
        self.engine.lock().await.status()
    }

    pub async fn schedule(&self) -> Vec<BreakWindow> {
        self.engine.lock().await.schedule().to_vec()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let engine = self.engine.lock().await;
        engine.snapshot(Instant::now(), self.narrator.state())
    }

    pub async fn toggle_count_up(&self) -> bool {
        self.engine.lock().await.toggle_count_up()
    }

    /// Starts or resumes the session once the start narration has played.
    pub async fn start(&self) -> SessionResult<SessionSnapshot> {
        let _op = self.ops.lock().await;
        self.engine.lock().await.ensure_can(SessionAction::Start)?;

        self.narrate(NarrationCategory::SessionStart).await;

        self.engine.lock().await.start(Instant::now(), Utc::now())?;
        self.emit(SessionEvent::StatusChanged {
            status: SessionStatus::Running,
        });
        self.spawn_ticker().await;

        Ok(self.snapshot().await)
    }

    /// Pauses after the pause narration. Narration time still counts as
    /// session time.
    pub async fn pause(&self) -> SessionResult<SessionSnapshot> {
        let _op = self.ops.lock().await;
        self.engine.lock().await.ensure_can(SessionAction::Pause)?;

        self.narrate(NarrationCategory::SessionPause).await;

        self.engine.lock().await.pause(Instant::now())?;
        self.emit(SessionEvent::StatusChanged {
            status: SessionStatus::Paused,
        });

        Ok(self.snapshot().await)
    }

    /// Confirmed stop. Time spent is taken at the moment of the call, before
    /// the quit narration plays.
    pub async fn stop(&self) -> SessionResult<SessionRecord> {
        let _op = self.ops.lock().await;
        let record = self
            .engine
            .lock()
            .await
            .stop(Instant::now(), Utc::now())?;
        self.emit(SessionEvent::StatusChanged {
            status: SessionStatus::Stopped,
        });
        self.cancel_ticker().await;

        self.narrate(NarrationCategory::SessionQuit).await;

        self.persist(&record).await?;
        self.emit(SessionEvent::Finished {
            record: record.clone(),
        });
        Ok(record)
    }

    /// Back to a fresh, not-yet-started session after a stop or completion.
    pub async fn restart(&self) -> SessionResult<SessionSnapshot> {
        let _op = self.ops.lock().await;
        self.engine.lock().await.ensure_can(SessionAction::Restart)?;
        self.cancel_ticker().await;
        self.engine.lock().await.restart()?;
        self.emit(SessionEvent::StatusChanged {
            status: SessionStatus::NotStarted,
        });
        Ok(self.snapshot().await)
    }

    async fn narrate(&self, category: NarrationCategory) -> String {
        self.emit(SessionEvent::NarrationStarted { category });
        let text = self.narrator.speak(category).await;
        self.engine.lock().await.note_speech(Instant::now());
        self.emit(SessionEvent::NarrationFinished {
            category,
            text: text.clone(),
        });
        text
    }

    async fn persist(&self, record: &SessionRecord) -> SessionResult<()> {
        self.store
            .append(record.clone())
            .await
            .map_err(SessionError::Persistence)?;
        log_info!(
            "saved session {} ({}s, completed: {})",
            record.id,
            record.time_spent_secs,
            record.completed
        );
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    async fn spawn_ticker(&self) {
        let mut slot = self.ticker.lock().await;
        if slot.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(self.clone().tick_loop(cancel.clone()));
        *slot = Some(Ticker { handle, cancel });
    }

    async fn cancel_ticker(&self) {
        let Some(ticker) = self.ticker.lock().await.take() else {
            return;
        };
        ticker.cancel.cancel();
        if let Err(err) = ticker.handle.await {
            log_error!("tick loop failed to join: {err}");
        }
    }

    /// Keeps ticking while paused; the engine ignores those ticks. Exits on
    /// cancellation or once the session has finished.
    async fn tick_loop(self, cancel: CancellationToken) {
        let mut interval = time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let Ok(_op) = self.ops.try_lock() else {
                continue;
            };

            let (cue, snapshot) = {
                let mut engine = self.engine.lock().await;
                let now = Instant::now();
                let cue = engine.tick(now, self.narrator.is_speaking());
                (cue, engine.snapshot(now, self.narrator.state()))
            };
            self.emit(SessionEvent::Tick { snapshot });

            if let Some(cue) = cue {
                self.handle_cue(cue).await;
            }

            if self.engine.lock().await.status().is_finished() {
                break;
            }
        }

        log_debug!("tick loop exited");
    }

    async fn handle_cue(&self, cue: SessionCue) {
        match cue {
            SessionCue::BreakStarted(window) => {
                log_info!("break {} started", window.sequence);
                self.narrate(NarrationCategory::BreakStart).await;
            }
            SessionCue::BreakEnded(window) => {
                log_info!("break {} ended", window.sequence);
                self.narrate(NarrationCategory::BreakEnd).await;
            }
            SessionCue::FocusReminder { offset_secs } => {
                log_debug!("focus reminder due at {offset_secs}s");
                self.narrate(NarrationCategory::FocusReminder).await;
            }
            SessionCue::Finished(record) => {
                self.emit(SessionEvent::StatusChanged {
                    status: SessionStatus::Completed,
                });
                self.narrate(NarrationCategory::SessionEnd).await;
                match self.persist(&record).await {
                    Ok(()) => self.emit(SessionEvent::Finished { record }),
                    Err(err) => log_error!("failed to save completed session {}: {err:?}", record.id),
                }
            }
        }
    }
}
