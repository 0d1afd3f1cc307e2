use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

enum Location {
    File(PathBuf),
    Memory,
}

impl Location {
    fn open(&self) -> Result<Connection> {
        let conn = match self {
            Location::File(path) => Connection::open(path)
                .with_context(|| format!("failed to open history database {}", path.display()))?,
            Location::Memory => {
                Connection::open_in_memory().context("failed to open in-memory database")?
            }
        };

        conn.busy_timeout(BUSY_TIMEOUT)
            .context("failed to set SQLite busy timeout")?;
        if let Location::File(_) = self {
            // Readers (`history`) never block the running session's writes.
            if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                warn!("could not switch history database to WAL: {err}");
            }
        }
        Ok(conn)
    }
}

/// Owns the worker thread. Dropping the last handle closes the job channel,
/// which ends the worker loop, then joins it.
struct Worker {
    jobs: Mutex<Option<mpsc::Sender<Job>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        let jobs = match self.jobs.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(jobs);

        let thread = match self.thread.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(thread) = thread {
            if thread.join().is_err() {
                error!("history database thread panicked");
            }
        }
    }
}

/// Session history database. `rusqlite::Connection` is not `Sync`, so one
/// dedicated thread owns it; async callers send closures and await the reply.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    path: Option<Arc<PathBuf>>,
}

impl Database {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let db = Self::spawn(Location::File(path.clone()))?;
        info!("history database ready at {}", path.display());
        Ok(Self {
            path: Some(Arc::new(path)),
            ..db
        })
    }

    /// A private database that disappears with the last handle.
    pub fn in_memory() -> Result<Self> {
        Self::spawn(Location::Memory)
    }

    fn spawn(location: Location) -> Result<Self> {
        let (jobs_tx, jobs_rx) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        let thread = thread::Builder::new()
            .name("focusmom-db".into())
            .spawn(move || {
                let mut conn = match location
                    .open()
                    .and_then(|mut conn| run_migrations(&mut conn).map(|()| conn))
                {
                    Ok(conn) => conn,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                if ready_tx.send(Ok(())).is_err() {
                    return;
                }

                for job in jobs_rx {
                    job(&mut conn);
                }
                debug!("history database thread exiting");
            })
            .context("failed to spawn database thread")?;

        ready_rx
            .recv()
            .context("database thread exited during startup")??;

        Ok(Self {
            worker: Arc::new(Worker {
                jobs: Mutex::new(Some(jobs_tx)),
                thread: Mutex::new(Some(thread)),
            }),
            path: None,
        })
    }

    /// `None` for an in-memory database.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().map(PathBuf::as_path)
    }

    /// Runs `task` on the database thread.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |conn| {
            let _ = reply_tx.send(task(conn));
        });

        {
            let jobs = self
                .worker
                .jobs
                .lock()
                .map_err(|_| anyhow!("database job queue lock poisoned"))?;
            jobs.as_ref()
                .ok_or_else(|| anyhow!("database is shut down"))?
                .send(job)
                .map_err(|_| anyhow!("database thread is gone"))?;
        }

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread dropped the request"))?
    }
}
