//! Worker pool that owns the browser sessions

use crate::browser::{Session, SessionState};
use crate::config::{Assignment, DispatcherSettings};
use crate::error::{PipelineError, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Work to run against a session while the worker holds its lock. The
/// returned callback delivers the result once the session is released.
pub type SessionJob = Box<dyn for<'a> FnOnce(&'a mut Session) -> BoxFuture<'a, JobDone> + Send>;

/// Completion callback of a [`SessionJob`]
pub type JobDone = Box<dyn FnOnce() + Send>;

/// Point-in-time view of one pooled session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub state: SessionState,
    /// Jobs queued or running on this session's worker
    pub pending: usize,
}

struct Worker {
    id: Uuid,
    session: Arc<Mutex<Session>>,
    queue: mpsc::Sender<SessionJob>,
    pending: Arc<AtomicUsize>,
}

/// Bounded pool with one worker per session.
///
/// Each worker drains its own FIFO queue and runs one job at a time while
/// holding the session lock, so a session never sees two cycles at once.
pub struct Dispatcher {
    workers: Vec<Worker>,
    assignment: Assignment,
    next: AtomicUsize,
    shut_down: AtomicBool,
}

impl Dispatcher {
    /// Spawn one worker per session. Must be called inside a tokio runtime.
    pub fn start(sessions: Vec<Session>, settings: &DispatcherSettings) -> Self {
        let queue_depth = settings.queue_depth.max(1);
        let workers = sessions
            .into_iter()
            .enumerate()
            .map(|(index, session)| {
                let id = session.id();
                let session = Arc::new(Mutex::new(session));
                let pending = Arc::new(AtomicUsize::new(0));
                let (queue, rx) = mpsc::channel(queue_depth);

                tokio::spawn(run_worker(index, session.clone(), rx, pending.clone()));

                Worker {
                    id,
                    session,
                    queue,
                    pending,
                }
            })
            .collect::<Vec<_>>();

        info!(
            "Dispatcher started with {} workers (queue depth {}, {:?})",
            workers.len(),
            queue_depth,
            settings.assignment
        );

        Self {
            workers,
            assignment: settings.assignment,
            next: AtomicUsize::new(0),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.workers.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Queue `op` on a session and wait for its result.
    ///
    /// Waits for admission when the chosen worker's queue is full.
    pub async fn submit<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: for<'a> FnOnce(&'a mut Session) -> BoxFuture<'a, T> + Send + 'static,
    {
        if self.is_shut_down() {
            return Err(PipelineError::Connection(
                "browser dispatcher is shut down".to_string(),
            ));
        }

        let worker = self.pick()?;
        let (tx, rx) = oneshot::channel();
        let job = into_job(move |session| {
            async move {
                let out = op(session).await;
                Box::new(move || {
                    let _ = tx.send(out);
                }) as JobDone
            }
            .boxed()
        });

        // Count the job only once it holds a queue slot, so a caller dropped
        // while waiting for admission leaves nothing behind.
        let permit = worker.queue.reserve().await.map_err(|_| {
            PipelineError::Connection(format!(
                "worker for browser session {} has stopped",
                worker.id
            ))
        })?;
        worker.pending.fetch_add(1, Ordering::SeqCst);
        permit.send(job);

        rx.await.map_err(|_| {
            PipelineError::Internal(format!(
                "browser session {} dropped the job before completing it",
                worker.id
            ))
        })
    }

    /// Current state of every pooled session. A session whose lock is held
    /// is reported as busy.
    pub fn snapshot(&self) -> Vec<SessionSnapshot> {
        self.workers
            .iter()
            .map(|worker| SessionSnapshot {
                id: worker.id,
                state: worker
                    .session
                    .try_lock()
                    .map(|session| session.state())
                    .unwrap_or(SessionState::Busy),
                pending: worker.pending.load(Ordering::SeqCst),
            })
            .collect()
    }

    /// Close every session once. Waits for in-flight cycles; jobs still
    /// queued afterwards run against a closed session and fail.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            debug!("Dispatcher already shut down");
            return;
        }

        for worker in &self.workers {
            let mut session = worker.session.lock().await;
            session.close().await;
        }
        info!("Dispatcher shut down, {} sessions closed", self.workers.len());
    }

    fn pick(&self) -> Result<&Worker> {
        if self.workers.is_empty() {
            return Err(PipelineError::Connection(
                "no browser sessions configured".to_string(),
            ));
        }

        let worker = match self.assignment {
            Assignment::RoundRobin => {
                let n = self.next.fetch_add(1, Ordering::Relaxed);
                &self.workers[n % self.workers.len()]
            }
            Assignment::LeastBusy => self
                .workers
                .iter()
                .min_by_key(|w| w.pending.load(Ordering::SeqCst))
                .unwrap_or(&self.workers[0]),
        };
        Ok(worker)
    }
}

fn into_job<F>(f: F) -> SessionJob
where
    F: for<'a> FnOnce(&'a mut Session) -> BoxFuture<'a, JobDone> + Send + 'static,
{
    Box::new(f)
}

async fn run_worker(
    index: usize,
    session: Arc<Mutex<Session>>,
    mut rx: mpsc::Receiver<SessionJob>,
    pending: Arc<AtomicUsize>,
) {
    debug!("Session worker {} started", index);

    while let Some(job) = rx.recv().await {
        let done = {
            let mut session = session.lock().await;
            if session.state() != SessionState::Closed {
                if let Err(e) = session.connect().await {
                    warn!(worker = index, error = %e, "Session unavailable for queued job");
                }
            }
            session.mark_busy();

            let outcome = AssertUnwindSafe(job(&mut *session)).catch_unwind().await;
            session.release();
            match outcome {
                Ok(done) => Some(done),
                Err(_) => {
                    error!(worker = index, session = %session.id(), "Session job panicked");
                    None
                }
            }
        };
        pending.fetch_sub(1, Ordering::SeqCst);
        if let Some(done) = done {
            done();
        }
    }

    debug!("Session worker {} stopped", index);
}
