//! Announcement Queue
//!
//! Bounded FIFO of announcement requests drained by a fixed pool of workers.
//!
//! Lifecycle is one-shot: `Created -> Running -> Stopped`. Tasks added before
//! `start()` wait in the buffer; `stop()` closes intake and waits for the
//! workers to play everything still buffered.
//!
//! Producers never block. A full buffer (or closed intake) drops the task
//! with a warning and bumps the `dropped` counter.

use crate::playback::announcer::NumeralAnnouncer;
use chrono::{DateTime, Utc};
use qcall_common::config::QueueConfig;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

/// One accepted announcement request.
#[derive(Debug, Clone)]
pub struct AnnouncementTask {
    pub id: Uuid,
    pub queue_number: String,
    pub room_number: String,
    pub enqueued_at: DateTime<Utc>,
    /// Always Medium; ordering is strictly FIFO.
    pub priority: TaskPriority,
}

impl AnnouncementTask {
    pub fn new(queue_number: impl Into<String>, room_number: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            queue_number: queue_number.into(),
            room_number: room_number.into(),
            enqueued_at: qcall_common::time::now(),
            priority: TaskPriority::Medium,
        }
    }
}

/// Point-in-time queue snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub is_running: bool,
    pub pending_count: usize,
    pub worker_count: usize,
    pub capacity: usize,
}

/// Cumulative counters since process start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub enqueued: u64,
    pub dropped: u64,
    /// Announcements where every step played
    pub announced: u64,
    /// Announcements with at least one skipped step (or a worker panic)
    pub incomplete: u64,
    pub cleared: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Running,
    Stopped,
}

#[derive(Default)]
struct Counters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    announced: AtomicU64,
    incomplete: AtomicU64,
    cleared: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> QueueStats {
        QueueStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            announced: self.announced.load(Ordering::Relaxed),
            incomplete: self.incomplete.load(Ordering::Relaxed),
            cleared: self.cleared.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejected {
    Full,
    Closed,
}

/// Task buffer shared with the workers.
///
/// One semaphore permit per pushed task wakes one worker. Permits outlive
/// cleared tasks; a worker that finds the buffer empty just waits again.
/// Closing the semaphore ends intake: workers then drain and exit.
struct Intake {
    tasks: Mutex<VecDeque<AnnouncementTask>>,
    ready: Semaphore,
    capacity: usize,
}

impl Intake {
    fn new(capacity: usize) -> Self {
        Self {
            tasks: Mutex::new(VecDeque::with_capacity(capacity)),
            ready: Semaphore::new(0),
            capacity,
        }
    }

    fn tasks(&self) -> MutexGuard<'_, VecDeque<AnnouncementTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the task's 1-based position in the buffer.
    fn push(&self, task: AnnouncementTask) -> Result<usize, Rejected> {
        let mut tasks = self.tasks();
        if self.ready.is_closed() {
            return Err(Rejected::Closed);
        }
        if tasks.len() >= self.capacity {
            return Err(Rejected::Full);
        }
        tasks.push_back(task);
        self.ready.add_permits(1);
        Ok(tasks.len())
    }

    /// Next task, or None once intake is closed and the buffer is empty.
    async fn next(&self) -> Option<AnnouncementTask> {
        loop {
            let open = match self.ready.acquire().await {
                Ok(permit) => {
                    permit.forget();
                    true
                }
                Err(_) => false,
            };

            let next = self.tasks().pop_front();
            match next {
                Some(task) => return Some(task),
                None if open => continue,
                None => return None,
            }
        }
    }

    fn drain(&self) -> usize {
        let mut tasks = self.tasks();
        let count = tasks.len();
        tasks.clear();
        count
    }

    fn close(&self) {
        // Under the buffer lock so no push lands after the final drain
        let _tasks = self.tasks();
        self.ready.close();
    }

    fn len(&self) -> usize {
        self.tasks().len()
    }
}

/// Bounded announcement queue with a worker pool.
pub struct AnnouncementQueue {
    announcer: Arc<NumeralAnnouncer>,
    intake: Arc<Intake>,
    counters: Arc<Counters>,
    worker_count: usize,
    pause: Duration,
    lifecycle: RwLock<Lifecycle>,
    workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl AnnouncementQueue {
    pub fn new(announcer: Arc<NumeralAnnouncer>, config: &QueueConfig) -> Self {
        Self {
            announcer,
            intake: Arc::new(Intake::new(config.capacity)),
            counters: Arc::new(Counters::default()),
            worker_count: config.worker_count,
            pause: config.inter_task_pause(),
            lifecycle: RwLock::new(Lifecycle::Created),
            workers: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// Enqueue an announcement without blocking.
    ///
    /// Dropped (and logged) when the buffer is full or the queue has stopped.
    pub fn add_task(&self, queue_number: &str, room_number: &str) {
        let task = AnnouncementTask::new(queue_number, room_number);
        let task_id = task.id;

        match self.intake.push(task) {
            Ok(position) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Queued announcement {} for ticket {} (position {})",
                    task_id, queue_number, position
                );
            }
            Err(reason) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                match reason {
                    Rejected::Full => warn!(
                        "Announcement queue full ({}), dropping ticket {} room {}",
                        self.intake.capacity, queue_number, room_number
                    ),
                    Rejected::Closed => warn!(
                        "Announcement queue stopped, dropping ticket {} room {}",
                        queue_number, room_number
                    ),
                }
            }
        }
    }

    /// Spawn the workers. No-op when already running or stopped.
    pub async fn start(&self) {
        let mut lifecycle = self.lifecycle.write().await;
        match *lifecycle {
            Lifecycle::Running => {
                debug!("Announcement queue already running");
                return;
            }
            Lifecycle::Stopped => {
                warn!("Announcement queue was stopped and cannot be restarted");
                return;
            }
            Lifecycle::Created => {}
        }

        let mut workers = self.workers.lock().await;
        for worker_id in 0..self.worker_count {
            workers.push(tokio::spawn(worker_loop(
                worker_id,
                Arc::clone(&self.intake),
                Arc::clone(&self.announcer),
                Arc::clone(&self.counters),
                self.pause,
            )));
        }
        *lifecycle = Lifecycle::Running;

        info!(
            "Announcement queue started: {} worker(s), capacity {}",
            self.worker_count, self.intake.capacity
        );
    }

    /// Close intake and wait for the workers to finish the backlog.
    ///
    /// Idempotent; a no-op unless running. Only the first caller waits for
    /// the drain: a concurrent second call returns at once, possibly before
    /// the backlog has played.
    pub async fn stop(&self) {
        let handles = {
            let mut lifecycle = self.lifecycle.write().await;
            if *lifecycle != Lifecycle::Running {
                return;
            }
            *lifecycle = Lifecycle::Stopped;
            self.intake.close();
            std::mem::take(&mut *self.workers.lock().await)
        };

        info!(
            "Stopping announcement queue, draining {} pending task(s)",
            self.intake.len()
        );

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Announcement worker ended abnormally: {}", e);
            }
        }

        info!("Announcement queue stopped");
    }

    /// Discard every buffered task. Tasks already being announced continue.
    pub async fn clear(&self) -> usize {
        let _lifecycle = self.lifecycle.write().await;
        let cleared = self.intake.drain();
        self.counters.cleared.fetch_add(cleared as u64, Ordering::Relaxed);
        info!("Cleared {} pending announcement(s)", cleared);
        cleared
    }

    pub async fn get_status(&self) -> QueueStatus {
        let lifecycle = self.lifecycle.read().await;
        QueueStatus {
            is_running: *lifecycle == Lifecycle::Running,
            pending_count: self.intake.len(),
            worker_count: self.worker_count,
            capacity: self.intake.capacity,
        }
    }

    pub async fn is_running(&self) -> bool {
        *self.lifecycle.read().await == Lifecycle::Running
    }

    /// Buffered tasks not yet claimed by a worker.
    pub fn pending_count(&self) -> usize {
        self.intake.len()
    }

    pub fn stats(&self) -> QueueStats {
        self.counters.snapshot()
    }
}

async fn worker_loop(
    worker_id: usize,
    intake: Arc<Intake>,
    announcer: Arc<NumeralAnnouncer>,
    counters: Arc<Counters>,
    pause: Duration,
) {
    debug!("Announcement worker {} started", worker_id);

    while let Some(task) = intake.next().await {
        debug!(
            "Worker {} picked up {} (waited {}ms)",
            worker_id,
            task.id,
            (qcall_common::time::now() - task.enqueued_at).num_milliseconds()
        );

        let announcer = Arc::clone(&announcer);
        let result = tokio::task::spawn_blocking(move || {
            announcer.announce(&task.queue_number, &task.room_number)
        })
        .await;

        match result {
            Ok(report) if report.is_complete() => {
                counters.announced.fetch_add(1, Ordering::Relaxed);
            }
            Ok(_) => {
                counters.incomplete.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                counters.incomplete.fetch_add(1, Ordering::Relaxed);
                error!("Worker {}: announcement panicked: {}", worker_id, e);
            }
        }

        tokio::time::sleep(pause).await;
    }

    debug!("Announcement worker {} exiting", worker_id);
}
