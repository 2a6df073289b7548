// src/pool.rs
// =============================================================================
// A bounded worker pool.
//
// The pool knows nothing about crawling. It runs opaque async jobs on at
// most `max_workers` concurrent workers:
//
// - `min_workers` workers are started up front and always stay alive
// - when jobs are queued and no worker is free, another worker is started,
//   up to `max_workers`
// - a worker above the minimum that sits idle for `idle_timeout` retires
// - `submit` never waits: it only puts the job on an unbounded queue
// - `shutdown` stops accepting jobs and waits for running jobs to finish
//
// Jobs are closures that receive the id of the worker running them.
// =============================================================================

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

type Job = Box<dyn FnOnce(usize) -> BoxFuture<'static, ()> + Send>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool '{name}': min_workers ({min}) must be between 1 and max_workers ({max})")]
    InvalidBounds { name: String, min: usize, max: usize },

    #[error("pool is shut down")]
    Closed,
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Shows up in log lines
    pub name: String,
    pub min_workers: usize,
    pub max_workers: usize,
    pub idle_timeout: Duration,
}

impl PoolConfig {
    pub fn new(name: impl Into<String>, min_workers: usize, max_workers: usize) -> Self {
        Self {
            name: name.into(),
            min_workers,
            max_workers,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

/// A snapshot of what the pool is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Workers alive
    pub running: usize,
    /// Workers currently executing a job
    pub active: usize,
    /// Jobs waiting for a worker
    pub queued: usize,
    /// Jobs finished so far (including ones that panicked)
    pub executed: u64,
}

/// Cheap to clone; every clone submits to the same pool
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<Inner>,
}

struct Inner {
    config: PoolConfig,
    tx: mpsc::UnboundedSender<Job>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>,
    running: AtomicUsize,
    idle: AtomicUsize,
    active: AtomicUsize,
    queued: AtomicUsize,
    executed: AtomicU64,
    next_id: AtomicUsize,
    stop: watch::Sender<bool>,
    workers: Mutex<Workers>,
}

#[derive(Default)]
struct Workers {
    closed: bool,
    handles: Vec<JoinHandle<()>>,
}

enum Next {
    Job(Job),
    Idle,
    Stop,
}

impl WorkerPool {
    /// Starts the pool with `min_workers` workers. Must be called inside a
    /// tokio runtime.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        if config.min_workers == 0 || config.min_workers > config.max_workers {
            return Err(PoolError::InvalidBounds {
                name: config.name,
                min: config.min_workers,
                max: config.max_workers,
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let (stop, _) = watch::channel(false);
        let min = config.min_workers;

        let pool = Self {
            inner: Arc::new(Inner {
                config,
                tx,
                rx: tokio::sync::Mutex::new(rx),
                running: AtomicUsize::new(0),
                idle: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                queued: AtomicUsize::new(0),
                executed: AtomicU64::new(0),
                next_id: AtomicUsize::new(0),
                stop,
                workers: Mutex::new(Workers::default()),
            }),
        };

        for _ in 0..min {
            pool.grow();
        }

        tracing::debug!(
            pool = %pool.inner.config.name,
            min = pool.inner.config.min_workers,
            max = pool.inner.config.max_workers,
            "worker pool started"
        );
        Ok(pool)
    }

    /// Queues a job. Fails only once the pool is shut down, in which case
    /// the job is dropped without running.
    pub fn submit<F, Fut>(&self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce(usize) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.inner.lock_workers().closed {
            return Err(PoolError::Closed);
        }

        let job: Job = Box::new(move |id| job(id).boxed());
        self.inner.queued.fetch_add(1, Ordering::SeqCst);
        if self.inner.tx.send(job).is_err() {
            self.inner.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(PoolError::Closed);
        }

        // More waiting jobs than free workers: add a worker if allowed
        if self.inner.queued.load(Ordering::SeqCst) > self.inner.idle.load(Ordering::SeqCst) {
            self.grow();
        }
        Ok(())
    }

    pub fn stats(&self) -> PoolStats {
        let inner = &self.inner;
        PoolStats {
            running: inner.running.load(Ordering::SeqCst),
            active: inner.active.load(Ordering::SeqCst),
            queued: inner.queued.load(Ordering::SeqCst),
            executed: inner.executed.load(Ordering::SeqCst),
        }
    }

    /// Stops accepting jobs and waits for every worker to finish the job it
    /// is running. Jobs still queued at that point are dropped.
    pub async fn shutdown(&self) {
        let handles = {
            let mut workers = self.inner.lock_workers();
            workers.closed = true;
            std::mem::take(&mut workers.handles)
        };

        self.inner.stop.send_replace(true);

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(pool = %self.inner.config.name, error = %e, "worker ended abnormally");
            }
        }

        let mut rx = self.inner.rx.lock().await;
        rx.close();
        while let Ok(job) = rx.try_recv() {
            self.inner.queued.fetch_sub(1, Ordering::SeqCst);
            drop(job);
        }

        tracing::debug!(
            pool = %self.inner.config.name,
            executed = self.inner.executed.load(Ordering::SeqCst),
            "worker pool shut down"
        );
    }

    fn grow(&self) {
        let mut workers = self.inner.lock_workers();
        if workers.closed {
            return;
        }
        if self.inner.running.load(Ordering::SeqCst) >= self.inner.config.max_workers {
            return;
        }

        self.inner.running.fetch_add(1, Ordering::SeqCst);
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);

        workers.handles.retain(|handle| !handle.is_finished());
        workers
            .handles
            .push(tokio::spawn(worker_loop(Arc::clone(&self.inner), id)));

        tracing::trace!(pool = %self.inner.config.name, worker = id, "worker started");
    }
}

impl Inner {
    fn lock_workers(&self) -> MutexGuard<'_, Workers> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits for a job, the idle timeout, or the stop signal
    async fn next(&self, stop: &mut watch::Receiver<bool>) -> Next {
        if *stop.borrow() {
            return Next::Stop;
        }

        let recv = async {
            let mut rx = self.rx.lock().await;
            rx.recv().await
        };

        tokio::select! {
            _ = stop.changed() => Next::Stop,
            job = tokio::time::timeout(self.config.idle_timeout, recv) => match job {
                Ok(Some(job)) => Next::Job(job),
                Ok(None) => Next::Stop,
                Err(_) => Next::Idle,
            },
        }
    }

    /// Lets an idle worker go if we're above the minimum
    fn try_retire(&self) -> bool {
        let mut running = self.running.load(Ordering::SeqCst);
        while running > self.config.min_workers {
            match self.running.compare_exchange(
                running,
                running - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(current) => running = current,
            }
        }
        false
    }
}

async fn worker_loop(inner: Arc<Inner>, id: usize) {
    let mut stop = inner.stop.subscribe();

    let retired = loop {
        inner.idle.fetch_add(1, Ordering::SeqCst);
        let next = inner.next(&mut stop).await;
        inner.idle.fetch_sub(1, Ordering::SeqCst);

        match next {
            Next::Job(job) => {
                inner.queued.fetch_sub(1, Ordering::SeqCst);
                inner.active.fetch_add(1, Ordering::SeqCst);

                // A panicking job must not take the worker down with it
                let outcome = AssertUnwindSafe(async move { job(id).await })
                    .catch_unwind()
                    .await;
                if outcome.is_err() {
                    tracing::error!(pool = %inner.config.name, worker = id, "job panicked");
                }

                inner.active.fetch_sub(1, Ordering::SeqCst);
                inner.executed.fetch_add(1, Ordering::SeqCst);
            }
            Next::Idle => {
                if inner.try_retire() {
                    break true;
                }
            }
            Next::Stop => break false,
        }
    };

    if !retired {
        inner.running.fetch_sub(1, Ordering::SeqCst);
    }
    tracing::trace!(pool = %inner.config.name, worker = id, retired, "worker stopped");
}
