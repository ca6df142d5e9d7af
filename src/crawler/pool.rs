use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log2::{debug, error, warn};
use tokio::sync::{Notify, watch};
use tokio::time::timeout;

/// A unit of work the pool can execute. Running tasks may submit more tasks
/// through the pool handle they receive.
pub trait Task: Sized + Send + 'static {
    fn run(self, pool: WorkerPool<Self>) -> impl Future<Output = ()> + Send + 'static;
}

/// Sizing of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Workers that stay alive once started
    pub core_workers: usize,
    /// Upper bound on workers, extra ones appear only when every worker is busy
    pub max_workers: usize,
    /// How long an extra worker waits for work before it retires
    pub keep_alive: Duration,
}

struct Shared<T> {
    config: PoolConfig,
    /// Unbounded backlog, submission never blocks and never rejects
    queue: Mutex<VecDeque<T>>,
    available: Notify,
    workers: AtomicUsize,
    idle: AtomicUsize,
    next_worker_id: AtomicUsize,
    /// Times any worker went to sleep waiting for work
    idle_waits: AtomicUsize,
    closed: AtomicBool,
    /// Tasks queued or running
    pending: watch::Sender<usize>,
}

/// Elastic pool of tokio workers fed from a FIFO backlog.
/// Cloning hands out another handle to the same pool.
pub struct WorkerPool<T: Task> {
    shared: Arc<Shared<T>>,
}

impl<T: Task> Clone for WorkerPool<T> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T: Task> WorkerPool<T> {
    /// Creates an empty pool. Workers are spawned lazily on submission, so this
    /// must be called from within a tokio runtime before anything is submitted.
    pub fn new(config: PoolConfig) -> Self {
        let (pending, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                config,
                queue: Mutex::new(VecDeque::new()),
                available: Notify::new(),
                workers: AtomicUsize::new(0),
                idle: AtomicUsize::new(0),
                next_worker_id: AtomicUsize::new(0),
                idle_waits: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                pending,
            }),
        }
    }

    pub fn config(&self) -> PoolConfig {
        self.shared.config
    }

    /// Queues `task` without waiting for it to start.
    pub fn submit(&self, task: T) {
        if self.shared.closed.load(Ordering::SeqCst) {
            warn!("Pool is shut down, dropping submitted task");
            return;
        }

        self.shared.pending.send_modify(|n| *n += 1);
        self.queue().push_back(task);
        self.shared.available.notify_one();
        self.grow();
    }

    /// Workers currently alive
    pub fn worker_count(&self) -> usize {
        self.shared.workers.load(Ordering::SeqCst)
    }

    /// Tasks waiting for a worker
    pub fn backlog(&self) -> usize {
        self.queue().len()
    }

    /// How often workers have parked waiting for work
    pub fn idle_waits(&self) -> usize {
        self.shared.idle_waits.load(Ordering::Relaxed)
    }

    /// Tasks queued or running
    pub fn pending(&self) -> usize {
        *self.shared.pending.borrow()
    }

    /// Resolves once nothing is queued and nothing is running.
    pub async fn wait_idle(&self) {
        let mut pending = self.shared.pending.subscribe();
        // the sender lives in `shared`, which we hold, so this cannot fail
        let _ = pending.wait_for(|n| *n == 0).await;
    }

    /// Lets every worker exit once it runs out of work. Later submissions are dropped.
    pub fn shutdown(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.available.notify_waiters();
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.shared.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a worker while below the core size, or when the backlog is
    /// piling up and nobody is idle.
    fn grow(&self) {
        let PoolConfig { core_workers, max_workers, .. } = self.shared.config;
        let live = self.shared.workers.load(Ordering::SeqCst);
        let starved = self.shared.idle.load(Ordering::SeqCst) == 0 && live < max_workers;
        if live >= core_workers && !starved {
            return;
        }
        // losing this race means another submitter just added a worker
        if self
            .shared
            .workers
            .compare_exchange(live, live + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let id = self.shared.next_worker_id.fetch_add(1, Ordering::Relaxed);
            tokio::spawn(self.clone().work(id));
        }
    }

    /// Gives up the worker slot if the pool is above its core size.
    fn retire(&self) -> bool {
        let core = self.shared.config.core_workers;
        self.shared
            .workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n > core).then(|| n - 1))
            .is_ok()
    }

    async fn work(self, id: usize) {
        debug!("Worker {} started", id);
        loop {
            let next = self.queue().pop_front();
            match next {
                Some(task) => {
                    // a panicking task takes down its own tokio task, not this worker
                    if let Err(e) = tokio::spawn(task.run(self.clone())).await {
                        error!("Worker {}: task aborted: {}", id, e);
                    }
                    self.shared.pending.send_modify(|n| *n -= 1);
                }
                None => {
                    if self.shared.closed.load(Ordering::SeqCst) {
                        self.shared.workers.fetch_sub(1, Ordering::SeqCst);
                        break;
                    }
                    self.shared.idle.fetch_add(1, Ordering::SeqCst);
                    self.shared.idle_waits.fetch_add(1, Ordering::Relaxed);
                    // core workers never retire, so they sleep until there is work
                    let woken = if self.worker_count() > self.shared.config.core_workers {
                        timeout(self.shared.config.keep_alive, self.shared.available.notified())
                            .await
                            .is_ok()
                    } else {
                        self.shared.available.notified().await;
                        true
                    };
                    self.shared.idle.fetch_sub(1, Ordering::SeqCst);
                    if !woken && self.retire() {
                        debug!("Worker {} idle for {:?}, retiring", id, self.shared.config.keep_alive);
                        break;
                    }
                }
            }
        }
        debug!("Worker {} finished", id);
    }
}
