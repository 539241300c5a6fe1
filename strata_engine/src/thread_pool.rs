//! Persistent worker pool for parallel command recording
//!
//! Each worker owns its own job queue. Jobs submitted to the same worker run in
//! FIFO order on that worker's thread, so per-worker data (a secondary command
//! recorder and its objects) is never touched by two threads at once.
//! `wait()` is a batch barrier that can be reused every frame.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use crossbeam::channel::{unbounded, Receiver, Sender};
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_info};

/// Unit of work executed by a worker thread
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Lifecycle of a [`ThreadPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadPoolState {
    /// Created, no threads spawned yet
    Unstarted,
    /// Workers alive and accepting jobs
    Running,
    /// Workers joined; no more jobs accepted
    Shutdown,
}

enum Message {
    Run(Job),
    Terminate,
}

/// Completion tracking shared between the pool and its workers
struct Batch {
    /// Jobs enqueued but not yet finished
    pending: Mutex<usize>,
    /// Signaled when `pending` drops to zero
    drained: Condvar,
    /// Jobs that panicked since the last `wait()`
    panicked: AtomicUsize,
}

impl Batch {
    fn new() -> Self {
        Self {
            pending: Mutex::new(0),
            drained: Condvar::new(),
            panicked: AtomicUsize::new(0),
        }
    }

    fn job_added(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending += 1;
    }

    fn job_finished(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending -= 1;
        if *pending == 0 {
            self.drained.notify_all();
        }
    }
}

struct Worker {
    sender: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(index: usize, batch: Arc<Batch>) -> Result<Self> {
        let (sender, receiver): (Sender<Message>, Receiver<Message>) = unbounded();

        let handle = thread::Builder::new()
            .name(format!("strata-worker-{}", index))
            .spawn(move || {
                while let Ok(message) = receiver.recv() {
                    match message {
                        Message::Run(job) => {
                            if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                                batch.panicked.fetch_add(1, Ordering::SeqCst);
                                engine_error!("strata::ThreadPool", "Job panicked on worker {}", index);
                            }
                            // Last step of every job, so wait() never sees a half-run job as done
                            batch.job_finished();
                        }
                        Message::Terminate => break,
                    }
                }
            })
            .map_err(|e| {
                engine_error!("strata::ThreadPool", "Failed to spawn worker {}: {}", index, e);
                Error::InitializationFailed(format!("Failed to spawn worker thread {}: {}", index, e))
            })?;

        Ok(Self { sender, handle: Some(handle) })
    }
}

/// Fixed-size pool of persistent worker threads
pub struct ThreadPool {
    state: ThreadPoolState,
    workers: Vec<Worker>,
    batch: Arc<Batch>,
    next_worker: AtomicUsize,
}

impl ThreadPool {
    /// Create an unstarted pool; call [`set_thread_count`](Self::set_thread_count) to spawn workers
    pub fn new() -> Self {
        Self {
            state: ThreadPoolState::Unstarted,
            workers: Vec::new(),
            batch: Arc::new(Batch::new()),
            next_worker: AtomicUsize::new(0),
        }
    }

    /// Create a pool and spawn `count` workers right away
    pub fn with_threads(count: usize) -> Result<Self> {
        let mut pool = Self::new();
        pool.set_thread_count(count)?;
        Ok(pool)
    }

    /// Spawn `count` persistent workers
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` if `count` is zero
    /// - `InvalidState` if the pool was already started or shut down
    pub fn set_thread_count(&mut self, count: usize) -> Result<()> {
        if self.state != ThreadPoolState::Unstarted {
            return Err(Error::InvalidState(format!(
                "set_thread_count called on a {:?} thread pool",
                self.state
            )));
        }
        if count == 0 {
            return Err(Error::InvalidConfiguration("thread pool needs at least one worker".to_string()));
        }

        for index in 0..count {
            match Worker::spawn(index, Arc::clone(&self.batch)) {
                Ok(worker) => self.workers.push(worker),
                Err(e) => {
                    self.stop_workers();
                    return Err(e);
                }
            }
        }

        self.state = ThreadPoolState::Running;
        engine_info!("strata::ThreadPool", "Spawned {} worker threads", count);
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> ThreadPoolState {
        self.state
    }

    /// Number of worker threads
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Jobs enqueued and not yet finished
    pub fn pending_jobs(&self) -> usize {
        *self.batch.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a job on the next worker in round-robin order
    pub fn add_job<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.workers.is_empty() {
            return Err(self.not_running());
        }
        let worker = self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len();
        self.add_job_on(worker, job)
    }

    /// Enqueue a job on a specific worker
    ///
    /// # Panics
    ///
    /// Panics if `worker` is not below [`thread_count`](Self::thread_count).
    pub fn add_job_on<F>(&self, worker: usize, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.state != ThreadPoolState::Running {
            return Err(self.not_running());
        }
        assert!(
            worker < self.workers.len(),
            "worker index {} out of range (pool has {} workers)",
            worker,
            self.workers.len()
        );

        self.batch.job_added();
        if self.workers[worker].sender.send(Message::Run(Box::new(job))).is_err() {
            self.batch.job_finished();
            return Err(Error::UnexpectedError(format!("worker {} queue is closed", worker)));
        }
        Ok(())
    }

    /// Block until every job enqueued so far has finished
    ///
    /// # Errors
    ///
    /// `JobPanicked(n)` if `n` jobs of the batch panicked. The counter is cleared,
    /// so the next batch starts clean.
    pub fn wait(&self) -> Result<()> {
        let mut pending = self.batch.pending.lock().unwrap_or_else(PoisonError::into_inner);
        while *pending > 0 {
            pending = self
                .batch
                .drained
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
        drop(pending);

        let panicked = self.batch.panicked.swap(0, Ordering::SeqCst);
        if panicked > 0 {
            return Err(Error::JobPanicked(panicked));
        }
        Ok(())
    }

    /// Finish queued jobs, stop every worker and join its thread
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.state == ThreadPoolState::Shutdown {
            return;
        }
        self.stop_workers();
        self.state = ThreadPoolState::Shutdown;
        engine_debug!("strata::ThreadPool", "Thread pool shut down");
    }

    fn stop_workers(&mut self) {
        for worker in &self.workers {
            // Queued jobs ahead of Terminate still run
            let _ = worker.sender.send(Message::Terminate);
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    engine_error!("strata::ThreadPool", "Worker thread terminated abnormally");
                }
            }
        }
        self.workers.clear();
    }

    fn not_running(&self) -> Error {
        Error::InvalidState(format!("thread pool is {:?}", self.state))
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "thread_pool_tests.rs"]
mod tests;
