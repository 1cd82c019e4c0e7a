use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError, unbounded};
use tracing::{debug, warn};

use crate::error::{PoolError, TaskError};

struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

struct Job(Box<dyn FnOnce() + Send + 'static>);

#[derive(Default)]
struct JobCount {
    pending: usize,
    failed: usize,
}

#[derive(Default)]
struct ThreadInnerPool {
    jobcount: Mutex<JobCount>,
    cvar: Condvar,
}

impl ThreadInnerPool {
    fn counts(&self) -> MutexGuard<'_, JobCount> {
        self.jobcount.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_job(&self) {
        self.counts().pending += 1;
    }

    // Undoes `start_job` for a job that never reached the queue.
    fn cancel_job(&self) {
        self.finish(|_| {});
    }

    fn finish_job(&self, succeeded: bool) {
        self.finish(|counts| {
            if !succeeded {
                counts.failed += 1;
            }
        });
    }

    fn finish(&self, update: impl FnOnce(&mut JobCount)) {
        let mut counts = self.counts();
        counts.pending -= 1;
        update(&mut counts);
        if counts.pending == 0 {
            self.cvar.notify_all();
        }
    }

    fn wait_empty(&self, timeout: Duration) -> DrainOutcome {
        let counts = self.counts();
        let (counts, _) = self
            .cvar
            .wait_timeout_while(counts, timeout, |counts| counts.pending > 0)
            .unwrap_or_else(PoisonError::into_inner);
        DrainOutcome {
            completed: counts.pending == 0,
            pending: counts.pending,
            failed: counts.failed,
        }
    }
}

/// State of the pool when `drain` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Every submitted task finished before the timeout.
    pub completed: bool,
    /// Tasks still queued or running.
    pub pending: usize,
    /// Tasks that panicked.
    pub failed: usize,
}

/// Receives the result of one submitted task.
pub struct TaskHandle<T> {
    receiver: Receiver<Result<T, TaskError>>,
}

impl<T> TaskHandle<T> {
    pub fn wait(self) -> Result<T, TaskError> {
        self.receiver.recv().unwrap_or(Err(TaskError::Lost))
    }

    /// Returns `None` while the task is still queued or running. The result
    /// can be taken once; later calls report it as lost.
    pub fn try_result(&self) -> Option<Result<T, TaskError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(TaskError::Lost)),
        }
    }
}

/// Fixed set of worker threads fed from one unbounded queue.
pub struct ThreadPool {
    workers: Vec<Worker>,
    inner_pool: Arc<ThreadInnerPool>,
    sender: Option<Sender<Job>>,
    detach_on_drop: bool,
}

impl ThreadPool {
    pub fn new(size: usize) -> Self {
        assert!(size > 0);
        let pool = Arc::new(ThreadInnerPool::default());
        let (s, r) = unbounded();
        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let r: Receiver<Job> = r.clone();
            let thread = thread::spawn(move || {
                while let Ok(job) = r.recv() {
                    job.0();
                }
            });
            workers.push(Worker {
                id,
                thread: Some(thread),
            });
        }
        debug!(workers = size, "thread pool started");
        Self {
            workers,
            inner_pool: pool,
            sender: Some(s),
            detach_on_drop: false,
        }
    }

    /// One worker per available CPU.
    pub fn with_available_parallelism() -> Self {
        Self::new(num_cpus::get().max(1))
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues `f` without blocking and without a result channel. A panic is
    /// still counted in `DrainOutcome::failed`.
    pub fn execute<F>(&self, f: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let pool = Arc::clone(&self.inner_pool);
        self.enqueue(Job(Box::new(move || {
            let succeeded = run_guarded(f).is_ok();
            pool.finish_job(succeeded);
        })))
    }

    /// Queues `f` without blocking. Fails only once `drain` has been called.
    pub fn submit<F, T>(&self, f: F) -> Result<TaskHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = channel::bounded(1);
        let pool = Arc::clone(&self.inner_pool);
        self.enqueue(Job(Box::new(move || {
            let result = run_guarded(f);
            let succeeded = result.is_ok();
            // The submitter may have dropped its handle.
            let _ = result_tx.send(result);
            pool.finish_job(succeeded);
        })))?;
        Ok(TaskHandle {
            receiver: result_rx,
        })
    }

    fn enqueue(&self, job: Job) -> Result<(), PoolError> {
        let sender = self.sender.as_ref().ok_or(PoolError::Closed)?;
        self.inner_pool.start_job();
        if sender.send(job).is_err() {
            self.inner_pool.cancel_job();
            return Err(PoolError::Closed);
        }
        Ok(())
    }

    /// Stops accepting work and waits up to `timeout` for queued and running
    /// tasks to finish.
    pub fn drain(&mut self, timeout: Duration) -> DrainOutcome {
        self.sender = None;
        let outcome = self.inner_pool.wait_empty(timeout);
        if outcome.completed {
            debug!(failed = outcome.failed, "thread pool drained");
        } else {
            warn!(
                pending = outcome.pending,
                timeout = ?timeout,
                "thread pool did not drain before timeout"
            );
            self.detach_on_drop = true;
        }
        if outcome.failed > 0 {
            warn!(failed = outcome.failed, "some pool tasks failed");
        }
        outcome
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.sender = None;
        if self.detach_on_drop {
            debug!("detaching worker threads with work still pending");
            return;
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.thread.take() {
                if handle.join().is_err() {
                    warn!(worker = worker.id, "worker thread panicked");
                }
            }
        }
    }
}

fn run_guarded<T>(f: impl FnOnce() -> T) -> Result<T, TaskError> {
    let result = panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| TaskError::Panicked(panic_message(payload.as_ref())));
    if let Err(err) = &result {
        warn!(%err, "pool task failed");
    }
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
