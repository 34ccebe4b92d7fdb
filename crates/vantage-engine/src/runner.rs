//! Job execution capability.
//!
//! The orchestrator holds a [`JobRunner`] and does not know which
//! implementation is behind it: inline execution runs jobs in the calling
//! task, the worker pool fans them out over a bounded set of threads. The
//! pool size caps inflight jobs, which is the back-pressure mechanism.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::debug;

/// A unit of background work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that can execute submitted jobs.
pub trait JobRunner: Send + Sync {
    fn submit(&self, job: Job);
}

/// Runs every job synchronously in the calling task.
#[derive(Debug, Default)]
pub struct InlineRunner;

impl JobRunner for InlineRunner {
    fn submit(&self, job: Job) {
        job();
    }
}

/// A fixed-size thread pool draining a shared queue.
pub struct WorkerPool {
    sender: Option<mpsc::Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let receiver = Arc::clone(&receiver);
            let handle = std::thread::Builder::new()
                .name(format!("clean-worker-{index}"))
                .spawn(move || {
                    loop {
                        let job = {
                            let guard = receiver.lock().unwrap_or_else(|p| p.into_inner());
                            guard.recv()
                        };
                        match job {
                            Ok(job) => job(),
                            // Channel closed: the pool is shutting down.
                            Err(_) => break,
                        }
                    }
                })
                .expect("spawn worker thread");
            handles.push(handle);
        }
        debug!(workers, "worker pool started");
        Self {
            sender: Some(sender),
            handles,
        }
    }
}

impl JobRunner for WorkerPool {
    fn submit(&self, job: Job) {
        if let Some(sender) = &self.sender {
            // A send failure means the pool already shut down; the job is
            // dropped and its cleaning job stays in its last stored state.
            let _ = sender.send(job);
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
