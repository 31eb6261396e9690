//! Bounded-concurrency job executor used by the concurrent pipeline stages

use crate::limiter::RateLimiter;
use crate::requests::Result;

use kdam::{Bar, BarExt as _};
use parking_lot::Mutex;

use tokio::sync::mpsc;
use tokio::task;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt as _;

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One unit of work tagged with a correlation id
#[derive(Debug, Clone)]
pub struct Job<T> {
    pub id: usize,
    pub payload: T,
}

/// Outcome of one [`Job`], carrying the same correlation id as the job
#[derive(Debug)]
pub struct JobResult<T> {
    pub id: usize,
    pub outcome: Result<T>,
}

/// Executor that drains a closed queue of jobs on a fixed number of
/// concurrent workers.
///
/// Results are unordered with respect to submission: callers that need
/// positional correspondence re-sort by the correlation id afterwards.
pub struct WorkerPool<J> {
    workers: usize,
    queue: VecDeque<Job<J>>,
    limiter: Option<Arc<RateLimiter>>,
    progress: Option<Bar>,
}

impl<J: Send + 'static> WorkerPool<J> {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            queue: VecDeque::new(),
            limiter: None,
            progress: None,
        }
    }

    /// Shares `limiter` across all workers; it is acquired before every job
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Ticks `bar` once per collected result
    pub fn with_progress(mut self, bar: Bar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Enqueues jobs. Meant to be called once per pool instance, before
    /// [`run`](Self::run); the queue is closed from then on.
    pub fn submit(&mut self, jobs: impl IntoIterator<Item = Job<J>>) {
        self.queue.extend(jobs);
    }

    /// Starts the workers, drains the queue and returns the collected
    /// results.
    ///
    /// A failing handler produces a [`JobResult`] carrying the error, never
    /// a panic. After the first failure idle workers stop pulling new jobs,
    /// while jobs already in flight run to completion, so the pool never
    /// leaves orphaned work behind. With no failures there is exactly one
    /// result per submitted job.
    pub async fn run<R, H, Fut>(mut self, handler: H) -> Vec<JobResult<R>>
    where
        R: Send + 'static,
        H: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send,
    {
        let submitted = self.queue.len();
        let queue = Arc::new(Mutex::new(std::mem::take(&mut self.queue)));
        let failed = Arc::new(AtomicBool::new(false));
        let handler = Arc::new(handler);

        let (result_tx, result_rx) = mpsc::channel(submitted.max(1));

        tracing::debug!(num_workers = self.workers, submitted, "worker pool starting");

        let mut workers = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let queue = Arc::clone(&queue);
            let failed = Arc::clone(&failed);
            let handler = Arc::clone(&handler);
            let limiter = self.limiter.clone();
            let result_tx = result_tx.clone();

            workers.push(task::spawn(async move {
                loop {
                    if failed.load(Ordering::Acquire) {
                        break;
                    }

                    let job = { queue.lock().pop_front() };
                    let Some(Job { id, payload }) = job else { break };

                    if let Some(limiter) = &limiter {
                        limiter.acquire().await;
                    }

                    tracing::debug!(id, worker_id, "job started");

                    let outcome = (*handler)(payload).await;
                    if let Err(e) = &outcome {
                        failed.store(true, Ordering::Release);
                        tracing::error!(id, worker_id, error = %e, "job failed");
                    }

                    // The receiver outlives the workers, a send only fails
                    // once the whole run has been dropped.
                    let _ = result_tx.send(JobResult { id, outcome }).await;
                }
            }));
        }
        drop(result_tx);

        let mut results = Vec::with_capacity(submitted);
        let mut incoming = ReceiverStream::new(result_rx);
        while let Some(result) = incoming.next().await {
            if let Some(bar) = self.progress.as_mut() {
                let _ = bar.update(1);
            }

            results.push(result);
        }

        for join in futures::future::join_all(workers).await {
            if let Err(e) = join {
                tracing::warn!(error = %e, "worker task aborted");
            }
        }

        results
    }
}
