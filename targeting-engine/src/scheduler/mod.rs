//! Asynchronous evaluation scheduler.
//!
//! Evaluation is long-running and I/O-bound, so it never runs on a
//! request-handling thread: jobs go over a channel to a small worker
//! pool, and the caller gets a handle to poll or block on. Workers retry
//! retryable failures a bounded number of times with linear backoff,
//! honor a configurable timeout, and check the cancellation token
//! between cursor batches.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};

use targeting_core::ast::CompiledCriteria;
use targeting_core::config::EvaluationConfig;
use targeting_core::errors::EvaluationError;
use targeting_core::events::{
    EvaluationCancelledEvent, EvaluationCompletedEvent, EvaluationFailedEvent,
    EvaluationStartedEvent, EventDispatcher,
};
use targeting_core::model::MaterializedPopulation;
use targeting_core::traits::{
    Cancellable, CancellationToken, Evaluator, HouseholdMatch, PopulationAccess,
};

/// One unit of evaluation work.
#[derive(Clone)]
pub struct EvaluationJob {
    pub population_id: String,
    pub criteria: CompiledCriteria,
    pub evaluation_date: NaiveDate,
}

/// Handle returned to the submitter.
pub struct EvaluationHandle {
    receiver: Receiver<Result<MaterializedPopulation, EvaluationError>>,
    token: CancellationToken,
}

impl EvaluationHandle {
    /// Non-blocking poll. `None` while the job is still running.
    pub fn try_result(&self) -> Option<Result<MaterializedPopulation, EvaluationError>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(EvaluationError::Failed {
                message: "evaluation worker dropped the job".to_string(),
            })),
        }
    }

    /// Block until the job finishes.
    pub fn wait(self) -> Result<MaterializedPopulation, EvaluationError> {
        self.receiver.recv().unwrap_or(Err(EvaluationError::Failed {
            message: "evaluation worker dropped the job".to_string(),
        }))
    }

    /// Request cancellation; the worker notices between batches.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

struct WorkItem {
    job: EvaluationJob,
    token: CancellationToken,
    result_tx: Sender<Result<MaterializedPopulation, EvaluationError>>,
}

/// Dispatches evaluation jobs to background workers.
pub struct EvaluationScheduler {
    job_tx: Option<Sender<WorkItem>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl EvaluationScheduler {
    pub fn new(
        config: EvaluationConfig,
        evaluator: Arc<dyn Evaluator>,
        store: Arc<dyn PopulationAccess>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        let (job_tx, job_rx) = unbounded::<WorkItem>();
        let mut workers = Vec::with_capacity(config.workers());

        for worker_id in 0..config.workers() {
            let rx = job_rx.clone();
            let evaluator = evaluator.clone();
            let store = store.clone();
            let dispatcher = dispatcher.clone();
            let config = config.clone();
            workers.push(
                thread::Builder::new()
                    .name(format!("targeting-eval-{worker_id}"))
                    .spawn(move || {
                        for item in rx.iter() {
                            run_job(&config, &*evaluator, &*store, &dispatcher, item);
                        }
                    })
                    .expect("failed to spawn evaluation worker"),
            );
        }

        Self {
            job_tx: Some(job_tx),
            workers,
        }
    }

    /// Submit a job; returns immediately with a pollable handle.
    pub fn submit(&self, job: EvaluationJob) -> EvaluationHandle {
        let token = CancellationToken::new();
        let (result_tx, result_rx) = bounded(1);
        let item = WorkItem {
            job,
            token: token.clone(),
            result_tx,
        };
        self.job_tx
            .as_ref()
            .expect("scheduler already shut down")
            .send(item)
            .expect("evaluation workers are gone");
        EvaluationHandle {
            receiver: result_rx,
            token,
        }
    }

    /// Stop accepting jobs and join the workers after the queue drains.
    pub fn shutdown(mut self) {
        self.job_tx.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for EvaluationScheduler {
    fn drop(&mut self) {
        self.job_tx.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn run_job(
    config: &EvaluationConfig,
    evaluator: &dyn Evaluator,
    store: &dyn PopulationAccess,
    dispatcher: &EventDispatcher,
    item: WorkItem,
) {
    let WorkItem {
        job,
        token,
        result_tx,
    } = item;

    dispatcher.emit_evaluation_started(&EvaluationStartedEvent {
        population_id: job.population_id.clone(),
        rule_count: job.criteria.rule_count(),
    });

    let started = Instant::now();
    let max_attempts = config.max_retries().saturating_add(1);
    let mut attempt = 0u32;

    let outcome = loop {
        attempt += 1;
        match run_attempt(config, evaluator, store, &job, &token) {
            Ok(population) => break Ok(population),
            Err(EvaluationError::Cancelled) => {
                dispatcher.emit_evaluation_cancelled(&EvaluationCancelledEvent {
                    population_id: job.population_id.clone(),
                });
                break Err(EvaluationError::Cancelled);
            }
            Err(e) => {
                let will_retry = e.is_retryable() && attempt < max_attempts;
                dispatcher.emit_evaluation_failed(&EvaluationFailedEvent {
                    population_id: job.population_id.clone(),
                    message: e.to_string(),
                    attempt,
                    will_retry,
                });
                if !will_retry {
                    break Err(e);
                }
                tracing::warn!(
                    population_id = %job.population_id,
                    attempt,
                    error = %e,
                    "evaluation attempt failed; retrying"
                );
                thread::sleep(Duration::from_millis(
                    config.retry_backoff_ms().saturating_mul(attempt as u64),
                ));
            }
        }
    };

    if let Ok(population) = &outcome {
        dispatcher.emit_evaluation_completed(&EvaluationCompletedEvent {
            population_id: job.population_id.clone(),
            household_count: population.household_count,
            duration_ms: started.elapsed().as_millis() as u64,
        });
    }

    // The submitter may have dropped the handle; that is not an error.
    let _ = result_tx.send(outcome);
}

fn run_attempt(
    config: &EvaluationConfig,
    evaluator: &dyn Evaluator,
    store: &dyn PopulationAccess,
    job: &EvaluationJob,
    token: &CancellationToken,
) -> Result<MaterializedPopulation, EvaluationError> {
    if token.is_cancelled() {
        return Err(EvaluationError::Cancelled);
    }

    let deadline = Instant::now() + Duration::from_millis(config.timeout_ms());
    let mut result = evaluator.evaluate(&job.criteria, job.evaluation_date)?;

    // Drain cooperatively so cancellation and timeout are honored
    // mid-flight rather than only at the end.
    let mut matches: Vec<HouseholdMatch> = Vec::new();
    loop {
        if token.is_cancelled() {
            return Err(EvaluationError::Cancelled);
        }
        if Instant::now() >= deadline {
            return Err(EvaluationError::TimedOut {
                timeout_ms: config.timeout_ms(),
            });
        }
        let page = result.matches.next_batch(config.batch_size())?;
        if page.is_empty() {
            break;
        }
        matches.extend(page);
    }

    crate::materializer::materialize_matches(matches, store)
}
