//! Bounded-concurrency OCR dispatch.
//!
//! Every submitted page yields exactly one `OcrOutcome`, whether the OCR call
//! succeeded, failed, timed out, or panicked. Outcomes come back in
//! completion order; callers sort by page number.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use super::types::{OcrOutcome, OcrTask, PipelineEvent};
use crate::models::SourceDocument;
use crate::ocr::{OcrBackend, PageRenderer};

/// Upper bound for the default worker count.
pub const MAX_DEFAULT_CONCURRENCY: usize = 4;

/// Default per-task timeout.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(300);

/// Default worker count: available cores, capped at `MAX_DEFAULT_CONCURRENCY`.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_DEFAULT_CONCURRENCY)
}

/// Runs OCR tasks with at most `max_concurrency` in flight.
pub struct OcrDispatcher {
    backend: Arc<dyn OcrBackend>,
    max_concurrency: usize,
    per_task_timeout: Duration,
    events: Option<mpsc::Sender<PipelineEvent>>,
}

impl OcrDispatcher {
    pub fn new(
        backend: Arc<dyn OcrBackend>,
        max_concurrency: usize,
        per_task_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            max_concurrency: max_concurrency.max(1),
            per_task_timeout,
            events: None,
        }
    }

    /// Report per-page completion on this channel.
    pub fn with_events(mut self, events: mpsc::Sender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// OCR pre-rendered tasks.
    pub async fn dispatch(&self, tasks: Vec<OcrTask>) -> Vec<OcrOutcome> {
        let jobs = tasks
            .into_iter()
            .map(|task| {
                let backend = self.backend.clone();
                let page_number = task.page_number;
                let job = async move { recognize(backend.as_ref(), task).await }.boxed();
                (page_number, job)
            })
            .collect();

        self.run_bounded(jobs).await
    }

    /// Render and OCR the given pages.
    ///
    /// Rendering happens after a worker slot is acquired, so at most
    /// `max_concurrency` page images exist at any moment. A render failure
    /// is a failed outcome for that page only.
    pub async fn dispatch_pages(
        &self,
        document: Arc<SourceDocument>,
        renderer: Arc<dyn PageRenderer>,
        page_numbers: &[u32],
        language_hints: &[String],
    ) -> Vec<OcrOutcome> {
        let jobs = page_numbers
            .iter()
            .map(|&page_number| {
                let backend = self.backend.clone();
                let renderer = renderer.clone();
                let document = document.clone();
                let language_hints = language_hints.to_vec();

                let job = async move {
                    let image = match renderer.render(&document, page_number).await {
                        Ok(image) => image,
                        Err(e) => {
                            return OcrOutcome::failure(
                                page_number,
                                format!("render failed: {}", e),
                            )
                        }
                    };
                    let task = OcrTask {
                        page_number,
                        image,
                        language_hints,
                    };
                    recognize(backend.as_ref(), task).await
                }
                .boxed();

                (page_number, job)
            })
            .collect();

        self.run_bounded(jobs).await
    }

    async fn run_bounded(&self, jobs: Vec<(u32, BoxFuture<'static, OcrOutcome>)>) -> Vec<OcrOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let timeout = self.per_task_timeout;
        let mut pending: Vec<u32> = Vec::with_capacity(jobs.len());
        let mut set = JoinSet::new();

        for (page_number, job) in jobs {
            pending.push(page_number);
            let semaphore = semaphore.clone();

            set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return OcrOutcome::failure(page_number, "dispatcher closed"),
                };

                // Dropping `job` on timeout kills any subprocess it started
                match tokio::time::timeout(timeout, AssertUnwindSafe(job).catch_unwind()).await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(_)) => OcrOutcome::failure(page_number, "OCR task panicked"),
                    Err(_) => OcrOutcome::failure(
                        page_number,
                        format!("OCR timed out after {:?}", timeout),
                    ),
                }
            });
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => {
                    if let Some(pos) = pending.iter().position(|p| *p == outcome.page_number) {
                        pending.swap_remove(pos);
                    }
                    self.record(&outcome).await;
                    outcomes.push(outcome);
                }
                Err(e) => tracing::error!("OCR task did not complete: {}", e),
            }
        }

        // A task that never reported still owes its page an outcome
        for page_number in pending {
            let outcome = OcrOutcome::failure(page_number, "OCR task aborted");
            self.record(&outcome).await;
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn record(&self, outcome: &OcrOutcome) {
        if outcome.succeeded {
            tracing::debug!("OCR completed for page {}", outcome.page_number);
        } else {
            tracing::warn!(
                "OCR failed for page {}: {}",
                outcome.page_number,
                outcome.error_reason.as_deref().unwrap_or("unknown error")
            );
        }

        if let Some(tx) = &self.events {
            let _ = tx
                .send(PipelineEvent::PageOcrFinished {
                    page_number: outcome.page_number,
                    succeeded: outcome.succeeded,
                })
                .await;
        }
    }
}

/// Run one task. The task, and its image buffer, is dropped on return.
async fn recognize(backend: &dyn OcrBackend, task: OcrTask) -> OcrOutcome {
    match backend.recognize(&task.image, &task.language_hints).await {
        Ok(text) => OcrOutcome::success(task.page_number, text),
        Err(e) => OcrOutcome::failure(task.page_number, e.to_string()),
    }
}
