//! Aggregation engine.
//!
//! Fans out across collectors in parallel and pipes the merged batches through
//! validity filter, dedupe, normalization and matching.

use super::types::{AggregationReport, ProgressEvent, ProgressFn, SourceSummary};
use crate::config::{EngineSettings, ScholarConfig};
use crate::error::{CollectorError, EngineError, FetchError};
use crate::model::{Profile, RawRecord, Record};
use crate::pipeline::{self, ArrivalOrder, Ranker};
use crate::{CollectorHandle, CollectorRegistry};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What a dispatched task reports back: its slot, outcome and elapsed time.
type Completion = (usize, Result<Vec<RawRecord>, CollectorError>, u64);

/// Engine for one immutable set of collectors.
pub struct AggregationEngine {
    handles: Vec<CollectorHandle>,
    settings: EngineSettings,
    ranker: Arc<dyn Ranker>,
}

impl AggregationEngine {
    pub fn new(handles: Vec<CollectorHandle>, settings: EngineSettings) -> Self {
        Self {
            handles,
            settings,
            ranker: Arc::new(ArrivalOrder),
        }
    }

    /// Build collectors for every configured source with the built-in registry.
    pub fn from_config(config: &ScholarConfig) -> Result<Self, FetchError> {
        let handles = CollectorRegistry::builtin().build(config)?;
        Ok(Self::new(handles, config.engine.clone()))
    }

    pub fn with_ranker<R: Ranker + 'static>(mut self, ranker: R) -> Self {
        self.ranker = Arc::new(ranker);
        self
    }

    pub fn handles(&self) -> &[CollectorHandle] {
        &self.handles
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Aggregate, dedupe, normalize and rank for one profile.
    pub async fn run(
        &self,
        profile: &Profile,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<Vec<Record>, EngineError> {
        self.run_with_cancel(profile, on_progress, CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), stopping early when `cancel` fires.
    pub async fn run_with_cancel(
        &self,
        profile: &Profile,
        on_progress: Option<ProgressFn<'_>>,
        cancel: CancellationToken,
    ) -> Result<Vec<Record>, EngineError> {
        self.run_detailed(profile, on_progress, cancel)
            .await
            .map(|report| report.records)
    }

    /// Run and keep the per-collector outcomes alongside the records.
    ///
    /// Cancellation stops dispatch of collectors that have not started yet.
    /// Collectors already running are left to finish or hit their own budget
    /// in the background, and the run returns [`EngineError::Aborted`].
    pub async fn run_detailed(
        &self,
        profile: &Profile,
        on_progress: Option<ProgressFn<'_>>,
        cancel: CancellationToken,
    ) -> Result<AggregationReport, EngineError> {
        let start = Instant::now();
        let emit = |message: String, fraction: f64| {
            if let Some(callback) = on_progress {
                callback(&ProgressEvent::new(message, fraction));
            }
        };

        if cancel.is_cancelled() {
            return Err(EngineError::Aborted);
        }

        let selected = self.dispatch_order(profile);
        let total = selected.len();
        let mut report = AggregationReport::new(total);

        info!(collectors = total, "starting aggregation run");
        emit("Initializing...".to_string(), 0.1);

        let batches = self
            .collect_all(&selected, profile, &cancel, &mut report, &emit)
            .await?;

        // merged in dispatch order, not completion order
        let raw: Vec<RawRecord> = batches.into_iter().flatten().flatten().collect();
        report.raw_count = raw.len();
        emit(format!("Found {} scholarships", raw.len()), 0.6);

        if cancel.is_cancelled() {
            return Err(EngineError::Aborted);
        }

        let unique: Vec<Record> = pipeline::dedupe(raw)
            .into_iter()
            .map(|raw| pipeline::standardize(Record::from(raw)))
            .collect();
        report.unique_count = unique.len();
        emit("Processing results...".to_string(), 0.8);

        report.records = pipeline::match_and_rank(unique, profile, self.ranker.as_ref());
        emit("Complete!".to_string(), 1.0);

        report.duration_ms = start.elapsed().as_millis() as u64;
        report.finished_at = Utc::now();
        info!(
            matched = report.records.len(),
            unique = report.unique_count,
            failed = report.errors.len(),
            duration_ms = report.duration_ms,
            "aggregation run complete"
        );
        Ok(report)
    }

    /// Enabled collectors by priority, preferred-country sources first.
    fn dispatch_order(&self, profile: &Profile) -> Vec<CollectorHandle> {
        let mut selected: Vec<CollectorHandle> = self
            .handles
            .iter()
            .filter(|h| h.is_enabled())
            .cloned()
            .collect();
        selected.sort_by_key(|h| h.meta().priority);

        if let Some(country) = profile.preferred_country() {
            let (mut preferred, rest): (Vec<_>, Vec<_>) =
                selected.into_iter().partition(|h| {
                    h.meta()
                        .source_country
                        .as_deref()
                        .is_some_and(|c| c.trim().eq_ignore_ascii_case(country))
                });
            preferred.extend(rest);
            selected = preferred;
        }
        selected
    }

    /// Dispatch every selected collector and gather batches by slot.
    async fn collect_all(
        &self,
        selected: &[CollectorHandle],
        profile: &Profile,
        cancel: &CancellationToken,
        report: &mut AggregationReport,
        emit: &(dyn Fn(String, f64) + Send + Sync),
    ) -> Result<Vec<Option<Vec<RawRecord>>>, EngineError> {
        let total = selected.len();
        let mut batches: Vec<Option<Vec<RawRecord>>> = vec![None; total];
        if total == 0 {
            return Ok(batches);
        }

        let budget = Duration::from_millis(self.settings.collector_timeout_ms);
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency()));
        let dispatch = cancel.child_token();
        let shared_profile = Arc::new(profile.clone());
        let (tx, mut rx) = mpsc::channel::<Completion>(total);
        let started: Arc<Vec<AtomicBool>> = Arc::new((0..total).map(|_| AtomicBool::new(false)).collect());

        for (slot, handle) in selected.iter().enumerate() {
            let handle = handle.clone();
            let tx = tx.clone();
            let started = Arc::clone(&started);
            let semaphore = Arc::clone(&semaphore);
            let dispatch = dispatch.clone();
            let profile = Arc::clone(&shared_profile);

            tokio::spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = dispatch.cancelled() => return,
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return,
                    },
                };
                if dispatch.is_cancelled() {
                    return;
                }

                started[slot].store(true, Ordering::SeqCst);
                debug!(target: "scholarsift::engine", collector = handle.name(), "dispatching");
                let begun = Instant::now();
                let outcome = handle.invoke(&profile, budget).await;
                let elapsed = begun.elapsed().as_millis() as u64;
                let _ = tx.send((slot, outcome, elapsed)).await;
            });
        }
        drop(tx);

        let run_deadline = deadline(self.settings.run_timeout_ms);
        tokio::pin!(run_deadline);

        let mut reported = vec![false; total];
        let mut completed = 0usize;
        while completed < total {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    dispatch.cancel();
                    warn!(outstanding = total - completed, "aggregation run cancelled");
                    return Err(EngineError::Aborted);
                }
                _ = &mut run_deadline => None,
                message = rx.recv() => match message {
                    Some(message) => Some(message),
                    None => {
                        return Err(EngineError::Internal(format!(
                            "{} collector task(s) ended without reporting",
                            total - completed
                        )));
                    }
                },
            };

            let Some((slot, outcome, elapsed)) = next else {
                // run deadline hit: stop dispatching and fail whatever is outstanding
                dispatch.cancel();
                let budget_ms = self.settings.run_timeout_ms.unwrap_or_default();
                let outstanding: Vec<usize> = (0..total).filter(|slot| !reported[*slot]).collect();
                for slot in outstanding {
                    let handle = &selected[slot];
                    let (err, message) = if started[slot].load(Ordering::SeqCst) {
                        (
                            CollectorError::timeout(handle.name(), budget_ms),
                            format!("{} timed out", handle.display_name()),
                        )
                    } else {
                        (
                            CollectorError::not_started(handle.name()),
                            format!("{} skipped", handle.display_name()),
                        )
                    };
                    warn!(collector = handle.name(), error = %err, "collector outstanding at run deadline");
                    report.add_error(handle.display_name(), &err);
                    reported[slot] = true;
                    completed += 1;
                    emit(message, progress_fraction(completed, total));
                }
                break;
            };

            let handle = &selected[slot];
            reported[slot] = true;
            completed += 1;

            let message = match outcome {
                Ok(batch) => {
                    let mut batch = pipeline::retain_valid(batch);
                    for record in &mut batch {
                        if record.source.is_none() {
                            record.source = Some(handle.name().to_string());
                        }
                    }
                    debug!(
                        target: "scholarsift::engine",
                        collector = handle.name(),
                        records = batch.len(),
                        elapsed_ms = elapsed,
                        "collector finished"
                    );
                    report.add_source(SourceSummary {
                        source: handle.name().to_string(),
                        display_name: handle.display_name().to_string(),
                        count: batch.len(),
                        duration_ms: elapsed,
                    });
                    let message = format!("Collected {}: {} found", handle.display_name(), batch.len());
                    batches[slot] = Some(batch);
                    message
                }
                Err(err) => {
                    warn!(collector = handle.name(), code = err.code_str(), error = %err, "collector failed");
                    report.add_error(handle.display_name(), &err);
                    if err.is_timeout() {
                        format!("{} timed out", handle.display_name())
                    } else {
                        format!("{} failed", handle.display_name())
                    }
                }
            };
            emit(message, progress_fraction(completed, total));
        }

        // keep completed and errors in dispatch order
        let order = |name: &str| selected.iter().position(|h| h.name() == name);
        report.completed.sort_by_key(|s| order(&s.source));
        report.errors.sort_by_key(|e| order(&e.source));

        Ok(batches)
    }
}

fn progress_fraction(completed: usize, total: usize) -> f64 {
    0.1 + 0.5 * (completed as f64 / total.max(1) as f64)
}

async fn deadline(run_timeout_ms: Option<u64>) {
    match run_timeout_ms {
        Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        None => std::future::pending::<()>().await,
    }
}
