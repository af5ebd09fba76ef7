use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use super::compressor::{CompressError, CompressedImage, Compressor};
use crate::format::TargetFormat;
use crate::jobs::{Job, JobId, JobStore, SourceFile};

/// What `convert_existing` does for a given job and format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedPlan {
    /// Same format and already small enough.
    Skip,
    /// Same format but over the threshold: compress the original again.
    Recompress,
    /// Different format.
    Convert,
}

/// Decides how a finished job is re-targeted to `new_format`.
pub fn plan_derived(job: &Job, new_format: TargetFormat, threshold_bytes: u64) -> DerivedPlan {
    if job.source().format() != Some(new_format) {
        return DerivedPlan::Convert;
    }
    if job.effective_size() <= threshold_bytes {
        DerivedPlan::Skip
    } else {
        DerivedPlan::Recompress
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Conversion of {name} (job {id}) failed: {source}")]
pub struct ConversionError {
    pub id: JobId,
    pub name: String,
    #[source]
    pub source: CompressError,
}

#[derive(Debug)]
enum ConversionEvent {
    Progress { id: JobId, fraction: f32 },
    Completed { id: JobId, image: CompressedImage },
    Failed { id: JobId, name: String, error: CompressError },
}

/// Drives jobs through the compressor and folds the results into a [`JobStore`].
///
/// Background conversions run on worker threads that never see the store.
/// They report through a channel, and the store owner applies those reports
/// with [`Converter::pump`] or [`Converter::wait_idle`].
pub struct Converter {
    compressor: Arc<dyn Compressor>,
    recompress_threshold_bytes: u64,
    events_tx: Sender<ConversionEvent>,
    events_rx: Receiver<ConversionEvent>,
    in_flight: usize,
}

impl Converter {
    pub fn new(compressor: Arc<dyn Compressor>, recompress_threshold_bytes: u64) -> Self {
        let (events_tx, events_rx) = channel();
        Self {
            compressor,
            recompress_threshold_bytes,
            events_tx,
            events_rx,
            in_flight: 0,
        }
    }

    /// Number of background conversions that have not reported a terminal outcome.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Creates a job and compresses it on a worker thread.
    pub fn convert(
        &mut self,
        store: &mut JobStore,
        source: Arc<SourceFile>,
        target: TargetFormat,
        parent: Option<JobId>,
    ) -> JobId {
        let id = store.create_job(Arc::clone(&source), target, parent);
        let compressor = Arc::clone(&self.compressor);
        let tx = self.events_tx.clone();
        let job_id = id.clone();
        self.in_flight += 1;

        thread::spawn(move || {
            let progress_tx = tx.clone();
            let progress_id = job_id.clone();
            let outcome = run_guarded(compressor.as_ref(), source.bytes(), target, &mut |fraction| {
                let _ = progress_tx.send(ConversionEvent::Progress {
                    id: progress_id.clone(),
                    fraction,
                });
            });
            let event = match outcome {
                Ok(image) => ConversionEvent::Completed { id: job_id, image },
                Err(error) => ConversionEvent::Failed {
                    id: job_id,
                    name: source.name().to_string(),
                    error,
                },
            };
            let _ = tx.send(event);
        });

        id
    }

    /// Creates a job and compresses it on the calling thread.
    ///
    /// The job is marked failed before the error is returned.
    pub fn convert_blocking(
        &self,
        store: &mut JobStore,
        source: Arc<SourceFile>,
        target: TargetFormat,
        parent: Option<JobId>,
    ) -> Result<JobId, ConversionError> {
        let id = store.create_job(Arc::clone(&source), target, parent);
        let outcome = run_guarded(self.compressor.as_ref(), source.bytes(), target, &mut |fraction| {
            store.update_progress(&id, fraction * 100.0);
        });
        match outcome {
            Ok(image) => {
                let size = image.size_bytes();
                store.complete_job(&id, Arc::from(image.bytes), size);
                Ok(id)
            }
            Err(source_err) => {
                store.fail_job(&id);
                let err = ConversionError {
                    id,
                    name: source.name().to_string(),
                    source: source_err,
                };
                tracing::warn!("{err}");
                Err(err)
            }
        }
    }

    /// Re-targets an existing job to `new_format` as a derived job.
    ///
    /// Returns the new job's id, or `None` when the job is gone or the
    /// conversion is skipped.
    pub fn convert_existing(
        &mut self,
        store: &mut JobStore,
        job_id: &JobId,
        new_format: TargetFormat,
    ) -> Option<JobId> {
        let job = store.get(job_id)?;
        let plan = plan_derived(job, new_format, self.recompress_threshold_bytes);
        if plan == DerivedPlan::Skip {
            tracing::info!(
                "Skipping {} -> {}: already {} and {} bytes",
                job.source().name(),
                new_format,
                new_format,
                job.effective_size()
            );
            return None;
        }
        let source = Arc::clone(job.source());
        Some(self.convert(store, source, new_format, Some(job_id.clone())))
    }

    /// Applies every event received so far without blocking. Failures of jobs
    /// removed in the meantime are logged but not returned.
    pub fn pump(&mut self, store: &mut JobStore) -> Vec<ConversionError> {
        let mut failures = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(store, event, &mut failures);
        }
        failures
    }

    /// Blocks until every background conversion has reported its outcome.
    pub fn wait_idle(&mut self, store: &mut JobStore) -> Vec<ConversionError> {
        let mut failures = Vec::new();
        while self.in_flight > 0 {
            match self.events_rx.recv() {
                Ok(event) => self.apply(store, event, &mut failures),
                Err(_) => break,
            }
        }
        failures.extend(self.pump(store));
        failures
    }

    fn apply(&mut self, store: &mut JobStore, event: ConversionEvent, failures: &mut Vec<ConversionError>) {
        match event {
            ConversionEvent::Progress { id, fraction } => {
                store.update_progress(&id, fraction * 100.0);
            }
            ConversionEvent::Completed { id, image } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                if store.get(&id).is_none() {
                    tracing::debug!("Job {id} was removed before it finished");
                    return;
                }
                let size = image.size_bytes();
                store.complete_job(&id, Arc::from(image.bytes), size);
                tracing::info!("Job {id} finished: {size} bytes");
            }
            ConversionEvent::Failed { id, name, error } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let present = store.get(&id).is_some();
                store.fail_job(&id);
                let failure = ConversionError { id, name, source: error };
                tracing::warn!("{failure}");
                if present {
                    failures.push(failure);
                }
            }
        }
    }
}

fn run_guarded(
    compressor: &dyn Compressor,
    bytes: &[u8],
    target: TargetFormat,
    on_progress: &mut dyn FnMut(f32),
) -> Result<CompressedImage, CompressError> {
    panic::catch_unwind(AssertUnwindSafe(|| compressor.compress(bytes, target, on_progress)))
        .unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(CompressError::Panicked(message))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::testing::{FakeCompressor, Script};
    use crate::jobs::JobStatus;

    const MIB: usize = 1024 * 1024;

    fn source(name: &str, size: usize) -> Arc<SourceFile> {
        Arc::new(SourceFile::from_bytes(name, vec![0u8; size]).unwrap())
    }

    fn converter(script: Script) -> Converter {
        Converter::new(Arc::new(FakeCompressor::new(script)), MIB as u64)
    }

    /// Adds a finished top-level job without going through a compressor.
    fn finished(store: &mut JobStore, name: &str, size: usize, target: TargetFormat, result_size: usize) -> JobId {
        let id = store.create_job(source(name, size), target, None);
        store.complete_job(&id, Arc::from(vec![0u8; result_size]), result_size as u64);
        id
    }

    #[test]
    fn blocking_success_marks_done() {
        let mut store = JobStore::new();
        let conv = converter(Script::succeed(vec![0.25, 0.5], 42));
        let id = conv
            .convert_blocking(&mut store, source("a.png", 10), TargetFormat::Webp, None)
            .expect("convert");
        let job = store.get(&id).unwrap();
        assert_eq!(job.status(), JobStatus::Done);
        assert_eq!(job.progress(), 100);
        assert_eq!(job.result().unwrap().size_bytes, 42);
        assert_eq!(job.target_format(), TargetFormat::Webp);
    }

    #[test]
    fn blocking_failure_marks_error_and_propagates() {
        let mut store = JobStore::new();
        let conv = converter(Script::fail(vec![0.4]));
        let err = conv
            .convert_blocking(&mut store, source("a.png", 10), TargetFormat::Jpeg, None)
            .unwrap_err();
        let job = store.get(&err.id).unwrap();
        assert_eq!(job.status(), JobStatus::Error);
        assert_eq!(job.progress(), 0);
        assert_eq!(err.name, "a.png");
    }

    #[test]
    fn blocking_forwards_each_progress_report() {
        let mut store = JobStore::new();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let conv = Converter::new(
            Arc::new(FakeCompressor::new(Script::succeed(vec![0.333, 0.666], 1)).observe(Arc::clone(&seen))),
            MIB as u64,
        );
        conv.convert_blocking(&mut store, source("a.png", 1), TargetFormat::Jpeg, None)
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0.333, 0.666]);
    }

    #[test]
    fn background_batch_completes_independently() {
        let mut store = JobStore::new();
        let mut conv = converter(Script::fail_when_empty(vec![0.5], 100));
        let a = conv.convert(&mut store, source("a.jpg", 2 * MIB), TargetFormat::Jpeg, None);
        let b = conv.convert(&mut store, source("b.png", 0), TargetFormat::Jpeg, None);
        let c = conv.convert(&mut store, source("c.jpg", 3 * MIB), TargetFormat::Jpeg, None);
        assert_eq!(store.len(), 3);
        assert!(store.jobs().iter().all(|j| j.status() == JobStatus::Converting));

        let failures = conv.wait_idle(&mut store);

        assert_eq!(conv.in_flight(), 0);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, b);
        assert_eq!(store.get(&a).unwrap().status(), JobStatus::Done);
        assert_eq!(store.get(&b).unwrap().status(), JobStatus::Error);
        assert_eq!(store.get(&c).unwrap().status(), JobStatus::Done);
    }

    #[test]
    fn removal_while_in_flight_does_not_recreate() {
        let mut store = JobStore::new();
        let mut conv = converter(Script::succeed(vec![0.1, 0.9], 5));
        let id = conv.convert(&mut store, source("a.png", 1), TargetFormat::Jpeg, None);
        store.remove_job(&id);
        let failures = conv.wait_idle(&mut store);
        assert!(failures.is_empty());
        assert!(store.is_empty());
        assert_eq!(store.live_blob_count(), 0);
    }

    #[test]
    fn failure_of_removed_job_is_not_reported() {
        let mut store = JobStore::new();
        let mut conv = converter(Script::fail(vec![0.4]));
        let id = conv.convert(&mut store, source("a.png", 1), TargetFormat::Jpeg, None);
        store.remove_job(&id);
        let failures = conv.wait_idle(&mut store);
        assert!(failures.is_empty());
        assert_eq!(conv.in_flight(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn panicking_compressor_fails_the_job() {
        let mut store = JobStore::new();
        let mut conv = converter(Script::panic());
        let id = conv.convert(&mut store, source("a.png", 1), TargetFormat::Png, None);
        let failures = conv.wait_idle(&mut store);
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0].source, CompressError::Panicked(_)));
        assert_eq!(store.get(&id).unwrap().status(), JobStatus::Error);
    }

    #[test]
    fn same_format_small_job_is_skipped() {
        let mut store = JobStore::new();
        let mut conv = converter(Script::succeed(vec![], 1));
        let x = finished(&mut store, "x.jpg", 2 * MIB, TargetFormat::Png, MIB);
        assert_eq!(conv.convert_existing(&mut store, &x, TargetFormat::Jpeg), None);
        assert_eq!(store.len(), 1);
        assert_eq!(conv.in_flight(), 0);
    }

    #[test]
    fn same_format_large_job_is_recompressed() {
        let mut store = JobStore::new();
        let mut conv = converter(Script::succeed(vec![0.5], 900));
        let x = finished(&mut store, "x.jpg", 3 * MIB, TargetFormat::Jpeg, 2 * MIB);

        let derived = conv
            .convert_existing(&mut store, &x, TargetFormat::Jpeg)
            .expect("derived job");
        conv.wait_idle(&mut store);

        assert_eq!(store.len(), 2);
        let job = store.get(&derived).unwrap();
        assert_eq!(job.parent(), Some(&x));
        assert_eq!(job.target_format(), TargetFormat::Jpeg);
        assert_eq!(job.status(), JobStatus::Done);
    }

    #[test]
    fn effective_size_falls_back_to_source_size() {
        let mut store = JobStore::new();
        let mut conv = converter(Script::succeed(vec![], 1));
        let pending = store.create_job(source("big.jpg", MIB + 1), TargetFormat::Jpeg, None);
        let small = store.create_job(source("small.jpg", MIB), TargetFormat::Jpeg, None);
        assert!(conv.convert_existing(&mut store, &pending, TargetFormat::Jpeg).is_some());
        assert!(conv.convert_existing(&mut store, &small, TargetFormat::Jpeg).is_none());
        conv.wait_idle(&mut store);
    }

    #[test]
    fn different_format_always_derives() {
        let mut store = JobStore::new();
        let mut conv = converter(Script::succeed(vec![], 10));
        let tiny = finished(&mut store, "tiny.png", 10, TargetFormat::Png, 8);

        let derived = conv
            .convert_existing(&mut store, &tiny, TargetFormat::Avif)
            .expect("derived job");
        conv.wait_idle(&mut store);

        let job = store.get(&derived).unwrap();
        assert_eq!(job.parent(), Some(&tiny));
        assert_eq!(job.target_format(), TargetFormat::Avif);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn convert_existing_on_missing_job_is_noop() {
        let mut store = JobStore::new();
        let mut conv = converter(Script::succeed(vec![], 1));
        let gone = finished(&mut store, "a.png", 10, TargetFormat::Jpeg, 5);
        store.remove_job(&gone);
        assert_eq!(conv.convert_existing(&mut store, &gone, TargetFormat::Webp), None);
        assert!(store.is_empty());
    }

    #[test]
    fn removing_parent_drops_derived_jobs() {
        let mut store = JobStore::new();
        let mut conv = converter(Script::succeed(vec![], 3));
        let parent = finished(&mut store, "p.png", 10, TargetFormat::Jpeg, 5);
        conv.convert_existing(&mut store, &parent, TargetFormat::Webp);
        conv.convert_existing(&mut store, &parent, TargetFormat::Avif);
        conv.wait_idle(&mut store);
        assert_eq!(store.len(), 3);

        store.remove_job(&parent);
        assert!(store.is_empty());
    }

    #[test]
    fn no_entry_point_assigns_pending() {
        let mut store = JobStore::new();
        let mut conv = converter(Script::fail_when_empty(vec![0.3], 4));
        conv.convert(&mut store, source("a.png", 4), TargetFormat::Jpeg, None);
        conv.convert(&mut store, source("b.png", 0), TargetFormat::Jpeg, None);
        let _ = conv.convert_blocking(&mut store, source("c.png", 4), TargetFormat::Png, None);
        assert!(store.jobs().iter().all(|j| j.status() != JobStatus::Pending));
        conv.wait_idle(&mut store);
        assert!(store.jobs().iter().all(|j| j.status() != JobStatus::Pending));
    }

    #[test]
    fn plan_derived_covers_each_branch() {
        let mut store = JobStore::new();
        let small = finished(&mut store, "s.jpg", 10, TargetFormat::Png, 10);
        let large = finished(&mut store, "l.jpg", 2 * MIB, TargetFormat::Png, MIB + 1);
        let gif = finished(&mut store, "g.gif", 10, TargetFormat::Png, 10);
        let threshold = MIB as u64;
        assert_eq!(plan_derived(store.get(&small).unwrap(), TargetFormat::Jpeg, threshold), DerivedPlan::Skip);
        assert_eq!(plan_derived(store.get(&large).unwrap(), TargetFormat::Jpeg, threshold), DerivedPlan::Recompress);
        assert_eq!(plan_derived(store.get(&small).unwrap(), TargetFormat::Webp, threshold), DerivedPlan::Convert);
        assert_eq!(plan_derived(store.get(&gif).unwrap(), TargetFormat::Jpeg, threshold), DerivedPlan::Convert);
    }
}
