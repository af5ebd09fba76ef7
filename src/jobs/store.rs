use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;

use super::blob::{BlobId, BlobTable};
use super::job::{ConversionResult, Job, JobId, JobStatus};
use super::source::SourceFile;
use crate::format::TargetFormat;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

#[derive(Debug, Default)]
pub struct JobStore {
    jobs: Vec<Job>,
    blobs: BlobTable,
    issued: HashSet<JobId>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_job(
        &mut self,
        source: Arc<SourceFile>,
        target_format: TargetFormat,
        parent: Option<JobId>,
    ) -> JobId {
        let id = self.next_id();
        let preview = self.blobs.insert(Arc::clone(source.bytes()));
        tracing::debug!(
            "Created job {} for {} -> {}{}",
            id,
            source.name(),
            target_format,
            parent.as_ref().map(|p| format!(" (derived from {p})")).unwrap_or_default()
        );
        self.jobs.push(Job {
            id: id.clone(),
            source,
            preview,
            result: None,
            target_format,
            progress: 0,
            status: JobStatus::Converting,
            parent,
        });
        id
    }

    /// Sets progress from a percentage. Ignored unless the job is converting.
    pub fn update_progress(&mut self, id: &JobId, percent: f32) {
        let Some(job) = self.get_mut(id) else { return };
        if job.status != JobStatus::Converting {
            return;
        }
        job.progress = clamp_percent(percent);
    }

    pub fn complete_job(&mut self, id: &JobId, result: Arc<[u8]>, size_bytes: u64) {
        let Some(index) = self.index_of(id) else { return };
        let blob = self.blobs.insert(result);
        let job = &mut self.jobs[index];
        if let Some(previous) = job.result.replace(ConversionResult { blob, size_bytes }) {
            self.blobs.revoke(previous.blob);
        }
        job.status = JobStatus::Done;
        job.progress = 100;
    }

    pub fn fail_job(&mut self, id: &JobId) {
        let Some(index) = self.index_of(id) else { return };
        let job = &mut self.jobs[index];
        let stale = job.result.take();
        job.status = JobStatus::Error;
        job.progress = 0;
        if let Some(result) = stale {
            self.blobs.revoke(result.blob);
        }
    }

    /// Removes the job and every job derived from it.
    pub fn remove_job(&mut self, id: &JobId) {
        let mut released = Vec::new();
        self.jobs.retain(|job| {
            let doomed = &job.id == id || job.parent.as_ref() == Some(id);
            if doomed {
                released.push(job.preview);
                released.extend(job.result.map(|r| r.blob));
            }
            !doomed
        });
        for blob in released {
            self.blobs.revoke(blob);
        }
    }

    pub fn clear_all(&mut self) {
        self.jobs.clear();
        self.blobs.clear();
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn get(&self, id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| &job.id == id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn has_completed(&self) -> bool {
        self.jobs.iter().any(|job| job.status == JobStatus::Done)
    }

    pub fn blob(&self, id: BlobId) -> Option<Arc<[u8]>> {
        self.blobs.get(id)
    }

    pub fn live_blob_count(&self) -> usize {
        self.blobs.len()
    }

    fn index_of(&self, id: &JobId) -> Option<usize> {
        self.jobs.iter().position(|job| &job.id == id)
    }

    fn get_mut(&mut self, id: &JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|job| &job.id == id)
    }

    fn next_id(&mut self) -> JobId {
        let mut rng = rand::rng();
        loop {
            let token: String = (0..ID_LEN)
                .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
                .collect();
            let id = JobId::new(token);
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }
}

fn clamp_percent(percent: f32) -> u8 {
    if percent.is_nan() {
        return 0;
    }
    percent.round().clamp(0.0, 100.0) as u8
}
