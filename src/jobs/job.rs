use std::fmt;
use std::sync::Arc;

use super::blob::BlobId;
use super::source::SourceFile;
use crate::format::TargetFormat;

/// Opaque job identifier: a short random base-36 token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub(crate) fn new(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Not yet started. Jobs are created already converting, so nothing
    /// reachable through the store assigns this.
    Pending,
    Converting,
    Done,
    Error,
}

impl JobStatus {
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Converting => "Converting",
            JobStatus::Done => "Done",
            JobStatus::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionResult {
    pub blob: BlobId,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub(super) id: JobId,
    pub(super) source: Arc<SourceFile>,
    pub(super) preview: BlobId,
    pub(super) result: Option<ConversionResult>,
    pub(super) target_format: TargetFormat,
    pub(super) progress: u8,
    pub(super) status: JobStatus,
    pub(super) parent: Option<JobId>,
}

impl Job {
    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn source(&self) -> &Arc<SourceFile> {
        &self.source
    }

    pub fn preview(&self) -> BlobId {
        self.preview
    }

    pub fn result(&self) -> Option<ConversionResult> {
        self.result
    }

    pub fn target_format(&self) -> TargetFormat {
        self.target_format
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn parent(&self) -> Option<&JobId> {
        self.parent.as_ref()
    }

    pub fn is_derived(&self) -> bool {
        self.parent.is_some()
    }

    /// Result size once converted, otherwise the original size.
    pub fn effective_size(&self) -> u64 {
        self.result
            .map(|r| r.size_bytes)
            .unwrap_or_else(|| self.source.size_bytes())
    }

    /// A finished job whose source was already in the target format.
    pub fn is_skipped(&self) -> bool {
        self.status == JobStatus::Done && self.source.format() == Some(self.target_format)
    }

    pub fn output_name(&self) -> String {
        format!("{}.{}", self.source.stem(), self.target_format.extension())
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_skipped() { "Skipped" } else { self.status.label() }
    }
}
