//! Bundles finished conversions into a single zip archive.

use std::collections::HashSet;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;

use crate::jobs::{Job, JobId, JobStatus, JobStore};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to build archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Failed to write archive: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct ExportArchive {
    pub bytes: Vec<u8>,
    pub entries: Vec<String>,
    /// Jobs whose result could not be read.
    pub skipped: Vec<JobId>,
}

impl ExportArchive {
    pub fn write_to(&self, path: &Path) -> Result<(), ExportError> {
        fs::write(path, &self.bytes)?;
        tracing::info!("Wrote {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }
}

/// Completed top-level jobs, in store order.
pub fn exportable(store: &JobStore) -> impl Iterator<Item = &Job> {
    store
        .jobs()
        .iter()
        .filter(|job| job.status() == JobStatus::Done && !job.is_derived())
}

/// Builds an archive of every completed top-level job.
///
/// Entries are named `<source stem>.<format>`; repeated names get a `-2`,
/// `-3`, ... suffix. A job whose result has vanished is skipped with a warning.
pub fn export_all(store: &JobStore) -> Result<ExportArchive, ExportError> {
    let selected: Vec<&Job> = exportable(store).collect();

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut used = HashSet::new();
    let mut entries = Vec::with_capacity(selected.len());
    let mut skipped = Vec::new();

    for job in selected {
        let Some(bytes) = job.result().and_then(|r| store.blob(r.blob)) else {
            tracing::warn!("Result for {} (job {}) is unavailable; leaving it out", job.source().name(), job.id());
            skipped.push(job.id().clone());
            continue;
        };
        let name = unique_name(&job.output_name(), &mut used);
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&bytes)?;
        entries.push(name);
    }

    let bytes = zip.finish()?.into_inner();
    Ok(ExportArchive { bytes, entries, skipped })
}

fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (name, String::new()),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{stem}-{n}{ext}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
