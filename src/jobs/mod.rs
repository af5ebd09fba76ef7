//! Conversion jobs and the store that owns them.
//!
//! The [`JobStore`] is the only mutable state shared between the UI and the
//! conversion pipeline. It is owned by one thread and mutated through its
//! methods only; operations naming an id that is gone are silent no-ops.

mod blob;
mod job;
mod source;
mod store;

pub use blob::{BlobId, BlobTable};
pub use job::{ConversionResult, Job, JobId, JobStatus};
pub use source::{is_supported, SourceError, SourceFile, SUPPORTED_EXTENSIONS};
pub use store::JobStore;
