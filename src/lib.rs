//! Bulk image converter: queue images, compress them to a target format in
//! the background and export the results as a zip archive.

pub mod app;
pub mod config;
pub mod convert;
pub mod export;
pub mod format;
pub mod jobs;
pub mod logging;
pub mod modules;
pub mod preferences;
pub mod style;
pub mod utils;
