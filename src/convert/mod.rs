//! Conversion pipeline: the compression capability and the orchestrator that
//! folds its progress and outcome into the job store.

mod compressor;
mod encode;
mod orchestrator;
#[cfg(test)]
pub(crate) mod testing;

pub use compressor::{CompressError, CompressedImage, Compressor, ImageCompressor};
pub use encode::{EncodeError, encode_image};
pub use orchestrator::{ConversionError, Converter, DerivedPlan, plan_derived};
