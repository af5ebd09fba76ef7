//! Scripted compressor for exercising the conversion pipeline in tests.

use std::sync::{Arc, Mutex};

use super::compressor::{CompressError, CompressedImage, Compressor};
use crate::format::TargetFormat;

#[derive(Debug, Clone)]
enum Outcome {
    Succeed(usize),
    Fail,
    FailWhenEmpty(usize),
    Panic,
}

#[derive(Debug, Clone)]
pub(crate) struct Script {
    progress: Vec<f32>,
    outcome: Outcome,
}

impl Script {
    /// Reports `progress`, then returns `size` zero bytes.
    pub(crate) fn succeed(progress: Vec<f32>, size: usize) -> Self {
        Self { progress, outcome: Outcome::Succeed(size) }
    }

    pub(crate) fn fail(progress: Vec<f32>) -> Self {
        Self { progress, outcome: Outcome::Fail }
    }

    /// Fails for empty sources, succeeds with `size` bytes otherwise.
    pub(crate) fn fail_when_empty(progress: Vec<f32>, size: usize) -> Self {
        Self { progress, outcome: Outcome::FailWhenEmpty(size) }
    }

    pub(crate) fn panic() -> Self {
        Self { progress: Vec::new(), outcome: Outcome::Panic }
    }
}

pub(crate) struct FakeCompressor {
    script: Script,
    observed: Option<Arc<Mutex<Vec<f32>>>>,
}

impl FakeCompressor {
    pub(crate) fn new(script: Script) -> Self {
        Self { script, observed: None }
    }

    /// Records every progress value this compressor emits.
    pub(crate) fn observe(mut self, sink: Arc<Mutex<Vec<f32>>>) -> Self {
        self.observed = Some(sink);
        self
    }
}

impl Compressor for FakeCompressor {
    fn compress(
        &self,
        source: &[u8],
        _target: TargetFormat,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<CompressedImage, CompressError> {
        for &fraction in &self.script.progress {
            if let Some(sink) = &self.observed {
                sink.lock().unwrap().push(fraction);
            }
            on_progress(fraction);
        }
        let size = match self.script.outcome {
            Outcome::Succeed(size) => size,
            Outcome::Fail => return Err(CompressError::Other("scripted failure".into())),
            Outcome::FailWhenEmpty(_) if source.is_empty() => {
                return Err(CompressError::Other("empty source".into()));
            }
            Outcome::FailWhenEmpty(size) => size,
            Outcome::Panic => panic!("scripted panic"),
        };
        Ok(CompressedImage { bytes: vec![0u8; size] })
    }
}
