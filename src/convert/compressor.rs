use image::DynamicImage;

use super::encode::{EncodeError, encode_image};
use crate::config::CompressionConfig;
use crate::format::TargetFormat;

#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("Compressor panicked: {0}")]
    Panicked(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
}

impl CompressedImage {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// The image compression capability.
///
/// Implementations call `on_progress` zero or more times with a completion
/// fraction in `[0, 1]` before returning.
pub trait Compressor: Send + Sync {
    fn compress(
        &self,
        source: &[u8],
        target: TargetFormat,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<CompressedImage, CompressError>;
}

/// Share of the progress bar spent decoding.
const DECODE_SHARE: f32 = 0.2;

/// Compressor backed by the `image` crate.
///
/// Encodes repeatedly, lowering quality (JPEG, AVIF) or scale (PNG, WebP),
/// until the output fits `max_size_bytes` or the passes run out. The smallest
/// attempt is returned.
#[derive(Debug, Clone, Default)]
pub struct ImageCompressor {
    config: CompressionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pass {
    Quality(u8),
    Scale(f32),
}

impl ImageCompressor {
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    fn passes(&self, target: TargetFormat) -> Vec<Pass> {
        let cfg = &self.config;
        match target {
            TargetFormat::Jpeg | TargetFormat::Avif => {
                let step = cfg.quality_step.max(1);
                let floor = cfg.min_quality.min(cfg.initial_quality);
                let mut passes = Vec::new();
                let mut quality = cfg.initial_quality;
                loop {
                    passes.push(Pass::Quality(quality));
                    if quality <= floor {
                        break;
                    }
                    quality = quality.saturating_sub(step).max(floor);
                }
                passes
            }
            TargetFormat::Png | TargetFormat::Webp => {
                let step = cfg.scale_step.clamp(0.1, 0.95);
                let floor = if cfg.min_scale.is_nan() { 1.0 } else { cfg.min_scale.clamp(0.01, 1.0) };
                let mut passes = vec![Pass::Scale(1.0)];
                let mut scale = step;
                while scale >= floor {
                    passes.push(Pass::Scale(scale));
                    scale *= step;
                }
                passes
            }
        }
    }

    fn run_pass(&self, img: &DynamicImage, target: TargetFormat, pass: Pass) -> Result<Vec<u8>, EncodeError> {
        match pass {
            Pass::Quality(quality) => encode_image(img, target, quality, self.config.avif_speed),
            Pass::Scale(scale) if scale >= 1.0 => {
                encode_image(img, target, self.config.initial_quality, self.config.avif_speed)
            }
            Pass::Scale(scale) => {
                let width = ((img.width() as f32 * scale) as u32).max(1);
                let height = ((img.height() as f32 * scale) as u32).max(1);
                let scaled = img.resize(width, height, image::imageops::FilterType::Lanczos3);
                encode_image(&scaled, target, self.config.initial_quality, self.config.avif_speed)
            }
        }
    }
}

impl Compressor for ImageCompressor {
    fn compress(
        &self,
        source: &[u8],
        target: TargetFormat,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<CompressedImage, CompressError> {
        on_progress(0.0);
        let img = image::load_from_memory(source).map_err(CompressError::Decode)?;
        on_progress(DECODE_SHARE);

        let passes = self.passes(target);
        let total = passes.len() as f32;
        let mut best: Option<Vec<u8>> = None;
        for (i, pass) in passes.into_iter().enumerate() {
            let encoded = self.run_pass(&img, target, pass)?;
            tracing::trace!("{target} pass {pass:?}: {} bytes", encoded.len());
            if best.as_ref().is_none_or(|b| encoded.len() < b.len()) {
                best = Some(encoded);
            }
            on_progress(DECODE_SHARE + (1.0 - DECODE_SHARE) * (i + 1) as f32 / total);
            if best.as_ref().is_some_and(|b| b.len() as u64 <= self.config.max_size_bytes) {
                break;
            }
        }

        let bytes = best.ok_or_else(|| CompressError::Other("no encoding passes ran".into()))?;
        on_progress(1.0);
        Ok(CompressedImage { bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([((x * 31) ^ (y * 17)) as u8, (x * y) as u8, (x + 3 * y) as u8, 255])
        }));
        encode_image(&img, TargetFormat::Png, 90, 8).unwrap()
    }

    #[test]
    fn quality_passes_descend_to_floor() {
        let compressor = ImageCompressor::default();
        assert_eq!(
            compressor.passes(TargetFormat::Jpeg),
            vec![
                Pass::Quality(90),
                Pass::Quality(80),
                Pass::Quality(70),
                Pass::Quality(60),
                Pass::Quality(50),
                Pass::Quality(40),
            ]
        );
    }

    #[test]
    fn scale_passes_stop_at_min_scale() {
        let compressor = ImageCompressor::default();
        let passes = compressor.passes(TargetFormat::Png);
        assert_eq!(passes[0], Pass::Scale(1.0));
        assert!(passes.iter().all(|p| matches!(p, Pass::Scale(s) if *s >= 0.25)));
        assert!(passes.len() > 2);
    }

    #[test]
    fn zero_min_scale_still_terminates() {
        let compressor = ImageCompressor::new(CompressionConfig {
            min_scale: 0.0,
            ..CompressionConfig::default()
        });
        let passes = compressor.passes(TargetFormat::Webp);
        assert!(passes.len() < 64);
        assert!(passes.iter().all(|p| matches!(p, Pass::Scale(s) if *s >= 0.01)));

        let negative = ImageCompressor::new(CompressionConfig {
            min_scale: -1.0,
            ..CompressionConfig::default()
        });
        assert_eq!(negative.passes(TargetFormat::Png), passes);
    }

    #[test]
    fn small_image_finishes_in_one_pass() {
        let compressor = ImageCompressor::default();
        let mut reports = Vec::new();
        let out = compressor
            .compress(&png_bytes(32, 32), TargetFormat::Jpeg, &mut |f| reports.push(f))
            .expect("compress");
        assert_eq!(image::guess_format(&out.bytes).unwrap(), image::ImageFormat::Jpeg);
        assert_eq!(reports, vec![0.0, DECODE_SHARE, DECODE_SHARE + (1.0 - DECODE_SHARE) / 6.0, 1.0]);
    }

    #[test]
    fn tight_budget_keeps_smallest_attempt() {
        let config = CompressionConfig {
            max_size_bytes: 1,
            ..CompressionConfig::default()
        };
        let compressor = ImageCompressor::new(config);
        let source = png_bytes(64, 64);
        let mut reports = Vec::new();
        let out = compressor
            .compress(&source, TargetFormat::Png, &mut |f| reports.push(f))
            .expect("compress");
        let full = encode_image(&image::load_from_memory(&source).unwrap(), TargetFormat::Png, 90, 8).unwrap();
        assert!(out.size_bytes() < full.len() as u64);
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(reports.last().copied(), Some(1.0));
    }

    #[test]
    fn garbage_input_fails_to_decode() {
        let compressor = ImageCompressor::default();
        let err = compressor
            .compress(b"definitely not an image", TargetFormat::Webp, &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, CompressError::Decode(_)));
    }
}
