use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use crate::format::TargetFormat;

#[derive(Debug, thiserror::Error)]
#[error("Failed to encode {format}: {source}")]
pub struct EncodeError {
    pub format: TargetFormat,
    #[source]
    pub source: image::ImageError,
}

/// Encodes `img` into an in-memory buffer.
///
/// `quality` (1-100) applies to JPEG and AVIF. PNG and WebP are written
/// lossless, so callers shrink those by scaling instead.
pub fn encode_image(
    img: &DynamicImage,
    format: TargetFormat,
    quality: u8,
    avif_speed: u8,
) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    let (width, height) = (img.width(), img.height());
    let quality = quality.clamp(1, 100);

    let result = match format {
        TargetFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = img.to_rgb8();
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality)
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        }
        TargetFormat::Png => {
            let encoder = image::codecs::png::PngEncoder::new_with_quality(
                &mut buf,
                image::codecs::png::CompressionType::Best,
                image::codecs::png::FilterType::Adaptive,
            );
            if img.color().has_alpha() {
                let rgba = img.to_rgba8();
                encoder.write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
            } else {
                let rgb = img.to_rgb8();
                encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            }
        }
        TargetFormat::Webp => {
            let rgba = img.to_rgba8();
            image::codecs::webp::WebPEncoder::new_lossless(&mut buf)
                .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
        }
        TargetFormat::Avif => {
            let rgba = img.to_rgba8();
            image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut buf, avif_speed.clamp(1, 10), quality)
                .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
        }
    };

    result.map_err(|source| EncodeError { format, source })?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample() -> DynamicImage {
        let img = RgbaImage::from_fn(16, 12, |x, y| Rgba([(x * 16) as u8, (y * 20) as u8, 90, 200]));
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn jpeg_output_decodes_back() {
        let bytes = encode_image(&sample(), TargetFormat::Jpeg, 80, 8).expect("jpeg");
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (16, 12));
    }

    #[test]
    fn png_keeps_alpha() {
        let bytes = encode_image(&sample(), TargetFormat::Png, 80, 8).expect("png");
        let decoded = image::load_from_memory(&bytes).expect("decode");
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn webp_is_recognised() {
        let bytes = encode_image(&sample(), TargetFormat::Webp, 80, 8).expect("webp");
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::WebP);
    }

    #[test]
    fn lower_jpeg_quality_is_smaller() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(64, 64, |x, y| {
            Rgba([((x * 7) ^ (y * 13)) as u8, (x * y) as u8, (x + y) as u8, 255])
        }));
        let high = encode_image(&img, TargetFormat::Jpeg, 95, 8).unwrap();
        let low = encode_image(&img, TargetFormat::Jpeg, 20, 8).unwrap();
        assert!(low.len() < high.len());
    }
}
