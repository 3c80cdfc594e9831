//! Raster conversions: resize, re-encode, and embed into PDF.

use crate::converter::ConversionJob;
use crate::error::{ConversionError, Result};
use crate::format::Format;
use crate::pdf_writer::{PdfBuilder, PdfImage};
use image::codecs::jpeg::{JpegDecoder, JpegEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Image → image: optional resize, then encode to the target codec.
pub fn transcode(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let image = decode(&job.read_source()?)?;
    let image = resize(image, job.options.width, job.options.height);
    encode(&image, job.target, job.options.quality)
}

/// Image → PDF: a single page holding the image.
pub fn to_pdf(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let data = job.read_source()?;

    let embedded = if job.options.wants_resize() {
        let image = resize(decode(&data)?, job.options.width, job.options.height);
        pixels_for_pdf(&image)
    } else {
        embed_source(job.source, data)?
    };

    let mut builder = PdfBuilder::new();
    builder.add_image_page(embedded)?;
    builder.finish()
}

fn embed_source(source: Format, data: Vec<u8>) -> Result<PdfImage> {
    match source {
        Format::Jpg | Format::Jpeg => embed_jpeg(data),
        Format::Png => Ok(pixels_for_pdf(&decode_as(&data, ImageFormat::Png)?)),
        _ => {
            let png = encode(&decode(&data)?, Format::Png, 100)?;
            Ok(pixels_for_pdf(&decode_as(&png, ImageFormat::Png)?))
        }
    }
}

/// JPEG data passes through untouched when its color model maps onto a PDF
/// device space; anything else is decoded to pixels.
fn embed_jpeg(data: Vec<u8>) -> Result<PdfImage> {
    let ((width, height), color) = {
        let decoder = JpegDecoder::new(Cursor::new(data.as_slice()))
            .map_err(|e| ConversionError::encoding("Failed to read JPEG header", e))?;
        (decoder.dimensions(), decoder.color_type())
    };
    let gray = match color {
        ColorType::L8 => true,
        ColorType::Rgb8 => false,
        other => {
            debug!("JPEG color type {:?} is re-encoded before embedding", other);
            return Ok(pixels_for_pdf(&decode_as(&data, ImageFormat::Jpeg)?));
        }
    };
    Ok(PdfImage::Jpeg {
        data,
        width,
        height,
        gray,
    })
}

fn pixels_for_pdf(image: &DynamicImage) -> PdfImage {
    let (width, height) = (image.width(), image.height());
    if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        let mut pixels = Vec::with_capacity(sample_count(width, height, 3));
        let mut alpha = Vec::with_capacity(sample_count(width, height, 1));
        for px in rgba.pixels() {
            pixels.extend_from_slice(&px.0[..3]);
            alpha.push(px.0[3]);
        }
        PdfImage::Rgb {
            pixels,
            alpha: Some(alpha),
            width,
            height,
        }
    } else {
        PdfImage::Rgb {
            pixels: image.to_rgb8().into_raw(),
            alpha: None,
            width,
            height,
        }
    }
}

/// Samples in a `width`×`height` plane, computed in `usize` so large images
/// do not wrap around `u32`.
fn sample_count(width: u32, height: u32, channels: usize) -> usize {
    width as usize * height as usize * channels
}

fn decode(data: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(data).map_err(|e| ConversionError::encoding("Failed to decode image", e))
}

fn decode_as(data: &[u8], format: ImageFormat) -> Result<DynamicImage> {
    image::load_from_memory_with_format(data, format)
        .map_err(|e| ConversionError::encoding("Failed to decode image", e))
}

/// Size that fits `width`×`height` inside the optional box, keeping the
/// aspect ratio and never enlarging.
pub fn fit_inside(
    width: u32,
    height: u32,
    box_width: Option<u32>,
    box_height: Option<u32>,
) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let scale_w = box_width.map_or(f64::INFINITY, |w| w as f64 / width as f64);
    let scale_h = box_height.map_or(f64::INFINITY, |h| h as f64 / height as f64);
    let scale = scale_w.min(scale_h);
    if scale >= 1.0 {
        return (width, height);
    }
    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);
    (new_width, new_height)
}

/// Shrink an image into the requested box. No box, or a box the image
/// already fits in, returns the image unchanged.
pub fn resize(image: DynamicImage, width: Option<u32>, height: Option<u32>) -> DynamicImage {
    let (new_width, new_height) = fit_inside(image.width(), image.height(), width, height);
    if (new_width, new_height) == (image.width(), image.height()) {
        return image;
    }
    debug!(
        "Resizing {}x{} -> {}x{}",
        image.width(),
        image.height(),
        new_width,
        new_height
    );
    image.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

/// Encode to a raster target. `quality` applies to JPEG only; the WebP
/// encoder available is lossless.
pub fn encode(image: &DynamicImage, target: Format, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let result = match target {
        Format::Jpg | Format::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)
        }
        Format::Webp => {
            let encoder = WebPEncoder::new_lossless(&mut buffer);
            DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)
        }
        Format::Png => image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png),
        Format::Gif => DynamicImage::ImageRgba8(image.to_rgba8())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Gif),
        Format::Bmp => DynamicImage::ImageRgba8(image.to_rgba8())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Bmp),
        Format::Tiff => DynamicImage::ImageRgba8(image.to_rgba8())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Tiff),
        other => {
            // The route table only sends image targets here.
            return Err(ConversionError::Encoding(format!(
                "{} is not a raster output format",
                other
            )));
        }
    };
    result.map_err(|e| ConversionError::encoding(&format!("Failed to encode {}", target), e))?;
    Ok(buffer)
}
