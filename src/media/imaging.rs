//! Display-variant generation for uploaded images.
//!
//! | Operation | `image` crate call |
//! |---|---|
//! | Decode (format sniffed from bytes) | `ImageReader::with_guessed_format` |
//! | Fill + center crop | `DynamicImage::resize_to_fill` with `Lanczos3` |
//! | Crop without scaling | `DynamicImage::crop_imm` |
//! | Encode | `JpegEncoder::new_with_quality` |

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

use crate::errors::AppError;

/// Encoding quality for every generated variant.
pub const JPEG_QUALITY: u8 = 85;

/// Target box for a fill-crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillBox {
    pub width: u32,
    pub height: u32,
}

/// Gallery photo variants.
pub const PHOTO_BOX: FillBox = FillBox {
    width: 800,
    height: 600,
};

/// Timeline image variants.
pub const TIMELINE_BOX: FillBox = FillBox {
    width: 400,
    height: 300,
};

/// What to do with a source of a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPlan {
    /// Scale down to cover the box, then center-crop to exactly the box.
    Fill { width: u32, height: u32 },
    /// Source is smaller than the box on some axis: center-crop only.
    Crop { width: u32, height: u32 },
}

/// Decide how to bring `source` into `target` without upscaling.
pub fn plan_fill(source: (u32, u32), target: FillBox) -> FillPlan {
    let (src_w, src_h) = source;
    if src_w >= target.width && src_h >= target.height {
        FillPlan::Fill {
            width: target.width,
            height: target.height,
        }
    } else {
        FillPlan::Crop {
            width: src_w.min(target.width),
            height: src_h.min(target.height),
        }
    }
}

/// Decode `bytes`, fit them into `target`, and encode as JPEG.
pub fn optimize_jpeg(bytes: &[u8], target: FillBox) -> Result<Vec<u8>, AppError> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AppError::Media(format!("Failed to read image: {}", e)))?
        .decode()?;

    let fitted = match plan_fill((img.width(), img.height()), target) {
        FillPlan::Fill { width, height } => img.resize_to_fill(width, height, FilterType::Lanczos3),
        FillPlan::Crop { width, height } => {
            let x = (img.width() - width) / 2;
            let y = (img.height() - height) / 2;
            img.crop_imm(x, y, width, height)
        }
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(fitted.to_rgb8());

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)?;
    Ok(out)
}
