//! Image encoding: `DynamicImage` → PNG bytes → base64 `ImageData`.
//!
//! PNG is lossless, so rendered text stays crisp for the vision model.
//! The provider sends the image as a `data:image/png;base64,…` URL in an
//! `image_url` content part.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} page → {} PNG bytes",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Wrap PNG bytes as base64 image data for a vision message.
pub fn page_image_data(png: &[u8]) -> ImageData {
    ImageData::new(STANDARD.encode(png), "image/png")
}
