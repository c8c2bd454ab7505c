use std::path::Path;

use anyhow::Context;

use crate::foundation::core::{Image, ImageRef};
use crate::foundation::error::{DriftError, DriftResult};

/// Decode any format the `image` crate recognizes into straight-alpha RGBA8.
pub fn decode_image(bytes: &[u8]) -> DriftResult<Image> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(Image::from(dyn_img.to_rgba8()))
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> DriftResult<Image> {
    let bytes = std::fs::read(path)
        .map_err(|e| DriftError::io(format!("read image '{}': {e}", path.display())))?;
    decode_image(&bytes).map_err(|e| DriftError::io(format!("{}: {e}", path.display())))
}

/// Encode an RGBA8 frame as PNG, creating parent directories as needed.
pub fn save_png(path: &Path, frame: ImageRef<'_>) -> DriftResult<()> {
    if !frame.is_consistent() {
        return Err(DriftError::validation(format!(
            "frame buffer does not match {}x{}",
            frame.width, frame.height
        )));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/io/codec.rs"]
mod tests;
