use crate::foundation::error::{DriftError, DriftResult};
use crate::foundation::math::u8_to_unit;

pub use kurbo::Vec2;

/// Largest edge accepted for canvases and surfaces.
pub const MAX_DIMENSION: u32 = 16_384;

/// Output resolution shared by every surface of a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas.
    pub fn new(width: u32, height: u32) -> DriftResult<Self> {
        let c = Self { width, height };
        c.validate()?;
        Ok(c)
    }

    /// Reject empty or oversized canvases.
    pub fn validate(self) -> DriftResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DriftError::validation("canvas width/height must be > 0"));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(DriftError::validation(format!(
                "canvas must be at most {MAX_DIMENSION}x{MAX_DIMENSION}"
            )));
        }
        Ok(())
    }

    /// Tightly packed RGBA8 byte length.
    pub fn byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
        }
    }
}

/// Channel layout of a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 8-bit RGBA, straight (non-premultiplied) alpha.
    #[default]
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
        }
    }
}

/// Owned RGBA8 image with straight alpha, row-major and tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes.
    pub data: Vec<u8>,
}

impl Image {
    /// Wrap existing bytes, checking that they match `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> DriftResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| DriftError::validation("image buffer size overflow"))?;
        if width == 0 || height == 0 {
            return Err(DriftError::validation("image width/height must be > 0"));
        }
        if data.len() != expected {
            return Err(DriftError::validation(format!(
                "image data is {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Image filled with a single RGBA8 color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let n = (width as usize).saturating_mul(height as usize);
        Self {
            width,
            height,
            data: rgba.repeat(n),
        }
    }

    /// Opaque black image of the canvas size.
    pub fn blank(canvas: Canvas) -> Self {
        Self::solid(canvas.width, canvas.height, [0, 0, 0, 255])
    }

    /// Borrow as an [`ImageRef`].
    pub fn view(&self) -> ImageRef<'_> {
        ImageRef {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl From<image::RgbaImage> for Image {
    fn from(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

/// Borrowed RGBA8 pixels; the read side of every pass.
#[derive(Clone, Copy, Debug)]
pub struct ImageRef<'a> {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes.
    pub data: &'a [u8],
}

impl ImageRef<'_> {
    /// `true` when the byte slice matches the declared dimensions.
    pub fn is_consistent(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width as usize) * (self.height as usize) * 4
    }

    /// Raw pixel with edge clamping.
    pub fn pixel(&self, x: i64, y: i64) -> [u8; 4] {
        let x = x.clamp(0, i64::from(self.width) - 1) as usize;
        let y = y.clamp(0, i64::from(self.height) - 1) as usize;
        let idx = (y * self.width as usize + x) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Nearest sample at normalized `(u, v)`, channels in `[0, 1]`.
    pub fn sample_nearest(&self, u: f32, v: f32) -> [f32; 4] {
        let x = (u * self.width as f32).floor() as i64;
        let y = (v * self.height as f32).floor() as i64;
        self.pixel(x, y).map(u8_to_unit)
    }

    /// Bilinear sample at normalized `(u, v)` with pixel centers at `+0.5`.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> [f32; 4] {
        let fx = u * self.width as f32 - 0.5;
        let fy = v * self.height as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (ix, iy) = (x0 as i64, y0 as i64);

        let a = self.pixel(ix, iy);
        let b = self.pixel(ix + 1, iy);
        let c = self.pixel(ix, iy + 1);
        let d = self.pixel(ix + 1, iy + 1);

        let mut out = [0.0f32; 4];
        for i in 0..4 {
            let top = f32::from(a[i]) + (f32::from(b[i]) - f32::from(a[i])) * tx;
            let bottom = f32::from(c[i]) + (f32::from(d[i]) - f32::from(c[i])) * tx;
            out[i] = (top + (bottom - top) * ty) / 255.0;
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
