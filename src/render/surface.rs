use crate::foundation::core::{Canvas, ImageRef, PixelFormat};
use crate::foundation::error::{DriftError, DriftResult};

/// Identity of one allocation. A recreated surface gets a fresh id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Descriptor used to allocate a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channel layout.
    pub format: PixelFormat,
}

impl SurfaceDesc {
    /// Descriptor covering a whole canvas.
    pub fn for_canvas(canvas: Canvas, format: PixelFormat) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            format,
        }
    }

    /// Buffer length in bytes.
    pub fn byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(self.format.bytes_per_pixel())
    }
}

/// Intermediate or final render target.
#[derive(Debug)]
pub struct RenderSurface {
    id: SurfaceId,
    desc: SurfaceDesc,
    data: Vec<u8>,
}

impl RenderSurface {
    pub(crate) fn allocate(id: SurfaceId, desc: SurfaceDesc) -> Self {
        Self {
            id,
            desc,
            data: vec![0; desc.byte_len()],
        }
    }

    /// Allocation identity.
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Allocation descriptor.
    pub fn desc(&self) -> SurfaceDesc {
        self.desc
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    /// Read-only pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable pixel bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Borrow as an image view for the next pass.
    pub fn view(&self) -> ImageRef<'_> {
        ImageRef {
            width: self.desc.width,
            height: self.desc.height,
            data: &self.data,
        }
    }

    /// Fill every pixel with one RGBA8 value.
    pub fn clear(&mut self, rgba: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Copy a same-sized image into this surface, or resample it when sizes differ.
    pub fn blit_from(&mut self, src: ImageRef<'_>) -> DriftResult<()> {
        if !src.is_consistent() {
            return Err(DriftError::render("blit source buffer is inconsistent"));
        }
        if src.width == self.desc.width && src.height == self.desc.height {
            self.data.copy_from_slice(src.data);
            return Ok(());
        }
        let (w, h) = (self.desc.width, self.desc.height);
        for y in 0..h {
            for x in 0..w {
                let u = (x as f32 + 0.5) / w as f32;
                let v = (y as f32 + 0.5) / h as f32;
                let s = src.sample_bilinear(u, v);
                let idx = ((y as usize) * (w as usize) + x as usize) * 4;
                for c in 0..4 {
                    self.data[idx + c] = crate::foundation::math::unit_to_u8(s[c]);
                }
            }
        }
        Ok(())
    }

    /// Reject a write target whose buffer does not match its descriptor.
    pub(crate) fn check_consistent(&self) -> DriftResult<()> {
        if self.data.len() != self.desc.byte_len() || self.desc.width == 0 || self.desc.height == 0
        {
            return Err(DriftError::render(format!(
                "surface {:?} buffer size mismatch",
                self.id
            )));
        }
        Ok(())
    }
}
