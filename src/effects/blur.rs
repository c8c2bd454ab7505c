use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::effects::params::BlurParams;
use crate::foundation::core::ImageRef;
use crate::foundation::error::{DriftError, DriftResult};
use crate::render::surface::RenderSurface;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct KernelKey {
    radius: u32,
    sigma_bits: u32,
}

/// Separable Gaussian blur kernels, cached by `(radius, sigma)`.
///
/// One program can be shared by every pipeline; kernels are read-only once built.
#[derive(Debug, Default)]
pub struct BlurProgram {
    kernels: Mutex<HashMap<KernelKey, Arc<Vec<u32>>>>,
}

impl BlurProgram {
    /// Create an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct kernels built so far.
    pub fn cached_kernels(&self) -> usize {
        self.kernels.lock().map(|k| k.len()).unwrap_or(0)
    }

    fn kernel(&self, radius: u32, sigma: f32) -> DriftResult<Arc<Vec<u32>>> {
        let key = KernelKey {
            radius,
            sigma_bits: sigma.to_bits(),
        };
        let mut cache = self
            .kernels
            .lock()
            .map_err(|_| DriftError::render("blur kernel cache poisoned"))?;
        if let Some(k) = cache.get(&key) {
            return Ok(Arc::clone(k));
        }
        let k = Arc::new(gaussian_kernel_q16(radius, sigma)?);
        cache.insert(key, Arc::clone(&k));
        Ok(k)
    }

    /// Blur `src` (tightly packed RGBA8, `width x height`) into a new buffer.
    pub fn blur_rgba8(
        &self,
        src: &[u8],
        width: u32,
        height: u32,
        radius: u32,
        sigma: f32,
    ) -> DriftResult<Vec<u8>> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| DriftError::render("blur buffer size overflow"))?;
        if src.len() != expected_len {
            return Err(DriftError::render(
                "blur_rgba8 expects src matching width*height*4",
            ));
        }
        if radius == 0 {
            return Ok(src.to_vec());
        }

        let kernel = self.kernel(radius, sigma)?;
        let mut tmp = vec![0u8; expected_len];
        let mut out = vec![0u8; expected_len];
        horizontal_pass(src, &mut tmp, width, height, &kernel);
        vertical_pass(&tmp, &mut out, width, height, &kernel);
        Ok(out)
    }
}

/// Down-sample, blur, up-sample.
///
/// Without a program the stage copies its source unchanged.
#[derive(Clone, Debug, Default)]
pub struct BlurStage {
    program: Option<Arc<BlurProgram>>,
    params: BlurParams,
}

impl BlurStage {
    /// Create a stage; parameters are clamped.
    pub fn new(program: Option<Arc<BlurProgram>>, params: BlurParams) -> Self {
        Self {
            program,
            params: params.clamped(),
        }
    }

    /// Active (clamped) parameters.
    pub fn params(&self) -> &BlurParams {
        &self.params
    }

    /// Replace parameters; they are clamped.
    pub fn set_params(&mut self, params: BlurParams) {
        self.params = params.clamped();
    }

    /// `true` when a program is attached.
    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    /// Drop this stage's handle on the program.
    pub fn release_program(&mut self) {
        self.program = None;
    }

    /// Blur `source` into `target` with the stage parameters.
    pub fn apply(&self, source: ImageRef<'_>, target: &mut RenderSurface) -> DriftResult<()> {
        let p = self.params;
        self.blur(source, target, p.lod, p.iterations, p.step)
    }

    /// Blur with explicit `lod`, `iterations` and `step`.
    pub fn blur(
        &self,
        source: ImageRef<'_>,
        target: &mut RenderSurface,
        lod: u32,
        iterations: u32,
        step: f32,
    ) -> DriftResult<()> {
        if !source.is_consistent() {
            return Err(DriftError::render("blur source buffer is inconsistent"));
        }
        target.check_consistent()?;
        let Some(program) = self.program.as_deref() else {
            return target.blit_from(source);
        };

        let lod = lod.min(4);
        let step = if step.is_finite() {
            step.clamp(0.5, 8.0)
        } else {
            1.0
        };
        let (mut buf, w, h) = downsample(source, lod);

        let radius = (step * 2.0).ceil().clamp(1.0, 32.0) as u32;
        for _ in 0..iterations.min(8) {
            buf = program.blur_rgba8(&buf, w, h, radius, step)?;
        }

        target.blit_from(ImageRef {
            width: w,
            height: h,
            data: &buf,
        })
    }
}

/// Box-filter reduction by `2^lod` on each axis (never below one pixel).
fn downsample(src: ImageRef<'_>, lod: u32) -> (Vec<u8>, u32, u32) {
    let factor = 1u32 << lod;
    if factor == 1 {
        return (src.data.to_vec(), src.width, src.height);
    }
    let w = (src.width / factor).max(1);
    let h = (src.height / factor).max(1);
    let fx = src.width as f32 / w as f32;
    let fy = src.height as f32 / h as f32;
    let mut out = vec![0u8; (w as usize) * (h as usize) * 4];
    for y in 0..h {
        let y0 = (y as f32 * fy) as u32;
        let y1 = (((y + 1) as f32 * fy) as u32).clamp(y0 + 1, src.height);
        for x in 0..w {
            let x0 = (x as f32 * fx) as u32;
            let x1 = (((x + 1) as f32 * fx) as u32).clamp(x0 + 1, src.width);
            let mut acc = [0u32; 4];
            for sy in y0..y1 {
                for sx in x0..x1 {
                    let px = src.pixel(i64::from(sx), i64::from(sy));
                    for c in 0..4 {
                        acc[c] += u32::from(px[c]);
                    }
                }
            }
            let n = (x1 - x0) * (y1 - y0);
            let idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                out[idx + c] = ((acc[c] + n / 2) / n) as u8;
            }
        }
    }
    (out, w, h)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> DriftResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(DriftError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(DriftError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
