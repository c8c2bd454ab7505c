use rayon::prelude::*;

use crate::foundation::core::ImageRef;
use crate::foundation::error::{DriftError, DriftResult};
use crate::foundation::math::unit_to_u8;
use crate::render::surface::RenderSurface;

/// Per-frame inputs shared by the single-source passes.
#[derive(Clone, Copy, Debug)]
pub struct PassInput<'a> {
    /// Image the pass reads.
    pub source: ImageRef<'a>,
    /// Instance intensity in `[0, 1]`; every pass scales its result by it.
    pub ratio: f32,
    /// Monotonic clock in seconds.
    pub time: f32,
}

impl<'a> PassInput<'a> {
    /// Inputs with `ratio` clamped into `[0, 1]`.
    pub fn new(source: ImageRef<'a>, ratio: f32, time: f32) -> Self {
        Self {
            source,
            ratio: if ratio.is_finite() {
                ratio.clamp(0.0, 1.0)
            } else {
                0.0
            },
            time: if time.is_finite() { time } else { 0.0 },
        }
    }
}

/// One image transform with a fixed parameter contract.
///
/// Passes hold no per-frame state: the same input and parameters always produce the same
/// target pixels.
pub trait EffectPass: Send + Sync {
    /// Stable stage name used in logs.
    fn name(&self) -> &'static str;

    /// Render `input` into `target`. Nothing is written when an error is returned.
    fn apply(&self, input: &PassInput<'_>, target: &mut RenderSurface) -> DriftResult<()>;
}

pub(crate) fn check_source(pass: &str, src: &ImageRef<'_>) -> DriftResult<()> {
    if src.is_consistent() {
        Ok(())
    } else {
        Err(DriftError::render(format!(
            "{pass}: source buffer does not match {}x{}",
            src.width, src.height
        )))
    }
}

/// Evaluate `f` at every target pixel center (normalized UV) and store the result.
///
/// Rows are shaded in parallel; each pixel depends only on `(u, v)`, so output is identical to
/// a sequential run.
pub(crate) fn shade<F>(target: &mut RenderSurface, f: F) -> DriftResult<()>
where
    F: Fn(f32, f32) -> [f32; 4] + Sync,
{
    target.check_consistent()?;
    let (w, h) = (target.width(), target.height());
    let row_bytes = w as usize * 4;
    target
        .data_mut()
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let v = (y as f32 + 0.5) / h as f32;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let u = (x as f32 + 0.5) / w as f32;
                let c = f(u, v);
                for i in 0..4 {
                    px[i] = unit_to_u8(c[i]);
                }
            }
        });
    Ok(())
}

/// Gray, opaque encoding used by the mask-like passes.
pub(crate) fn gray(v: f32) -> [f32; 4] {
    let v = v.clamp(0.0, 1.0);
    [v, v, v, 1.0]
}
