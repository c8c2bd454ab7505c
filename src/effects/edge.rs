use crate::effects::params::EdgeParams;
use crate::effects::pass::{EffectPass, PassInput, check_source, gray, shade};
use crate::foundation::core::ImageRef;
use crate::foundation::error::DriftResult;
use crate::foundation::math::{luminance, smoothstep};
use crate::render::surface::RenderSurface;

const SOBEL_X: [[f32; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_Y: [[f32; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Sobel gradient magnitude with a soft threshold.
#[derive(Clone, Debug, Default)]
pub struct EdgePass {
    params: EdgeParams,
}

impl EdgePass {
    /// Create a pass; parameters are clamped.
    pub fn new(params: EdgeParams) -> Self {
        Self {
            params: params.clamped(),
        }
    }

    /// Active (clamped) parameters.
    pub fn params(&self) -> &EdgeParams {
        &self.params
    }

    /// Replace parameters; they are clamped.
    pub fn set_params(&mut self, params: EdgeParams) {
        self.params = params.clamped();
    }

    /// Map a gradient magnitude to edge intensity, before ratio scaling.
    pub fn response(&self, magnitude: f32) -> f32 {
        let p = &self.params;
        let g = magnitude * p.gain;
        let e = if p.softness <= 0.0 {
            if g >= p.threshold { 1.0 } else { 0.0 }
        } else {
            smoothstep(p.threshold, p.threshold + p.softness, g)
        };
        e * p.strength
    }
}

/// Luminance gradient at `(u, v)` measured one source texel apart.
fn gradient(src: &ImageRef<'_>, u: f32, v: f32) -> f32 {
    let tx = 1.0 / src.width as f32;
    let ty = 1.0 / src.height as f32;
    let mut gx = 0.0f32;
    let mut gy = 0.0f32;
    for (j, dy) in (-1i32..=1).enumerate() {
        for (i, dx) in (-1i32..=1).enumerate() {
            let s = src.sample_bilinear(u + dx as f32 * tx, v + dy as f32 * ty);
            let l = luminance([s[0], s[1], s[2]]);
            gx += SOBEL_X[j][i] * l;
            gy += SOBEL_Y[j][i] * l;
        }
    }
    (gx * gx + gy * gy).sqrt()
}

impl EffectPass for EdgePass {
    fn name(&self) -> &'static str {
        "edge"
    }

    fn apply(&self, input: &PassInput<'_>, target: &mut RenderSurface) -> DriftResult<()> {
        check_source(self.name(), &input.source)?;
        let src = input.source;
        shade(target, |u, v| {
            gray(self.response(gradient(&src, u, v)) * input.ratio)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/edge.rs"]
mod tests;
