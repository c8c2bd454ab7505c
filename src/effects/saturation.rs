use crate::effects::params::SaturationMaskParams;
use crate::effects::pass::{EffectPass, PassInput, check_source, gray, shade};
use crate::foundation::error::DriftResult;
use crate::foundation::math::{rgb_to_hsv, smoothstep};
use crate::render::surface::RenderSurface;

/// Mask of strongly saturated regions.
#[derive(Clone, Debug, Default)]
pub struct SaturationMaskPass {
    params: SaturationMaskParams,
}

impl SaturationMaskPass {
    /// Create a pass; parameters are clamped.
    pub fn new(params: SaturationMaskParams) -> Self {
        Self {
            params: params.clamped(),
        }
    }

    /// Active (clamped) parameters.
    pub fn params(&self) -> &SaturationMaskParams {
        &self.params
    }

    /// Replace parameters; they are clamped.
    pub fn set_params(&mut self, params: SaturationMaskParams) {
        self.params = params.clamped();
    }

    /// Mask value for one color, before ratio scaling.
    pub fn weight(&self, rgb: [f32; 3]) -> f32 {
        let s = rgb_to_hsv(rgb)[1];
        let [lo, hi] = self.params.smooth_range;
        let m = if hi <= lo {
            if s >= lo { 1.0 } else { 0.0 }
        } else {
            smoothstep(lo, hi, s)
        };
        m * self.params.strength
    }
}

impl EffectPass for SaturationMaskPass {
    fn name(&self) -> &'static str {
        "saturation_mask"
    }

    fn apply(&self, input: &PassInput<'_>, target: &mut RenderSurface) -> DriftResult<()> {
        check_source(self.name(), &input.source)?;
        let src = input.source;
        shade(target, |u, v| {
            let s = src.sample_bilinear(u, v);
            gray(self.weight([s[0], s[1], s[2]]) * s[3] * input.ratio)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/saturation.rs"]
mod tests;
