use crate::effects::params::MaskParams;
use crate::effects::pass::{EffectPass, PassInput, check_source, gray, shade};
use crate::foundation::error::DriftResult;
use crate::foundation::math::{hue_distance, rgb_to_hsv, smoothstep};
use crate::render::surface::RenderSurface;

/// Soft HSV key: selects pixels close to a target hue/saturation/value.
#[derive(Clone, Debug, Default)]
pub struct MaskPass {
    params: MaskParams,
}

impl MaskPass {
    /// Create a pass; parameters are clamped.
    pub fn new(params: MaskParams) -> Self {
        Self {
            params: params.clamped(),
        }
    }

    /// Active (clamped) parameters.
    pub fn params(&self) -> &MaskParams {
        &self.params
    }

    /// Replace parameters; they are clamped.
    pub fn set_params(&mut self, params: MaskParams) {
        self.params = params.clamped();
    }

    /// Inclusion weight of one straight-alpha RGB color, before ratio scaling.
    pub fn weight(&self, rgb: [f32; 3]) -> f32 {
        let hsv = rgb_to_hsv(rgb);
        let p = &self.params;
        let d = [
            hue_distance(hsv[0], p.target_hsv[0]),
            (hsv[1] - p.target_hsv[1]).abs(),
            (hsv[2] - p.target_hsv[2]).abs(),
        ];
        (0..3)
            .map(|c| band_weight(d[c], p.filter_range[c], p.smooth_range))
            .product()
    }
}

/// 1 inside the filter, smooth falloff over `[filter - inner, filter + outer]`, 0 beyond.
fn band_weight(d: f32, filter: f32, smooth: [f32; 2]) -> f32 {
    let e0 = (filter - smooth[0]).max(0.0);
    let e1 = filter + smooth[1];
    if e1 <= e0 {
        return if d <= filter { 1.0 } else { 0.0 };
    }
    1.0 - smoothstep(e0, e1, d)
}

impl EffectPass for MaskPass {
    fn name(&self) -> &'static str {
        "mask"
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
#[path = "../../tests/unit/effects/mask.rs"]
mod tests;
