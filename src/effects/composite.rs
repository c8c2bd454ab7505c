use kurbo::Vec2;

use crate::effects::params::CompositeParams;
use crate::effects::pass::{check_source, shade};
use crate::foundation::core::ImageRef;
use crate::foundation::error::DriftResult;
use crate::foundation::math::{fbm, lerp, u8_to_unit};
use crate::render::surface::RenderSurface;

/// The five images the composite pass reads.
///
/// Missing intermediate stages (disabled passes) read as zero.
#[derive(Clone, Copy, Debug)]
pub struct CompositeInputs<'a> {
    /// Original source image.
    pub source: ImageRef<'a>,
    /// Edge pass output.
    pub edge: Option<ImageRef<'a>>,
    /// Shift pass output.
    pub shift: Option<ImageRef<'a>>,
    /// Blurred HSV mask.
    pub mask_blur: Option<ImageRef<'a>>,
    /// Blurred saturation mask.
    pub saturation_blur: Option<ImageRef<'a>>,
}

/// Straight-alpha "over" of `src` onto `dst`.
pub(crate) fn over_straight(dst: [f32; 4], src: [f32; 4]) -> [f32; 4] {
    let sa = src[3].clamp(0.0, 1.0);
    let da = dst[3].clamp(0.0, 1.0);
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0.0; 4];
    }
    let mut out = [0.0f32; 4];
    for i in 0..3 {
        out[i] = (src[i] * sa + dst[i] * da * (1.0 - sa)) / out_a;
    }
    out[3] = out_a;
    out
}

/// Terminal pass: fractal-noise distortion of the source, mixed with the shift output under
/// the mask, plus edge glow, placed over the instance background color.
#[derive(Clone, Debug, Default)]
pub struct CompositePass {
    params: CompositeParams,
}

impl CompositePass {
    /// Create a pass; parameters are clamped.
    pub fn new(params: CompositeParams) -> Self {
        Self {
            params: params.clamped(),
        }
    }

    /// Active (clamped) parameters.
    pub fn params(&self) -> &CompositeParams {
        &self.params
    }

    /// Replace parameters; they are clamped.
    pub fn set_params(&mut self, params: CompositeParams) {
        self.params = params.clamped();
    }

    /// Fractal noise at `(u, v)`; the second value is decorrelated for the y axis.
    pub fn noise(&self, u: f32, v: f32, time: f32) -> (f32, f32) {
        let [scale, octaves, lacunarity, gain] = self.params.fractal;
        let speed = self.params.distortion[1];
        let ox = self.params.noise_offset[0] + time * speed;
        let oy = self.params.noise_offset[1] + time * speed;
        let octaves = octaves as u32;
        let n1 = fbm(u * scale + ox, v * scale + oy, octaves, lacunarity, gain);
        let n2 = fbm(
            u * scale + ox + 31.7,
            v * scale + oy + 17.3,
            octaves,
            lacunarity,
            gain,
        );
        (n1, n2)
    }

    /// Render the composite into `target`.
    pub fn apply(
        &self,
        inputs: &CompositeInputs<'_>,
        ratio: f32,
        time: f32,
        bg_color: [u8; 4],
        target: &mut RenderSurface,
    ) -> DriftResult<()> {
        check_source("composite", &inputs.source)?;
        for aux in [
            inputs.edge,
            inputs.shift,
            inputs.mask_blur,
            inputs.saturation_blur,
        ]
        .into_iter()
        .flatten()
        {
            check_source("composite", &aux)?;
        }

        let ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let [amount, _, edge_glow, noise_mix] = self.params.distortion;
        let bg = bg_color.map(u8_to_unit);
        let read = |img: Option<ImageRef<'_>>, u: f32, v: f32| -> [f32; 4] {
            img.map_or([0.0; 4], |i| i.sample_bilinear(u, v))
        };

        shade(target, |u, v| {
            let m = read(inputs.mask_blur, u, v)[0];
            let e = read(inputs.edge, u, v)[0];
            let s = read(inputs.saturation_blur, u, v)[0];
            let sh = read(inputs.shift, u, v);

            let (n1, n2) = self.noise(u, v, time);
            let disp = Vec2::new(f64::from(n1 - 0.5), f64::from(n2 - 0.5))
                * f64::from(amount * ratio * m);
            let base = inputs
                .source
                .sample_bilinear(u + disp.x as f32, v + disp.y as f32);

            let mut rgb = [0.0f32; 3];
            for c in 0..3 {
                let mixed = lerp(base[c], sh[c], m);
                let glow = mixed + e * edge_glow * (1.0 - mixed);
                rgb[c] = lerp(glow, glow * (0.5 + n1), s * noise_mix).clamp(0.0, 1.0);
            }
            let alpha = m.max(e).max(s).clamp(0.0, 1.0) * base[3];
            over_straight(bg, [rgb[0], rgb[1], rgb[2], alpha])
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
