use std::f64::consts::TAU;

use kurbo::Vec2;

use crate::effects::params::{ShiftChannel, ShiftParams};
use crate::effects::pass::{EffectPass, PassInput, check_source, shade};
use crate::foundation::core::ImageRef;
use crate::foundation::error::DriftResult;
use crate::foundation::math::{hash01, lerp};
use crate::render::surface::RenderSurface;

/// Directional smear built from a seeded, Gaussian-weighted set of offset samples.
#[derive(Clone, Debug, Default)]
pub struct ShiftPass {
    params: ShiftParams,
}

impl ShiftPass {
    /// Create a pass; parameters are clamped.
    pub fn new(params: ShiftParams) -> Self {
        Self {
            params: params.clamped(),
        }
    }

    /// Active (clamped) parameters.
    pub fn params(&self) -> &ShiftParams {
        &self.params
    }

    /// Replace parameters; they are clamped.
    pub fn set_params(&mut self, params: ShiftParams) {
        self.params = params.clamped();
    }

    /// Sum of both channels at `(u, v)`, before ratio scaling.
    pub fn sample(&self, src: &ImageRef<'_>, u: f32, v: f32, time: f32) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        for ch in self.params.channels() {
            let c = channel_sample(ch, src, u, v, time);
            for i in 0..4 {
                out[i] += c[i];
            }
        }
        out
    }
}

/// UV offset of step `i` out of `steps` (> 1).
pub(crate) fn step_offset(ch: &ShiftChannel, i: u32, time: f32) -> Vec2 {
    let n = ch.steps.max(2);
    let t = i as f32 / (n - 1) as f32;
    let span_step = 2.0 * ch.max_span / (n - 1) as f32;
    let jitter = (hash01(ch.seed, i) * 2.0 - 1.0) * ch.randomness * span_step * 0.5;
    let offset = lerp(-ch.max_span, ch.max_span, t) + jitter;
    let wave = f64::from(ch.wave_strength)
        * (TAU * f64::from(ch.wave_frequency) * f64::from(t) + f64::from(time)).sin();
    Vec2::new(1.0, wave) * f64::from(offset)
}

fn channel_sample(ch: &ShiftChannel, src: &ImageRef<'_>, u: f32, v: f32, time: f32) -> [f32; 4] {
    if !ch.enable || ch.strength <= 0.0 {
        return [0.0; 4];
    }
    if ch.steps <= 1 {
        return src.sample_bilinear(u, v).map(|c| c * ch.strength);
    }

    let pulse = if ch.pulse_amount > 0.0 {
        (1.0 + ch.pulse_amount * (time * ch.pulse_speed).sin()).max(0.0)
    } else {
        1.0
    };
    let two_sigma_sq = 2.0 * ch.sigma * ch.sigma;

    let mut acc = [0.0f32; 4];
    let mut wsum = 0.0f32;
    for i in 0..ch.steps {
        let x = 2.0 * i as f32 / (ch.steps - 1) as f32 - 1.0;
        let w = (-x * x / two_sigma_sq).exp();
        let d = step_offset(ch, i, time);
        let s = src.sample_bilinear(u + d.x as f32, v + d.y as f32);
        for c in 0..4 {
            acc[c] += s[c] * w;
        }
        wsum += w;
    }
    if wsum <= 0.0 {
        return [0.0; 4];
    }
    acc.map(|c| c / wsum * ch.strength * pulse)
}

impl EffectPass for ShiftPass {
    fn name(&self) -> &'static str {
        "shift"
    }

    fn apply(&self, input: &PassInput<'_>, target: &mut RenderSurface) -> DriftResult<()> {
        check_source(self.name(), &input.source)?;
        let src = input.source;
        shade(target, |u, v| {
            self.sample(&src, u, v, input.time)
                .map(|c| c * input.ratio)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/shift.rs"]
mod tests;
