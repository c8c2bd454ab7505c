//! Per-pass parameter sets.
//!
//! Every set deserializes with defaults for missing fields and is normalized through
//! `clamped()` before a pass sees it: out-of-domain values are clamped, non-finite values fall
//! back to the field default.

use crate::foundation::error::{DriftError, DriftResult};
use crate::foundation::math::finite_or;

fn clamp_f(v: f32, default: f32, lo: f32, hi: f32) -> f32 {
    finite_or(v, default).clamp(lo, hi)
}

fn ordered_pair(pair: [f32; 2], default: [f32; 2]) -> [f32; 2] {
    let a = clamp_f(pair[0], default[0], 0.0, 1.0);
    let b = clamp_f(pair[1], default[1], 0.0, 1.0);
    if a <= b { [a, b] } else { [b, a] }
}

/// HSV mask parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MaskParams {
    /// Hue, saturation, value to select; each in `[0, 1]`.
    pub target_hsv: [f32; 3],
    /// Accepted distance per HSV channel; each in `[0, 1]`.
    pub filter_range: [f32; 3],
    /// Falloff band `(inside, outside)` around the filter edge; each in `[0, 1]`.
    pub smooth_range: [f32; 2],
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            target_hsv: [0.0, 0.0, 1.0],
            filter_range: [0.1, 0.3, 0.3],
            smooth_range: [0.05, 0.1],
        }
    }
}

impl MaskParams {
    /// Normalize into the documented domain.
    pub fn clamped(self) -> Self {
        let d = Self::default();
        Self {
            target_hsv: std::array::from_fn(|i| clamp_f(self.target_hsv[i], d.target_hsv[i], 0.0, 1.0)),
            filter_range: std::array::from_fn(|i| {
                clamp_f(self.filter_range[i], d.filter_range[i], 0.0, 1.0)
            }),
            smooth_range: std::array::from_fn(|i| {
                clamp_f(self.smooth_range[i], d.smooth_range[i], 0.0, 1.0)
            }),
        }
    }
}

/// Edge detection parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EdgeParams {
    /// Gradient cutoff in `[0, 1]`.
    pub threshold: f32,
    /// Width of the transition band above `threshold`, in `[0, 1]`.
    pub softness: f32,
    /// Pre-threshold multiplier in `[0, 16]`.
    pub gain: f32,
    /// Post multiplier in `[0, 4]`.
    pub strength: f32,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            softness: 0.1,
            gain: 1.0,
            strength: 1.0,
        }
    }
}

impl EdgeParams {
    /// Normalize into the documented domain.
    pub fn clamped(self) -> Self {
        let d = Self::default();
        Self {
            threshold: clamp_f(self.threshold, d.threshold, 0.0, 1.0),
            softness: clamp_f(self.softness, d.softness, 0.0, 1.0),
            gain: clamp_f(self.gain, d.gain, 0.0, 16.0),
            strength: clamp_f(self.strength, d.strength, 0.0, 4.0),
        }
    }
}

/// One directional shift channel.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShiftChannel {
    /// Disabled channels contribute nothing.
    pub enable: bool,
    /// Sample count, at least 1.
    pub steps: u32,
    /// Largest UV offset in `[0, 1]`.
    pub max_span: f32,
    /// Vertical wave frequency in `[0, 64]`.
    pub wave_frequency: f32,
    /// Vertical wave amplitude in `[0, 1]`.
    pub wave_strength: f32,
    /// Gaussian envelope width over the normalized step index, in `[0.01, 4]`.
    pub sigma: f32,
    /// Output multiplier in `[0, 4]`.
    pub strength: f32,
    /// Per-step jitter amount in `[0, 1]`.
    pub randomness: f32,
    /// Jitter seed.
    pub seed: u32,
    /// Pulse angular speed in `[0, 64]`.
    pub pulse_speed: f32,
    /// Pulse depth in `[0, 1]`; zero disables pulsing.
    pub pulse_amount: f32,
}

impl Default for ShiftChannel {
    fn default() -> Self {
        Self {
            enable: true,
            steps: 8,
            max_span: 0.05,
            wave_frequency: 4.0,
            wave_strength: 0.2,
            sigma: 0.5,
            strength: 1.0,
            randomness: 0.25,
            seed: 0,
            pulse_speed: 0.0,
            pulse_amount: 0.0,
        }
    }
}

/// Upper bound on shift samples per pixel.
pub const MAX_SHIFT_STEPS: u32 = 64;

impl ShiftChannel {
    /// Normalize into the documented domain.
    pub fn clamped(self) -> Self {
        let d = Self::default();
        Self {
            enable: self.enable,
            steps: self.steps.clamp(1, MAX_SHIFT_STEPS),
            max_span: clamp_f(self.max_span, d.max_span, 0.0, 1.0),
            wave_frequency: clamp_f(self.wave_frequency, d.wave_frequency, 0.0, 64.0),
            wave_strength: clamp_f(self.wave_strength, d.wave_strength, 0.0, 1.0),
            sigma: clamp_f(self.sigma, d.sigma, 0.01, 4.0),
            strength: clamp_f(self.strength, d.strength, 0.0, 4.0),
            randomness: clamp_f(self.randomness, d.randomness, 0.0, 1.0),
            seed: self.seed,
            pulse_speed: clamp_f(self.pulse_speed, d.pulse_speed, 0.0, 64.0),
            pulse_amount: clamp_f(self.pulse_amount, d.pulse_amount, 0.0, 1.0),
        }
    }

    fn set(&mut self, field: &str, value: f32) -> bool {
        match field {
            "enable" => self.enable = value != 0.0,
            "steps" => self.steps = finite_or(value, 1.0).max(0.0).round() as u32,
            "max_span" => self.max_span = value,
            "wave_frequency" => self.wave_frequency = value,
            "wave_strength" => self.wave_strength = value,
            "sigma" => self.sigma = value,
            "strength" => self.strength = value,
            "randomness" => self.randomness = value,
            "seed" => self.seed = finite_or(value, 0.0).max(0.0) as u32,
            "pulse_speed" => self.pulse_speed = value,
            "pulse_amount" => self.pulse_amount = value,
            _ => return false,
        }
        true
    }
}

/// Two shift channels evaluated in one pass invocation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShiftParams {
    /// Channel addressed with suffix `1`.
    pub channel1: ShiftChannel,
    /// Channel addressed with suffix `2`.
    pub channel2: ShiftChannel,
}

impl Default for ShiftParams {
    fn default() -> Self {
        Self {
            channel1: ShiftChannel::default(),
            channel2: ShiftChannel {
                enable: false,
                seed: 1,
                ..ShiftChannel::default()
            },
        }
    }
}

impl ShiftParams {
    /// Normalize both channels.
    pub fn clamped(self) -> Self {
        Self {
            channel1: self.channel1.clamped(),
            channel2: self.channel2.clamped(),
        }
    }

    /// Both channels in suffix order.
    pub fn channels(&self) -> [&ShiftChannel; 2] {
        [&self.channel1, &self.channel2]
    }

    /// Set a field by suffixed name, e.g. `strength2` or `steps1`.
    ///
    /// The value is stored raw; pass it through [`ShiftParams::clamped`] before use.
    pub fn set_named(&mut self, key: &str, value: f32) -> DriftResult<()> {
        let (field, channel) = match key.strip_suffix('1') {
            Some(f) => (f, &mut self.channel1),
            None => match key.strip_suffix('2') {
                Some(f) => (f, &mut self.channel2),
                None => {
                    return Err(DriftError::validation(format!(
                        "shift parameter '{key}' needs a channel suffix 1 or 2"
                    )));
                }
            },
        };
        if channel.set(field, value) {
            Ok(())
        } else {
            Err(DriftError::validation(format!(
                "unknown shift parameter '{key}'"
            )))
        }
    }
}

/// Saturation mask parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SaturationMaskParams {
    /// Output multiplier in `[0, 4]`.
    pub strength: f32,
    /// Saturation band `(low, high)` mapped to `0..1`; ordered, each in `[0, 1]`.
    pub smooth_range: [f32; 2],
}

impl Default for SaturationMaskParams {
    fn default() -> Self {
        Self {
            strength: 1.0,
            smooth_range: [0.3, 0.7],
        }
    }
}

impl SaturationMaskParams {
    /// Normalize into the documented domain.
    pub fn clamped(self) -> Self {
        let d = Self::default();
        Self {
            strength: clamp_f(self.strength, d.strength, 0.0, 4.0),
            smooth_range: ordered_pair(self.smooth_range, d.smooth_range),
        }
    }
}

/// Terminal composite parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompositeParams {
    /// Offset added to noise coordinates.
    pub noise_offset: [f32; 2],
    /// `(scale, octaves, lacunarity, gain)` of the fractal noise.
    pub fractal: [f32; 4],
    /// `(amount, speed, edge_glow, noise_mix)` of the distortion.
    pub distortion: [f32; 4],
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self {
            noise_offset: [0.0, 0.0],
            fractal: [4.0, 4.0, 2.0, 0.5],
            distortion: [0.02, 0.1, 1.0, 0.25],
        }
    }
}

impl CompositeParams {
    /// Normalize into the documented domain.
    pub fn clamped(self) -> Self {
        let d = Self::default();
        Self {
            noise_offset: std::array::from_fn(|i| {
                clamp_f(self.noise_offset[i], d.noise_offset[i], -1.0e4, 1.0e4)
            }),
            fractal: [
                clamp_f(self.fractal[0], d.fractal[0], 0.01, 64.0),
                clamp_f(self.fractal[1], d.fractal[1], 1.0, 8.0).round(),
                clamp_f(self.fractal[2], d.fractal[2], 1.0, 4.0),
                clamp_f(self.fractal[3], d.fractal[3], 0.0, 1.0),
            ],
            distortion: [
                clamp_f(self.distortion[0], d.distortion[0], 0.0, 0.5),
                clamp_f(self.distortion[1], d.distortion[1], 0.0, 16.0),
                clamp_f(self.distortion[2], d.distortion[2], 0.0, 4.0),
                clamp_f(self.distortion[3], d.distortion[3], 0.0, 1.0),
            ],
        }
    }
}

/// Down-sample / blur / up-sample parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BlurParams {
    /// Resolution level; each level halves the working size. `[0, 4]`.
    pub lod: u32,
    /// Blur repetitions at the reduced size. `[0, 8]`.
    pub iterations: u32,
    /// Sample spacing in working pixels. `[0.5, 8]`.
    pub step: f32,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            lod: 1,
            iterations: 2,
            step: 1.0,
        }
    }
}

impl BlurParams {
    /// Normalize into the documented domain.
    pub fn clamped(self) -> Self {
        Self {
            lod: self.lod.min(4),
            iterations: self.iterations.min(8),
            step: clamp_f(self.step, 1.0, 0.5, 8.0),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/params.rs"]
mod tests;
