#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub(crate) fn new_default() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

/// Reproducible hash of `(seed, index)` mapped to `[0, 1)`.
pub(crate) fn hash01(seed: u32, index: u32) -> f32 {
    let mut h = Fnv1a64::new_default();
    h.write_u32(seed);
    h.write_u32(index);
    // Top 24 bits keep the value exactly representable in f32.
    ((h.finish() >> 40) as f32) / ((1u32 << 24) as f32)
}

/// Lattice hash for value noise; `[0, 1)`.
pub(crate) fn lattice01(x: i32, y: i32, seed: u64) -> f32 {
    let mut h = Fnv1a64::new(seed ^ Fnv1a64::OFFSET_BASIS);
    h.write_u64(((x as u32 as u64) << 32) | (y as u32 as u64));
    ((h.finish() >> 40) as f32) / ((1u32 << 24) as f32)
}

pub(crate) fn smoothstep(a: f32, b: f32, x: f32) -> f32 {
    if x <= a {
        return 0.0;
    }
    if x >= b {
        return 1.0;
    }
    let t = (x - a) / (b - a);
    (t * t * (3.0 - 2.0 * t)).clamp(0.0, 1.0)
}

pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub(crate) fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() { v } else { fallback }
}

pub(crate) fn unit_to_u8(v: f32) -> u8 {
    ((v.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u8
}

pub(crate) fn u8_to_unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

/// Rec. 709 luma of a straight-alpha RGB triple in `[0, 1]`.
pub(crate) fn luminance(rgb: [f32; 3]) -> f32 {
    0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2]
}

/// RGB in `[0, 1]` to HSV with every channel (hue included) in `[0, 1]`.
pub(crate) fn rgb_to_hsv(rgb: [f32; 3]) -> [f32; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta <= f32::EPSILON {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    let s = if max <= f32::EPSILON { 0.0 } else { delta / max };
    [h, s, max]
}

/// Distance on the unit hue circle; result in `[0, 0.5]`.
pub(crate) fn hue_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).abs().rem_euclid(1.0);
    d.min(1.0 - d)
}

/// Lattice period of [`value_noise`]; the field tiles every `NOISE_PERIOD` units.
pub(crate) const NOISE_PERIOD: i32 = 4096;

/// Bilinear value noise in `[0, 1)`.
///
/// Coordinates wrap on [`NOISE_PERIOD`], so arbitrarily large (or non-finite)
/// inputs stay on the lattice.
pub(crate) fn value_noise(x: f32, y: f32, seed: u64) -> f32 {
    let period = NOISE_PERIOD as f32;
    let x = finite_or(x, 0.0).rem_euclid(period);
    let y = finite_or(y, 0.0).rem_euclid(period);
    let x0 = x.floor();
    let y0 = y.floor();
    let ix = (x0 as i32).rem_euclid(NOISE_PERIOD);
    let iy = (y0 as i32).rem_euclid(NOISE_PERIOD);
    let jx = (ix + 1) % NOISE_PERIOD;
    let jy = (iy + 1) % NOISE_PERIOD;
    let sx = smooth_fract(x - x0);
    let sy = smooth_fract(y - y0);

    let a = lattice01(ix, iy, seed);
    let b = lattice01(jx, iy, seed);
    let c = lattice01(ix, jy, seed);
    let d = lattice01(jx, jy, seed);
    lerp(lerp(a, b, sx), lerp(c, d, sx), sy)
}

fn smooth_fract(f: f32) -> f32 {
    let f = f.clamp(0.0, 1.0);
    f * f * (3.0 - 2.0 * f)
}

/// Fractal sum of [`value_noise`] octaves, normalized to `[0, 1]`.
pub(crate) fn fbm(x: f32, y: f32, octaves: u32, lacunarity: f32, gain: f32) -> f32 {
    let mut freq = 1.0f32;
    let mut amp = 1.0f32;
    let mut sum = 0.0f32;
    let mut norm = 0.0f32;
    for octave in 0..octaves.max(1) {
        sum += amp * value_noise(x * freq, y * freq, u64::from(octave));
        norm += amp;
        freq *= lacunarity;
        amp *= gain;
    }
    if norm <= 0.0 { 0.0 } else { sum / norm }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
