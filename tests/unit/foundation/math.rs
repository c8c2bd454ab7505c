use super::*;

#[test]
fn fnv_seeded_hash_is_stable() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"driftfx");
    let mut b = Fnv1a64::new(Fnv1a64::OFFSET_BASIS);
    b.write_bytes(b"drift");
    b.write_bytes(b"fx");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn hash01_is_reproducible_and_in_range() {
    for i in 0..64 {
        let a = hash01(7, i);
        assert_eq!(a, hash01(7, i));
        assert!((0.0..1.0).contains(&a));
    }
    assert_ne!(hash01(7, 3), hash01(8, 3));
}

#[test]
fn smoothstep_edges() {
    assert_eq!(smoothstep(0.2, 0.4, 0.1), 0.0);
    assert_eq!(smoothstep(0.2, 0.4, 0.5), 1.0);
    assert!((smoothstep(0.2, 0.4, 0.3) - 0.5).abs() < 1e-6);
}

#[test]
fn hsv_of_primaries() {
    let red = rgb_to_hsv([1.0, 0.0, 0.0]);
    assert!(red[0].abs() < 1e-6 && (red[1] - 1.0).abs() < 1e-6 && (red[2] - 1.0).abs() < 1e-6);
    let green = rgb_to_hsv([0.0, 1.0, 0.0]);
    assert!((green[0] - 1.0 / 3.0).abs() < 1e-6);
    let gray = rgb_to_hsv([0.5, 0.5, 0.5]);
    assert_eq!(gray[1], 0.0);
}

#[test]
fn hue_distance_wraps() {
    assert!((hue_distance(0.95, 0.05) - 0.1).abs() < 1e-6);
    assert!((hue_distance(0.25, 0.75) - 0.5).abs() < 1e-6);
}

#[test]
fn fbm_stays_normalized() {
    for i in 0..32 {
        let v = fbm(i as f32 * 0.37, i as f32 * 0.11, 4, 2.0, 0.5);
        assert!((0.0..=1.0).contains(&v));
    }
}

#[test]
fn value_noise_wraps_huge_and_non_finite_coordinates() {
    for &x in &[2.2e9f32, -2.2e9, 3.0e38, f32::INFINITY, f32::NAN] {
        let v = value_noise(x, x * 0.5, 3);
        assert!((0.0..=1.0).contains(&v), "{x} -> {v}");
    }
    let p = NOISE_PERIOD as f32;
    assert!((value_noise(1.25, 2.5, 1) - value_noise(1.25 + p, 2.5 - p, 1)).abs() < 1e-4);
}
