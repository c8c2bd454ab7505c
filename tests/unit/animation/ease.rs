use super::*;

#[test]
fn endpoints_are_stable() {
    for ease in Ease::ALL {
        assert_eq!(ease.apply(0.0), 0.0, "{ease:?}");
        assert_eq!(ease.apply(1.0), 1.0, "{ease:?}");
    }
}

#[test]
fn monotonic_spot_check() {
    for ease in Ease::ALL {
        let a = ease.apply(0.25);
        let b = ease.apply(0.5);
        let c = ease.apply(0.75);
        assert!(a < b, "{ease:?}");
        assert!(b < c, "{ease:?}");
    }
}

#[test]
fn input_is_clamped() {
    for ease in Ease::ALL {
        assert_eq!(ease.apply(-3.0), 0.0);
        assert_eq!(ease.apply(7.5), 1.0);
        assert_eq!(ease.apply(f64::NAN), 0.0);
    }
}

#[test]
fn symmetric_curves_pass_through_half() {
    for ease in [
        Ease::Linear,
        Ease::InOutSine,
        Ease::InOutQuad,
        Ease::InOutCubic,
        Ease::SmoothStep,
    ] {
        assert!((ease.apply(0.5) - 0.5).abs() < 1e-12, "{ease:?}");
    }
}

#[test]
fn names_are_snake_case() {
    let s = serde_json::to_string(&Ease::InOutSine).unwrap();
    assert_eq!(s, "\"in_out_sine\"");
    let e: Ease = serde_json::from_str("\"smooth_step\"").unwrap();
    assert_eq!(e, Ease::SmoothStep);
    assert_eq!(Ease::default(), Ease::InOutCubic);
}
