use super::*;
use crate::animation::ease::Ease;
use crate::render::pipeline::OutputStage;

#[test]
fn empty_object_yields_defaults() {
    let cfg = EngineConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg.slots, SlotCount(3));
    assert_eq!(cfg.blur, BlurToggle(true));
    assert_eq!(cfg.transition, TransitionOpts::default());
    assert_eq!(cfg.pipeline.output_stage, OutputStage::Composite);
    assert_eq!(cfg.pipeline.canvas, cfg.canvas);
    assert_eq!(cfg.capture.settle_delay, 1.0);
}

#[test]
fn parses_nested_sections() {
    let json = r#"{
        "canvas": { "width": 64, "height": 32 },
        "slots": 4,
        "transition": { "duration": 0.5, "floor": 0.3, "ease": "in_out_sine" },
        "pipeline": {
            "output_stage": "edge",
            "mask": null,
            "edge": { "threshold": 0.2 }
        },
        "background": [1, 2, 3, 255],
        "blur": false,
        "capture": { "enabled": false, "report_address": "upload_path" }
    }"#;
    let cfg = EngineConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.canvas, Canvas::new(64, 32).unwrap());
    assert_eq!(cfg.pipeline.canvas, cfg.canvas);
    assert_eq!(cfg.slots, SlotCount(4));
    assert_eq!(cfg.transition.ease, Ease::InOutSine);
    assert_eq!(cfg.transition.floor, 0.3);
    assert!(cfg.pipeline.mask.is_none());
    assert_eq!(cfg.pipeline.edge.unwrap().threshold, 0.2);
    assert_eq!(cfg.pipeline.output_stage, OutputStage::Edge);
    assert_eq!(cfg.background, [1, 2, 3, 255]);
    assert_eq!(cfg.blur, BlurToggle(false));
    assert!(!cfg.capture.enabled);
}

#[test]
fn too_few_slots_is_rejected() {
    let err = EngineConfig::from_json_str(r#"{ "slots": 2 }"#).unwrap_err();
    assert!(matches!(err, DriftError::Validation(_)));
}

#[test]
fn bad_transition_values_are_rejected() {
    for json in [
        r#"{ "transition": { "duration": -1.0 } }"#,
        r#"{ "transition": { "floor": 1.5 } }"#,
        r#"{ "capture": { "settle_delay": -0.1 } }"#,
        r#"{ "canvas": { "width": 0, "height": 4 } }"#,
    ] {
        assert!(EngineConfig::from_json_str(json).is_err(), "{json}");
    }
}

#[test]
fn malformed_json_is_an_error() {
    assert!(EngineConfig::from_json_str("{ nope").is_err());
}

#[test]
fn pass_parameters_are_clamped_on_load() {
    let cfg =
        EngineConfig::from_json_str(r#"{ "pipeline": { "mask_blur": { "iterations": 500 } } }"#)
            .unwrap();
    assert!(cfg.pipeline.mask_blur.iterations <= 8);
}

#[test]
fn file_round_trip() {
    let path = std::env::temp_dir().join(format!("driftfx-config-{}.json", std::process::id()));
    let cfg = EngineConfig {
        canvas: Canvas::new(16, 16).unwrap(),
        ..EngineConfig::default()
    }
    .normalized()
    .unwrap();
    std::fs::write(&path, serde_json::to_string_pretty(&cfg).unwrap()).unwrap();
    let back = EngineConfig::from_json_file(&path).unwrap();
    assert_eq!(back, cfg);
    std::fs::remove_file(&path).ok();
    assert!(EngineConfig::from_json_file(&path).is_err());
}
