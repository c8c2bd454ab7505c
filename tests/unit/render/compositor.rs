use std::sync::Arc;

use super::*;
use crate::foundation::error::DriftError;
use crate::render::pipeline::{EffectPipeline, OutputStage, PipelineConfig};
use crate::transition::manager::TransitionOpts;

fn canvas() -> Canvas {
    Canvas::new(4, 4).unwrap()
}

fn layer(img: &Image, weight: f32) -> BlendLayer<'_> {
    BlendLayer {
        image: Some(img.view()),
        weight,
    }
}

fn all_px(out: ImageRef<'_>, f: impl Fn(&[u8]) -> bool) -> bool {
    out.data.chunks_exact(4).all(f)
}

struct Broken;

impl BlendProgram for Broken {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn blend(
        &self,
        _layers: &[BlendLayer<'_>; 3],
        _background: [u8; 4],
        _target: &mut RenderSurface,
    ) -> DriftResult<()> {
        Err(DriftError::render("nope"))
    }
}

#[test]
fn starts_opaque_black() {
    let c = Compositor::new(canvas(), [0, 0, 0, 0]).unwrap();
    let out = c.output();
    assert_eq!((out.width, out.height), (4, 4));
    assert!(all_px(out, |p| p == [0, 0, 0, 255]));
    assert_eq!(c.frames(), 0);
}

#[test]
fn empty_layers_show_background() {
    let mut c = Compositor::new(canvas(), [10, 20, 30, 255]).unwrap();
    c.compose_layers(&[BlendLayer::EMPTY; 3]).unwrap();
    assert!(all_px(c.output(), |p| p == [10, 20, 30, 255]));
    assert_eq!(c.frames(), 1);
}

#[test]
fn full_weight_opaque_layer_replaces_background() {
    let red = Image::solid(4, 4, [255, 0, 0, 255]);
    let mut c = Compositor::new(canvas(), [0, 0, 0, 255]).unwrap();
    c.compose_layers(&[BlendLayer::EMPTY, layer(&red, 1.0), BlendLayer::EMPTY])
        .unwrap();
    assert!(all_px(c.output(), |p| p == [255, 0, 0, 255]));
}

#[test]
fn weight_scales_layer_alpha() {
    let red = Image::solid(4, 4, [255, 0, 0, 255]);
    let mut c = Compositor::new(canvas(), [0, 0, 0, 255]).unwrap();
    c.compose_layers(&[layer(&red, 0.5), BlendLayer::EMPTY, BlendLayer::EMPTY])
        .unwrap();
    assert!(all_px(c.output(), |p| (p[0] as i32 - 128).abs() <= 1
        && p[1] == 0
        && p[3] == 255));
}

#[test]
fn next_is_stacked_on_top() {
    let red = Image::solid(4, 4, [255, 0, 0, 255]);
    let green = Image::solid(4, 4, [0, 255, 0, 255]);
    let blue = Image::solid(4, 4, [0, 0, 255, 255]);
    let mut c = Compositor::new(canvas(), [0, 0, 0, 255]).unwrap();
    c.compose_layers(&[layer(&red, 1.0), layer(&green, 1.0), layer(&blue, 1.0)])
        .unwrap();
    assert!(all_px(c.output(), |p| p == [0, 0, 255, 255]));
}

#[test]
fn layers_of_other_sizes_are_resampled() {
    let small = Image::solid(2, 3, [40, 80, 120, 255]);
    let mut c = Compositor::new(canvas(), [0, 0, 0, 255]).unwrap();
    c.compose_layers(&[BlendLayer::EMPTY, layer(&small, 1.0), BlendLayer::EMPTY])
        .unwrap();
    assert!(all_px(c.output(), |p| p == [40, 80, 120, 255]));
}

#[test]
fn failed_blend_keeps_previous_frame() {
    let mut c = Compositor::with_program(canvas(), [0, 0, 0, 255], Box::new(Broken)).unwrap();
    assert!(c.compose_layers(&[BlendLayer::EMPTY; 3]).is_err());
    assert!(all_px(c.output(), |p| p == [0, 0, 0, 255]));
    assert_eq!(c.frames(), 0);
}

#[test]
fn composes_manager_roles() {
    let cfg = PipelineConfig {
        canvas: canvas(),
        output_stage: OutputStage::Original,
        ..PipelineConfig::default()
    };
    let slots = (0..3)
        .map(|_| {
            let p = EffectPipeline::new(&cfg, None).unwrap();
            EffectInstance::new(Box::new(p))
        })
        .collect();
    let mut m = TransitionManager::new(slots, TransitionOpts::default());
    let src = Arc::new(Image::solid(4, 4, [200, 100, 50, 255]));
    let cur = m.role_indices()[1];
    m.instances_mut()[cur].set_source(Some(src));
    m.update_instances(0.0);

    let mut c = Compositor::new(canvas(), [0, 0, 0, 255]).unwrap();
    c.compose(&m).unwrap();
    assert!(all_px(c.output(), |p| p == [200, 100, 50, 255]));
    assert_eq!(c.snapshot().data, c.output().data);
}
