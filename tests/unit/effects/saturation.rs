use super::*;
use crate::foundation::core::{Canvas, Image, PixelFormat};
use crate::render::surface::{SurfaceDesc, SurfaceId};

fn target(w: u32, h: u32) -> RenderSurface {
    RenderSurface::allocate(
        SurfaceId(u64::MAX - 3),
        SurfaceDesc::for_canvas(Canvas::new(w, h).unwrap(), PixelFormat::Rgba8),
    )
}

#[test]
fn gray_pixels_are_excluded_and_vivid_pixels_included() {
    let pass = SaturationMaskPass::default();
    assert_eq!(pass.weight([0.5, 0.5, 0.5]), 0.0);
    assert_eq!(pass.weight([1.0, 0.0, 0.0]), 1.0);
    let mid = pass.weight([1.0, 0.5, 0.5]);
    assert!(mid > 0.0 && mid < 1.0);
}

#[test]
fn strength_and_ratio_scale_output() {
    let img = Image::solid(3, 3, [255, 0, 0, 255]);
    let pass = SaturationMaskPass::new(SaturationMaskParams {
        strength: 0.5,
        ..SaturationMaskParams::default()
    });
    let mut out = target(3, 3);
    pass.apply(&PassInput::new(img.view(), 0.5, 0.0), &mut out)
        .unwrap();
    assert!(out.data().chunks_exact(4).all(|p| p[0] == 64 && p[3] == 255));
}

#[test]
fn collapsed_range_is_a_hard_threshold() {
    let pass = SaturationMaskPass::new(SaturationMaskParams {
        strength: 1.0,
        smooth_range: [0.5, 0.5],
    });
    assert_eq!(pass.weight([1.0, 0.6, 0.6]), 0.0);
    assert_eq!(pass.weight([1.0, 0.4, 0.4]), 1.0);
}
