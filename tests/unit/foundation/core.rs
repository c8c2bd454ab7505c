use super::*;

#[test]
fn canvas_rejects_zero_and_oversized() {
    assert!(Canvas::new(0, 4).is_err());
    assert!(Canvas::new(4, MAX_DIMENSION + 1).is_err());
    assert_eq!(Canvas::new(4, 3).unwrap().byte_len(), 48);
}

#[test]
fn image_new_checks_length() {
    assert!(Image::new(2, 2, vec![0; 15]).is_err());
    assert!(Image::new(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn pixel_clamps_to_edges() {
    let mut img = Image::solid(2, 1, [0, 0, 0, 255]);
    img.data[4..8].copy_from_slice(&[255, 10, 20, 255]);
    let v = img.view();
    assert_eq!(v.pixel(-5, 0), [0, 0, 0, 255]);
    assert_eq!(v.pixel(9, 3), [255, 10, 20, 255]);
}

#[test]
fn bilinear_of_constant_image_is_constant() {
    let img = Image::solid(3, 3, [51, 102, 153, 255]);
    let s = img.view().sample_bilinear(0.37, 0.81);
    assert!((s[0] - 0.2).abs() < 1e-5);
    assert!((s[1] - 0.4).abs() < 1e-5);
    assert!((s[2] - 0.6).abs() < 1e-5);
    assert!((s[3] - 1.0).abs() < 1e-5);
}

#[test]
fn nearest_picks_containing_pixel() {
    let mut img = Image::solid(2, 1, [0, 0, 0, 255]);
    img.data[4] = 255;
    assert_eq!(img.view().sample_nearest(0.75, 0.5)[0], 1.0);
    assert_eq!(img.view().sample_nearest(0.25, 0.5)[0], 0.0);
}
