use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_keeps_straight_alpha() {
    let img = decode_image(&png_bytes(2, 1, [100, 50, 200, 128])).unwrap();
    assert_eq!((img.width, img.height), (2, 1));
    assert_eq!(&img.data[..4], &[100, 50, 200, 128]);
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_image(b"not an image").is_err());
}

#[test]
fn save_then_load_png() {
    let dir = std::env::temp_dir().join(format!("driftfx-codec-{}", std::process::id()));
    let path = dir.join("nested").join("frame.png");
    let src = Image::solid(3, 2, [1, 2, 3, 255]);
    save_png(&path, src.view()).unwrap();
    let back = load_image(&path).unwrap();
    assert_eq!(back, src);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_file_is_an_error() {
    let err = load_image(Path::new("/definitely/not/here.png")).unwrap_err();
    assert!(matches!(err, DriftError::Io(_)));
    assert!(err.to_string().contains("here.png"));
}

#[test]
fn inconsistent_frame_is_rejected() {
    let data = [0u8; 3];
    let bad = ImageRef {
        width: 2,
        height: 2,
        data: &data,
    };
    assert!(save_png(Path::new("unused.png"), bad).is_err());
}
