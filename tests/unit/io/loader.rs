use super::*;
use crate::io::codec::save_png;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("driftfx-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn loads_in_background() {
    let dir = temp_dir("loader-ok");
    let path = dir.join("a.png");
    save_png(&path, Image::solid(3, 3, [9, 8, 7, 255]).view()).unwrap();

    let mut loader = TextureLoader::new().unwrap();
    let id = loader.request(&path).unwrap();
    assert_eq!(loader.pending(), 1);
    let done = loader.wait(Duration::from_secs(10)).unwrap();
    assert_eq!(done.id, id);
    assert_eq!(done.path, path);
    let img = done.result.unwrap();
    assert_eq!((img.width, img.height), (3, 3));
    assert_eq!(&img.data[..4], &[9, 8, 7, 255]);
    assert_eq!(loader.pending(), 0);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn failures_come_back_as_results() {
    let mut loader = TextureLoader::new().unwrap();
    let a = loader.request("/no/such/file.png").unwrap();
    let b = loader.request("/no/such/other.png").unwrap();
    assert_ne!(a, b);
    let first = loader.wait(Duration::from_secs(10)).unwrap();
    let second = loader.wait(Duration::from_secs(10)).unwrap();
    assert_eq!(first.id, a);
    assert_eq!(second.id, b);
    assert!(first.result.is_err());
    assert!(second.result.is_err());
}

#[test]
fn poll_is_non_blocking() {
    let mut loader = TextureLoader::new().unwrap();
    assert!(loader.poll().is_empty());
    assert!(loader.wait(Duration::from_millis(1)).is_none());
}

#[test]
fn shutdown_rejects_new_requests() {
    let mut loader = TextureLoader::new().unwrap();
    loader.shutdown();
    loader.shutdown();
    let err = loader.request("x.png").unwrap_err();
    assert!(err.is_setup());
}
