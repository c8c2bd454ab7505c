use super::*;

fn pool(w: u32, h: u32) -> SurfacePool {
    SurfacePool::new(Canvas::new(w, h).unwrap(), PixelFormat::Rgba8)
}

#[test]
fn get_twice_returns_same_surface() {
    let mut p = pool(8, 8);
    let a = p.get(SurfaceName::Mask).id();
    let b = p.get(SurfaceName::Mask).id();
    assert_eq!(a, b);
    assert_eq!(p.stats().alloc_surfaces, 1);
}

#[test]
fn distinct_names_get_distinct_surfaces() {
    let mut p = pool(8, 8);
    let a = p.get(SurfaceName::Mask).id();
    let b = p.get(SurfaceName::Edge).id();
    assert_ne!(a, b);
    assert_eq!(p.stats().live_bytes, 2 * 8 * 8 * 4);
}

#[test]
fn released_surface_is_recreated() {
    let mut p = pool(4, 4);
    let a = p.get(SurfaceName::Shift).id();
    assert!(p.release(SurfaceName::Shift));
    assert!(!p.contains(SurfaceName::Shift));
    let b = p.get(SurfaceName::Shift).id();
    assert_ne!(a, b);
    assert_eq!(p.get(SurfaceName::Shift).data().len(), 4 * 4 * 4);
}

#[test]
fn release_all_is_idempotent() {
    let mut p = pool(4, 4);
    p.get(SurfaceName::Mask);
    p.get(SurfaceName::Output);
    assert_eq!(p.release_all(), 2);
    assert_eq!(p.release_all(), 0);
    let st = p.stats();
    assert_eq!(st.live_surfaces, 0);
    assert_eq!(st.live_bytes, 0);
    assert_eq!(st.released_surfaces, 2);
}

#[test]
fn take_and_restore_keep_identity() {
    let mut p = pool(2, 2);
    let id = p.get(SurfaceName::Composite).id();
    let s = p.take(SurfaceName::Composite);
    assert!(!p.contains(SurfaceName::Composite));
    p.restore(SurfaceName::Composite, s);
    assert_eq!(p.get(SurfaceName::Composite).id(), id);
    assert_eq!(p.stats().alloc_surfaces, 1);
}
