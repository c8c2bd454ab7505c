use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::{Canvas, PixelFormat};
use crate::render::surface::{RenderSurface, SurfaceDesc, SurfaceId};

const SLOT_COUNT: usize = 8;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Logical buffers owned by one pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfaceName {
    /// HSV mask output.
    Mask,
    /// Blurred HSV mask.
    MaskBlur,
    /// Edge detection output.
    Edge,
    /// Directional shift output.
    Shift,
    /// Saturation mask output.
    Saturation,
    /// Blurred saturation mask.
    SaturationBlur,
    /// Composite pass output.
    Composite,
    /// Stage selected for display.
    Output,
}

impl SurfaceName {
    /// Every name in slot order.
    pub const ALL: [SurfaceName; SLOT_COUNT] = [
        Self::Mask,
        Self::MaskBlur,
        Self::Edge,
        Self::Shift,
        Self::Saturation,
        Self::SaturationBlur,
        Self::Composite,
        Self::Output,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

/// Allocation counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SurfacePoolStats {
    /// Surfaces currently allocated.
    pub live_surfaces: usize,
    /// Bytes currently allocated.
    pub live_bytes: usize,
    /// Allocations since the pool was created.
    pub alloc_surfaces: u64,
    /// Surfaces released since the pool was created.
    pub released_surfaces: u64,
}

/// Arena of named surfaces with create-on-miss and explicit release.
///
/// All surfaces share the pool's canvas and format. A released name is recreated on the next
/// [`SurfacePool::get`].
#[derive(Debug)]
pub struct SurfacePool {
    desc: SurfaceDesc,
    slots: [Option<RenderSurface>; SLOT_COUNT],
    stats: SurfacePoolStats,
}

impl SurfacePool {
    /// Create an empty pool; nothing is allocated until the first `get`.
    pub fn new(canvas: Canvas, format: PixelFormat) -> Self {
        Self {
            desc: SurfaceDesc::for_canvas(canvas, format),
            slots: Default::default(),
            stats: SurfacePoolStats::default(),
        }
    }

    /// Descriptor used for every allocation.
    pub fn desc(&self) -> SurfaceDesc {
        self.desc
    }

    /// Current counters.
    pub fn stats(&self) -> SurfacePoolStats {
        self.stats.clone()
    }

    /// Fetch the surface for `name`, allocating it on first use.
    pub fn get(&mut self, name: SurfaceName) -> &mut RenderSurface {
        let desc = self.desc;
        let stats = &mut self.stats;
        self.slots[name.slot()].get_or_insert_with(|| allocate(name, desc, stats))
    }

    /// Borrow an already-allocated surface without creating it.
    pub fn peek(&self, name: SurfaceName) -> Option<&RenderSurface> {
        self.slots[name.slot()].as_ref()
    }

    /// `true` when `name` currently holds an allocation.
    pub fn contains(&self, name: SurfaceName) -> bool {
        self.slots[name.slot()].is_some()
    }

    /// Move a surface out so it can be written while other surfaces are read.
    ///
    /// Pair with [`SurfacePool::restore`]; the slot counts as live in between.
    pub(crate) fn take(&mut self, name: SurfaceName) -> RenderSurface {
        match self.slots[name.slot()].take() {
            Some(s) => s,
            None => allocate(name, self.desc, &mut self.stats),
        }
    }

    pub(crate) fn restore(&mut self, name: SurfaceName, surface: RenderSurface) {
        self.slots[name.slot()] = Some(surface);
    }

    /// Release one surface. Returns `true` when something was freed.
    pub fn release(&mut self, name: SurfaceName) -> bool {
        let Some(s) = self.slots[name.slot()].take() else {
            return false;
        };
        self.stats.live_surfaces = self.stats.live_surfaces.saturating_sub(1);
        self.stats.live_bytes = self.stats.live_bytes.saturating_sub(s.desc().byte_len());
        self.stats.released_surfaces += 1;
        true
    }

    /// Release every surface. Safe to call on an empty pool.
    pub fn release_all(&mut self) -> usize {
        SurfaceName::ALL
            .iter()
            .filter(|&&name| self.release(name))
            .count()
    }
}

fn allocate(name: SurfaceName, desc: SurfaceDesc, stats: &mut SurfacePoolStats) -> RenderSurface {
    stats.alloc_surfaces += 1;
    stats.live_surfaces += 1;
    stats.live_bytes = stats.live_bytes.saturating_add(desc.byte_len());
    let id = SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed));
    tracing::trace!(?name, id = id.0, "allocating surface");
    RenderSurface::allocate(id, desc)
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface_pool.rs"]
mod tests;
