//! Final cross-blend of the previous, current and next instance outputs.

use tracing::{debug, warn};

use crate::effects::composite::over_straight;
use crate::effects::pass::shade;
use crate::foundation::core::{Canvas, Image, ImageRef, PixelFormat};
use crate::foundation::error::DriftResult;
use crate::foundation::math::u8_to_unit;
use crate::render::surface::RenderSurface;
use crate::render::surface_pool::{SurfaceName, SurfacePool, SurfacePoolStats};
use crate::transition::instance::EffectInstance;
use crate::transition::manager::TransitionManager;

/// One weighted input of the blend. A missing image contributes nothing.
#[derive(Clone, Copy, Debug)]
pub struct BlendLayer<'a> {
    /// Instance output, if it has rendered yet.
    pub image: Option<ImageRef<'a>>,
    /// Blend weight in `[0, 1]`.
    pub weight: f32,
}

impl BlendLayer<'static> {
    /// A layer that draws nothing.
    pub const EMPTY: BlendLayer<'static> = BlendLayer {
        image: None,
        weight: 0.0,
    };
}

/// Combines the three layers (previous, current, next) into the target.
pub trait BlendProgram: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Write the blend of `layers` over `background` into `target`.
    fn blend(
        &self,
        layers: &[BlendLayer<'_>; 3],
        background: [u8; 4],
        target: &mut RenderSurface,
    ) -> DriftResult<()>;
}

/// Stacks the layers in order with "over", each layer's alpha scaled by its weight.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedOverBlend;

impl BlendProgram for WeightedOverBlend {
    fn name(&self) -> &'static str {
        "weighted_over"
    }

    fn blend(
        &self,
        layers: &[BlendLayer<'_>; 3],
        background: [u8; 4],
        target: &mut RenderSurface,
    ) -> DriftResult<()> {
        let bg = background.map(u8_to_unit);
        let live: Vec<(ImageRef<'_>, f32)> = layers
            .iter()
            .filter_map(|l| {
                let w = if l.weight.is_finite() {
                    l.weight.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                match l.image {
                    Some(img) if w > 0.0 && img.is_consistent() => Some((img, w)),
                    _ => None,
                }
            })
            .collect();
        shade(target, |u, v| {
            live.iter().fold(bg, |dst, (img, w)| {
                let mut s = img.sample_bilinear(u, v);
                s[3] *= w;
                over_straight(dst, s)
            })
        })
    }
}

/// Owns the final frame and the program that produces it.
pub struct Compositor {
    pool: SurfacePool,
    program: Box<dyn BlendProgram>,
    background: [u8; 4],
    frames: u64,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("program", &self.program.name())
            .field("background", &self.background)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Compositor with the default [`WeightedOverBlend`].
    pub fn new(canvas: Canvas, background: [u8; 4]) -> DriftResult<Self> {
        Self::with_program(canvas, background, Box::new(WeightedOverBlend))
    }

    /// Compositor with a custom program.
    pub fn with_program(
        canvas: Canvas,
        background: [u8; 4],
        program: Box<dyn BlendProgram>,
    ) -> DriftResult<Self> {
        canvas.validate()?;
        let mut pool = SurfacePool::new(canvas, PixelFormat::Rgba8);
        pool.get(SurfaceName::Output).clear([0, 0, 0, 255]);
        Ok(Self {
            pool,
            program,
            background,
            frames: 0,
        })
    }

    /// Output resolution.
    pub fn canvas(&self) -> Canvas {
        let d = self.pool.desc();
        Canvas {
            width: d.width,
            height: d.height,
        }
    }

    /// Color under all layers.
    pub fn background(&self) -> [u8; 4] {
        self.background
    }

    /// Replace the background color.
    pub fn set_background(&mut self, rgba: [u8; 4]) {
        self.background = rgba;
    }

    /// Frames composed successfully.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Surface counters of the output buffer.
    pub fn surface_stats(&self) -> SurfacePoolStats {
        self.pool.stats()
    }

    /// Blend explicit layers into the output. On error the previous frame is kept.
    pub fn compose_layers(&mut self, layers: &[BlendLayer<'_>; 3]) -> DriftResult<()> {
        let target = self.pool.get(SurfaceName::Output);
        if let Err(e) = self.program.blend(layers, self.background, target) {
            warn!(program = self.program.name(), error = %e, "blend failed; keeping last frame");
            return Err(e);
        }
        self.frames += 1;
        Ok(())
    }

    /// Blend the manager's previous, current and next slots by their blend weights. A slot
    /// with no output yet is a transparent layer.
    pub fn compose(&mut self, manager: &TransitionManager) -> DriftResult<()> {
        let layers = [
            layer_of(manager.previous()),
            layer_of(manager.current()),
            layer_of(manager.next()),
        ];
        if layers.iter().all(|l| l.image.is_none()) {
            debug!("no instance output yet; composing background only");
        }
        self.compose_layers(&layers)
    }

    /// The last composed frame; opaque black before the first compose.
    pub fn output(&self) -> ImageRef<'_> {
        match self.pool.peek(SurfaceName::Output) {
            Some(s) => s.view(),
            None => ImageRef {
                width: 0,
                height: 0,
                data: &[],
            },
        }
    }

    /// Copy of the last composed frame.
    pub fn snapshot(&self) -> Image {
        let out = self.output();
        Image {
            width: out.width,
            height: out.height,
            data: out.data.to_vec(),
        }
    }
}

fn layer_of(inst: Option<&EffectInstance>) -> BlendLayer<'_> {
    match inst {
        Some(i) => BlendLayer {
            image: i.output(),
            weight: i.blend(),
        },
        None => BlendLayer::EMPTY,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
