//! driftfx is a real-time effect compositor.
//!
//! A source image runs through a fixed chain of CPU passes (HSV mask, blur, edge detection,
//! directional shift, saturation mask, blur, fractal-noise composite). Three live instances
//! (previous, current, next) each own such a chain; a transition manager eases their weights
//! when a new source arrives and a compositor blends them into the final frame.
//!
//! # Frame overview
//!
//! 1. **Load**: incoming paths are decoded on a worker thread ([`TextureLoader`]).
//! 2. **Transition**: a finished load starts a transition; [`TransitionManager::tick`] advances it.
//! 3. **Render**: previous, current and next run their [`EffectPipeline`].
//! 4. **Compose**: [`Compositor`] blends the three outputs by their blend weights.
//! 5. **Capture** (optional): after a completed transition and a settle delay the frame is
//!    written as PNG.
//!
//! [`Engine`] wires these steps together behind [`Engine::frame`].
//!
//! Pixels are straight-alpha RGBA8 throughout. Rendering is deterministic: the same inputs,
//! parameters and clock produce the same bytes.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod effects;
mod engine;
mod foundation;
mod io;
mod render;
mod transition;

pub use animation::ease::Ease;
pub use effects::blur::{BlurProgram, BlurStage};
pub use effects::composite::{CompositeInputs, CompositePass};
pub use effects::edge::EdgePass;
pub use effects::mask::MaskPass;
pub use effects::params::{
    BlurParams, CompositeParams, EdgeParams, MAX_SHIFT_STEPS, MaskParams, SaturationMaskParams,
    ShiftChannel, ShiftParams,
};
pub use effects::pass::{EffectPass, PassInput};
pub use effects::saturation::SaturationMaskPass;
pub use effects::shift::ShiftPass;
pub use engine::config::{BlurToggle, EngineConfig, SlotCount};
pub use engine::driver::{Engine, EngineEvent};
pub use foundation::core::{Canvas, Image, ImageRef, MAX_DIMENSION, PixelFormat, Vec2};
pub use foundation::error::{DriftError, DriftResult};
pub use io::capture::{
    CaptureOpts, CaptureScheduler, LogReporter, PathReporter, ReportAddress, capture_path,
};
pub use io::codec::{decode_image, load_image, save_png};
pub use io::loader::{LoadId, LoadedTexture, TextureLoader};
pub use render::compositor::{BlendLayer, BlendProgram, Compositor, WeightedOverBlend};
pub use render::pipeline::{
    EffectPipeline, EffectSource, OutputStage, PipelineConfig, PipelineStats,
};
pub use render::surface::{RenderSurface, SurfaceDesc, SurfaceId};
pub use render::surface_pool::{SurfaceName, SurfacePool, SurfacePoolStats};
pub use transition::instance::EffectInstance;
pub use transition::manager::{
    DURATION_EPS, MIN_SLOTS, PixelExtractor, TransitionCompleted, TransitionManager,
    TransitionOpts, TransitionState, TransitionTask,
};
