//! One live slot of the transition ring.

use std::sync::Arc;

use crate::foundation::core::{Image, ImageRef};
use crate::render::pipeline::EffectSource;

fn unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

/// A pipeline plus the values the transition manager and compositor drive it with.
///
/// `ratio` is the effect intensity handed to the pipeline; `blend` is only read by the
/// compositor. Both stay in `[0, 1]`.
pub struct EffectInstance {
    pipeline: Box<dyn EffectSource>,
    source: Option<Arc<Image>>,
    ratio: f32,
    blend: f32,
}

impl std::fmt::Debug for EffectInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectInstance")
            .field("has_source", &self.source.is_some())
            .field("ratio", &self.ratio)
            .field("blend", &self.blend)
            .finish_non_exhaustive()
    }
}

impl EffectInstance {
    /// Wrap a pipeline. Starts without a source, `ratio = 0`, `blend = 0`.
    pub fn new(pipeline: Box<dyn EffectSource>) -> Self {
        Self {
            pipeline,
            source: None,
            ratio: 0.0,
            blend: 0.0,
        }
    }

    /// Shared input image, if any.
    pub fn source(&self) -> Option<&Arc<Image>> {
        self.source.as_ref()
    }

    /// Swap the input image; takes effect on the next update.
    pub fn set_source(&mut self, source: Option<Arc<Image>>) {
        self.source = source;
    }

    /// Effect intensity.
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Set the effect intensity (clamped; non-finite becomes 0).
    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = unit(ratio);
    }

    /// Compositor weight.
    pub fn blend(&self) -> f32 {
        self.blend
    }

    /// Set the compositor weight (clamped; non-finite becomes 0).
    pub fn set_blend(&mut self, blend: f32) {
        self.blend = unit(blend);
    }

    /// The wrapped pipeline.
    pub fn pipeline_mut(&mut self) -> &mut dyn EffectSource {
        self.pipeline.as_mut()
    }

    /// Latest pipeline output.
    pub fn output(&self) -> Option<ImageRef<'_>> {
        self.pipeline.output()
    }

    /// Push source and ratio into the pipeline and render one frame.
    pub fn update(&mut self, time: f32) {
        self.pipeline.set_source(self.source.clone());
        self.pipeline.set_ratio(self.ratio);
        self.pipeline.render(time);
    }

    /// Release the pipeline's resources.
    pub fn teardown(&mut self) {
        self.pipeline.teardown();
    }
}
