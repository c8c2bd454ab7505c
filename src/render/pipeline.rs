//! One effect instance's pass chain.
//!
//! Fixed order: mask, mask blur, edge, shift, saturation mask, saturation blur, composite,
//! output selection. Every stage renders into its own named surface; a stage that fails keeps
//! its previous frame's pixels and the remaining stages still run.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::effects::blur::{BlurProgram, BlurStage};
use crate::effects::composite::{CompositeInputs, CompositePass};
use crate::effects::edge::EdgePass;
use crate::effects::mask::MaskPass;
use crate::effects::params::{
    BlurParams, CompositeParams, EdgeParams, MaskParams, SaturationMaskParams, ShiftParams,
};
use crate::effects::pass::{EffectPass, PassInput};
use crate::effects::saturation::SaturationMaskPass;
use crate::effects::shift::ShiftPass;
use crate::foundation::core::{Canvas, Image, ImageRef, PixelFormat};
use crate::foundation::error::{DriftError, DriftResult};
use crate::render::surface_pool::{SurfaceName, SurfacePool, SurfacePoolStats};

/// Capabilities every pipeline variant offers to the compositor and transition manager.
pub trait EffectSource: Send {
    /// Latest rendered output; `None` until a frame with a source has been rendered.
    fn output(&self) -> Option<ImageRef<'_>>;
    /// Replace the input image. The image is shared, not owned.
    fn set_source(&mut self, source: Option<Arc<Image>>);
    /// Set the effect intensity in `[0, 1]`.
    fn set_ratio(&mut self, ratio: f32);
    /// Set the color the composite is placed over.
    fn set_bg_color(&mut self, rgba: [u8; 4]);
    /// Render one frame at clock `time` (seconds).
    fn render(&mut self, time: f32);
    /// Release every owned resource. Safe to call repeatedly.
    fn teardown(&mut self);
}

/// Which intermediate buffer is copied to the pipeline output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStage {
    /// The unprocessed source.
    Original,
    /// HSV mask.
    Mask,
    /// Blurred HSV mask.
    MaskBlur,
    /// Edge detection.
    Edge,
    /// Directional shift.
    Shift,
    /// Saturation mask.
    Saturation,
    /// Blurred saturation mask.
    SaturationBlur,
    /// Final composite.
    #[default]
    Composite,
}

impl OutputStage {
    fn surface(self) -> Option<SurfaceName> {
        match self {
            Self::Original => None,
            Self::Mask => Some(SurfaceName::Mask),
            Self::MaskBlur => Some(SurfaceName::MaskBlur),
            Self::Edge => Some(SurfaceName::Edge),
            Self::Shift => Some(SurfaceName::Shift),
            Self::Saturation => Some(SurfaceName::Saturation),
            Self::SaturationBlur => Some(SurfaceName::SaturationBlur),
            Self::Composite => Some(SurfaceName::Composite),
        }
    }
}

/// Pipeline construction options. A `null` pass disables that stage.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Resolution of every intermediate surface.
    pub canvas: Canvas,
    /// Surface channel layout.
    pub format: PixelFormat,
    /// HSV mask stage.
    pub mask: Option<MaskParams>,
    /// Edge stage.
    pub edge: Option<EdgeParams>,
    /// Shift stage.
    pub shift: Option<ShiftParams>,
    /// Saturation mask stage.
    pub saturation: Option<SaturationMaskParams>,
    /// Composite stage.
    pub composite: Option<CompositeParams>,
    /// Blur applied to the HSV mask.
    pub mask_blur: BlurParams,
    /// Blur applied to the saturation mask.
    pub saturation_blur: BlurParams,
    /// Stage copied to the output.
    pub output_stage: OutputStage,
    /// Background color under the composite (RGBA8, straight alpha).
    pub bg_color: [u8; 4],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            format: PixelFormat::Rgba8,
            mask: Some(MaskParams::default()),
            edge: Some(EdgeParams::default()),
            shift: Some(ShiftParams::default()),
            saturation: Some(SaturationMaskParams::default()),
            composite: Some(CompositeParams::default()),
            mask_blur: BlurParams::default(),
            saturation_blur: BlurParams::default(),
            output_stage: OutputStage::Composite,
            bg_color: [0, 0, 0, 0],
        }
    }
}

/// Frame and failure counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Calls to `update` that had a usable source.
    pub frames_rendered: u64,
    /// Stages that returned an error.
    pub stage_failures: u64,
}

/// Pass chain plus the surfaces it renders into.
pub struct EffectPipeline {
    canvas: Canvas,
    pool: SurfacePool,
    mask: Option<MaskPass>,
    edge: Option<EdgePass>,
    shift: Option<ShiftPass>,
    saturation: Option<SaturationMaskPass>,
    composite: Option<CompositePass>,
    mask_blur: BlurStage,
    saturation_blur: BlurStage,
    output_stage: OutputStage,
    bg_color: [u8; 4],
    source: Option<Arc<Image>>,
    ratio: f32,
    has_output: bool,
    stats: PipelineStats,
}

impl std::fmt::Debug for EffectPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectPipeline")
            .field("canvas", &self.canvas)
            .field("output_stage", &self.output_stage)
            .field("ratio", &self.ratio)
            .field("has_output", &self.has_output)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl EffectPipeline {
    /// Build a pipeline. `blur` may be shared between pipelines; `None` makes both blur stages
    /// plain copies.
    pub fn new(config: &PipelineConfig, blur: Option<Arc<BlurProgram>>) -> DriftResult<Self> {
        config.canvas.validate()?;
        if blur.is_none() {
            warn!("no blur program attached; blur stages fall back to copies");
        }
        for (stage, present) in [
            ("mask", config.mask.is_some()),
            ("edge", config.edge.is_some()),
            ("shift", config.shift.is_some()),
            ("saturation_mask", config.saturation.is_some()),
            ("composite", config.composite.is_some()),
        ] {
            if !present {
                warn!(stage, "pass not assigned; stage will be skipped");
            }
        }

        Ok(Self {
            canvas: config.canvas,
            pool: SurfacePool::new(config.canvas, config.format),
            mask: config.mask.map(MaskPass::new),
            edge: config.edge.map(EdgePass::new),
            shift: config.shift.map(ShiftPass::new),
            saturation: config.saturation.map(SaturationMaskPass::new),
            composite: config.composite.map(CompositePass::new),
            mask_blur: BlurStage::new(blur.clone(), config.mask_blur),
            saturation_blur: BlurStage::new(blur, config.saturation_blur),
            output_stage: config.output_stage,
            bg_color: config.bg_color,
            source: None,
            ratio: 0.0,
            has_output: false,
            stats: PipelineStats::default(),
        })
    }

    /// Output resolution.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Counters since construction.
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Surface allocation counters.
    pub fn surface_stats(&self) -> SurfacePoolStats {
        self.pool.stats()
    }

    /// Read-only access to the surfaces, e.g. to inspect intermediate stages.
    pub fn surfaces(&self) -> &SurfacePool {
        &self.pool
    }

    /// Ratio used by the most recent update.
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Stage copied to the output.
    pub fn output_stage(&self) -> OutputStage {
        self.output_stage
    }

    /// Select a different stage for the output; takes effect on the next update.
    pub fn set_output_stage(&mut self, stage: OutputStage) {
        self.output_stage = stage;
    }

    /// Mask pass, if assigned.
    pub fn mask_mut(&mut self) -> Option<&mut MaskPass> {
        self.mask.as_mut()
    }

    /// Edge pass, if assigned.
    pub fn edge_mut(&mut self) -> Option<&mut EdgePass> {
        self.edge.as_mut()
    }

    /// Shift pass, if assigned.
    pub fn shift_mut(&mut self) -> Option<&mut ShiftPass> {
        self.shift.as_mut()
    }

    /// Saturation mask pass, if assigned.
    pub fn saturation_mut(&mut self) -> Option<&mut SaturationMaskPass> {
        self.saturation.as_mut()
    }

    /// Composite pass, if assigned.
    pub fn composite_mut(&mut self) -> Option<&mut CompositePass> {
        self.composite.as_mut()
    }

    /// Both blur stages, mask first.
    pub fn blur_stages_mut(&mut self) -> (&mut BlurStage, &mut BlurStage) {
        (&mut self.mask_blur, &mut self.saturation_blur)
    }

    /// Final image, once an update with a source has run.
    pub fn output(&self) -> Option<ImageRef<'_>> {
        if !self.has_output {
            return None;
        }
        self.pool.peek(SurfaceName::Output).map(|s| s.view())
    }

    /// Run every stage against `source`.
    #[tracing::instrument(
        level = "trace",
        skip(self, source),
        fields(w = source.width, h = source.height)
    )]
    pub fn update(&mut self, source: ImageRef<'_>, ratio: f32, time: f32) {
        if !source.is_consistent() {
            warn!(
                width = source.width,
                height = source.height,
                "pipeline source buffer is inconsistent; frame skipped"
            );
            return;
        }
        let input = PassInput::new(source, ratio, time);
        self.ratio = input.ratio;

        let failures = &mut self.stats.stage_failures;
        let pool = &mut self.pool;

        let mask = self.mask.as_ref().map(|p| p as &dyn EffectPass);
        let edge = self.edge.as_ref().map(|p| p as &dyn EffectPass);
        let shift = self.shift.as_ref().map(|p| p as &dyn EffectPass);
        let saturation = self.saturation.as_ref().map(|p| p as &dyn EffectPass);

        run_pass(mask, pool, SurfaceName::Mask, &input, failures);
        run_blur(&self.mask_blur, pool, SurfaceName::Mask, SurfaceName::MaskBlur, failures);
        run_pass(edge, pool, SurfaceName::Edge, &input, failures);
        run_pass(shift, pool, SurfaceName::Shift, &input, failures);
        run_pass(saturation, pool, SurfaceName::Saturation, &input, failures);
        run_blur(
            &self.saturation_blur,
            pool,
            SurfaceName::Saturation,
            SurfaceName::SaturationBlur,
            failures,
        );

        if let Some(composite) = self.composite.as_ref() {
            let mut target = pool.take(SurfaceName::Composite);
            let inputs = CompositeInputs {
                source,
                edge: pool.peek(SurfaceName::Edge).map(|s| s.view()),
                shift: pool.peek(SurfaceName::Shift).map(|s| s.view()),
                mask_blur: pool.peek(SurfaceName::MaskBlur).map(|s| s.view()),
                saturation_blur: pool.peek(SurfaceName::SaturationBlur).map(|s| s.view()),
            };
            let res = composite.apply(
                &inputs,
                input.ratio,
                input.time,
                self.bg_color,
                &mut target,
            );
            pool.restore(SurfaceName::Composite, target);
            record("composite", res, failures);
        } else {
            trace!(stage = "composite", "pass not assigned; skipped");
        }

        let mut output = pool.take(SurfaceName::Output);
        let selected = self
            .output_stage
            .surface()
            .and_then(|name| pool.peek(name))
            .map(|s| s.view());
        let res = match selected {
            Some(view) => output.blit_from(view),
            None => {
                if self.output_stage != OutputStage::Original {
                    trace!(stage = ?self.output_stage, "selected stage unavailable; showing source");
                }
                output.blit_from(source)
            }
        };
        pool.restore(SurfaceName::Output, output);
        if record("output", res, failures) {
            self.has_output = true;
        }
        self.stats.frames_rendered += 1;
    }

    /// Release every surface and this pipeline's handle on the blur program.
    ///
    /// Idempotent. A later update reallocates surfaces; blur stages then act as copies.
    pub fn teardown(&mut self) {
        let released = self.pool.release_all();
        self.mask_blur.release_program();
        self.saturation_blur.release_program();
        self.has_output = false;
        if released > 0 {
            debug!(released, "pipeline torn down");
        }
    }

    /// Render the pipeline's own source, if it has one.
    pub fn render_current(&mut self, time: f32) -> DriftResult<()> {
        let Some(src) = self.source.clone() else {
            return Err(DriftError::setup("pipeline has no source"));
        };
        self.update(src.view(), self.ratio, time);
        Ok(())
    }
}

fn record(stage: &'static str, res: DriftResult<()>, failures: &mut u64) -> bool {
    match res {
        Ok(()) => true,
        Err(e) => {
            *failures += 1;
            warn!(stage, error = %e, "stage failed; keeping previous contents");
            false
        }
    }
}

fn run_pass(
    pass: Option<&dyn EffectPass>,
    pool: &mut SurfacePool,
    name: SurfaceName,
    input: &PassInput<'_>,
    failures: &mut u64,
) {
    let Some(pass) = pass else {
        trace!(?name, "pass not assigned; skipped");
        return;
    };
    let res = pass.apply(input, pool.get(name));
    record(pass.name(), res, failures);
}

fn run_blur(
    stage: &BlurStage,
    pool: &mut SurfacePool,
    from: SurfaceName,
    to: SurfaceName,
    failures: &mut u64,
) {
    if !pool.contains(from) {
        return;
    }
    let mut target = pool.take(to);
    let res = match pool.peek(from) {
        Some(src) => stage.apply(src.view(), &mut target),
        None => Ok(()),
    };
    pool.restore(to, target);
    record("blur", res, failures);
}

impl EffectSource for EffectPipeline {
    fn output(&self) -> Option<ImageRef<'_>> {
        EffectPipeline::output(self)
    }

    fn set_source(&mut self, source: Option<Arc<Image>>) {
        self.source = source;
    }

    fn set_ratio(&mut self, ratio: f32) {
        self.ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    fn set_bg_color(&mut self, rgba: [u8; 4]) {
        self.bg_color = rgba;
    }

    fn render(&mut self, time: f32) {
        if self.render_current(time).is_err() {
            trace!("no source assigned; frame skipped");
        }
    }

    fn teardown(&mut self) {
        EffectPipeline::teardown(self);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
