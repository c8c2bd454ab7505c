use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::Canvas;
use crate::foundation::error::{DriftError, DriftResult};
use crate::io::capture::CaptureOpts;
use crate::render::pipeline::PipelineConfig;
use crate::transition::manager::{MIN_SLOTS, TransitionOpts};

/// Everything an [`Engine`](crate::Engine) is built from. Loaded from JSON; every field has a
/// default.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Resolution of every instance and of the composed frame. Overrides `pipeline.canvas`.
    pub canvas: Canvas,
    /// Ring size; at least 3.
    pub slots: SlotCount,
    /// Duration, floor and easing of transitions.
    pub transition: TransitionOpts,
    /// Pass parameters shared by every instance.
    pub pipeline: PipelineConfig,
    /// Color under the composed layers.
    pub background: [u8; 4],
    /// Attach a shared blur program; without one blur stages copy.
    pub blur: BlurToggle,
    /// Post-transition capture.
    pub capture: CaptureOpts,
}

/// Ring size with a default of [`MIN_SLOTS`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SlotCount(pub usize);

impl Default for SlotCount {
    fn default() -> Self {
        Self(MIN_SLOTS)
    }
}

/// Boolean defaulting to `true`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct BlurToggle(pub bool);

impl Default for BlurToggle {
    fn default() -> Self {
        Self(true)
    }
}

impl EngineConfig {
    /// Parse JSON text, then validate and clamp.
    pub fn from_json_str(s: &str) -> DriftResult<Self> {
        let cfg: Self = serde_json::from_str(s).context("parse engine config JSON")?;
        cfg.normalized()
    }

    /// Read a JSON file, then validate and clamp.
    pub fn from_json_file(path: &Path) -> DriftResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config '{}'", path.display()))?;
        cfg.normalized()
    }

    /// Validate, then clamp every parameter set into its domain.
    pub fn normalized(mut self) -> DriftResult<Self> {
        self.validate()?;
        self.transition = self.transition.clamped();
        let p = &mut self.pipeline;
        p.canvas = self.canvas;
        p.mask = p.mask.map(|m| m.clamped());
        p.edge = p.edge.map(|m| m.clamped());
        p.shift = p.shift.map(|m| m.clamped());
        p.saturation = p.saturation.map(|m| m.clamped());
        p.composite = p.composite.map(|m| m.clamped());
        p.mask_blur = p.mask_blur.clamped();
        p.saturation_blur = p.saturation_blur.clamped();
        Ok(self)
    }

    /// Reject values that clamping cannot repair.
    pub fn validate(&self) -> DriftResult<()> {
        self.canvas.validate()?;
        if self.slots.0 < MIN_SLOTS {
            return Err(DriftError::validation(format!(
                "slots must be >= {MIN_SLOTS}, got {}",
                self.slots.0
            )));
        }
        let d = self.transition.duration;
        if !d.is_finite() || d < 0.0 {
            return Err(DriftError::validation(
                "transition duration must be a finite number of seconds >= 0",
            ));
        }
        let floor = self.transition.floor;
        if !(0.0..=1.0).contains(&floor) {
            return Err(DriftError::validation("transition floor must be in [0, 1]"));
        }
        let delay = self.capture.settle_delay;
        if !delay.is_finite() || delay < 0.0 {
            return Err(DriftError::validation(
                "capture settle_delay must be a finite number of seconds >= 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/config.rs"]
mod tests;
