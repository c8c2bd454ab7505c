//! Frame driver wiring loader, transitions, compositor and capture together.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::effects::blur::BlurProgram;
use crate::engine::config::EngineConfig;
use crate::foundation::core::{Image, ImageRef};
use crate::foundation::error::{DriftError, DriftResult};
use crate::io::capture::{CaptureScheduler, PathReporter};
use crate::io::loader::{LoadId, TextureLoader};
use crate::render::compositor::Compositor;
use crate::render::pipeline::EffectPipeline;
use crate::transition::instance::EffectInstance;
use crate::transition::manager::{PixelExtractor, TransitionCompleted, TransitionManager};

/// Something that happened during a frame.
#[derive(Debug)]
pub enum EngineEvent {
    /// A decoded texture was loaded into the next slot.
    TransitionStarted {
        /// Path the texture came from.
        path: PathBuf,
    },
    /// A transition reached its targets.
    TransitionCompleted(TransitionCompleted),
    /// The composed frame was written to disk.
    Captured {
        /// File that was written.
        path: PathBuf,
    },
    /// A recoverable failure; the frame still completed.
    Error {
        /// Where it happened.
        stage: &'static str,
        /// What went wrong.
        error: DriftError,
    },
}

/// Owns every runtime component. Driven by [`Engine::frame`].
pub struct Engine {
    config: EngineConfig,
    manager: TransitionManager,
    compositor: Compositor,
    loader: TextureLoader,
    capture: CaptureScheduler,
    reporter: Option<Box<dyn PathReporter>>,
    clock: f64,
    frames: u64,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("manager", &self.manager)
            .field("compositor", &self.compositor)
            .field("clock", &self.clock)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Validate `config`, build the instance ring and start the loader thread.
    pub fn new(config: EngineConfig) -> DriftResult<Self> {
        let config = config.normalized()?;
        let blur = config.blur.0.then(|| Arc::new(BlurProgram::new()));

        let mut slots = Vec::with_capacity(config.slots.0);
        for _ in 0..config.slots.0 {
            let pipeline = EffectPipeline::new(&config.pipeline, blur.clone())?;
            slots.push(EffectInstance::new(Box::new(pipeline)));
        }
        let manager = TransitionManager::new(slots, config.transition);
        let compositor = Compositor::new(config.canvas, config.background)?;
        let loader = TextureLoader::new()?;
        let capture = CaptureScheduler::new(config.capture.clone());

        info!(
            width = config.canvas.width,
            height = config.canvas.height,
            slots = config.slots.0,
            "engine ready"
        );
        Ok(Self {
            config,
            manager,
            compositor,
            loader,
            capture,
            reporter: None,
            clock: 0.0,
            frames: 0,
        })
    }

    /// Normalized configuration the engine was built from.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Attach the collaborator that receives saved capture paths.
    pub fn set_reporter(&mut self, reporter: Option<Box<dyn PathReporter>>) {
        self.reporter = reporter;
    }

    /// Attach the pixel-extraction collaborator.
    pub fn set_extractor(&mut self, extractor: Option<Box<dyn PixelExtractor>>) {
        self.manager.set_extractor(extractor);
    }

    /// Transition state and instances.
    pub fn manager(&self) -> &TransitionManager {
        &self.manager
    }

    /// Mutable access, e.g. to tweak pass parameters of individual instances.
    pub fn manager_mut(&mut self) -> &mut TransitionManager {
        &mut self.manager
    }

    /// Capture scheduling state.
    pub fn capture(&self) -> &CaptureScheduler {
        &self.capture
    }

    /// Seconds of frame time since construction.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Frames driven so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Texture loads still in flight.
    pub fn pending_loads(&self) -> usize {
        self.loader.pending()
    }

    /// The last composed frame.
    pub fn output(&self) -> ImageRef<'_> {
        self.compositor.output()
    }

    /// Incoming path message. Blank payloads are dropped with a warning.
    pub fn on_texture_path(&mut self, payload: &str) -> Option<LoadId> {
        let path = payload.trim();
        if path.is_empty() {
            warn!("empty texture path received; ignored");
            return None;
        }
        match self.loader.request(path) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(path, error = %e, "texture request rejected");
                None
            }
        }
    }

    /// Start a transition to an already decoded image, bypassing the loader.
    pub fn start_transition(&mut self, image: Arc<Image>) -> DriftResult<()> {
        self.manager.start_transition(image)
    }

    /// Advance by `dt` seconds: apply finished loads, tick the transition, render previous,
    /// current and next, compose, and capture when due. Never fails; problems come back as
    /// [`EngineEvent::Error`].
    #[tracing::instrument(level = "trace", skip(self), fields(frame = self.frames))]
    pub fn frame(&mut self, dt: f64) -> Vec<EngineEvent> {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.clock += dt;
        let mut events = Vec::new();

        for loaded in self.loader.poll() {
            let started = loaded
                .result
                .and_then(|img| self.manager.start_transition(img));
            match started {
                Ok(()) => events.push(EngineEvent::TransitionStarted { path: loaded.path }),
                Err(error) => {
                    warn!(path = %loaded.path.display(), error = %error, "texture not applied");
                    events.push(EngineEvent::Error {
                        stage: "load",
                        error,
                    });
                }
            }
        }

        // Counts only frames after the one that armed it.
        let capture_due = self.capture.tick(dt);

        // The first tick after a start snapshots blend weights and ratios only, so it does not
        // need this frame's render to have happened yet.
        if let Some(done) = self.manager.tick(dt) {
            self.capture.schedule();
            events.push(EngineEvent::TransitionCompleted(done));
        }

        self.manager.update_instances(self.clock as f32);
        if let Err(error) = self.compositor.compose(&self.manager) {
            events.push(EngineEvent::Error {
                stage: "compose",
                error,
            });
        }

        if capture_due {
            let reporter = self.reporter.as_deref_mut();
            match self
                .capture
                .capture_and_report(self.compositor.output(), SystemTime::now(), reporter)
            {
                Ok(path) => events.push(EngineEvent::Captured { path }),
                Err(error) => {
                    warn!(error = %error, "capture failed");
                    events.push(EngineEvent::Error {
                        stage: "capture",
                        error,
                    });
                }
            }
        }

        self.frames += 1;
        if !events.is_empty() {
            debug!(events = events.len(), "frame produced events");
        }
        events
    }

    /// Release instance resources and stop the loader. Idempotent.
    pub fn teardown(&mut self) {
        self.manager.teardown();
        self.capture.cancel();
        self.loader.shutdown();
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/driver.rs"]
mod tests;
