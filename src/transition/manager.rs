//! Ring of live effect instances and the cross-fade between them.
//!
//! Roles rotate around `ring_index`: the slot at the index is *current*, the one before it is
//! *previous* and the one after it is *next*. A transition loads a new source into *next*,
//! eases the weights over `duration` and then advances the index by one.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::animation::ease::Ease;
use crate::foundation::core::Image;
use crate::foundation::error::{DriftError, DriftResult};
use crate::foundation::math::{finite_or, lerp};
use crate::transition::instance::EffectInstance;

/// Smallest ring that has distinct previous, current and next slots.
pub const MIN_SLOTS: usize = 3;

/// Durations at or below this complete on the first running tick.
pub const DURATION_EPS: f64 = 1e-4;

/// Receives transition progress and the finished instance.
pub trait PixelExtractor: Send {
    /// Off while a transition runs, back on once it completes.
    fn enable_spawn(&mut self, enabled: bool);
    /// Eased progress in `[0, 1]`, once per running tick.
    fn set_transition_ratio(&mut self, ratio: f32);
    /// Called once per completed transition with the new current instance.
    fn execute(&mut self, instance: &EffectInstance);
}

/// Timing and target values for transitions.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransitionOpts {
    /// Seconds from the first running tick to completion.
    pub duration: f64,
    /// Weight the outgoing current slot settles at.
    pub floor: f32,
    /// Curve applied to normalized progress.
    pub ease: Ease,
}

impl Default for TransitionOpts {
    fn default() -> Self {
        Self {
            duration: 0.8,
            floor: 0.2,
            ease: Ease::default(),
        }
    }
}

impl TransitionOpts {
    /// Clamp `floor` to `[0, 1]` and `duration` to `>= 0`; non-finite values take defaults.
    pub fn clamped(self) -> Self {
        let d = Self::default();
        Self {
            duration: if self.duration.is_finite() {
                self.duration.max(0.0)
            } else {
                d.duration
            },
            floor: finite_or(self.floor, d.floor).clamp(0.0, 1.0),
            ease: self.ease,
        }
    }
}

/// Whether a transition is in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionState {
    /// No task.
    Idle,
    /// A task is priming or running.
    Transitioning,
}

/// Emitted by the tick that completes a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionCompleted {
    /// Ring index after advancing; the slot that is now current.
    pub ring_index: usize,
    /// Seconds accumulated by the task.
    pub elapsed: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Snapshot {
    previous_blend: f32,
    current_blend: f32,
    next_ratio: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    /// Waiting one tick before reading start values.
    Pending,
    Running(Snapshot),
}

/// The in-flight interpolation. Dropping it cancels the transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionTask {
    elapsed: f64,
    duration: f64,
    phase: Phase,
}

impl TransitionTask {
    fn new(duration: f64) -> Self {
        Self {
            elapsed: 0.0,
            duration,
            phase: Phase::Pending,
        }
    }

    /// Seconds accumulated while running.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Configured duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration <= DURATION_EPS {
            return if self.elapsed > 0.0 { 1.0 } else { 0.0 };
        }
        (self.elapsed / self.duration.max(DURATION_EPS)).clamp(0.0, 1.0)
    }

    /// Whether start values have been captured.
    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }
}

/// Owns the instance ring and at most one active transition.
pub struct TransitionManager {
    instances: Vec<EffectInstance>,
    ring_index: usize,
    opts: TransitionOpts,
    active: Option<TransitionTask>,
    extractor: Option<Box<dyn PixelExtractor>>,
    completed: u64,
}

impl std::fmt::Debug for TransitionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionManager")
            .field("slots", &self.instances.len())
            .field("ring_index", &self.ring_index)
            .field("opts", &self.opts)
            .field("active", &self.active)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

impl TransitionManager {
    /// Take ownership of the ring and put it into its rest state:
    /// previous `blend = 0`, current `blend = 1, ratio = 1`, next `blend = 1, ratio = 0`,
    /// any further slots zeroed.
    ///
    /// A ring shorter than [`MIN_SLOTS`] is accepted here and rejected by
    /// [`start_transition`](Self::start_transition).
    pub fn new(instances: Vec<EffectInstance>, opts: TransitionOpts) -> Self {
        let mut m = Self {
            instances,
            ring_index: 0,
            opts: opts.clamped(),
            active: None,
            extractor: None,
            completed: 0,
        };
        if m.instances.len() < MIN_SLOTS {
            warn!(
                slots = m.instances.len(),
                required = MIN_SLOTS,
                "transition ring too small; transitions will be rejected"
            );
            return m;
        }
        for inst in &mut m.instances {
            inst.set_blend(0.0);
            inst.set_ratio(0.0);
        }
        let (cur, next) = (m.current_index(), m.next_index());
        m.instances[cur].set_blend(1.0);
        m.instances[cur].set_ratio(1.0);
        m.instances[next].set_blend(1.0);
        m
    }

    /// Attach the collaborator that is told about progress and completion.
    pub fn set_extractor(&mut self, extractor: Option<Box<dyn PixelExtractor>>) {
        self.extractor = extractor;
    }

    /// Active options.
    pub fn opts(&self) -> TransitionOpts {
        self.opts
    }

    /// Replace options; a running task keeps the duration it started with.
    pub fn set_opts(&mut self, opts: TransitionOpts) {
        self.opts = opts.clamped();
    }

    /// Number of ring slots.
    pub fn slot_count(&self) -> usize {
        self.instances.len()
    }

    /// Index of the current slot.
    pub fn ring_index(&self) -> usize {
        self.ring_index
    }

    /// Transitions completed since construction.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Idle or transitioning.
    pub fn state(&self) -> TransitionState {
        if self.active.is_some() {
            TransitionState::Transitioning
        } else {
            TransitionState::Idle
        }
    }

    /// The in-flight task, if any.
    pub fn active(&self) -> Option<&TransitionTask> {
        self.active.as_ref()
    }

    fn previous_index(&self) -> usize {
        let n = self.instances.len().max(1);
        (self.ring_index + n - 1) % n
    }

    fn current_index(&self) -> usize {
        self.ring_index % self.instances.len().max(1)
    }

    fn next_index(&self) -> usize {
        (self.ring_index + 1) % self.instances.len().max(1)
    }

    /// Slot indices in compositing order: previous, current, next.
    pub fn role_indices(&self) -> [usize; 3] {
        [self.previous_index(), self.current_index(), self.next_index()]
    }

    /// The outgoing slot.
    pub fn previous(&self) -> Option<&EffectInstance> {
        self.instances.get(self.previous_index())
    }

    /// The slot on screen.
    pub fn current(&self) -> Option<&EffectInstance> {
        self.instances.get(self.current_index())
    }

    /// The incoming slot.
    pub fn next(&self) -> Option<&EffectInstance> {
        self.instances.get(self.next_index())
    }

    /// All slots in ring order.
    pub fn instances(&self) -> &[EffectInstance] {
        &self.instances
    }

    /// All slots in ring order, mutable.
    pub fn instances_mut(&mut self) -> &mut [EffectInstance] {
        &mut self.instances
    }

    /// Load `source` into the next slot and start easing toward it.
    ///
    /// Cancels a running transition; the values it last wrote stay as they are.
    #[tracing::instrument(level = "debug", skip_all, fields(ring_index = self.ring_index))]
    pub fn start_transition(&mut self, source: Arc<Image>) -> DriftResult<()> {
        if self.instances.len() < MIN_SLOTS {
            return Err(DriftError::setup(format!(
                "transition needs at least {MIN_SLOTS} slots, ring has {}",
                self.instances.len()
            )));
        }

        let next = self.next_index();
        let inst = &mut self.instances[next];
        inst.set_source(Some(source));
        inst.set_ratio(0.0);
        inst.set_blend(1.0);

        if let Some(old) = self.active.take() {
            debug!(elapsed = old.elapsed, "cancelled in-flight transition");
        }
        self.active = Some(TransitionTask::new(self.opts.duration));
        if let Some(x) = self.extractor.as_mut() {
            x.enable_spawn(false);
        }
        info!(next, duration = self.opts.duration, "transition started");
        Ok(())
    }

    /// Drop the running task, if any. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        let had = self.active.take().is_some();
        if had {
            debug!("transition cancelled");
        }
        had
    }

    /// Advance the active task by `dt` seconds.
    ///
    /// The first tick after a start only captures the start values. Returns the completion
    /// event on the tick that finishes the transition.
    pub fn tick(&mut self, dt: f64) -> Option<TransitionCompleted> {
        let [prev, cur, next] = self.role_indices();
        let task = self.active.as_mut()?;

        let start = match task.phase {
            Phase::Pending => {
                task.phase = Phase::Running(Snapshot {
                    previous_blend: self.instances[prev].blend(),
                    current_blend: self.instances[cur].blend(),
                    next_ratio: self.instances[next].ratio(),
                });
                return None;
            }
            Phase::Running(start) => start,
        };

        if dt.is_finite() && dt > 0.0 {
            task.elapsed += dt;
        }
        let progress = task.progress();
        let k = self.opts.ease.apply(progress) as f32;
        let elapsed = task.elapsed;

        if let Some(x) = self.extractor.as_mut() {
            x.set_transition_ratio(k);
        }

        if progress < 1.0 {
            let floor = self.opts.floor;
            self.instances[prev].set_blend(lerp(start.previous_blend, 0.0, k));
            self.instances[cur].set_blend(lerp(start.current_blend, floor, k));
            self.instances[next].set_ratio(lerp(start.next_ratio, 1.0, k));
            return None;
        }

        Some(self.finish(elapsed))
    }

    fn finish(&mut self, elapsed: f64) -> TransitionCompleted {
        let [prev, cur, next] = self.role_indices();
        self.instances[prev].set_blend(0.0);
        self.instances[cur].set_blend(self.opts.floor);
        self.instances[next].set_ratio(1.0);

        self.active = None;
        self.ring_index = next;
        self.completed += 1;

        if let Some(x) = self.extractor.as_mut() {
            x.enable_spawn(true);
            x.execute(&self.instances[self.ring_index]);
        }
        info!(ring_index = self.ring_index, elapsed, "transition completed");
        TransitionCompleted {
            ring_index: self.ring_index,
            elapsed,
        }
    }

    /// Render previous, current and next, in that order.
    pub fn update_instances(&mut self, time: f32) {
        if self.instances.len() < MIN_SLOTS {
            for inst in &mut self.instances {
                inst.update(time);
            }
            return;
        }
        for i in self.role_indices() {
            self.instances[i].update(time);
        }
    }

    /// Drop any task and release every instance's resources. Idempotent.
    pub fn teardown(&mut self) {
        self.active = None;
        for inst in &mut self.instances {
            inst.teardown();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/manager.rs"]
mod tests;
