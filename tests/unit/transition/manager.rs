use std::sync::Mutex;

use super::*;
use crate::foundation::core::ImageRef;
use crate::render::pipeline::EffectSource;

#[derive(Default)]
struct StubSource {
    id: usize,
    log: Option<Arc<Mutex<Vec<usize>>>>,
    ratio: f32,
}

impl EffectSource for StubSource {
    fn output(&self) -> Option<ImageRef<'_>> {
        None
    }
    fn set_source(&mut self, _source: Option<Arc<Image>>) {}
    fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio;
    }
    fn set_bg_color(&mut self, _rgba: [u8; 4]) {}
    fn render(&mut self, _time: f32) {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.id);
        }
    }
    fn teardown(&mut self) {}
}

#[derive(Debug, PartialEq)]
enum Call {
    Spawn(bool),
    Ratio(f32),
    Execute(usize),
}

struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
    sources: Arc<Mutex<Vec<Option<Arc<Image>>>>>,
}

impl PixelExtractor for Recorder {
    fn enable_spawn(&mut self, enabled: bool) {
        self.calls.lock().unwrap().push(Call::Spawn(enabled));
    }
    fn set_transition_ratio(&mut self, ratio: f32) {
        self.calls.lock().unwrap().push(Call::Ratio(ratio));
    }
    fn execute(&mut self, instance: &EffectInstance) {
        let mut s = self.sources.lock().unwrap();
        s.push(instance.source().cloned());
        self.calls.lock().unwrap().push(Call::Execute(s.len()));
    }
}

fn ring(n: usize) -> Vec<EffectInstance> {
    (0..n)
        .map(|id| {
            EffectInstance::new(Box::new(StubSource {
                id,
                ..StubSource::default()
            }))
        })
        .collect()
}

fn img() -> Arc<Image> {
    Arc::new(Image::solid(2, 2, [10, 20, 30, 255]))
}

fn opts(duration: f64) -> TransitionOpts {
    TransitionOpts {
        duration,
        floor: 0.2,
        ease: Ease::InOutCubic,
    }
}

fn run_to_completion(m: &mut TransitionManager, dt: f64) -> (TransitionCompleted, usize) {
    for ticks in 1..10_000 {
        if let Some(done) = m.tick(dt) {
            return (done, ticks);
        }
    }
    panic!("transition never completed");
}

#[test]
fn rest_state_after_construction() {
    let m = TransitionManager::new(ring(3), opts(0.8));
    assert_eq!(m.ring_index(), 0);
    assert_eq!(m.state(), TransitionState::Idle);
    assert_eq!(m.previous().unwrap().blend(), 0.0);
    assert_eq!(m.current().unwrap().blend(), 1.0);
    assert_eq!(m.current().unwrap().ratio(), 1.0);
    assert_eq!(m.next().unwrap().blend(), 1.0);
    assert_eq!(m.next().unwrap().ratio(), 0.0);
    assert_eq!(m.role_indices(), [2, 0, 1]);
}

#[test]
fn reference_scenario_eight_tenths_of_a_second() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sources = Arc::new(Mutex::new(Vec::new()));
    let mut m = TransitionManager::new(ring(3), opts(0.8));
    m.set_extractor(Some(Box::new(Recorder {
        calls: Arc::clone(&calls),
        sources: Arc::clone(&sources),
    })));

    let x = img();
    m.start_transition(Arc::clone(&x)).unwrap();
    assert_eq!(m.state(), TransitionState::Transitioning);

    let (done, ticks) = run_to_completion(&mut m, 1.0 / 60.0);
    assert!(done.elapsed >= 0.8 - 1e-9);
    // One priming tick, then ~48 running ticks.
    assert!((48..=50).contains(&ticks), "ticks = {ticks}");

    assert_eq!(done.ring_index, 1);
    assert_eq!(m.ring_index(), 1);
    assert_eq!(m.state(), TransitionState::Idle);
    // Roles have rotated: old previous is now next, old current is previous.
    let slots = m.instances();
    assert_eq!(slots[2].blend(), 0.0);
    assert_eq!(slots[0].blend(), 0.2);
    assert_eq!(slots[1].ratio(), 1.0);
    assert!(Arc::ptr_eq(m.current().unwrap().source().unwrap(), &x));

    let calls = calls.lock().unwrap();
    assert_eq!(calls.first(), Some(&Call::Spawn(false)));
    assert_eq!(calls.iter().filter(|c| matches!(c, Call::Execute(_))).count(), 1);
    assert_eq!(calls[calls.len() - 2], Call::Spawn(true));
    assert_eq!(calls.last(), Some(&Call::Execute(1)));
    let sources = sources.lock().unwrap();
    assert!(Arc::ptr_eq(sources[0].as_ref().unwrap(), &x));
}

#[test]
fn progress_reported_each_running_tick() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut m = TransitionManager::new(ring(3), opts(1.0));
    m.set_extractor(Some(Box::new(Recorder {
        calls: Arc::clone(&calls),
        sources: Arc::new(Mutex::new(Vec::new())),
    })));
    m.start_transition(img()).unwrap();
    m.tick(0.25); // priming
    m.tick(0.25);
    m.tick(0.25);
    let ratios: Vec<f32> = calls
        .lock()
        .unwrap()
        .iter()
        .filter_map(|c| match c {
            Call::Ratio(r) => Some(*r),
            _ => None,
        })
        .collect();
    assert_eq!(ratios.len(), 2);
    assert!((ratios[0] - Ease::InOutCubic.apply(0.25) as f32).abs() < 1e-6);
    assert!((ratios[1] - 0.5).abs() < 1e-6);
}

#[test]
fn first_tick_only_primes() {
    let mut m = TransitionManager::new(ring(3), opts(1.0));
    m.start_transition(img()).unwrap();
    assert!(m.tick(10.0).is_none());
    let task = m.active().unwrap();
    assert!(task.is_running());
    assert_eq!(task.elapsed(), 0.0);
    assert_eq!(m.current().unwrap().blend(), 1.0);
}

#[test]
fn interpolates_from_snapshotted_start_values() {
    let mut m = TransitionManager::new(ring(3), opts(1.0));
    m.start_transition(img()).unwrap();
    m.tick(0.0);
    m.tick(0.5);
    let k = Ease::InOutCubic.apply(0.5) as f32;
    assert!((m.current().unwrap().blend() - (1.0 + (0.2 - 1.0) * k)).abs() < 1e-6);
    assert!((m.next().unwrap().ratio() - k).abs() < 1e-6);
    assert_eq!(m.previous().unwrap().blend(), 0.0);
}

#[test]
fn two_slots_is_a_setup_error_without_mutation() {
    let mut m = TransitionManager::new(ring(2), opts(0.8));
    let before: Vec<(f32, f32)> = m.instances().iter().map(|i| (i.ratio(), i.blend())).collect();

    let err = m.start_transition(img()).unwrap_err();
    assert!(err.is_setup());
    assert_eq!(m.state(), TransitionState::Idle);
    assert!(m.active().is_none());
    assert_eq!(m.ring_index(), 0);
    let after: Vec<(f32, f32)> = m.instances().iter().map(|i| (i.ratio(), i.blend())).collect();
    assert_eq!(before, after);
    assert!(m.instances().iter().all(|i| i.source().is_none()));
    assert!(m.tick(1.0).is_none());
}

#[test]
fn restart_cancels_and_resets_elapsed() {
    let mut m = TransitionManager::new(ring(3), opts(1.0));
    m.start_transition(img()).unwrap();
    m.tick(0.0);
    m.tick(0.6);
    let mid_blend = m.current().unwrap().blend();
    assert!(mid_blend < 1.0 && mid_blend > 0.2);

    let y = img();
    m.start_transition(Arc::clone(&y)).unwrap();
    assert_eq!(m.state(), TransitionState::Transitioning);
    let task = m.active().unwrap();
    assert_eq!(task.elapsed(), 0.0);
    assert!(!task.is_running());
    // Cancelled values are left as last written.
    assert_eq!(m.current().unwrap().blend(), mid_blend);
    assert!(Arc::ptr_eq(m.next().unwrap().source().unwrap(), &y));
    assert_eq!(m.next().unwrap().ratio(), 0.0);

    let (done, _) = run_to_completion(&mut m, 0.1);
    assert_eq!(done.ring_index, 1);
    assert_eq!(m.completed(), 1);
    assert_eq!(m.previous().unwrap().blend(), 0.2);
}

#[test]
fn zero_duration_completes_on_first_running_tick() {
    let mut m = TransitionManager::new(ring(3), opts(0.0));
    m.start_transition(img()).unwrap();
    assert!(m.tick(1.0 / 60.0).is_none());
    assert!(m.tick(1.0 / 60.0).is_some());
}

#[test]
fn ring_wraps_after_a_full_cycle() {
    let mut m = TransitionManager::new(ring(3), opts(0.1));
    for expected in [1, 2, 0, 1] {
        m.start_transition(img()).unwrap();
        let (done, _) = run_to_completion(&mut m, 0.05);
        assert_eq!(done.ring_index, expected);
    }
    assert_eq!(m.completed(), 4);
}

#[test]
fn cancel_leaves_values_and_goes_idle() {
    let mut m = TransitionManager::new(ring(3), opts(1.0));
    assert!(!m.cancel());
    m.start_transition(img()).unwrap();
    m.tick(0.0);
    m.tick(0.3);
    let ratio = m.next().unwrap().ratio();
    assert!(m.cancel());
    assert_eq!(m.state(), TransitionState::Idle);
    assert!(m.tick(1.0).is_none());
    assert_eq!(m.next().unwrap().ratio(), ratio);
    assert_eq!(m.ring_index(), 0);
}

#[test]
fn instances_update_in_role_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let slots = (0..4)
        .map(|id| {
            EffectInstance::new(Box::new(StubSource {
                id,
                log: Some(Arc::clone(&log)),
                ratio: 0.0,
            }))
        })
        .collect();
    let mut m = TransitionManager::new(slots, opts(0.1));
    m.update_instances(0.0);
    assert_eq!(*log.lock().unwrap(), vec![3, 0, 1]);
}

#[test]
fn opts_are_clamped() {
    let o = TransitionOpts {
        duration: f64::NAN,
        floor: 4.0,
        ease: Ease::Linear,
    }
    .clamped();
    assert_eq!(o.duration, TransitionOpts::default().duration);
    assert_eq!(o.floor, 1.0);
    let o = TransitionOpts {
        duration: -1.0,
        ..TransitionOpts::default()
    }
    .clamped();
    assert_eq!(o.duration, 0.0);
}
