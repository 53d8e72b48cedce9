//! Ordered queue of animation steps with directional playback.
//!
//! Steps in a queue never overlap: each one is awaited before the next
//! begins. A pass walks the queue forward, in reverse, or alternating
//! between the two on successive passes. With looping enabled the target
//! transforms are cleared between passes and the next pass starts at once.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use agile_config::{Direction, PlaybackConfig};
use tracing::{debug, warn};

use crate::error::AnimeError;
use crate::scheduler::FrameScheduler;
use crate::step::{AnimationStep, ProgressObserver, StepConfig};
use crate::style::{self, Target};
use crate::types::{PlayOutcome, Progress, StepOutcome};

/// Pass lifecycle callback, called with the pass number.
pub type PassCallback = Rc<dyn Fn(u32)>;

struct SequencerInner {
    targets: Vec<Target>,
    scheduler: Rc<dyn FrameScheduler>,
    looping: bool,
    direction: Direction,
    default_ease: String,
    steps: RefCell<Vec<AnimationStep>>,
    /// Sequence of the step in flight, 0 when idle.
    current: Cell<u32>,
    playing: Cell<bool>,
    /// Set by `pause()`; a step started while set begins paused.
    paused: Cell<bool>,
    play_count: Cell<u32>,
    /// Direction of the pass `current` belongs to.
    pass_reversed: Cell<bool>,
    in_flight: Cell<bool>,
    /// Bumped by `stop()` so an in-flight traversal can tell it was cancelled.
    generation: Cell<u64>,
    observer: RefCell<Option<ProgressObserver>>,
    on_begin: RefCell<Option<PassCallback>>,
    on_complete: RefCell<Option<PassCallback>>,
}

/// Handle to a step queue. Clones share the same queue.
#[derive(Clone)]
pub struct Sequencer {
    inner: Rc<SequencerInner>,
}

/// Clears the in-flight flag when a traversal ends or its future is dropped.
struct InFlight<'a>(&'a Cell<bool>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Whether pass number `play_count` (0-based, before increment) runs high to low.
///
/// Under [`Direction::Alternate`] even counts run in reverse, so the first
/// pass is reversed and the second runs forward.
pub fn pass_reversed(direction: Direction, play_count: u32) -> bool {
    match direction {
        Direction::Forward => false,
        Direction::Reverse => true,
        Direction::Alternate => play_count % 2 == 0,
    }
}

impl Sequencer {
    pub fn new(
        targets: Vec<Target>,
        scheduler: Rc<dyn FrameScheduler>,
        looping: bool,
        direction: Direction,
    ) -> Self {
        Self::build(targets, scheduler, looping, direction, "linear".to_string())
    }

    /// Take looping, direction and the default easing from configuration.
    pub fn from_config(
        targets: Vec<Target>,
        scheduler: Rc<dyn FrameScheduler>,
        config: &PlaybackConfig,
    ) -> Self {
        Self::build(
            targets,
            scheduler,
            config.looping,
            config.direction,
            config.ease.clone(),
        )
    }

    fn build(
        targets: Vec<Target>,
        scheduler: Rc<dyn FrameScheduler>,
        looping: bool,
        direction: Direction,
        default_ease: String,
    ) -> Self {
        Self {
            inner: Rc::new(SequencerInner {
                targets,
                scheduler,
                looping,
                direction,
                default_ease,
                steps: RefCell::new(Vec::new()),
                current: Cell::new(0),
                playing: Cell::new(false),
                paused: Cell::new(false),
                play_count: Cell::new(0),
                pass_reversed: Cell::new(false),
                in_flight: Cell::new(false),
                generation: Cell::new(0),
                observer: RefCell::new(None),
                on_begin: RefCell::new(None),
                on_complete: RefCell::new(None),
            }),
        }
    }

    /// Append a step with sequence number `len + 1`.
    pub fn animator(self, config: StepConfig) -> Self {
        let sequence = self.len() as u32 + 1;
        let step = AnimationStep::new(
            sequence,
            self.inner.targets.clone(),
            config,
            Rc::clone(&self.inner.scheduler),
            &self.inner.default_ease,
        );
        if let Some(observer) = self.inner.observer.borrow().clone() {
            step.set_observer(observer);
        }
        self.inner.steps.borrow_mut().push(step);
        self
    }

    /// Progress observer for every step, present and future.
    pub fn on_update<F>(self, f: F) -> Self
    where
        F: Fn(Progress) + 'static,
    {
        let observer: ProgressObserver = Rc::new(f);
        for step in self.inner.steps.borrow().iter() {
            step.set_observer(Rc::clone(&observer));
        }
        *self.inner.observer.borrow_mut() = Some(observer);
        self
    }

    /// Called when a pass starts.
    pub fn on_begin<F>(self, f: F) -> Self
    where
        F: Fn(u32) + 'static,
    {
        *self.inner.on_begin.borrow_mut() = Some(Rc::new(f));
        self
    }

    /// Called when a pass finishes.
    pub fn on_complete<F>(self, f: F) -> Self
    where
        F: Fn(u32) + 'static,
    {
        *self.inner.on_complete.borrow_mut() = Some(Rc::new(f));
        self
    }

    /// Play the queue.
    ///
    /// Resolves once every pass has finished, which never happens when
    /// looping unless `stop()` is called. While a traversal is already in
    /// flight this resumes it instead of starting another one.
    pub async fn play(&self) -> PlayOutcome {
        let inner = &self.inner;

        if inner.in_flight.get() {
            return self.resume_in_flight();
        }
        if inner.steps.borrow().is_empty() {
            warn!("sequencer has no steps");
            return PlayOutcome::Completed {
                passes: 0,
                degraded: Vec::new(),
            };
        }
        if inner.targets.is_empty() {
            warn!("sequencer has no targets");
            return PlayOutcome::Completed {
                passes: 0,
                degraded: vec![AnimeError::NoTargets],
            };
        }

        inner.in_flight.set(true);
        let _in_flight = InFlight(&inner.in_flight);
        inner.playing.set(true);
        inner.paused.set(false);
        let generation = inner.generation.get();
        let mut passes = 0;
        let mut degraded = Vec::new();

        loop {
            let resume_from = inner.current.get();
            let reversed = if resume_from == 0 {
                let count = inner.play_count.get();
                let reversed = pass_reversed(inner.direction, count);
                inner.play_count.set(count + 1);
                inner.pass_reversed.set(reversed);
                debug!(pass = count + 1, reversed, "pass started");
                let on_begin = inner.on_begin.borrow().clone();
                if let Some(on_begin) = on_begin {
                    on_begin(count + 1);
                }
                reversed
            } else {
                debug!(from = resume_from, "resuming pass");
                inner.pass_reversed.get()
            };

            let mut order = inner.steps.borrow().clone();
            let total = order.len() as u32;
            if reversed {
                order.reverse();
            }

            for step in order {
                let sequence = step.sequence();
                if resume_from != 0 {
                    let already_done = if reversed {
                        sequence > resume_from
                    } else {
                        sequence < resume_from
                    };
                    if already_done {
                        continue;
                    }
                }

                step.set_total(total);
                inner.current.set(sequence);
                let completion = step.play();
                if inner.paused.get() {
                    step.pause();
                }
                let outcome = completion.await;

                if inner.generation.get() != generation {
                    return PlayOutcome::Stopped;
                }
                match outcome {
                    StepOutcome::Completed => {}
                    StepOutcome::Degraded(issues) => degraded.extend(issues),
                    StepOutcome::Stopped => {
                        inner.playing.set(false);
                        return PlayOutcome::Stopped;
                    }
                }
            }

            inner.current.set(0);
            passes += 1;
            let pass = inner.play_count.get();
            debug!(pass, "pass complete");
            let on_complete = inner.on_complete.borrow().clone();
            if let Some(on_complete) = on_complete {
                on_complete(pass);
            }
            if inner.generation.get() != generation {
                return PlayOutcome::Stopped;
            }

            if !inner.looping {
                inner.playing.set(false);
                return PlayOutcome::Completed { passes, degraded };
            }
            for target in &inner.targets {
                style::reset(target.as_ref());
            }
        }
    }

    fn resume_in_flight(&self) -> PlayOutcome {
        let inner = &self.inner;
        let was_paused = inner.paused.replace(false);
        let step_paused = match self.current_step_handle() {
            Some(step) if step.is_paused() => {
                step.resume();
                true
            }
            _ => false,
        };
        if was_paused || step_paused {
            inner.playing.set(true);
            debug!(step = inner.current.get(), "sequencer resumed");
            PlayOutcome::Resumed
        } else {
            PlayOutcome::AlreadyPlaying
        }
    }

    /// Pause the step in flight. A pause between steps holds the next one.
    pub fn pause(&self) {
        let inner = &self.inner;
        inner.playing.set(false);
        if inner.in_flight.get() {
            inner.paused.set(true);
        }
        if let Some(step) = self.current_step_handle() {
            step.pause();
        }
        debug!(step = inner.current.get(), "sequencer paused");
    }

    /// Stop the step in flight, reset counters and clear target transforms.
    /// An in-flight `play()` resolves with [`PlayOutcome::Stopped`].
    pub fn stop(&self) {
        let inner = &self.inner;
        let current = self.current_step_handle();
        inner.generation.set(inner.generation.get() + 1);
        inner.current.set(0);
        inner.playing.set(false);
        inner.paused.set(false);
        inner.play_count.set(0);

        if let Some(step) = current {
            step.stop();
        }
        for target in &inner.targets {
            style::reset(target.as_ref());
        }
        let steps = inner.steps.borrow().clone();
        for step in steps {
            step.clear_pause();
        }
        debug!("sequencer stopped");
    }

    fn current_step_handle(&self) -> Option<AnimationStep> {
        let current = self.inner.current.get();
        if current == 0 {
            return None;
        }
        self.inner
            .steps
            .borrow()
            .iter()
            .find(|s| s.sequence() == current)
            .cloned()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.playing.get()
    }

    /// Passes started since construction or the last `stop()`.
    pub fn play_count(&self) -> u32 {
        self.inner.play_count.get()
    }

    /// Sequence of the step in flight, 0 when idle.
    pub fn current_step(&self) -> u32 {
        self.inner.current.get()
    }

    pub fn len(&self) -> usize {
        self.inner.steps.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.steps.borrow().is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.inner.direction
    }

    pub fn is_looping(&self) -> bool {
        self.inner.looping
    }

    pub fn steps(&self) -> Vec<AnimationStep> {
        self.inner.steps.borrow().clone()
    }

    pub fn targets(&self) -> &[Target] {
        &self.inner.targets
    }
}

impl fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequencer")
            .field("steps", &self.len())
            .field("looping", &self.inner.looping)
            .field("direction", &self.inner.direction)
            .field("current", &self.current_step())
            .field("play_count", &self.play_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use crate::style::MemoryElement;
    use crate::types::PropertySet;
    use futures::executor::block_on;

    fn sequencer(direction: Direction) -> Sequencer {
        let element: Target = Rc::new(MemoryElement::new("box"));
        Sequencer::new(vec![element], Rc::new(ManualScheduler::new()), false, direction)
    }

    #[test]
    fn test_pass_direction_table() {
        assert!(!pass_reversed(Direction::Forward, 0));
        assert!(!pass_reversed(Direction::Forward, 1));
        assert!(pass_reversed(Direction::Reverse, 0));
        assert!(pass_reversed(Direction::Reverse, 7));
        assert!(pass_reversed(Direction::Alternate, 0));
        assert!(!pass_reversed(Direction::Alternate, 1));
        assert!(pass_reversed(Direction::Alternate, 2));
    }

    #[test]
    fn test_animator_numbers_steps() {
        let seq = sequencer(Direction::Forward)
            .animator(StepConfig::new(100.0, PropertySet::new().set("opacity", 0.0)))
            .animator(StepConfig::new(100.0, PropertySet::new().set("opacity", 1.0)));
        let numbers: Vec<u32> = seq.steps().iter().map(AnimationStep::sequence).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(seq.current_step(), 0);
        assert!(!seq.is_playing());
    }

    #[test]
    fn test_empty_queue_completes_immediately() {
        let outcome = block_on(sequencer(Direction::Forward).play());
        assert_eq!(
            outcome,
            PlayOutcome::Completed {
                passes: 0,
                degraded: Vec::new()
            }
        );
    }

    #[test]
    fn test_no_targets_reports_degraded() {
        let seq = Sequencer::new(
            Vec::new(),
            Rc::new(ManualScheduler::new()),
            false,
            Direction::Forward,
        )
        .animator(StepConfig::new(100.0, PropertySet::new().set("rotate", 10.0)));
        assert_eq!(
            block_on(seq.play()),
            PlayOutcome::Completed {
                passes: 0,
                degraded: vec![AnimeError::NoTargets]
            }
        );
    }

    #[test]
    fn test_from_config() {
        let config = PlaybackConfig {
            looping: true,
            direction: Direction::Alternate,
            ease: "bounceEaseOut".to_string(),
        };
        let element: Target = Rc::new(MemoryElement::new("box"));
        let seq = Sequencer::from_config(vec![element], Rc::new(ManualScheduler::new()), &config);
        assert!(seq.is_looping());
        assert_eq!(seq.direction(), Direction::Alternate);
        assert!(seq.is_empty());
    }
}
