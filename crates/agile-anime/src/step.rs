//! A single timeline segment.
//!
//! An [`AnimationStep`] animates one property set on one or more targets.
//! `play()` captures a start snapshot per target and then runs a frame loop
//! on the host [`FrameScheduler`] until every target has reached its values
//! and the longest `duration + delay` (plus `end_delay`) has elapsed.
//!
//! Pausing keeps the loop ticking without touching styles; the paused time
//! is folded into an offset so the active duration is unaffected by how long
//! the pause lasted.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::channel::oneshot;
use tracing::{debug, trace, warn};

use crate::easing::{self, ResolvedEasing};
use crate::error::AnimeError;
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::stagger::Stagger;
use crate::style::{self, StyleValue, Target};
use crate::types::{Progress, PropertyMap, PropertySet, PropertyValue, StepOutcome, StepState};

/// Progress observer shared by steps.
pub type ProgressObserver = Rc<dyn Fn(Progress)>;

/// Configuration of one step.
#[derive(Debug, Clone)]
pub struct StepConfig {
    /// Milliseconds, fixed or per target.
    pub duration: Stagger,
    pub properties: PropertySet,
    /// Easing name; the sequencer default applies when `None`.
    pub ease: Option<String>,
    /// Milliseconds before each target starts moving.
    pub delay: Stagger,
    /// Extra milliseconds the step stays unresolved after the last target settles.
    pub end_delay: f64,
}

impl StepConfig {
    pub fn new(duration: impl Into<Stagger>, properties: PropertySet) -> Self {
        Self {
            duration: duration.into(),
            properties,
            ease: None,
            delay: Stagger::default(),
            end_delay: 0.0,
        }
    }

    pub fn ease(mut self, ease: impl Into<String>) -> Self {
        self.ease = Some(ease.into());
        self
    }

    pub fn delay(mut self, delay: impl Into<Stagger>) -> Self {
        self.delay = delay.into();
        self
    }

    pub fn end_delay(mut self, end_delay: f64) -> Self {
        self.end_delay = end_delay.max(0.0);
        self
    }
}

/// Per-target state of the current run.
#[derive(Debug, Default)]
struct TargetTrack {
    /// Values of the animated properties when the run started.
    start: PropertyMap<f64>,
    /// Every tracked property: animated ones plus whatever was inline.
    current: PropertyMap<StyleValue>,
    /// Unrecognized transform tokens, written back verbatim.
    foreign: Vec<String>,
}

#[derive(Debug, Default)]
struct RunState {
    state: StepState,
    start_time: Option<f64>,
    paused: bool,
    paused_start: Option<f64>,
    paused_offset: f64,
    frame: Option<FrameHandle>,
    tracks: Vec<TargetTrack>,
    waiters: Vec<oneshot::Sender<StepOutcome>>,
    percent: u32,
}

struct StepInner {
    sequence: u32,
    targets: Vec<Target>,
    goals: PropertyMap<PropertyValue>,
    durations: Vec<f64>,
    delays: Vec<f64>,
    end_delay: f64,
    easing: ResolvedEasing,
    issues: Vec<AnimeError>,
    scheduler: Rc<dyn FrameScheduler>,
    total: Cell<u32>,
    observer: RefCell<Option<ProgressObserver>>,
    run: RefCell<RunState>,
}

/// Handle to one animation step. Clones share the same step.
#[derive(Clone)]
pub struct AnimationStep {
    inner: Rc<StepInner>,
}

impl AnimationStep {
    /// Build a step. Property, unit and easing problems are absorbed here and
    /// reported later through [`StepOutcome::Degraded`].
    pub fn new(
        sequence: u32,
        targets: Vec<Target>,
        config: StepConfig,
        scheduler: Rc<dyn FrameScheduler>,
        default_ease: &str,
    ) -> Self {
        let ease_name = config.ease.as_deref().unwrap_or(default_ease);
        let easing = easing::resolve(ease_name);

        let mut issues: Vec<AnimeError> = config.properties.issues().to_vec();
        issues.extend(easing.issue.clone());

        let goals = config.properties.resolve();
        if goals.is_empty() {
            warn!(sequence, "step animates no properties");
        }

        let durations = config.duration.resolve(&targets);
        let delays = config.delay.resolve(&targets);

        Self {
            inner: Rc::new(StepInner {
                sequence,
                targets,
                goals,
                durations,
                delays,
                end_delay: config.end_delay,
                easing,
                issues,
                scheduler,
                total: Cell::new(sequence.max(1)),
                observer: RefCell::new(None),
                run: RefCell::new(RunState::default()),
            }),
        }
    }

    /// Start (or join) a run. The returned future resolves on the frame the
    /// completion condition is met, or with [`StepOutcome::Stopped`].
    ///
    /// Playing a paused step resumes it.
    pub fn play(&self) -> StepCompletion {
        let (tx, rx) = oneshot::channel();
        let completion = StepCompletion { rx };
        let inner = &self.inner;

        if inner.targets.is_empty() {
            warn!(sequence = inner.sequence, "step has no targets");
            let mut issues = inner.issues.clone();
            issues.push(AnimeError::NoTargets);
            let _ = tx.send(StepOutcome::Degraded(issues));
            return completion;
        }

        let state = inner.run.borrow().state;
        match state {
            StepState::Running => {
                inner.run.borrow_mut().waiters.push(tx);
            }
            StepState::Paused => {
                inner.run.borrow_mut().waiters.push(tx);
                self.resume();
            }
            StepState::Idle | StepState::Settled | StepState::Stopped => {
                let tracks = inner.capture();
                {
                    let mut run = inner.run.borrow_mut();
                    *run = RunState {
                        state: StepState::Running,
                        tracks,
                        ..RunState::default()
                    };
                    run.waiters.push(tx);
                }
                debug!(
                    sequence = inner.sequence,
                    targets = inner.targets.len(),
                    properties = inner.goals.len(),
                    "step started"
                );
                inner.schedule();
            }
        }
        completion
    }

    /// Freeze the run. The loop keeps ticking so a resume is picked up on
    /// the next frame.
    pub fn pause(&self) {
        let now = self.inner.scheduler.now();
        let mut run = self.inner.run.borrow_mut();
        if run.state != StepState::Running {
            return;
        }
        run.state = StepState::Paused;
        run.paused = true;
        run.paused_start = Some(now);
        debug!(sequence = self.inner.sequence, at = now, "step paused");
    }

    pub fn resume(&self) {
        let now = self.inner.scheduler.now();
        let mut run = self.inner.run.borrow_mut();
        if run.state != StepState::Paused {
            return;
        }
        if let (Some(paused_start), Some(start)) = (run.paused_start, run.start_time) {
            run.paused_offset += (now - paused_start.max(start)).max(0.0);
        }
        run.state = StepState::Running;
        run.paused = false;
        run.paused_start = None;
        debug!(sequence = self.inner.sequence, at = now, "step resumed");
    }

    /// Cancel the pending frame. Styles already committed stay in place and
    /// waiters resolve with [`StepOutcome::Stopped`].
    pub fn stop(&self) {
        let (frame, waiters) = {
            let mut run = self.inner.run.borrow_mut();
            if !matches!(run.state, StepState::Running | StepState::Paused) {
                return;
            }
            run.state = StepState::Stopped;
            run.paused = false;
            run.paused_start = None;
            (run.frame.take(), std::mem::take(&mut run.waiters))
        };
        if let Some(handle) = frame {
            self.inner.scheduler.cancel_frame(handle);
        }
        debug!(sequence = self.inner.sequence, "step stopped");
        for waiter in waiters {
            let _ = waiter.send(StepOutcome::Stopped);
        }
    }

    /// Forget any pause bookkeeping so the next run starts clean.
    pub fn clear_pause(&self) {
        let mut run = self.inner.run.borrow_mut();
        run.paused = false;
        run.paused_start = None;
        if run.state == StepState::Paused {
            run.state = StepState::Running;
        }
    }

    pub fn state(&self) -> StepState {
        self.inner.run.borrow().state
    }

    pub fn is_paused(&self) -> bool {
        self.inner.run.borrow().paused
    }

    pub fn sequence(&self) -> u32 {
        self.inner.sequence
    }

    /// Number of steps in the owning queue, used for the percent figure.
    pub fn set_total(&self, total: u32) {
        self.inner.total.set(total.max(1));
    }

    pub fn total(&self) -> u32 {
        self.inner.total.get()
    }

    pub fn set_observer(&self, observer: ProgressObserver) {
        *self.inner.observer.borrow_mut() = Some(observer);
    }

    pub fn targets(&self) -> &[Target] {
        &self.inner.targets
    }

    /// Problems absorbed while building the step.
    pub fn issues(&self) -> &[AnimeError] {
        &self.inner.issues
    }

    /// Last reported percent.
    pub fn percent(&self) -> u32 {
        self.inner.run.borrow().percent
    }
}

impl fmt::Debug for AnimationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationStep")
            .field("sequence", &self.inner.sequence)
            .field("targets", &self.inner.targets.len())
            .field("state", &self.state())
            .finish()
    }
}

impl StepInner {
    /// Read the start snapshot of every target.
    fn capture(&self) -> Vec<TargetTrack> {
        self.targets
            .iter()
            .map(|target| {
                let snapshot = style::snapshot(target.as_ref());
                let mut track = TargetTrack {
                    current: snapshot.present.clone(),
                    foreign: snapshot.foreign,
                    ..TargetTrack::default()
                };
                for (property, goal) in self.goals.iter() {
                    let start = style::read_transform_value(target.as_ref(), property).value;
                    let inline = snapshot.present.get(property).and_then(|v| v.unit);
                    let unit = goal.unit_for(property, inline);
                    track.start.insert(property, start);
                    track.current.insert(property, StyleValue { value: start, unit });
                }
                track
            })
            .collect()
    }

    fn schedule(self: &Rc<Self>) {
        let inner = Rc::clone(self);
        let handle = self
            .scheduler
            .request_frame(Box::new(move |timestamp| inner.on_frame(timestamp)));
        self.run.borrow_mut().frame = Some(handle);
    }

    fn on_frame(self: &Rc<Self>, timestamp: f64) {
        let mut run = self.run.borrow_mut();
        run.frame = None;
        if !matches!(run.state, StepState::Running | StepState::Paused) {
            return;
        }
        let start = *run.start_time.get_or_insert(timestamp);

        if run.paused {
            let since = run.paused_start.unwrap_or(timestamp).max(start);
            run.paused_offset += (timestamp - since).max(0.0);
            run.paused_start = Some(timestamp);
            let progress = self.progress(run.percent);
            drop(run);
            self.notify(progress);
            self.continue_loop();
            return;
        }

        let elapsed = timestamp - start - run.paused_offset;
        let mut writes: Vec<(Target, PropertyMap<StyleValue>, Vec<String>)> =
            Vec::with_capacity(self.targets.len());
        let mut progress_sum = 0.0;

        for (index, target) in self.targets.iter().enumerate() {
            let duration = self.durations[index];
            let delay = self.delays[index];
            let sub_elapsed = (elapsed - delay).max(0.0);
            let raw = if duration <= 0.0 {
                if elapsed >= delay { 1.0 } else { 0.0 }
            } else {
                (sub_elapsed / duration).min(1.0)
            };
            progress_sum += self.easing.shape(raw);

            let track = &mut run.tracks[index];
            for (property, goal) in self.goals.iter() {
                let begin = track.start.get(property).copied().unwrap_or(goal.value);
                let Some(slot) = track.current.get_mut(property) else {
                    continue;
                };
                // Already at rest when the run began; the captured value stands.
                if begin == goal.value {
                    continue;
                }
                slot.value = self.easing.value_at(begin, goal.value, raw, sub_elapsed, duration);
            }
            writes.push((Rc::clone(target), track.current.clone(), track.foreign.clone()));
        }

        let mean = progress_sum / self.targets.len().max(1) as f64;
        let total = self.total.get().max(1);
        run.percent = percent(mean, self.sequence, total);
        let longest = self
            .durations
            .iter()
            .zip(&self.delays)
            .map(|(d, l)| d + l)
            .fold(0.0, f64::max);
        let done = mean >= 1.0 && elapsed >= longest + self.end_delay;
        let progress = self.progress(run.percent);
        drop(run);

        trace!(sequence = self.sequence, elapsed, mean, percent = progress.percent, "frame");
        for (target, values, foreign) in &writes {
            style::write_style(target.as_ref(), values, foreign);
        }
        // Settle first so an observer pausing on the last frame holds the
        // next step rather than this one.
        if done {
            self.settle();
        }
        self.notify(progress);
        if !done {
            self.continue_loop();
        }
    }

    fn progress(&self, percent: u32) -> Progress {
        Progress {
            sequence: self.sequence,
            percent,
        }
    }

    fn notify(&self, progress: Progress) {
        let observer = self.observer.borrow().clone();
        if let Some(observer) = observer {
            observer(progress);
        }
    }

    /// Request the next frame unless the run ended meanwhile.
    fn continue_loop(self: &Rc<Self>) {
        let active = matches!(
            self.run.borrow().state,
            StepState::Running | StepState::Paused
        );
        if active {
            self.schedule();
        }
    }

    fn settle(&self) {
        let waiters = {
            let mut run = self.run.borrow_mut();
            if run.state != StepState::Running {
                return;
            }
            run.state = StepState::Settled;
            std::mem::take(&mut run.waiters)
        };
        let outcome = if self.issues.is_empty() {
            StepOutcome::Completed
        } else {
            StepOutcome::Degraded(self.issues.clone())
        };
        debug!(sequence = self.sequence, ?outcome, "step settled");
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Queue-relative percent: `floor(100 * (mean + sequence - 1) / total)`.
fn percent(mean: f64, sequence: u32, total: u32) -> u32 {
    let value = 100.0 * (mean + sequence as f64 - 1.0) / total as f64;
    // Absorb representation error such as 27.999999999999996.
    (value + 1e-9).floor().clamp(0.0, 100.0) as u32
}

/// Resolves when a step run ends.
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct StepCompletion {
    rx: oneshot::Receiver<StepOutcome>,
}

impl Future for StepCompletion {
    type Output = StepOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<StepOutcome> {
        match self.rx.poll_unpin(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(StepOutcome::Stopped),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use crate::style::MemoryElement;
    use futures::executor::block_on;

    fn setup(
        properties: PropertySet,
        duration: f64,
    ) -> (Rc<ManualScheduler>, Rc<MemoryElement>, AnimationStep) {
        let scheduler = Rc::new(ManualScheduler::new());
        let element = Rc::new(MemoryElement::new("box"));
        let step = AnimationStep::new(
            1,
            vec![element.clone() as Target],
            StepConfig::new(duration, properties),
            scheduler.clone(),
            "linear",
        );
        (scheduler, element, step)
    }

    #[test]
    fn test_percent_formula() {
        assert_eq!(percent(0.4, 2, 5), 28);
        assert_eq!(percent(0.0, 1, 1), 0);
        assert_eq!(percent(1.0, 3, 3), 100);
        assert_eq!(percent(0.5, 1, 1), 50);
    }

    #[test]
    fn test_runs_to_completion() {
        let (scheduler, element, step) =
            setup(PropertySet::new().set("translateX", "100px"), 1000.0);
        let mut completion = step.play();
        assert_eq!(step.state(), StepState::Running);

        scheduler.tick(0.0);
        assert_eq!(element.transform(), "translateX(0.00px)");
        scheduler.tick(500.0);
        assert_eq!(element.transform(), "translateX(50.00px)");
        assert!((&mut completion).now_or_never().is_none());

        scheduler.tick(1000.0);
        assert_eq!(element.transform(), "translateX(100.00px)");
        assert_eq!(step.state(), StepState::Settled);
        assert_eq!(block_on(completion), StepOutcome::Completed);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_no_targets_degrades_immediately() {
        let scheduler = Rc::new(ManualScheduler::new());
        let step = AnimationStep::new(
            1,
            Vec::new(),
            StepConfig::new(100.0, PropertySet::new().set("opacity", 0.0)),
            scheduler.clone(),
            "linear",
        );
        let outcome = block_on(step.play());
        assert_eq!(outcome, StepOutcome::Degraded(vec![AnimeError::NoTargets]));
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_unsupported_property_reports_degraded() {
        let (scheduler, element, step) = setup(
            PropertySet::new().set("opacity", 0.0).set("color", "red"),
            100.0,
        );
        let completion = step.play();
        scheduler.tick(0.0);
        scheduler.tick(100.0);
        assert_eq!(element.opacity().as_deref(), Some("0.00"));
        assert_eq!(
            block_on(completion),
            StepOutcome::Degraded(vec![AnimeError::UnsupportedProperty("color".into())])
        );
    }

    #[test]
    fn test_stop_cancels_frame_and_keeps_style() {
        let (scheduler, element, step) =
            setup(PropertySet::new().set("rotate", "90deg"), 1000.0);
        let completion = step.play();
        scheduler.tick(0.0);
        scheduler.tick(500.0);
        step.stop();
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(element.transform(), "rotate(45.00deg)");
        assert_eq!(step.state(), StepState::Stopped);
        assert!(block_on(completion).is_stopped());
    }

    #[test]
    fn test_second_play_joins_run() {
        let (scheduler, _element, step) = setup(PropertySet::new().set("scaleX", 2.0), 100.0);
        let first = step.play();
        scheduler.tick(0.0);
        let second = step.play();
        scheduler.tick(100.0);
        assert_eq!(block_on(first), StepOutcome::Completed);
        assert_eq!(block_on(second), StepOutcome::Completed);
    }

    #[test]
    fn test_paused_frames_still_notify() {
        let (scheduler, element, step) =
            setup(PropertySet::new().set("translateY", 100.0), 1000.0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        step.set_observer(Rc::new(move |p: Progress| sink.borrow_mut().push(p.percent)));

        let _completion = step.play();
        scheduler.tick(0.0);
        scheduler.tick(300.0);
        step.pause();
        let commits = element.commit_count();
        scheduler.tick(400.0);
        scheduler.tick(900.0);
        assert_eq!(element.commit_count(), commits);
        assert_eq!(*seen.borrow(), vec![0, 30, 30, 30]);
        assert!(step.is_paused());
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_already_at_target_stays_put() {
        let scheduler = Rc::new(ManualScheduler::new());
        let element = Rc::new(MemoryElement::new("box").with_transform("translateX(40px) skewX(10deg)"));
        let step = AnimationStep::new(
            1,
            vec![element.clone() as Target],
            StepConfig::new(200.0, PropertySet::new().set("translateX", "40px")),
            scheduler.clone(),
            "linear",
        );
        let completion = step.play();
        scheduler.tick(0.0);
        assert_eq!(element.transform(), "translateX(40.00px) skewX(10deg)");
        scheduler.tick(200.0);
        assert_eq!(block_on(completion), StepOutcome::Completed);
        assert_eq!(element.transform(), "translateX(40.00px) skewX(10deg)");
    }

    #[test]
    fn test_at_rest_property_keeps_captured_value() {
        let scheduler = Rc::new(ManualScheduler::new());
        let element = Rc::new(MemoryElement::new("box").with_transform("translateX(100furlongs)"));
        let step = AnimationStep::new(
            1,
            vec![element.clone() as Target],
            StepConfig::new(300.0, PropertySet::new().set("translateX", 100.0)),
            scheduler.clone(),
            "linear",
        );
        let completion = step.play();
        for ts in [0.0, 100.0, 200.0, 300.0] {
            scheduler.tick(ts);
        }
        assert_eq!(block_on(completion), StepOutcome::Completed);
        let writes = element.history();
        assert_eq!(writes.len(), 4);
        assert!(writes.iter().all(|w| w.transform == "translateX(100.00px)"));
    }

    #[test]
    fn test_zero_duration_snaps() {
        let (scheduler, element, step) = setup(PropertySet::new().set("translateX", 30.0), 0.0);
        let completion = step.play();
        scheduler.tick(5.0);
        assert_eq!(element.transform(), "translateX(30.00px)");
        assert_eq!(block_on(completion), StepOutcome::Completed);
    }
}
