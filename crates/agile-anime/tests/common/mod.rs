#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use agile_anime::{ManualScheduler, MemoryElement, PlayOutcome, Sequencer, Target};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;

pub fn elements(n: usize) -> Vec<Rc<MemoryElement>> {
    (0..n)
        .map(|i| Rc::new(MemoryElement::new(format!("el-{i}"))))
        .collect()
}

pub fn as_targets(elements: &[Rc<MemoryElement>]) -> Vec<Target> {
    elements.iter().map(|e| e.clone() as Target).collect()
}

/// Spawned `Sequencer::play` whose outcome lands in a shared slot.
pub struct Playback {
    pub pool: LocalPool,
    pub outcome: Rc<RefCell<Option<PlayOutcome>>>,
}

impl Playback {
    pub fn start(sequencer: &Sequencer) -> anyhow::Result<Self> {
        let pool = LocalPool::new();
        let outcome = Rc::new(RefCell::new(None));
        let slot = outcome.clone();
        let playing = sequencer.clone();
        pool.spawner().spawn_local(async move {
            let result = playing.play().await;
            *slot.borrow_mut() = Some(result);
        })?;
        let mut playback = Self { pool, outcome };
        playback.pool.run_until_stalled();
        Ok(playback)
    }

    pub fn is_done(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    pub fn outcome(&self) -> Option<PlayOutcome> {
        self.outcome.borrow().clone()
    }

    /// Tick `scheduler` at `timestamp` and let the traversal react.
    pub fn tick(&mut self, scheduler: &ManualScheduler, timestamp: f64) {
        scheduler.tick(timestamp);
        self.pool.run_until_stalled();
    }

    /// Tick every `step_ms` from `from` until the traversal resolves.
    /// Returns the timestamp of the last tick.
    pub fn run_to_end(&mut self, scheduler: &ManualScheduler, from: f64, step_ms: f64) -> f64 {
        let mut now = from;
        for _ in 0..10_000 {
            if self.is_done() {
                break;
            }
            self.tick(scheduler, now);
            now += step_ms;
        }
        now - step_ms
    }
}
