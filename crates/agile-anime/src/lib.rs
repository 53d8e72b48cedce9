//! Frame-driven transform/opacity animation engine.
//!
//! This crate provides:
//! - **Steps**: one timeline segment animating a property set on one or more targets
//! - **Sequencer**: an ordered queue of steps with forward, reverse and alternating playback
//! - **Easing**: CSS keywords, `cubic-bezier(...)` and named tweens (`elasticEaseIn`, ...)
//! - **Stagger**: per-target delays and durations
//! - **Style adapter**: reading and writing inline transform lists
//!
//! # Architecture
//!
//! ```text
//! Sequencer
//!   └── AnimationStep (awaited one at a time)
//!         ├── FrameScheduler (host frame callbacks)
//!         ├── ResolvedEasing (tween or progress curve)
//!         └── StyleTarget (one combined write per target per frame)
//! ```
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use agile_anime::{
//!     Direction, ManualScheduler, MemoryElement, PropertySet, Sequencer, StepConfig, Target,
//! };
//! use futures::executor::LocalPool;
//! use futures::task::LocalSpawnExt;
//!
//! let scheduler = Rc::new(ManualScheduler::new());
//! let element = Rc::new(MemoryElement::new("box"));
//! let sequencer = Sequencer::new(
//!     vec![element.clone() as Target],
//!     scheduler.clone(),
//!     false,
//!     Direction::Forward,
//! )
//! .animator(StepConfig::new(1000.0, PropertySet::new().set("translateX", "100px")));
//!
//! let mut pool = LocalPool::new();
//! let playing = sequencer.clone();
//! pool.spawner()
//!     .spawn_local(async move {
//!         playing.play().await;
//!     })
//!     .unwrap();
//!
//! pool.run_until_stalled();
//! scheduler.tick(0.0);
//! scheduler.tick(500.0);
//! assert_eq!(element.transform(), "translateX(50.00px)");
//! ```

pub mod easing;
pub mod error;
pub mod interpolate;
pub mod scheduler;
pub mod sequencer;
pub mod stagger;
pub mod step;
pub mod style;
pub mod tween;
pub mod types;

pub use agile_config::{Direction, PlaybackConfig};
pub use easing::{EasingFunction, ResolvedEasing};
pub use error::{AnimeError, Result};
pub use interpolate::{Interpolate, current_value};
pub use scheduler::{FrameCallback, FrameHandle, FrameScheduler, ManualScheduler};
pub use sequencer::Sequencer;
pub use stagger::Stagger;
pub use step::{AnimationStep, ProgressObserver, StepCompletion, StepConfig};
pub use style::{MemoryElement, StyleTarget, StyleValue, StyleWrite, Target};
pub use tween::{Tween, TweenFamily, TweenMode};
pub use types::{
    PlayOutcome, Progress, Property, PropertyKey, PropertyMap, PropertySet, PropertyValue,
    StepOutcome, StepState, Unit,
};
