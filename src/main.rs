use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use agile_anime::{
    ManualScheduler, MemoryElement, PlayOutcome, PropertySet, Sequencer, Stagger, StepConfig,
    StyleTarget, Target,
};
use agile_config::AnimeConfig;
use anyhow::{Context, Result};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;

fn main() -> Result<()> {
    let config = AnimeConfig::load();

    let mut logger = env_logger::Builder::from_default_env();
    if let Some(filter) = config.driver.log_filter.as_deref() {
        logger.parse_filters(filter);
    }
    let _ = logger.try_init();

    log::info!(
        "agile: looping={} direction={} ease={} frame_rate={}",
        config.playback.looping,
        config.playback.direction,
        config.playback.ease,
        config.driver.frame_rate
    );

    let elements: Vec<Rc<MemoryElement>> = (0..3)
        .map(|i| Rc::new(MemoryElement::new(format!("card-{i}")).with_transform("perspective(600px)")))
        .collect();
    let targets: Vec<Target> = elements.iter().map(|e| e.clone() as Target).collect();
    let scheduler = Rc::new(ManualScheduler::new());

    let sequencer = Sequencer::from_config(targets, scheduler.clone(), &config.playback)
        .on_update(|p| log::debug!("step {} at {}%", p.sequence, p.percent))
        .on_begin(|pass| log::info!("pass {pass} started"))
        .on_complete(|pass| log::info!("pass {pass} complete"))
        .animator(
            StepConfig::new(600.0, PropertySet::new().set("translateX", "120px").set("opacity", 0.5))
                .delay(Stagger::linear(0.0, 80.0)),
        )
        .animator(
            StepConfig::new(800.0, PropertySet::new().set("rotate", "180deg").set("scale", 1.5))
                .ease("elasticEaseOut"),
        )
        .animator(
            StepConfig::new(500.0, PropertySet::new().set("translateY", "-40px").set("opacity", 1.0))
                .ease("cubic-bezier(0.25, 0.1, 0.25, 1)")
                .end_delay(100.0),
        );

    let outcome = Rc::new(RefCell::new(None));
    let slot = outcome.clone();
    let playing = sequencer.clone();
    let mut pool = LocalPool::new();
    pool.spawner()
        .spawn_local(async move {
            let result = playing.play().await;
            *slot.borrow_mut() = Some(result);
        })
        .context("failed to spawn playback")?;

    let frame_ms = 1000.0 / config.driver.frame_rate.max(1.0);
    let max_frames = config.driver.max_frames.unwrap_or(u64::MAX);
    let mut frames = 0u64;
    pool.run_until_stalled();
    while outcome.borrow().is_none() {
        if frames >= max_frames {
            log::warn!("frame budget of {max_frames} exhausted, stopping");
            sequencer.stop();
            pool.run_until_stalled();
            break;
        }
        scheduler.tick(frames as f64 * frame_ms);
        pool.run_until_stalled();
        frames += 1;
        if config.driver.max_frames.is_none() {
            std::thread::sleep(Duration::from_secs_f64(frame_ms / 1000.0));
        }
    }

    match outcome.borrow().as_ref() {
        Some(PlayOutcome::Completed { passes, degraded }) => {
            println!("completed {passes} pass(es) in {frames} frames");
            for issue in degraded {
                println!("  degraded: {issue}");
            }
        }
        Some(other) => println!("playback ended: {other:?}"),
        None => println!("playback still pending after {frames} frames"),
    }
    for element in &elements {
        println!(
            "{}: transform=\"{}\" opacity={}",
            element.label(),
            element.transform(),
            element.opacity().unwrap_or_else(|| "1".to_string())
        );
    }
    Ok(())
}
