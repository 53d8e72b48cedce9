//! Value interpolation.
//!
//! Without a tween the value is the linear blend
//! `start + (target - start) * p` of the shaped progress. With a tween the
//! value comes from `tween(sub_elapsed, start, target - start, duration)`.

use crate::easing::ResolvedEasing;

/// Types that can be interpolated between two values.
pub trait Interpolate: Sized {
    /// `t = 0` yields `self`, `t = 1` yields `to`.
    fn interpolate(&self, to: &Self, t: f64) -> Self;
}

impl Interpolate for f64 {
    #[inline]
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        current_value(*self, *to, t)
    }
}

/// Linear blend. Symmetric, so decreasing targets need no special case.
#[inline]
pub fn current_value(start: f64, target: f64, p: f64) -> f64 {
    start + (target - start) * p
}

impl ResolvedEasing {
    /// Value of one property at raw time progress `raw`.
    ///
    /// `sub_elapsed` is the time spent past the target's delay; it only
    /// matters when a tween is active. The curve output is not clamped, so
    /// overshooting curves carry the value past `target` mid-run. Both paths
    /// land exactly on `target` once `raw >= 1`.
    pub fn value_at(&self, start: f64, target: f64, raw: f64, sub_elapsed: f64, duration: f64) -> f64 {
        if raw >= 1.0 {
            return target;
        }
        match self.tween {
            Some(tween) => {
                let t = sub_elapsed.clamp(0.0, duration.max(0.0));
                tween.apply(t, start, target - start, duration)
            }
            None => start.interpolate(&target, self.shape(raw)),
        }
    }
}
