//! Easing resolution for animation timing.
//!
//! An easing name resolves along exactly one path:
//! - a named tween (`elasticEaseIn`, `bounceEaseOut`, ...) computing values
//!   directly from elapsed time, see [`crate::tween`]
//! - a progress function remapping linear progress 0..1:
//!   `cubic-bezier(x1,y1,x2,y2)`, `ease-in`, `ease-out`, `ease-in-out`
//! - identity, for `linear` and anything unrecognized
//!
//! # Usage
//!
//! ```
//! use agile_anime::easing::{self, EasingFunction};
//!
//! let resolved = easing::resolve("cubic-bezier(0.4, 0, 0.2, 1)");
//! assert!(resolved.tween.is_none());
//! let shaped = resolved.shape(0.5);
//! assert!(shaped > 0.5);
//!
//! assert_eq!(easing::resolve("cubic-bezier(0.1,0.2,0.3)").progress, EasingFunction::Linear);
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AnimeError, Result};
use crate::tween::Tween;

/// Progress function mapping linear progress (0.0 to 1.0) to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EasingFunction {
    /// Identity.
    #[default]
    Linear,

    /// `ease-in`, equivalent to `cubic-bezier(0.64, 0.02, 0.64, 0.40)`.
    EaseIn,

    /// `ease-out`, equivalent to `cubic-bezier(0.10, 0.24, 0.25, 0.98)`.
    EaseOut,

    /// `ease-in-out`, equivalent to `cubic-bezier(0.94, 0.00, 0.34, 1.00)`.
    EaseInOut,

    /// Custom cubic bezier curve.
    /// x values must be in [0, 1], y values can be any float.
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl EasingFunction {
    /// Evaluate the easing function at the given progress.
    ///
    /// Input is clamped to [0, 1]; output may leave that range for curves
    /// with overshooting y control points.
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::EaseIn => cubic_bezier(0.64, 0.02, 0.64, 0.40, t),
            Self::EaseOut => cubic_bezier(0.10, 0.24, 0.25, 0.98, t),
            Self::EaseInOut => cubic_bezier(0.94, 0.00, 0.34, 1.00, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, t),
        }
    }

    /// Create a custom cubic bezier easing function.
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
            return Err(AnimeError::MalformedEasing {
                spec: format!("cubic-bezier({x1},{y1},{x2},{y2})"),
                reason: "bezier x values must be in [0, 1]".to_string(),
            });
        }
        Ok(Self::CubicBezier { x1, y1, x2, y2 })
    }

    /// Strict parse of a CSS timing keyword or `cubic-bezier(...)` string.
    ///
    /// Unknown keywords are `Linear`; only a malformed `cubic-bezier` errors.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if let Some(rest) = spec.strip_prefix("cubic-bezier") {
            let inner = rest.trim().trim_start_matches('(').trim_end_matches(')');
            let params: Vec<&str> = inner.split(',').map(str::trim).collect();
            if params.len() != 4 {
                return Err(AnimeError::MalformedEasing {
                    spec: spec.to_string(),
                    reason: format!("expected 4 parameters, found {}", params.len()),
                });
            }
            let mut values = [0.0; 4];
            for (slot, param) in values.iter_mut().zip(&params) {
                *slot = param.parse::<f64>().map_err(|_| AnimeError::MalformedEasing {
                    spec: spec.to_string(),
                    reason: format!("{param:?} is not a number"),
                })?;
            }
            let [x1, y1, x2, y2] = values;
            return Self::cubic_bezier(x1, y1, x2, y2).map_err(|_| AnimeError::MalformedEasing {
                spec: spec.to_string(),
                reason: "bezier x values must be in [0, 1]".to_string(),
            });
        }

        Ok(match spec {
            "ease-in" => Self::EaseIn,
            "ease-out" => Self::EaseOut,
            "ease-in-out" => Self::EaseInOut,
            _ => Self::Linear,
        })
    }
}

/// Result of resolving an easing name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEasing {
    /// Named tween computing values from elapsed time. Takes precedence.
    pub tween: Option<Tween>,
    /// Progress remapping; identity whenever a tween is active.
    pub progress: EasingFunction,
    /// Problem absorbed while resolving, if any.
    pub issue: Option<AnimeError>,
}

impl Default for ResolvedEasing {
    fn default() -> Self {
        Self {
            tween: None,
            progress: EasingFunction::Linear,
            issue: None,
        }
    }
}

impl ResolvedEasing {
    /// Shape raw progress. A tween works on elapsed time, so progress passes
    /// through unchanged when one is active.
    pub fn shape(&self, p: f64) -> f64 {
        match self.tween {
            Some(_) => p,
            None => self.progress.evaluate(p),
        }
    }
}

/// Resolve an easing name. Never fails: malformed specs are logged and
/// degrade to identity.
pub fn resolve(name: &str) -> ResolvedEasing {
    if let Some(tween) = Tween::from_name(name.trim()) {
        return ResolvedEasing {
            tween: Some(tween),
            ..ResolvedEasing::default()
        };
    }

    match EasingFunction::parse(name) {
        Ok(progress) => ResolvedEasing {
            progress,
            ..ResolvedEasing::default()
        },
        Err(err) => {
            warn!(%err, "falling back to linear easing");
            ResolvedEasing {
                issue: Some(err),
                ..ResolvedEasing::default()
            }
        }
    }
}

/// Evaluate a cubic bezier curve at progress `x`.
///
/// Solves x(t) = progress for t, then evaluates y(t).
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, progress: f64) -> f64 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }
    if x1 == y1 && x2 == y2 {
        return progress;
    }

    let t = solve_bezier_x(x1, x2, progress);
    bezier_y(y1, y2, t)
}

/// Newton-Raphson on x(t), falling back to bisection where the slope is flat.
fn solve_bezier_x(x1: f64, x2: f64, target_x: f64) -> f64 {
    let mut t = target_x;

    for _ in 0..8 {
        let x = bezier_x(x1, x2, t) - target_x;
        if x.abs() < 1e-7 {
            return t;
        }

        let dx = bezier_x_derivative(x1, x2, t);
        if dx.abs() < 1e-6 {
            break;
        }

        t = (t - x / dx).clamp(0.0, 1.0);
    }

    // x(t) is monotonic on [0, 1] when x1, x2 are in [0, 1]
    let (mut lo, mut hi) = (0.0, 1.0);
    t = target_x;
    for _ in 0..32 {
        let x = bezier_x(x1, x2, t);
        if (x - target_x).abs() < 1e-7 {
            break;
        }
        if x < target_x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) * 0.5;
    }
    t
}

/// x(t) = 3(1-t)²t·x1 + 3(1-t)t²·x2 + t³
#[inline]
fn bezier_x(x1: f64, x2: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;

    3.0 * mt2 * t * x1 + 3.0 * mt * t2 * x2 + t3
}

#[inline]
fn bezier_y(y1: f64, y2: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;

    3.0 * mt2 * t * y1 + 3.0 * mt * t2 * y2 + t3
}

/// dx/dt = 3(1-t)²·x1 + 6(1-t)t·(x2-x1) + 3t²·(1-x2)
#[inline]
fn bezier_x_derivative(x1: f64, x2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * x1 + 6.0 * mt * t * (x2 - x1) + 3.0 * t * t * (1.0 - x2)
}
