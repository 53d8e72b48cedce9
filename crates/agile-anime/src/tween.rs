//! Named tween functions.
//!
//! A tween computes an eased value directly from
//! `(t: elapsed, b: begin, c: change, d: duration)`, bypassing the 0..1
//! progress abstraction. Names follow `<family>Ease<Mode>`, e.g.
//! `elasticEaseIn`, `bounceEaseOut`, `backEaseInOut`, `quadEaseInOut`.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Curve family of a named tween.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweenFamily {
    Quad,
    Cubic,
    Quart,
    Quint,
    Sine,
    Expo,
    Circ,
    Elastic,
    Back,
    Bounce,
}

/// Which end(s) of the curve are eased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweenMode {
    In,
    Out,
    InOut,
}

/// A resolved entry of the named tween table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tween {
    pub family: TweenFamily,
    pub mode: TweenMode,
}

const FAMILIES: [(&str, TweenFamily); 10] = [
    ("quad", TweenFamily::Quad),
    ("cubic", TweenFamily::Cubic),
    ("quart", TweenFamily::Quart),
    ("quint", TweenFamily::Quint),
    ("sine", TweenFamily::Sine),
    ("expo", TweenFamily::Expo),
    ("circ", TweenFamily::Circ),
    ("elastic", TweenFamily::Elastic),
    ("back", TweenFamily::Back),
    ("bounce", TweenFamily::Bounce),
];

/// Overshoot used by the back family.
const BACK_OVERSHOOT: f64 = 1.70158;
/// Period of the elastic family, as a fraction of the duration.
const ELASTIC_PERIOD: f64 = 0.3;

impl Tween {
    pub fn new(family: TweenFamily, mode: TweenMode) -> Self {
        Self { family, mode }
    }

    /// Look up a tween by name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let (prefix, mode) = name.split_once("Ease")?;
        let mode = match mode {
            "In" => TweenMode::In,
            "Out" => TweenMode::Out,
            "InOut" => TweenMode::InOut,
            _ => return None,
        };
        let family = FAMILIES
            .iter()
            .find(|(n, _)| *n == prefix)
            .map(|(_, f)| *f)?;
        Some(Self { family, mode })
    }

    /// Canonical name, the inverse of [`Tween::from_name`].
    pub fn name(&self) -> String {
        let prefix = FAMILIES
            .iter()
            .find(|(_, f)| *f == self.family)
            .map(|(n, _)| *n)
            .unwrap_or("quad");
        let mode = match self.mode {
            TweenMode::In => "In",
            TweenMode::Out => "Out",
            TweenMode::InOut => "InOut",
        };
        format!("{prefix}Ease{mode}")
    }

    /// Evaluate at elapsed time `t` from `b` towards `b + c` over `d`.
    pub fn apply(&self, t: f64, b: f64, c: f64, d: f64) -> f64 {
        if d <= 0.0 || t >= d {
            return b + c;
        }
        if t <= 0.0 {
            return b;
        }
        b + c * self.normalized(t / d)
    }

    /// Normalized curve on x in (0, 1).
    fn normalized(&self, x: f64) -> f64 {
        match self.mode {
            TweenMode::In => self.ease_in(x),
            TweenMode::Out => 1.0 - self.ease_in(1.0 - x),
            TweenMode::InOut => {
                if x < 0.5 {
                    self.ease_in(2.0 * x) / 2.0
                } else {
                    1.0 - self.ease_in(2.0 - 2.0 * x) / 2.0
                }
            }
        }
    }

    /// The "in" half of each family; the other modes are mirrored from it.
    fn ease_in(&self, x: f64) -> f64 {
        match self.family {
            TweenFamily::Quad => x * x,
            TweenFamily::Cubic => x * x * x,
            TweenFamily::Quart => x.powi(4),
            TweenFamily::Quint => x.powi(5),
            TweenFamily::Sine => 1.0 - (x * FRAC_PI_2).cos(),
            TweenFamily::Expo => {
                if x <= 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * (x - 1.0))
                }
            }
            TweenFamily::Circ => 1.0 - (1.0 - x * x).max(0.0).sqrt(),
            TweenFamily::Elastic => {
                if x <= 0.0 {
                    return 0.0;
                }
                if x >= 1.0 {
                    return 1.0;
                }
                let s = ELASTIC_PERIOD / 4.0;
                let x = x - 1.0;
                -(2f64.powf(10.0 * x)) * ((x - s) * (2.0 * PI) / ELASTIC_PERIOD).sin()
            }
            TweenFamily::Back => x * x * ((BACK_OVERSHOOT + 1.0) * x - BACK_OVERSHOOT),
            TweenFamily::Bounce => 1.0 - bounce_out(1.0 - x),
        }
    }
}

fn bounce_out(x: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;
    if x < 1.0 / D {
        N * x * x
    } else if x < 2.0 / D {
        let x = x - 1.5 / D;
        N * x * x + 0.75
    } else if x < 2.5 / D {
        let x = x - 2.25 / D;
        N * x * x + 0.9375
    } else {
        let x = x - 2.625 / D;
        N * x * x + 0.984375
    }
}

/// Every name in the table, in family/mode order.
pub fn names() -> Vec<String> {
    let modes = [TweenMode::In, TweenMode::Out, TweenMode::InOut];
    FAMILIES
        .iter()
        .flat_map(|(_, family)| modes.iter().map(move |mode| Tween::new(*family, *mode).name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            Tween::from_name("elasticEaseIn"),
            Some(Tween::new(TweenFamily::Elastic, TweenMode::In))
        );
        assert_eq!(
            Tween::from_name("bounceEaseOut"),
            Some(Tween::new(TweenFamily::Bounce, TweenMode::Out))
        );
        assert_eq!(
            Tween::from_name("backEaseInOut"),
            Some(Tween::new(TweenFamily::Back, TweenMode::InOut))
        );
        assert_eq!(Tween::from_name("linear"), None);
        assert_eq!(Tween::from_name("ease-in"), None);
        assert_eq!(Tween::from_name("wobbleEaseIn"), None);
        assert_eq!(Tween::from_name("quadEaseSideways"), None);
    }

    #[test]
    fn test_names_round_trip() {
        let all = names();
        assert_eq!(all.len(), 30);
        for name in all {
            let tween = Tween::from_name(&name).unwrap();
            assert_eq!(tween.name(), name);
        }
    }

    #[test]
    fn test_boundary_convergence() {
        for name in names() {
            let tween = Tween::from_name(&name).unwrap();
            assert!(approx_eq(tween.apply(0.0, 10.0, 90.0, 500.0), 10.0), "{name} at t=0");
            assert!(
                approx_eq(tween.apply(500.0, 10.0, 90.0, 500.0), 100.0),
                "{name} at t=d"
            );
            // Just short of the end the curve is already close to b + c.
            let near = tween.apply(499.999, 10.0, 90.0, 500.0);
            assert!((near - 100.0).abs() < 0.5, "{name} near end: {near}");
        }
    }

    #[test]
    fn test_decreasing_change() {
        let tween = Tween::from_name("quadEaseIn").unwrap();
        assert!(approx_eq(tween.apply(0.0, 100.0, -100.0, 1000.0), 100.0));
        assert!(approx_eq(tween.apply(500.0, 100.0, -100.0, 1000.0), 75.0));
        assert!(approx_eq(tween.apply(1000.0, 100.0, -100.0, 1000.0), 0.0));
    }

    #[test]
    fn test_zero_duration_snaps() {
        let tween = Tween::from_name("cubicEaseOut").unwrap();
        assert_eq!(tween.apply(0.0, 5.0, 10.0, 0.0), 15.0);
    }

    #[test]
    fn test_back_overshoots_and_bounce_stays_in_range() {
        let back = Tween::from_name("backEaseIn").unwrap();
        assert!(back.apply(200.0, 0.0, 1.0, 1000.0) < 0.0);

        let bounce = Tween::from_name("bounceEaseOut").unwrap();
        for i in 0..=100 {
            let v = bounce.apply(i as f64 * 10.0, 0.0, 1.0, 1000.0);
            assert!((-EPSILON..=1.0 + EPSILON).contains(&v), "bounce out of range: {v}");
        }
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let first = Tween::from_name("elasticEaseOut").unwrap();
        let second = Tween::from_name("elasticEaseOut").unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.apply(300.0, 0.0, 1.0, 1000.0),
            second.apply(300.0, 0.0, 1.0, 1000.0)
        );
    }
}
