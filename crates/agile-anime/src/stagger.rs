//! Per-target timing expansion.
//!
//! Delays and durations are either one value shared by every target or a
//! generator called once per target with `(target, index)`.

use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::style::Target;

/// Per-target generator.
pub type StaggerFn = Rc<dyn Fn(&Target, usize) -> f64>;

/// Delay or duration in milliseconds.
#[derive(Clone)]
pub enum Stagger {
    /// Same value for every target.
    Fixed(f64),
    /// Value computed per target.
    PerTarget(StaggerFn),
}

impl Stagger {
    /// Create a per-target stagger from a closure.
    pub fn per_target<F>(f: F) -> Self
    where
        F: Fn(&Target, usize) -> f64 + 'static,
    {
        Self::PerTarget(Rc::new(f))
    }

    /// Evenly spaced values: `start + step * index`.
    pub fn linear(start: f64, step: f64) -> Self {
        Self::per_target(move |_, index| start + step * index as f64)
    }

    /// Expand into one value per target.
    ///
    /// Negative or non-finite values are clamped to 0.
    pub fn resolve(&self, targets: &[Target]) -> Vec<f64> {
        targets
            .iter()
            .enumerate()
            .map(|(index, target)| {
                let value = match self {
                    Self::Fixed(v) => *v,
                    Self::PerTarget(f) => f(target, index),
                };
                if value.is_finite() && value >= 0.0 {
                    value
                } else {
                    warn!(target = %target.label(), index, value, "timing clamped to 0");
                    0.0
                }
            })
            .collect()
    }
}

impl Default for Stagger {
    fn default() -> Self {
        Self::Fixed(0.0)
    }
}

impl fmt::Debug for Stagger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(v) => write!(f, "Fixed({})", v),
            Self::PerTarget(_) => write!(f, "PerTarget"),
        }
    }
}

impl From<f64> for Stagger {
    fn from(v: f64) -> Self {
        Self::Fixed(v)
    }
}

impl From<u32> for Stagger {
    fn from(v: u32) -> Self {
        Self::Fixed(v as f64)
    }
}

impl From<i32> for Stagger {
    fn from(v: i32) -> Self {
        Self::Fixed(v as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::MemoryElement;

    fn targets(n: usize) -> Vec<Target> {
        (0..n)
            .map(|i| Rc::new(MemoryElement::new(format!("el-{i}"))) as Target)
            .collect()
    }

    #[test]
    fn test_fixed_broadcasts() {
        let resolved = Stagger::from(120.0).resolve(&targets(4));
        assert_eq!(resolved, vec![120.0; 4]);
    }

    #[test]
    fn test_generator_called_per_target() {
        let targets = targets(3);
        let stagger = Stagger::per_target(|target, index| {
            let bonus = if target.label() == "el-2" { 1000.0 } else { 0.0 };
            index as f64 * 50.0 + bonus
        });
        assert_eq!(stagger.resolve(&targets), vec![0.0, 50.0, 1100.0]);
    }

    #[test]
    fn test_linear_helper() {
        assert_eq!(
            Stagger::linear(100.0, 25.0).resolve(&targets(3)),
            vec![100.0, 125.0, 150.0]
        );
    }

    #[test]
    fn test_invalid_values_clamped() {
        let stagger = Stagger::per_target(|_, index| match index {
            0 => -5.0,
            1 => f64::NAN,
            _ => 10.0,
        });
        assert_eq!(stagger.resolve(&targets(3)), vec![0.0, 0.0, 10.0]);
    }

    #[test]
    fn test_empty_targets() {
        assert!(Stagger::from(10).resolve(&[]).is_empty());
    }
}
