// Constraint: `lower ≤ Σ coefficient·x ≤ upper`, constants folded into the bounds.

use std::fmt;

use super::error::{ModelError, Result};
use super::expr::Sum;
use super::ids::ModelId;
use crate::frozen::FrozenMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    lower: Option<f64>,
    terms: FrozenMap<usize, f64>,
    upper: Option<f64>,
    model: Option<ModelId>,
}

impl Constraint {
    /// Build `lower ≤ sum ≤ upper`; `None` leaves that side unbounded.
    ///
    /// The constant of `sum` is moved into the bounds. A constraint left with no
    /// variable terms must hold for the remaining constant, otherwise
    /// `ModelError::Unsatisfiable` is returned.
    pub fn new(lower: Option<f64>, sum: &Sum, upper: Option<f64>) -> Result<Self> {
        let lower = lower.map(|lb| lb - sum.constant());
        let upper = upper.map(|ub| ub - sum.constant());
        let terms: FrozenMap<usize, f64> = sum.terms().into_iter().collect();

        if terms.is_empty() {
            let lower_ok = lower.map_or(true, |lb| lb <= 0.0);
            let upper_ok = upper.map_or(true, |ub| 0.0 <= ub);
            if !(lower_ok && upper_ok) {
                return Err(ModelError::Unsatisfiable {
                    lower: lower.unwrap_or(f64::NEG_INFINITY),
                    upper: upper.unwrap_or(f64::INFINITY),
                });
            }
        }

        Ok(Self {
            lower,
            terms,
            upper,
            model: sum.model(),
        })
    }

    pub fn lower(&self) -> Option<f64> {
        self.lower
    }

    pub fn upper(&self) -> Option<f64> {
        self.upper
    }

    /// Non-zero terms keyed by variable index.
    pub fn terms(&self) -> &FrozenMap<usize, f64> {
        &self.terms
    }

    pub fn model(&self) -> Option<ModelId> {
        self.model
    }

    /// True when no variable terms remain; such a constraint always holds.
    pub fn is_tautology(&self) -> bool {
        self.terms.is_empty()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(lb) = self.lower {
            write!(f, "{lb} ≤ ")?;
        }
        if self.terms.is_empty() {
            write!(f, "0")?;
        } else {
            let rendered = self
                .terms
                .iter()
                .map(|(index, coefficient)| format!("{coefficient}*x{index}"))
                .collect::<Vec<_>>();
            write!(f, "{}", rendered.join(" + "))?;
        }
        if let Some(ub) = self.upper {
            write!(f, " ≤ {ub}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::domain::solution::FixedModel;

    #[test]
    fn comparisons_render_normalized() {
        let mut model = FixedModel::new();
        let v0 = model.add_fixed_variable(0.0);
        let v1 = model.add_fixed_variable(1.0);

        assert_eq!(v0.le(v1 + 5.0).unwrap().to_string(), "1*x0 + -1*x1 ≤ 5");
        assert_eq!(v0.ge(v1 + 5.0).unwrap().to_string(), "5 ≤ 1*x0 + -1*x1");
        assert_eq!(
            v0.equals(v1 + 5.0).unwrap().to_string(),
            "5 ≤ 1*x0 + -1*x1 ≤ 5"
        );

        let s = v0 + v1;
        assert_eq!(s.le(1).unwrap().to_string(), "1*x0 + 1*x1 ≤ 1");
        assert_eq!(s.ge(1).unwrap().to_string(), "1 ≤ 1*x0 + 1*x1");
        assert_eq!(s.equals(1).unwrap().to_string(), "1 ≤ 1*x0 + 1*x1 ≤ 1");
    }

    #[test]
    fn constant_is_folded_into_bounds() {
        let mut model = FixedModel::new();
        let x = model.add_fixed_variable(0.0);
        let c = Constraint::new(Some(1.0), &(x + 3.0), Some(10.0)).unwrap();
        assert_eq!(c.lower(), Some(-2.0));
        assert_eq!(c.upper(), Some(7.0));
        assert_eq!(c.terms().single(), Some((&0, &1.0)));
    }

    #[test]
    fn degenerate_constraints() {
        let err = Sum::zero().ge(1).unwrap_err();
        assert_eq!(err.code(), "CONSTRAINT_UNSATISFIABLE");
        assert!(Sum::zero().le(1).unwrap().is_tautology());
        assert!(Sum::new(2.0).equals(2.0).unwrap().is_tautology());
        assert!(Sum::new(2.0).equals(3.0).is_err());
    }

    #[test]
    fn zero_coefficients_vanish() {
        let mut model = FixedModel::new();
        let x = model.add_fixed_variable(0.0);
        let c = (x * 0.0).equals(0.0).unwrap();
        assert!(c.is_tautology());
        assert!((x * 0.0).ge(1.0).is_err());
    }
}
