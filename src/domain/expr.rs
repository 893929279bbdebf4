// Linear expression algebra.
//
// - `Variable`: index of a column inside one model
// - `Sum`: constant plus a sparse index → coefficient map
// - `Term`: closed set of operands every combinator accepts
//
// Only scalar multiplication exists, so a product of two variable-bearing
// expressions does not type-check. Combining operands owned by two different
// models is a contract violation: the fallible methods return
// `ModelError::ModelMismatch`, the operators panic with the same message.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use super::constraint::Constraint;
use super::error::{combine_models, ModelError, Result};
use super::ids::ModelId;
use super::solution::Values;

/// A decision variable: an index into the model that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable {
    index: usize,
    model: ModelId,
}

impl Variable {
    /// Normally not used directly; variables are created by a model.
    pub(crate) fn new(index: usize, model: ModelId) -> Self {
        Self { index, model }
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn model(self) -> ModelId {
        self.model
    }

    /// Value of this variable in the current solution of `source`.
    pub fn value<V: Values + ?Sized>(self, source: &V) -> Result<f64> {
        if source.model_id() != self.model {
            return Err(ModelError::ModelMismatch {
                left: self.model,
                right: source.model_id(),
            });
        }
        source.value_at(self.index)
    }

    /// `self ≤ rhs`
    pub fn le(self, rhs: impl Into<Term>) -> Result<Constraint> {
        Sum::from(self).le(rhs)
    }

    /// `self ≥ rhs`
    pub fn ge(self, rhs: impl Into<Term>) -> Result<Constraint> {
        Sum::from(self).ge(rhs)
    }

    /// `self = rhs`
    pub fn equals(self, rhs: impl Into<Term>) -> Result<Constraint> {
        Sum::from(self).equals(rhs)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.index)
    }
}

/// Any operand of the algebra.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Literal(f64),
    Variable(Variable),
    Linear(Sum),
}

impl From<f64> for Term {
    fn from(value: f64) -> Self {
        Term::Literal(value)
    }
}

impl From<i32> for Term {
    fn from(value: i32) -> Self {
        Term::Literal(f64::from(value))
    }
}

impl From<Variable> for Term {
    fn from(value: Variable) -> Self {
        Term::Variable(value)
    }
}

impl From<Sum> for Term {
    fn from(value: Sum) -> Self {
        Term::Linear(value)
    }
}

impl From<&Sum> for Term {
    fn from(value: &Sum) -> Self {
        Term::Linear(value.clone())
    }
}

/// A linear expression `constant + Σ coefficient·x[index]`.
///
/// Duplicate indices combine by addition. Zero coefficients may exist while an
/// expression is being built and are dropped by `terms`, `Display` and
/// constraint construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sum {
    constant: f64,
    coefficients: BTreeMap<usize, f64>,
    model: Option<ModelId>,
}

impl Sum {
    /// Just a constant, no variable terms.
    pub fn new(constant: f64) -> Self {
        Self {
            constant,
            ..Default::default()
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Owning model, `None` while the expression holds no variables.
    pub fn model(&self) -> Option<ModelId> {
        self.model
    }

    /// Coefficient of `x`, zero when absent.
    pub fn coefficient(&self, x: Variable) -> f64 {
        if self.model.is_some_and(|id| id != x.model()) {
            return 0.0;
        }
        self.coefficients.get(&x.index()).copied().unwrap_or(0.0)
    }

    /// Non-zero terms sorted by variable index.
    pub fn terms(&self) -> Vec<(usize, f64)> {
        self.coefficients
            .iter()
            .filter(|(_, c)| **c != 0.0)
            .map(|(i, c)| (*i, *c))
            .collect()
    }

    /// All stored coefficients, zeros included, in index order.
    pub(crate) fn raw_coefficients(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.coefficients.iter().map(|(i, c)| (*i, *c))
    }

    /// Number of non-zero terms.
    pub fn num_terms(&self) -> usize {
        self.coefficients.values().filter(|c| **c != 0.0).count()
    }

    /// Add `term` in place. The receiver is unchanged on error.
    pub fn try_add_assign(&mut self, term: impl Into<Term>) -> Result<()> {
        self.accumulate(term.into(), 1.0)
    }

    /// Subtract `term` in place. The receiver is unchanged on error.
    pub fn try_sub_assign(&mut self, term: impl Into<Term>) -> Result<()> {
        self.accumulate(term.into(), -1.0)
    }

    pub fn checked_add(mut self, term: impl Into<Term>) -> Result<Sum> {
        self.try_add_assign(term)?;
        Ok(self)
    }

    pub fn checked_sub(mut self, term: impl Into<Term>) -> Result<Sum> {
        self.try_sub_assign(term)?;
        Ok(self)
    }

    /// Multiply constant and coefficients by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.constant *= factor;
        for coefficient in self.coefficients.values_mut() {
            *coefficient *= factor;
        }
    }

    /// Evaluate under the current solution of `source`.
    pub fn value<V: Values + ?Sized>(&self, source: &V) -> Result<f64> {
        if self.coefficients.is_empty() {
            return Ok(self.constant);
        }
        combine_models(self.model, Some(source.model_id()))?;
        let mut result = self.constant;
        for (index, coefficient) in &self.coefficients {
            result += coefficient * source.value_at(*index)?;
        }
        Ok(result)
    }

    /// `self ≤ rhs`, normalized to `self - rhs ≤ 0`.
    pub fn le(&self, rhs: impl Into<Term>) -> Result<Constraint> {
        let difference = self.clone().checked_sub(rhs)?;
        Constraint::new(None, &difference, Some(0.0))
    }

    /// `self ≥ rhs`, normalized to `0 ≤ self - rhs`.
    pub fn ge(&self, rhs: impl Into<Term>) -> Result<Constraint> {
        let difference = self.clone().checked_sub(rhs)?;
        Constraint::new(Some(0.0), &difference, None)
    }

    /// `self = rhs`, normalized to `0 ≤ self - rhs ≤ 0`.
    pub fn equals(&self, rhs: impl Into<Term>) -> Result<Constraint> {
        let difference = self.clone().checked_sub(rhs)?;
        Constraint::new(Some(0.0), &difference, Some(0.0))
    }

    fn accumulate(&mut self, term: Term, sign: f64) -> Result<()> {
        match term {
            Term::Literal(value) => {
                self.constant += sign * value;
            }
            Term::Variable(x) => {
                self.model = combine_models(self.model, Some(x.model()))?;
                *self.coefficients.entry(x.index()).or_insert(0.0) += sign;
            }
            Term::Linear(other) => {
                self.model = combine_models(self.model, other.model)?;
                self.constant += sign * other.constant;
                for (index, coefficient) in other.coefficients {
                    *self.coefficients.entry(index).or_insert(0.0) += sign * coefficient;
                }
            }
        }
        Ok(())
    }
}

impl From<Variable> for Sum {
    fn from(x: Variable) -> Self {
        let mut sum = Sum::zero();
        sum.coefficients.insert(x.index(), 1.0);
        sum.model = Some(x.model());
        sum
    }
}

impl From<f64> for Sum {
    fn from(value: f64) -> Self {
        Sum::new(value)
    }
}

impl fmt::Display for Sum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.constant != 0.0 {
            parts.push(self.constant.to_string());
        }
        for (index, coefficient) in self.terms() {
            parts.push(format!("{coefficient}*x{index}"));
        }
        if parts.is_empty() {
            return write!(f, "0");
        }
        write!(f, "{}", parts.join(" + "))
    }
}

fn unwrap_combination(result: Result<Sum>) -> Sum {
    match result {
        Ok(sum) => sum,
        Err(err) => panic!("{err}"),
    }
}

// ── Operator overloads ──────────────────────────────────────

impl<T: Into<Term>> Add<T> for Sum {
    type Output = Sum;

    fn add(self, rhs: T) -> Sum {
        unwrap_combination(self.checked_add(rhs))
    }
}

impl<T: Into<Term>> Add<T> for &Sum {
    type Output = Sum;

    fn add(self, rhs: T) -> Sum {
        unwrap_combination(self.clone().checked_add(rhs))
    }
}

impl<T: Into<Term>> Add<T> for Variable {
    type Output = Sum;

    fn add(self, rhs: T) -> Sum {
        unwrap_combination(Sum::from(self).checked_add(rhs))
    }
}

impl<T: Into<Term>> Sub<T> for Sum {
    type Output = Sum;

    fn sub(self, rhs: T) -> Sum {
        unwrap_combination(self.checked_sub(rhs))
    }
}

impl<T: Into<Term>> Sub<T> for &Sum {
    type Output = Sum;

    fn sub(self, rhs: T) -> Sum {
        unwrap_combination(self.clone().checked_sub(rhs))
    }
}

impl<T: Into<Term>> Sub<T> for Variable {
    type Output = Sum;

    fn sub(self, rhs: T) -> Sum {
        unwrap_combination(Sum::from(self).checked_sub(rhs))
    }
}

impl<T: Into<Term>> AddAssign<T> for Sum {
    fn add_assign(&mut self, rhs: T) {
        if let Err(err) = self.try_add_assign(rhs) {
            panic!("{err}");
        }
    }
}

impl<T: Into<Term>> SubAssign<T> for Sum {
    fn sub_assign(&mut self, rhs: T) {
        if let Err(err) = self.try_sub_assign(rhs) {
            panic!("{err}");
        }
    }
}

impl MulAssign<f64> for Sum {
    fn mul_assign(&mut self, rhs: f64) {
        self.scale(rhs);
    }
}

impl Mul<f64> for Sum {
    type Output = Sum;

    fn mul(mut self, rhs: f64) -> Sum {
        self.scale(rhs);
        self
    }
}

impl Mul<f64> for &Sum {
    type Output = Sum;

    fn mul(self, rhs: f64) -> Sum {
        self.clone() * rhs
    }
}

impl Mul<f64> for Variable {
    type Output = Sum;

    fn mul(self, rhs: f64) -> Sum {
        Sum::from(self) * rhs
    }
}

impl Neg for Sum {
    type Output = Sum;

    fn neg(self) -> Sum {
        self * -1.0
    }
}

impl Neg for &Sum {
    type Output = Sum;

    fn neg(self) -> Sum {
        self.clone() * -1.0
    }
}

impl Neg for Variable {
    type Output = Sum;

    fn neg(self) -> Sum {
        Sum::from(self) * -1.0
    }
}

macro_rules! scalar_lhs_ops {
    ($($scalar:ty),*) => {$(
        impl Add<Variable> for $scalar {
            type Output = Sum;

            fn add(self, rhs: Variable) -> Sum {
                rhs + self
            }
        }

        impl Add<Sum> for $scalar {
            type Output = Sum;

            fn add(self, rhs: Sum) -> Sum {
                rhs + self
            }
        }

        impl Sub<Variable> for $scalar {
            type Output = Sum;

            fn sub(self, rhs: Variable) -> Sum {
                -rhs + self
            }
        }

        impl Sub<Sum> for $scalar {
            type Output = Sum;

            fn sub(self, rhs: Sum) -> Sum {
                -rhs + self
            }
        }

        impl Mul<Variable> for $scalar {
            type Output = Sum;

            fn mul(self, rhs: Variable) -> Sum {
                rhs * f64::from(self)
            }
        }

        impl Mul<Sum> for $scalar {
            type Output = Sum;

            fn mul(self, rhs: Sum) -> Sum {
                rhs * f64::from(self)
            }
        }
    )*};
}

scalar_lhs_ops!(f64, i32);

impl Mul<i32> for Sum {
    type Output = Sum;

    fn mul(self, rhs: i32) -> Sum {
        self * f64::from(rhs)
    }
}

impl Mul<i32> for Variable {
    type Output = Sum;

    fn mul(self, rhs: i32) -> Sum {
        self * f64::from(rhs)
    }
}

impl std::iter::Sum<Variable> for Sum {
    fn sum<I: Iterator<Item = Variable>>(iter: I) -> Sum {
        iter.fold(Sum::zero(), |acc, x| acc + x)
    }
}

impl std::iter::Sum for Sum {
    fn sum<I: Iterator<Item = Sum>>(iter: I) -> Sum {
        iter.fold(Sum::zero(), |acc, s| acc + s)
    }
}

impl<'a> std::iter::Sum<&'a Sum> for Sum {
    fn sum<I: Iterator<Item = &'a Sum>>(iter: I) -> Sum {
        iter.fold(Sum::zero(), |acc, s| acc + s)
    }
}
