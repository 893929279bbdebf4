// Solution view: reading variable values back through a model

use super::error::{ModelError, Result};
use super::expr::Variable;
use super::ids::ModelId;

/// Source of per-variable values for `Variable::value` and `Sum::value`.
pub trait Values {
    /// Model whose variables this source can evaluate.
    fn model_id(&self) -> ModelId;

    /// Value of the variable with the given index.
    ///
    /// Fails with `ModelError::NoSolution` when no solution is available.
    fn value_at(&self, index: usize) -> Result<f64>;
}

/// In-memory model whose variables have fixed values, used to exercise the
/// algebra without an engine.
#[derive(Debug, Clone)]
pub struct FixedModel {
    id: ModelId,
    values: Vec<f64>,
}

impl FixedModel {
    pub fn new() -> Self {
        Self {
            id: ModelId::fresh(),
            values: Vec::new(),
        }
    }

    /// Add a variable that always evaluates to `value`.
    pub fn add_fixed_variable(&mut self, value: f64) -> Variable {
        let index = self.values.len();
        self.values.push(value);
        Variable::new(index, self.id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for FixedModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Values for FixedModel {
    fn model_id(&self) -> ModelId {
        self.id
    }

    fn value_at(&self, index: usize) -> Result<f64> {
        self.values
            .get(index)
            .copied()
            .ok_or(ModelError::UnknownVariable {
                index,
                len: self.values.len(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn fixed_variables_get_sequential_indices() {
        let mut model = FixedModel::new();
        let a = model.add_fixed_variable(1.5);
        let b = model.add_fixed_variable(-2.0);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(model.len(), 2);
        assert_eq!(b.value(&model).unwrap(), -2.0);
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let model = FixedModel::new();
        let err = model.value_at(4).unwrap_err();
        assert_eq!(err, ModelError::UnknownVariable { index: 4, len: 0 });
    }
}
