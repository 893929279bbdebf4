// Errors raised while describing a model or reading its solution

use super::ids::ModelId;

/// Contract violations in a model description, and reads without a solution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("[MODEL_EMPTY_BOUND] Can not add impossible constraint: bound of x{index} would become [{lower}, {upper}]")]
    EmptyBound { index: usize, lower: f64, upper: f64 },

    #[error("[CONSTRAINT_UNSATISFIABLE] Can not add constraint impossible to fulfill: {lower} ≤ 0 ≤ {upper}")]
    Unsatisfiable { lower: f64, upper: f64 },

    #[error("[MODEL_MISMATCH] Can not combine variables from different models ({left} and {right})")]
    ModelMismatch { left: ModelId, right: ModelId },

    #[error("[VARIABLE_INVALID_ID] Variable x{index} does not exist (model has {len} variables)")]
    UnknownVariable { index: usize, len: usize },

    #[error("[SOLUTION_MISSING] There is no solution")]
    NoSolution,
}

impl ModelError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::EmptyBound { .. } => "MODEL_EMPTY_BOUND",
            ModelError::Unsatisfiable { .. } => "CONSTRAINT_UNSATISFIABLE",
            ModelError::ModelMismatch { .. } => "MODEL_MISMATCH",
            ModelError::UnknownVariable { .. } => "VARIABLE_INVALID_ID",
            ModelError::NoSolution => "SOLUTION_MISSING",
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Check that two optional owners agree; `None` is compatible with anything.
pub(crate) fn combine_models(left: Option<ModelId>, right: Option<ModelId>) -> Result<Option<ModelId>> {
    match (left, right) {
        (Some(l), Some(r)) if l != r => Err(ModelError::ModelMismatch { left: l, right: r }),
        (Some(l), _) => Ok(Some(l)),
        (None, r) => Ok(r),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_error_code() {
        let rendered = ModelError::NoSolution.to_string();
        assert!(rendered.starts_with("[SOLUTION_MISSING]"));

        let rendered = ModelError::EmptyBound {
            index: 3,
            lower: 2.0,
            upper: 1.0,
        }
        .to_string();
        assert!(rendered.contains("x3"));
        assert!(rendered.contains("[2, 1]"));
    }

    #[test]
    fn combine_models_accepts_unowned_side() {
        let id = ModelId::fresh();
        assert_eq!(combine_models(None, None), Ok(None));
        assert_eq!(combine_models(Some(id), None), Ok(Some(id)));
        assert_eq!(combine_models(None, Some(id)), Ok(Some(id)));
        assert_eq!(combine_models(Some(id), Some(id)), Ok(Some(id)));
    }

    #[test]
    fn combine_models_rejects_two_owners() {
        let a = ModelId::fresh();
        let b = ModelId::fresh();
        let err = combine_models(Some(a), Some(b)).unwrap_err();
        assert_eq!(err.code(), "MODEL_MISMATCH");
    }
}
