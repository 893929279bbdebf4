// Domain service interface for solving engines
// Defines the contract that every backend behind the C surface must follow

use super::models::SolverConfig;
use super::problem::Problem;

/// Error types for the engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Unsupported model: {0}")]
    Unsupported(String),

    #[error("Solution buffer has length {actual} but the model has {expected} variables")]
    BufferLength { expected: usize, actual: usize },

    #[error("Solver execution failed: {0}")]
    Backend(String),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidModel(_) => "ENGINE_INVALID_MODEL",
            Self::Unsupported(_) => "ENGINE_UNSUPPORTED",
            Self::BufferLength { .. } => "ENGINE_BUFFER_LENGTH",
            Self::Backend(_) => "ENGINE_BACKEND",
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Successive solutions of one solve.
pub trait SolutionStream: Send {
    /// The next distinct solution, or `None` once there are no more.
    fn next_solution(&mut self) -> Result<Option<Vec<f64>>>;
}

/// Domain service interface for solving engines
///
/// This trait defines the contract that all backends must follow.
/// It allows backends to be swapped without changing the C surface or the session.
pub trait SolverService: Send + Sync {
    /// Start solving a problem. The stream owns everything it needs.
    fn solve(&self, problem: &Problem, config: &SolverConfig) -> Result<Box<dyn SolutionStream>>;

    /// Validate a problem without solving it
    fn validate(&self, problem: &Problem) -> Result<()> {
        let mut errors = Vec::new();
        let num_vars = problem.num_variables();

        for (i, column) in problem.columns.iter().enumerate() {
            if column.lower.is_nan() || column.upper.is_nan() || column.cost.is_nan() {
                errors.push(format!("Variable {i} has a NaN bound or cost"));
            }
        }

        for (i, row) in problem.rows.iter().enumerate() {
            if row.lower.is_nan() || row.upper.is_nan() {
                errors.push(format!("Constraint {i} has a NaN bound"));
            }
            for &(index, coefficient) in &row.terms {
                if index >= num_vars {
                    errors.push(format!(
                        "Constraint {i} refers to variable {index} but problem has {num_vars} variables"
                    ));
                }
                if !coefficient.is_finite() {
                    errors.push(format!("Constraint {i} has a non-finite coefficient"));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::InvalidModel(errors.join("; ")))
        }
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this backend accepts continuous and general integer variables
    fn supports_mip(&self) -> bool;
}
