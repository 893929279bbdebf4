use crate::domain::{
    solver_service::{EngineError, Result, SolverService},
    value_objects::SolverBackend,
};
#[cfg(feature = "highs")]
use crate::solver::HighsSolver;
use crate::solver::SatSolver;
use std::sync::Arc;

/// Factory for creating engine backends based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create a backend for a specific variant
    pub fn create_from_backend(backend: SolverBackend) -> Result<Arc<dyn SolverService>> {
        match backend {
            #[cfg(feature = "highs")]
            SolverBackend::Default => Ok(Arc::new(HighsSolver::new())),
            #[cfg(not(feature = "highs"))]
            SolverBackend::Default => Err(EngineError::Unsupported(
                "the default backend needs the `highs` feature".to_string(),
            )),
            SolverBackend::Sat => Ok(Arc::new(SatSolver::new())),
        }
    }

    /// Create a backend from its C ABI code
    pub fn create_from_code(code: i32) -> Result<Arc<dyn SolverService>> {
        let backend = SolverBackend::from_code(code)
            .ok_or_else(|| EngineError::Unsupported(format!("Unknown solver variant {code}")))?;
        Self::create_from_backend(backend)
    }
}
