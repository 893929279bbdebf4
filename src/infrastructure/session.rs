// Solving session: hands a model to the engine and reads solutions back into it.

use std::marker::PhantomData;

use tracing::debug;

use super::handles::{ModelHandle, SolutionStreamHandle, SolverHandle};
use crate::domain::{
    ids::ModelId,
    models::{Model, SolverConfig},
    value_objects::{Outcome, SolverBackend},
};

/// Errors surfaced by the solving session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Engine rejected the model: {0}")]
    ModelRejected(String),

    #[error("Solve failed: {0}")]
    SolveFailed(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Solutions belong to {expected} but were asked to fill {actual}")]
    ModelMismatch { expected: ModelId, actual: ModelId },

    #[error("Solver not available: {0}")]
    UnknownBackend(String),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModelRejected(_) => "SESSION_MODEL_REJECTED",
            Self::SolveFailed(_) => "SESSION_SOLVE_FAILED",
            Self::Engine(_) => "SESSION_ENGINE",
            Self::ModelMismatch { .. } => "SESSION_MODEL_MISMATCH",
            Self::UnknownBackend(_) => "SESSION_UNKNOWN_BACKEND",
        }
    }
}

/// Anything that can fill a model with successive solutions.
pub trait SolutionProvider {
    type Error: std::error::Error;

    /// Store the next solution on `model`.
    ///
    /// Returns `Ok(false)` when there are no (more) solutions; the model then
    /// keeps whatever solution it had.
    fn get(&mut self, model: &mut Model) -> Result<bool, Self::Error>;
}

/// Engine solver for one backend configuration.
#[derive(Debug)]
pub struct Solver {
    handle: SolverHandle,
    config: SolverConfig,
}

impl Solver {
    pub fn new(backend: SolverBackend) -> Result<Self, SessionError> {
        Self::with_config(SolverConfig::new(backend))
    }

    pub fn with_config(config: SolverConfig) -> Result<Self, SessionError> {
        let mut handle = SolverHandle::create(config.backend)?;
        if let Some(seconds) = config.time_limit {
            handle.set_time_limit(seconds);
        }
        handle.set_silent(!config.verbose);
        debug!(
            component = "session",
            operation = "solver_create",
            backend = %config.backend,
            "Solver ready"
        );
        Ok(Self { handle, config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Start solving `model`. Clears any solution the model holds.
    pub fn solutions<'s>(&'s self, model: &mut Model) -> Result<Solutions<'s>, SessionError> {
        model.clear_solution();
        let bytes = model.serialize();
        let model_handle = ModelHandle::create(&bytes)?;
        let stream = SolutionStreamHandle::solve(&self.handle, &model_handle)?;
        debug!(
            component = "session",
            operation = "solve",
            model = %model.id(),
            num_variables = model.num_variables(),
            num_constraints = model.num_constraints(),
            "Solution stream opened"
        );
        Ok(Solutions {
            stream,
            model_handle,
            model_id: model.id(),
            buffer: vec![0.0; model.num_variables()],
            _solver: PhantomData,
        })
    }

    /// Solve and store the first solution. Returns false if there is none.
    pub fn solve(&self, model: &mut Model) -> Result<bool, SessionError> {
        self.solutions(model)?.get(model)
    }
}

/// Successive solutions of one model.
///
/// Field order matters: the stream is released before the model handle.
#[derive(Debug)]
pub struct Solutions<'s> {
    stream: SolutionStreamHandle,
    model_handle: ModelHandle,
    model_id: ModelId,
    buffer: Vec<f64>,
    _solver: PhantomData<&'s Solver>,
}

impl Solutions<'_> {
    pub fn model_id(&self) -> ModelId {
        self.model_id
    }

    /// Retrieve the next solution into `model`.
    pub fn get(&mut self, model: &mut Model) -> Result<bool, SessionError> {
        if model.id() != self.model_id {
            return Err(SessionError::ModelMismatch {
                expected: self.model_id,
                actual: model.id(),
            });
        }
        let outcome = self.stream.next(&self.model_handle, &mut self.buffer)?;
        debug!(
            component = "session",
            operation = "get",
            model = %self.model_id,
            status = %outcome,
            "Solution retrieval"
        );
        match outcome {
            Outcome::Found => {
                model.set_solution(self.buffer.clone());
                Ok(true)
            }
            Outcome::Exhausted => Ok(false),
        }
    }
}

impl SolutionProvider for Solutions<'_> {
    type Error = SessionError;

    fn get(&mut self, model: &mut Model) -> Result<bool, SessionError> {
        Solutions::get(self, model)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn solutions_fill_the_model() {
        let mut model = Model::new();
        let x = model.add_boolean();
        let y = model.add_boolean();
        model.add_constraint((x + y).equals(1).unwrap()).unwrap();
        model.add_objective(x).unwrap();

        let solver = Solver::new(SolverBackend::Sat).unwrap();
        assert!(solver.solve(&mut model).unwrap());
        assert_eq!(x.value(&model), Ok(0.0));
        assert_eq!(y.value(&model), Ok(1.0));
    }

    #[test]
    fn exhausted_keeps_previous_solution_and_new_solve_clears_it() {
        let mut model = Model::new();
        let x = model.add_boolean();
        model.add_bounds(Some(1.0), x, None).unwrap();

        let solver = Solver::new(SolverBackend::Sat).unwrap();
        let mut solutions = solver.solutions(&mut model).unwrap();
        assert!(solutions.get(&mut model).unwrap());
        assert!(!solutions.get(&mut model).unwrap());
        assert_eq!(x.value(&model), Ok(1.0));
        drop(solutions);

        let _again = solver.solutions(&mut model).unwrap();
        assert!(!model.has_solution());
    }

    #[test]
    fn solutions_refuse_another_model() {
        let mut a = Model::new();
        a.add_boolean();
        let mut b = Model::new();
        b.add_boolean();

        let solver = Solver::new(SolverBackend::Sat).unwrap();
        let mut solutions = solver.solutions(&mut a).unwrap();
        let err = solutions.get(&mut b).unwrap_err();
        assert_eq!(err.code(), "SESSION_MODEL_MISMATCH");
        assert!(!b.has_solution());
    }

    #[test]
    fn backend_rejection_is_reported() {
        let mut model = Model::new();
        model.add_variable(crate::domain::value_objects::VariableType::Continuous);
        let solver = Solver::with_config(SolverConfig::new(SolverBackend::Sat).with_time_limit(1.0))
            .unwrap();
        let err = solver.solutions(&mut model).unwrap_err();
        assert_eq!(err.code(), "SESSION_SOLVE_FAILED");
        assert!(err.to_string().contains("0/1 integer"));
    }
}
