// Owning wrappers around the engine's opaque handles
//
// Each wrapper is move-only and releases its handle exactly once in Drop, so a
// released handle can never be used or released again. Constructors read the
// engine's error slot right after a failing call and return the message.

use std::ffi::CStr;
use std::ptr::NonNull;

use tracing::trace;

use super::session::SessionError;
use crate::domain::value_objects::{Outcome, SolverBackend};
use crate::solver::ffi::{self, EngineModel, EngineSolutions, EngineSolver};

fn last_error() -> String {
    // SAFETY: the engine always returns a valid NUL-terminated string.
    unsafe { CStr::from_ptr(ffi::linip_error_string()) }
        .to_string_lossy()
        .into_owned()
}

/// Engine-side parsed copy of a serialized model.
#[derive(Debug)]
pub struct ModelHandle(NonNull<EngineModel>);

impl ModelHandle {
    pub fn create(bytes: &[u8]) -> Result<Self, SessionError> {
        // SAFETY: `bytes` is a live slice of `bytes.len()` bytes.
        let raw = unsafe { ffi::linip_model_create(bytes.as_ptr(), bytes.len()) };
        NonNull::new(raw)
            .map(Self)
            .ok_or_else(|| SessionError::ModelRejected(last_error()))
    }

    pub fn variable_count(&self) -> usize {
        // SAFETY: the handle is live until Drop.
        unsafe { ffi::linip_model_variable_count(self.0.as_ptr()) }
    }
}

impl Drop for ModelHandle {
    fn drop(&mut self) {
        trace!(component = "session", operation = "model_destroy", "Releasing model handle");
        // SAFETY: created by `linip_model_create` and released only here.
        unsafe { ffi::linip_model_destroy(self.0.as_ptr()) }
    }
}

/// Engine solver configured for one backend.
#[derive(Debug)]
pub struct SolverHandle(NonNull<EngineSolver>);

impl SolverHandle {
    pub fn create(backend: SolverBackend) -> Result<Self, SessionError> {
        let raw = ffi::linip_solver_create(backend.code());
        NonNull::new(raw)
            .map(Self)
            .ok_or_else(|| SessionError::UnknownBackend(last_error()))
    }

    pub fn set_time_limit(&mut self, seconds: f64) {
        // SAFETY: the handle is live until Drop.
        unsafe { ffi::linip_solver_set_time_limit(self.0.as_ptr(), seconds) }
    }

    pub fn set_silent(&mut self, silent: bool) {
        // SAFETY: the handle is live until Drop.
        unsafe { ffi::linip_solver_set_silent(self.0.as_ptr(), silent) }
    }
}

impl Drop for SolverHandle {
    fn drop(&mut self) {
        trace!(component = "session", operation = "solver_destroy", "Releasing solver handle");
        // SAFETY: created by `linip_solver_create` and released only here.
        unsafe { ffi::linip_solver_destroy(self.0.as_ptr()) }
    }
}

/// Stream of solutions produced by one solve.
#[derive(Debug)]
pub struct SolutionStreamHandle(NonNull<EngineSolutions>);

impl SolutionStreamHandle {
    /// Start solving. Blocks for as long as the backend needs to set up.
    pub fn solve(solver: &SolverHandle, model: &ModelHandle) -> Result<Self, SessionError> {
        // SAFETY: both handles are live for the duration of the call.
        let raw = unsafe { ffi::linip_solve(solver.0.as_ptr(), model.0.as_ptr()) };
        NonNull::new(raw)
            .map(Self)
            .ok_or_else(|| SessionError::SolveFailed(last_error()))
    }

    /// Copy the next solution into `out`, which must hold one value per variable.
    pub fn next(&mut self, model: &ModelHandle, out: &mut [f64]) -> Result<Outcome, SessionError> {
        // SAFETY: handles are live and `out` is a writable slice of `out.len()` doubles.
        let status = unsafe {
            ffi::linip_solution_get(self.0.as_ptr(), model.0.as_ptr(), out.as_mut_ptr(), out.len())
        };
        match status {
            ffi::LINIP_FOUND => Ok(Outcome::Found),
            ffi::LINIP_EXHAUSTED => Ok(Outcome::Exhausted),
            _ => Err(SessionError::Engine(last_error())),
        }
    }
}

impl Drop for SolutionStreamHandle {
    fn drop(&mut self) {
        trace!(component = "session", operation = "solution_destroy", "Releasing solution handle");
        // SAFETY: created by `linip_solve` and released only here.
        unsafe { ffi::linip_solution_destroy(self.0.as_ptr()) }
    }
}
