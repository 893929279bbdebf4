// # C surface of the solving engine
//
// Opaque handles for a parsed model, a configured solver and a solution stream,
// each created by one factory function and released by one destroy function.
//
// ## Usage Lifecycle
//
// 1.  `linip_model_create` parses serialized model bytes.
// 2.  `linip_solver_create` selects a backend variant (`0` default, `1` SAT).
// 3.  `linip_solve` starts a solution stream for a solver and a model.
// 4.  `linip_solution_get` copies successive solutions into a caller buffer and
//     returns `LINIP_FOUND`, `LINIP_EXHAUSTED` or `LINIP_ERROR`.
// 5.  Every handle is released with its matching `*_destroy` function.
//
// ## Errors
//
// Failing calls return a null handle or `LINIP_ERROR` and store a message that
// `linip_error_string` returns until the next failing call on that thread. Passing a null
// handle where a live one is required aborts the process.

use crate::application::mappers::decode_problem;
use crate::domain::{
    models::SolverConfig,
    problem::Problem,
    solver_service::{EngineError, SolutionStream, SolverService},
};
use crate::solver::SolverFactory;
use libc::{c_char, c_int};
use std::any::Any;
use std::cell::RefCell;
use std::ffi::CString;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

pub const LINIP_FOUND: c_int = 0;
pub const LINIP_EXHAUSTED: c_int = 1;
pub const LINIP_ERROR: c_int = 2;

thread_local! {
    // One slot per thread, like errno.
    static ERROR_STRING: RefCell<Option<CString>> = const { RefCell::new(None) };
}

static EMPTY: [c_char; 1] = [0];

fn set_error(message: impl Into<String>) {
    let message: String = message.into();
    warn!(component = "engine", status = "error", %message, "Engine call failed");
    let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
    ERROR_STRING.with(|slot| *slot.borrow_mut() = Some(message));
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("Engine panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("Engine panicked: {message}")
    } else {
        "Engine panicked".to_string()
    }
}

/// Parsed model owned by the engine.
pub struct EngineModel {
    problem: Problem,
}

/// Backend together with its configuration.
pub struct EngineSolver {
    service: Arc<dyn SolverService>,
    config: SolverConfig,
}

/// Solution stream of one solve.
pub struct EngineSolutions {
    stream: Box<dyn SolutionStream>,
    num_variables: usize,
}

/// Parses serialized model bytes into a new model handle.
///
/// Returns null and sets the error string if the bytes are not a valid model.
///
/// # Safety
///
/// `data` must point to `len` readable bytes, or be null with `len == 0`.
#[no_mangle]
pub unsafe extern "C" fn linip_model_create(data: *const u8, len: usize) -> *mut EngineModel {
    let bytes: &[u8] = if len == 0 {
        &[]
    } else {
        assert!(
            !data.is_null(),
            "called `linip_model_create` with null data and length {len}"
        );
        std::slice::from_raw_parts(data, len)
    };
    match decode_problem(bytes) {
        Ok(problem) => {
            debug!(
                component = "engine",
                operation = "model_create",
                num_variables = problem.num_variables(),
                "Model handle created"
            );
            Box::into_raw(Box::new(EngineModel { problem }))
        }
        Err(e) => {
            set_error(e.to_string());
            std::ptr::null_mut()
        }
    }
}

/// Frees a model handle.
///
/// # Safety
///
/// `model` must be null or a handle returned by `linip_model_create` that has
/// not been destroyed.
#[no_mangle]
pub unsafe extern "C" fn linip_model_destroy(model: *mut EngineModel) {
    if !model.is_null() {
        drop(Box::from_raw(model));
        debug!(component = "engine", operation = "model_destroy", "Model handle destroyed");
    }
}

/// Number of variables in a model.
///
/// # Safety
///
/// `model` must be a live handle returned by `linip_model_create`.
#[no_mangle]
pub unsafe extern "C" fn linip_model_variable_count(model: *const EngineModel) -> usize {
    assert!(
        !model.is_null(),
        "called `linip_model_variable_count` with null pointer"
    );
    (*model).problem.num_variables()
}

/// Creates a solver for a backend variant: `0` default, `1` SAT.
///
/// Returns null and sets the error string for an unknown or unavailable variant.
#[no_mangle]
pub extern "C" fn linip_solver_create(variant: c_int) -> *mut EngineSolver {
    match SolverFactory::create_from_code(variant) {
        Ok(service) => {
            debug!(
                component = "engine",
                operation = "solver_create",
                backend = service.name(),
                "Solver handle created"
            );
            let config = SolverConfig::default();
            Box::into_raw(Box::new(EngineSolver { service, config }))
        }
        Err(e) => {
            set_error(e.to_string());
            std::ptr::null_mut()
        }
    }
}

/// Sets a wall-clock limit in seconds; zero or less removes it.
///
/// # Safety
///
/// `solver` must be a live handle returned by `linip_solver_create`.
#[no_mangle]
pub unsafe extern "C" fn linip_solver_set_time_limit(solver: *mut EngineSolver, seconds: f64) {
    assert!(
        !solver.is_null(),
        "called `linip_solver_set_time_limit` with null pointer"
    );
    let solver = &mut *solver;
    solver.config.time_limit = (seconds > 0.0).then_some(seconds);
}

/// Turns backend console output off (`true`) or on (`false`).
///
/// # Safety
///
/// `solver` must be a live handle returned by `linip_solver_create`.
#[no_mangle]
pub unsafe extern "C" fn linip_solver_set_silent(solver: *mut EngineSolver, silent: bool) {
    assert!(
        !solver.is_null(),
        "called `linip_solver_set_silent` with null pointer"
    );
    let solver = &mut *solver;
    solver.config.verbose = !silent;
}

/// Frees a solver handle.
///
/// # Safety
///
/// `solver` must be null or a handle returned by `linip_solver_create` that has
/// not been destroyed.
#[no_mangle]
pub unsafe extern "C" fn linip_solver_destroy(solver: *mut EngineSolver) {
    if !solver.is_null() {
        drop(Box::from_raw(solver));
        debug!(component = "engine", operation = "solver_destroy", "Solver handle destroyed");
    }
}

/// Starts solving `model` with `solver`.
///
/// The returned stream does not borrow either handle. Returns null and sets the
/// error string if the backend rejects the model.
///
/// # Safety
///
/// `solver` and `model` must be live handles.
#[no_mangle]
pub unsafe extern "C" fn linip_solve(
    solver: *const EngineSolver,
    model: *const EngineModel,
) -> *mut EngineSolutions {
    assert!(!solver.is_null(), "called `linip_solve` with null solver");
    assert!(!model.is_null(), "called `linip_solve` with null model");
    let solver = &*solver;
    let problem = &(*model).problem;

    let started = catch_unwind(AssertUnwindSafe(|| {
        solver.service.solve(problem, &solver.config)
    }));
    match started {
        Ok(Ok(stream)) => {
            debug!(
                component = "engine",
                operation = "solve",
                backend = solver.service.name(),
                "Solution stream created"
            );
            Box::into_raw(Box::new(EngineSolutions {
                stream,
                num_variables: problem.num_variables(),
            }))
        }
        Ok(Err(e)) => {
            set_error(e.to_string());
            std::ptr::null_mut()
        }
        Err(payload) => {
            set_error(panic_message(payload));
            std::ptr::null_mut()
        }
    }
}

/// Copies the next solution into `out`.
///
/// Returns `LINIP_FOUND` with `out` filled, `LINIP_EXHAUSTED` with `out`
/// untouched when there are no more solutions, or `LINIP_ERROR` with the error
/// string set. `len` must equal the model's variable count.
///
/// # Safety
///
/// `solutions` and `model` must be live handles and `out` must point to `len`
/// writable doubles (it may be null when `len == 0`).
#[no_mangle]
pub unsafe extern "C" fn linip_solution_get(
    solutions: *mut EngineSolutions,
    model: *const EngineModel,
    out: *mut f64,
    len: usize,
) -> c_int {
    assert!(
        !solutions.is_null(),
        "called `linip_solution_get` with null solutions"
    );
    assert!(!model.is_null(), "called `linip_solution_get` with null model");
    let solutions = &mut *solutions;
    let expected = (*model).problem.num_variables();

    if len != expected || solutions.num_variables != expected {
        set_error(
            EngineError::BufferLength {
                expected,
                actual: len,
            }
            .to_string(),
        );
        return LINIP_ERROR;
    }

    let next = catch_unwind(AssertUnwindSafe(|| solutions.stream.next_solution()));
    match next {
        Ok(Ok(Some(values))) => {
            if values.len() != len {
                set_error(format!(
                    "Backend produced {} values for {len} variables",
                    values.len()
                ));
                return LINIP_ERROR;
            }
            if len > 0 {
                assert!(!out.is_null(), "called `linip_solution_get` with null buffer");
                std::slice::from_raw_parts_mut(out, len).copy_from_slice(&values);
            }
            LINIP_FOUND
        }
        Ok(Ok(None)) => LINIP_EXHAUSTED,
        Ok(Err(e)) => {
            set_error(e.to_string());
            LINIP_ERROR
        }
        Err(payload) => {
            set_error(panic_message(payload));
            LINIP_ERROR
        }
    }
}

/// Frees a solution stream.
///
/// # Safety
///
/// `solutions` must be null or a handle returned by `linip_solve` that has not
/// been destroyed.
#[no_mangle]
pub unsafe extern "C" fn linip_solution_destroy(solutions: *mut EngineSolutions) {
    if !solutions.is_null() {
        drop(Box::from_raw(solutions));
        debug!(component = "engine", operation = "solution_destroy", "Solution handle destroyed");
    }
}

/// Message of the most recent failing call, or an empty string.
///
/// The slot is per thread. The pointer stays valid until the next failing call
/// on the same thread.
#[no_mangle]
pub extern "C" fn linip_error_string() -> *const c_char {
    ERROR_STRING.with(|slot| match slot.borrow().as_ref() {
        Some(message) => message.as_ptr(),
        None => EMPTY.as_ptr(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{models::Model, value_objects::VariableType};
    use std::ffi::CStr;

    fn error_string() -> String {
        unsafe { CStr::from_ptr(linip_error_string()) }
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn invalid_bytes_give_null_and_message() {
        let bytes = [0xffu8, 0xff, 0xff];
        let model = unsafe { linip_model_create(bytes.as_ptr(), bytes.len()) };
        assert!(model.is_null());
        assert!(error_string().contains("Could not parse model"));
    }

    #[test]
    fn unknown_variant_gives_null() {
        let solver = linip_solver_create(17);
        assert!(solver.is_null());
        assert!(error_string().contains("17"));
    }

    #[test]
    fn wrong_buffer_length_is_an_error() {
        let mut builder = Model::new();
        builder.add_boolean();
        builder.add_boolean();
        let bytes = builder.serialize();
        unsafe {
            let model = linip_model_create(bytes.as_ptr(), bytes.len());
            assert_eq!(linip_model_variable_count(model), 2);
            let solver = linip_solver_create(1);
            let solutions = linip_solve(solver, model);
            assert!(!solutions.is_null());
            let mut out = [0.0; 1];
            let status = linip_solution_get(solutions, model, out.as_mut_ptr(), out.len());
            assert_eq!(status, LINIP_ERROR);
            assert!(error_string().contains("length 1"));
            linip_solution_destroy(solutions);
            linip_solver_destroy(solver);
            linip_model_destroy(model);
        }
    }

    #[test]
    fn sat_variant_rejects_continuous_model() {
        let mut builder = Model::new();
        builder.add_variable(VariableType::Continuous);
        let bytes = builder.serialize();
        unsafe {
            let model = linip_model_create(bytes.as_ptr(), bytes.len());
            let solver = linip_solver_create(1);
            linip_solver_set_time_limit(solver, 5.0);
            linip_solver_set_silent(solver, true);
            let solutions = linip_solve(solver, model);
            assert!(solutions.is_null());
            assert!(error_string().contains("continuous"));
            linip_solver_destroy(solver);
            linip_model_destroy(model);
        }
    }

    #[test]
    fn empty_model_is_found_once() {
        let bytes = Model::new().serialize();
        unsafe {
            let model = linip_model_create(bytes.as_ptr(), bytes.len());
            assert!(!model.is_null());
            let solver = linip_solver_create(1);
            let solutions = linip_solve(solver, model);
            let out = std::ptr::null_mut();
            assert_eq!(linip_solution_get(solutions, model, out, 0), LINIP_FOUND);
            assert_eq!(linip_solution_get(solutions, model, out, 0), LINIP_EXHAUSTED);
            linip_solution_destroy(solutions);
            linip_solver_destroy(solver);
            linip_model_destroy(model);
        }
    }
}
