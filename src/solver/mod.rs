// Engine backends and the C surface they are reached through

pub mod factory;
pub mod ffi;
#[cfg(feature = "highs")]
pub mod highs_solver;
pub mod sat_solver;

pub use factory::SolverFactory;
#[cfg(feature = "highs")]
pub use highs_solver::HighsSolver;
pub use sat_solver::SatSolver;
