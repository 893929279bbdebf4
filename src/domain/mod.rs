// Domain module: modeling core and engine contract

pub mod constraint;
pub mod error;
pub mod expr;
pub mod ids;
pub mod models;
pub mod problem;
pub mod solution;
pub mod solver_service;
pub mod value_objects;

pub use constraint::Constraint;
pub use error::ModelError;
pub use expr::{Sum, Term, Variable};
pub use ids::ModelId;
pub use models::*;
pub use problem::{Column, Problem, Row};
pub use solution::{FixedModel, Values};
pub use solver_service::{EngineError, SolutionStream, SolverService};
pub use value_objects::*;
