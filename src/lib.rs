// Domain layer: modeling core and engine contract
pub mod domain;

// Application layer: wire messages and mapping
pub mod application;

// Infrastructure layer: engine handles, sessions, remote solving
pub mod infrastructure;

// Engine backends and their C surface
pub mod solver;

pub mod frozen;
pub mod logging;
pub mod record_stream;

// Re-export commonly used types
pub use domain::{
    Bounds, Constraint, FixedModel, Model, ModelError, ModelId, Outcome, SolverBackend,
    SolverConfig, Sum, Term, Values, Variable, VariableType,
};

pub use frozen::FrozenMap;
pub use infrastructure::{
    CloudConfig, CloudError, CloudSolver, JobService, SessionError, SolutionProvider, Solutions,
    Solver,
};
pub use logging::init_logging;
