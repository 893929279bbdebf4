// Infrastructure layer: engine handles, solving sessions and the remote provider

pub mod cloud;
pub mod handles;
pub mod session;

pub use cloud::{CloudConfig, CloudError, CloudSolutions, CloudSolver, JobService};
pub use handles::{ModelHandle, SolutionStreamHandle, SolverHandle};
pub use session::{SessionError, SolutionProvider, Solutions, Solver};
