// Domain value objects shared by the builder, the engine and the session

use std::fmt;

/// Type of decision variable in the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VariableType {
    /// Continuous real number (x ∈ ℝ)
    #[default]
    Continuous,
    /// Integer number (x ∈ ℤ)
    Integer,
}

impl VariableType {
    pub fn is_integer(self) -> bool {
        matches!(self, VariableType::Integer)
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableType::Continuous => write!(f, "Continuous"),
            VariableType::Integer => write!(f, "Integer"),
        }
    }
}

/// Engine backend selected when a solver handle is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SolverBackend {
    /// MIP solver with enumeration by exclusion cuts
    #[default]
    Default,
    /// Pure-boolean enumerator (all variables must be 0/1 integers)
    Sat,
}

impl SolverBackend {
    /// Variant code used at the C boundary.
    pub fn code(self) -> i32 {
        match self {
            SolverBackend::Default => 0,
            SolverBackend::Sat => 1,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(SolverBackend::Default),
            1 => Some(SolverBackend::Sat),
            _ => None,
        }
    }
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Default => write!(f, "Default"),
            SolverBackend::Sat => write!(f, "SAT"),
        }
    }
}

/// Result of asking a solution stream for its next solution.
///
/// Engine failures are not an outcome; they travel as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A solution was written to the output buffer
    Found,
    /// No (more) feasible solutions; the buffer is unchanged
    Exhausted,
}

impl Outcome {
    pub fn is_found(self) -> bool {
        matches!(self, Outcome::Found)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Found => write!(f, "Found"),
            Outcome::Exhausted => write!(f, "Exhausted"),
        }
    }
}
