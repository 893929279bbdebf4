use tracing::{debug, trace};

use super::constraint::Constraint;
use super::error::{ModelError, Result};
use super::expr::{Term, Variable};
use super::ids::ModelId;
use super::solution::Values;
use super::value_objects::{SolverBackend, VariableType};

/// Closed interval `[lower, upper]`; infinite ends mean unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn unbounded() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Column of the model: bounds, objective cost and type
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRecord {
    pub bounds: Bounds,
    pub cost: f64,
    pub variable_type: VariableType,
}

impl VariableRecord {
    pub fn new(variable_type: VariableType) -> Self {
        Self {
            bounds: Bounds::unbounded(),
            cost: 0.0,
            variable_type,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.variable_type.is_integer()
    }
}

/// General constraint row with at least two variables
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintRecord {
    pub terms: Vec<(usize, f64)>,
    pub bounds: Bounds,
}

impl ConstraintRecord {
    pub fn num_variables(&self) -> usize {
        self.terms.len()
    }
}

/// Configuration for the solver
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    pub time_limit: Option<f64>,
    pub verbose: bool,
}

impl SolverConfig {
    pub fn new(backend: SolverBackend) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// An integer/linear program under construction.
///
/// Variables receive sequential indices starting at zero. Bounds only ever
/// narrow; a single-variable constraint narrows its variable's bound instead of
/// becoming a row. The model also holds the most recently retrieved solution.
#[derive(Debug)]
pub struct Model {
    id: ModelId,
    variables: Vec<VariableRecord>,
    constraints: Vec<ConstraintRecord>,
    objective_constant: f64,
    solution: Option<Vec<f64>>,
}

impl Model {
    pub fn new() -> Self {
        let id = ModelId::fresh();
        debug!(component = "model", operation = "create", %id, "Creating model");
        Self {
            id,
            variables: Vec::new(),
            constraints: Vec::new(),
            objective_constant: 0.0,
            solution: None,
        }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    // ── Variables ───────────────────────────────────────────

    /// Add an unbounded variable with zero cost.
    pub fn add_variable(&mut self, variable_type: VariableType) -> Variable {
        let index = self.variables.len();
        self.variables.push(VariableRecord::new(variable_type));
        trace!(
            component = "model",
            operation = "add_variable",
            index,
            %variable_type,
            "Adding variable"
        );
        Variable::new(index, self.id)
    }

    /// Add an integer variable bounded to `[0, 1]`.
    pub fn add_boolean(&mut self) -> Variable {
        let x = self.add_variable(VariableType::Integer);
        self.variables[x.index()].bounds = Bounds::new(0.0, 1.0);
        x
    }

    pub fn add_boolean_vector(&mut self, n: usize) -> Vec<Variable> {
        (0..n).map(|_| self.add_boolean()).collect()
    }

    /// `m × n` booleans; `grid[i][j]` is the `(i·n + j)`-th created.
    pub fn add_boolean_grid(&mut self, m: usize, n: usize) -> Vec<Vec<Variable>> {
        (0..m).map(|_| self.add_boolean_vector(n)).collect()
    }

    /// `m × n × o` booleans in row-major creation order.
    pub fn add_boolean_cube(&mut self, m: usize, n: usize, o: usize) -> Vec<Vec<Vec<Variable>>> {
        (0..m).map(|_| self.add_boolean_grid(n, o)).collect()
    }

    /// Intersect the bound of `x` with `[lb, ub]`; `None` keeps that side.
    ///
    /// Fails without changing the model if the intersection is empty.
    pub fn add_bounds(&mut self, lb: Option<f64>, x: Variable, ub: Option<f64>) -> Result<()> {
        let record = self.record_mut(x)?;
        let mut bounds = record.bounds;
        if let Some(lb) = lb {
            bounds.lower = bounds.lower.max(lb);
        }
        if let Some(ub) = ub {
            bounds.upper = bounds.upper.min(ub);
        }
        if bounds.is_empty() {
            return Err(ModelError::EmptyBound {
                index: x.index(),
                lower: bounds.lower,
                upper: bounds.upper,
            });
        }
        record.bounds = bounds;
        trace!(
            component = "model",
            operation = "add_bounds",
            index = x.index(),
            lower = bounds.lower,
            upper = bounds.upper,
            "Narrowed variable bounds"
        );
        Ok(())
    }

    // ── Constraints ─────────────────────────────────────────

    /// Add `c` to the model.
    ///
    /// A constraint on one variable `k·x` becomes the bound `[lower/k, upper/k]`
    /// on `x` (ends swapped for negative `k`). A constraint without variables
    /// always holds and adds nothing.
    pub fn add_constraint(&mut self, c: Constraint) -> Result<()> {
        if let Some(owner) = c.model() {
            self.check_owner(owner)?;
        }
        for index in c.terms().keys() {
            self.check_index(*index)?;
        }

        if c.is_tautology() {
            debug!(
                component = "model",
                operation = "add_constraint",
                status = "skipped",
                "Constraint without variables always holds"
            );
            return Ok(());
        }

        if let Some((&index, &k)) = c.terms().single() {
            let mut lb = c.lower().map(|lb| lb / k);
            let mut ub = c.upper().map(|ub| ub / k);
            if k < 0.0 {
                std::mem::swap(&mut lb, &mut ub);
            }
            return self.add_bounds(lb, Variable::new(index, self.id), ub);
        }

        let record = ConstraintRecord {
            terms: c.terms().iter().map(|(i, k)| (*i, *k)).collect(),
            bounds: Bounds::new(
                c.lower().unwrap_or(f64::NEG_INFINITY),
                c.upper().unwrap_or(f64::INFINITY),
            ),
        };
        trace!(
            component = "model",
            operation = "add_constraint",
            row = self.constraints.len(),
            num_terms = record.terms.len(),
            lower = record.bounds.lower,
            upper = record.bounds.upper,
            "Adding constraint row"
        );
        self.constraints.push(record);
        Ok(())
    }

    // ── Objective ───────────────────────────────────────────

    /// Accumulate an objective term (the objective is minimized).
    ///
    /// - a variable adds 1 to its cost,
    /// - a sum adds its constant to the objective constant and *sets* the
    ///   cost of each variable it mentions to its coefficient,
    /// - a number adds to the objective constant.
    pub fn add_objective(&mut self, term: impl Into<Term>) -> Result<()> {
        match term.into() {
            Term::Literal(value) => {
                self.objective_constant += value;
            }
            Term::Variable(x) => {
                self.record_mut(x)?.cost += 1.0;
            }
            Term::Linear(sum) => {
                if let Some(owner) = sum.model() {
                    self.check_owner(owner)?;
                }
                for (index, _) in sum.raw_coefficients() {
                    self.check_index(index)?;
                }
                self.objective_constant += sum.constant();
                for (index, coefficient) in sum.raw_coefficients() {
                    self.variables[index].cost = coefficient;
                }
            }
        }
        Ok(())
    }

    // ── Inspection ──────────────────────────────────────────

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn variables(&self) -> &[VariableRecord] {
        &self.variables
    }

    pub fn variable(&self, x: Variable) -> Result<&VariableRecord> {
        self.check_owner(x.model())?;
        self.check_index(x.index())?;
        Ok(&self.variables[x.index()])
    }

    pub fn constraints(&self) -> &[ConstraintRecord] {
        &self.constraints
    }

    pub fn objective_constant(&self) -> f64 {
        self.objective_constant
    }

    // ── Solution ────────────────────────────────────────────

    /// The most recently retrieved solution, one value per variable.
    pub fn solution(&self) -> Option<&[f64]> {
        self.solution.as_deref()
    }

    pub fn has_solution(&self) -> bool {
        self.solution.is_some()
    }

    pub fn clear_solution(&mut self) {
        self.solution = None;
    }

    pub(crate) fn set_solution(&mut self, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.variables.len());
        self.solution = Some(values);
    }

    fn check_owner(&self, owner: ModelId) -> Result<()> {
        if owner != self.id {
            return Err(ModelError::ModelMismatch {
                left: self.id,
                right: owner,
            });
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.variables.len() {
            return Err(ModelError::UnknownVariable {
                index,
                len: self.variables.len(),
            });
        }
        Ok(())
    }

    fn record_mut(&mut self, x: Variable) -> Result<&mut VariableRecord> {
        self.check_owner(x.model())?;
        self.check_index(x.index())?;
        Ok(&mut self.variables[x.index()])
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Values for Model {
    fn model_id(&self) -> ModelId {
        self.id
    }

    fn value_at(&self, index: usize) -> Result<f64> {
        let solution = self.solution.as_ref().ok_or(ModelError::NoSolution)?;
        solution.get(index).copied().ok_or(ModelError::UnknownVariable {
            index,
            len: solution.len(),
        })
    }
}
