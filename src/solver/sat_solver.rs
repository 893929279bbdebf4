// SAT-style backend for pure 0/1 models
// Depth-first branch-and-bound with row-activity propagation; no external solver needed

use crate::domain::{
    models::SolverConfig,
    problem::Problem,
    solver_service::{EngineError, Result, SolutionStream, SolverService},
};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

const FEASIBILITY_TOLERANCE: f64 = 1e-9;

pub struct SatSolver;

impl SatSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for SatSolver {
    fn solve(&self, problem: &Problem, config: &SolverConfig) -> Result<Box<dyn SolutionStream>> {
        self.validate(problem)?;
        if let Some((i, column)) = problem
            .columns
            .iter()
            .enumerate()
            .find(|(_, c)| !c.is_boolean())
        {
            return Err(EngineError::Unsupported(format!(
                "The SAT backend needs 0/1 integer variables; variable {i} is {} with bound [{}, {}]",
                if column.integer { "integer" } else { "continuous" },
                column.lower,
                column.upper
            )));
        }
        debug!(
            component = "solver",
            operation = "solve",
            backend = self.name(),
            num_variables = problem.num_variables(),
            num_rows = problem.num_rows(),
            "Starting solution stream"
        );
        let deadline = config
            .time_limit
            .map(|seconds| Instant::now() + Duration::from_secs_f64(seconds.max(0.0)));
        Ok(Box::new(SatSolutions::new(Search::new(problem.clone(), deadline))))
    }

    fn name(&self) -> &str {
        "SAT"
    }

    fn supports_mip(&self) -> bool {
        false
    }
}

/// Partial assignment with running activity bounds for every row.
struct Node {
    values: Vec<u8>,
    min_activity: Vec<f64>,
    max_activity: Vec<f64>,
    objective_min: f64,
}

/// Immutable search data for one problem.
struct Search {
    problem: Problem,
    /// Allowed values per variable, `lo..=hi` within `{0, 1}`.
    domains: Vec<(u8, u8)>,
    /// Rows touched by each variable, with the coefficient.
    incidence: Vec<Vec<(usize, f64)>>,
    deadline: Option<Instant>,
    nodes: u64,
}

impl Search {
    fn new(problem: Problem, deadline: Option<Instant>) -> Self {
        let domains = problem
            .columns
            .iter()
            .map(|c| {
                let (lo, hi) = (c.lower.ceil().max(0.0), c.upper.floor().min(1.0));
                // Empty domains are kept as (1, 0); casting a negative bound saturates to 0.
                if lo > hi {
                    (1, 0)
                } else {
                    (lo as u8, hi as u8)
                }
            })
            .collect();
        let mut incidence = vec![Vec::new(); problem.num_variables()];
        for (r, row) in problem.rows.iter().enumerate() {
            for &(i, k) in &row.terms {
                incidence[i].push((r, k));
            }
        }
        Self {
            problem,
            domains,
            incidence,
            deadline,
            nodes: 0,
        }
    }

    fn has_empty_domain(&self) -> bool {
        self.domains.iter().any(|(lo, hi)| lo > hi)
    }

    fn root(&self) -> Node {
        let mut min_activity = vec![0.0; self.problem.num_rows()];
        let mut max_activity = vec![0.0; self.problem.num_rows()];
        let mut objective_min = 0.0;
        for (i, &(lo, hi)) in self.domains.iter().enumerate() {
            let (lo, hi) = (f64::from(lo), f64::from(hi));
            for &(r, k) in &self.incidence[i] {
                min_activity[r] += (k * lo).min(k * hi);
                max_activity[r] += (k * lo).max(k * hi);
            }
            let cost = self.problem.columns[i].cost;
            objective_min += (cost * lo).min(cost * hi);
        }
        Node {
            values: Vec::with_capacity(self.domains.len()),
            min_activity,
            max_activity,
            objective_min,
        }
    }

    fn row_violated(&self, node: &Node, r: usize) -> bool {
        let row = &self.problem.rows[r];
        node.min_activity[r] > row.upper + FEASIBILITY_TOLERANCE
            || node.max_activity[r] < row.lower - FEASIBILITY_TOLERANCE
    }

    fn root_is_feasible(&self, node: &Node) -> bool {
        (0..self.problem.num_rows()).all(|r| !self.row_violated(node, r))
    }

    /// Replace the free contribution of variable `i` with `value`, or undo that.
    fn shift(&self, node: &mut Node, i: usize, value: u8, undo: bool) {
        let (lo, hi) = (f64::from(self.domains[i].0), f64::from(self.domains[i].1));
        let v = f64::from(value);
        let sign = if undo { -1.0 } else { 1.0 };
        for &(r, k) in &self.incidence[i] {
            node.min_activity[r] += sign * (k * v - (k * lo).min(k * hi));
            node.max_activity[r] += sign * (k * v - (k * lo).max(k * hi));
        }
        let cost = self.problem.columns[i].cost;
        node.objective_min += sign * (cost * v - (cost * lo).min(cost * hi));
    }

    /// Visit every feasible full assignment whose objective can stay within `bound`.
    ///
    /// `on_leaf` may lower `bound` and returns true to stop the search.
    fn dfs(
        &mut self,
        node: &mut Node,
        bound: &mut f64,
        on_leaf: &mut dyn FnMut(&[u8], f64, &mut f64) -> bool,
    ) -> Result<bool> {
        self.nodes += 1;
        if let Some(deadline) = self.deadline {
            if self.nodes % 1024 == 0 && Instant::now() > deadline {
                return Err(EngineError::Backend("SAT backend reached its time limit".into()));
            }
        }

        let depth = node.values.len();
        if depth == self.domains.len() {
            let objective = node.objective_min;
            return Ok(on_leaf(&node.values, objective, bound));
        }

        let (lo, hi) = self.domains[depth];
        // Cheaper value first.
        let order: [u8; 2] = if self.problem.columns[depth].cost < 0.0 {
            [1, 0]
        } else {
            [0, 1]
        };
        for value in order.into_iter().filter(|v| (lo..=hi).contains(v)) {
            self.shift(node, depth, value, false);
            let feasible = node.objective_min <= *bound + FEASIBILITY_TOLERANCE
                && self.incidence[depth]
                    .iter()
                    .all(|&(r, _)| !self.row_violated(node, r));
            if feasible {
                node.values.push(value);
                let stop = self.dfs(node, bound, on_leaf)?;
                node.values.pop();
                if stop {
                    self.shift(node, depth, value, true);
                    return Ok(true);
                }
            }
            self.shift(node, depth, value, true);
        }
        Ok(false)
    }

    /// Smallest objective over all feasible assignments, without the constant.
    fn optimum(&mut self) -> Result<Option<f64>> {
        let mut node = self.root();
        if self.problem.has_empty_bounds()
            || self.has_empty_domain()
            || !self.root_is_feasible(&node)
        {
            return Ok(None);
        }
        let mut best = None;
        let mut bound = f64::INFINITY;
        self.dfs(&mut node, &mut bound, &mut |_, objective, bound| {
            if objective < *bound - FEASIBILITY_TOLERANCE || best.is_none() {
                *bound = objective;
                best = Some(objective);
            }
            false
        })?;
        Ok(best)
    }

    /// First optimal assignment not in `blocked`.
    fn next_optimal(&mut self, optimum: f64, blocked: &HashSet<Vec<u8>>) -> Result<Option<Vec<u8>>> {
        let mut node = self.root();
        let mut found = None;
        let mut bound = optimum;
        self.dfs(&mut node, &mut bound, &mut |values, _, _| {
            if blocked.contains(values) {
                return false;
            }
            found = Some(values.to_vec());
            true
        })?;
        Ok(found)
    }
}

/// Solution stream enumerating distinct optimal assignments.
struct SatSolutions {
    search: Search,
    optimum: Option<Option<f64>>,
    blocked: HashSet<Vec<u8>>,
}

impl SatSolutions {
    fn new(search: Search) -> Self {
        Self {
            search,
            optimum: None,
            blocked: HashSet::new(),
        }
    }
}

impl SolutionStream for SatSolutions {
    fn next_solution(&mut self) -> Result<Option<Vec<f64>>> {
        let optimum = match self.optimum {
            Some(optimum) => optimum,
            None => {
                let optimum = self.search.optimum()?;
                trace!(
                    component = "solver",
                    operation = "optimize",
                    nodes = self.search.nodes,
                    ?optimum,
                    "Optimal objective determined"
                );
                self.optimum = Some(optimum);
                optimum
            }
        };
        let Some(optimum) = optimum else {
            return Ok(None);
        };

        match self.search.next_optimal(optimum, &self.blocked)? {
            Some(values) => {
                let solution = values.iter().map(|&v| f64::from(v)).collect();
                self.blocked.insert(values);
                debug!(
                    component = "solver",
                    operation = "next_solution",
                    status = "found",
                    count = self.blocked.len(),
                    "Solution found"
                );
                Ok(Some(solution))
            }
            None => {
                debug!(
                    component = "solver",
                    operation = "next_solution",
                    status = "exhausted",
                    count = self.blocked.len(),
                    "No further solution"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::domain::problem::{Column, Row};

    fn boolean(cost: f64) -> Column {
        Column {
            lower: 0.0,
            upper: 1.0,
            cost,
            integer: true,
        }
    }

    fn stream(problem: &Problem) -> Box<dyn SolutionStream> {
        SatSolver::new()
            .solve(problem, &SolverConfig::default())
            .unwrap()
    }

    fn drain(stream: &mut dyn SolutionStream) -> Vec<Vec<f64>> {
        let mut all = Vec::new();
        while let Some(values) = stream.next_solution().unwrap() {
            all.push(values);
        }
        all
    }

    #[test]
    fn covering_constraint_has_seven_solutions() {
        let problem = Problem {
            columns: vec![boolean(0.0), boolean(0.0), boolean(0.0)],
            rows: vec![Row {
                terms: vec![(0, 1.0), (1, 1.0), (2, 1.0)],
                lower: 1.0,
                upper: f64::INFINITY,
            }],
            objective_constant: 0.0,
        };
        let all = drain(stream(&problem).as_mut());
        assert_eq!(all.len(), 7);
        let distinct: HashSet<Vec<u64>> = all
            .iter()
            .map(|v| v.iter().map(|x| x.to_bits()).collect())
            .collect();
        assert_eq!(distinct.len(), 7);
        assert!(!all.contains(&vec![0.0, 0.0, 0.0]));
    }

    #[test]
    fn only_optimal_assignments_are_enumerated() {
        // minimize -x0 - x1 subject to x0 + x1 + x2 <= 2
        let problem = Problem {
            columns: vec![boolean(-1.0), boolean(-1.0), boolean(0.0)],
            rows: vec![Row {
                terms: vec![(0, 1.0), (1, 1.0), (2, 1.0)],
                lower: f64::NEG_INFINITY,
                upper: 2.0,
            }],
            objective_constant: 0.0,
        };
        let all = drain(stream(&problem).as_mut());
        assert_eq!(all, vec![vec![1.0, 1.0, 0.0]]);
    }

    #[test]
    fn contradictory_rows_are_exhausted() {
        let problem = Problem {
            columns: vec![boolean(0.0), boolean(0.0)],
            rows: vec![
                Row {
                    terms: vec![(0, 1.0), (1, 1.0)],
                    lower: f64::NEG_INFINITY,
                    upper: 0.0,
                },
                Row {
                    terms: vec![(0, 1.0), (1, 1.0)],
                    lower: 1.0,
                    upper: f64::INFINITY,
                },
            ],
            objective_constant: 0.0,
        };
        let mut solutions = stream(&problem);
        assert_eq!(solutions.next_solution().unwrap(), None);
        assert_eq!(solutions.next_solution().unwrap(), None);
    }

    #[test]
    fn negative_upper_bound_is_infeasible() {
        let problem = Problem {
            columns: vec![Column {
                lower: 0.0,
                upper: -0.5,
                cost: 0.0,
                integer: true,
            }],
            rows: vec![],
            objective_constant: 0.0,
        };
        let mut solutions = stream(&problem);
        assert_eq!(solutions.next_solution().unwrap(), None);
    }

    #[test]
    fn fixed_variables_are_respected() {
        let problem = Problem {
            columns: vec![
                Column {
                    lower: 1.0,
                    upper: 1.0,
                    cost: 0.0,
                    integer: true,
                },
                boolean(0.0),
            ],
            rows: vec![],
            objective_constant: 0.0,
        };
        let all = drain(stream(&problem).as_mut());
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|v| v[0] == 1.0));
    }

    #[test]
    fn empty_model_has_one_solution() {
        let mut solutions = stream(&Problem::default());
        assert_eq!(solutions.next_solution().unwrap(), Some(vec![]));
        assert_eq!(solutions.next_solution().unwrap(), None);
    }

    #[test]
    fn continuous_variables_are_rejected() {
        let problem = Problem {
            columns: vec![Column {
                lower: 0.0,
                upper: 1.0,
                cost: 0.0,
                integer: false,
            }],
            rows: vec![],
            objective_constant: 0.0,
        };
        let err = SatSolver::new()
            .solve(&problem, &SolverConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.code(), "ENGINE_UNSUPPORTED");
        assert!(err.to_string().contains("continuous"));
    }
}
