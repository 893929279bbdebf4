// HiGHS Solver Adapter
// Implements the SolverService interface for HiGHS
// Successive solutions are enumerated by adding exclusion cuts and re-solving

use crate::domain::{
    models::SolverConfig,
    problem::{Problem, Row},
    solver_service::{EngineError, Result, SolutionStream, SolverService},
};
use highs::{HighsModelStatus, RowProblem, Sense};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Integer columns closer than this to an integer are reported as that integer.
const INTEGRALITY_TOLERANCE: f64 = 1e-5;

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for HighsSolver {
    fn solve(&self, problem: &Problem, config: &SolverConfig) -> Result<Box<dyn SolutionStream>> {
        // Validate first
        self.validate(problem)?;
        debug!(
            component = "solver",
            operation = "solve",
            backend = self.name(),
            num_variables = problem.num_variables(),
            num_rows = problem.num_rows(),
            "Starting solution stream"
        );
        Ok(Box::new(HighsSolutions::new(problem.clone(), config.clone())))
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}

/// Solution stream over one HiGHS problem.
///
/// The first call solves the problem as given. Every later call adds a cut
/// excluding the previous 0/1 assignment and a row pinning the objective to the
/// first optimum, then solves again.
pub struct HighsSolutions {
    problem: Problem,
    config: SolverConfig,
    cuts: Vec<Row>,
    optimum: Option<f64>,
    previous: Option<Vec<f64>>,
    exhausted: bool,
}

impl HighsSolutions {
    fn new(problem: Problem, config: SolverConfig) -> Self {
        let exhausted = problem.has_empty_bounds();
        if exhausted {
            debug!(
                component = "solver",
                operation = "solve",
                status = "infeasible",
                "Model has an empty interval; no solution exists"
            );
        }
        Self {
            problem,
            config,
            cuts: Vec::new(),
            optimum: None,
            previous: None,
            exhausted,
        }
    }

    /// Rows forcing the next solution to differ from `previous` with the same objective.
    fn add_enumeration_rows(&mut self, previous: &[f64]) -> Result<()> {
        let mut terms = Vec::new();
        let mut lower = 1.0;
        for (i, column) in self.problem.columns.iter().enumerate() {
            if !column.integer {
                continue;
            }
            if !column.is_boolean() {
                return Err(EngineError::Unsupported(format!(
                    "Enumerating solutions needs 0/1 integer variables, variable {i} has bound [{}, {}]",
                    column.lower, column.upper
                )));
            }
            if previous[i] > 0.5 {
                terms.push((i, -1.0));
                lower -= 1.0;
            } else {
                terms.push((i, 1.0));
            }
        }
        self.cuts.push(Row {
            terms,
            lower,
            upper: f64::INFINITY,
        });

        if self.optimum.is_none() {
            let objective = self.problem.objective_value(previous) - self.problem.objective_constant;
            let slack = 1e-6 * objective.abs().max(1.0);
            self.cuts.push(Row {
                terms: self
                    .problem
                    .columns
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.cost != 0.0)
                    .map(|(i, c)| (i, c.cost))
                    .collect(),
                lower: objective - slack,
                upper: objective + slack,
            });
            self.optimum = Some(objective);
        }
        trace!(
            component = "solver",
            operation = "add_cut",
            num_cuts = self.cuts.len(),
            "Excluding previous solution"
        );
        Ok(())
    }

    fn run(&self) -> Result<Option<Vec<f64>>> {
        let start_time = Instant::now();
        let mut pb = RowProblem::default();
        let mut cols = Vec::with_capacity(self.problem.num_variables());

        for column in &self.problem.columns {
            let col = if column.integer {
                pb.add_integer_column(column.cost, column.lower..=column.upper)
            } else {
                pb.add_column(column.cost, column.lower..=column.upper)
            };
            cols.push(col);
        }

        for row in self.problem.rows.iter().chain(&self.cuts) {
            let terms: Vec<_> = row.terms.iter().map(|&(i, k)| (cols[i], k)).collect();
            pb.add_row(row.lower..=row.upper, &terms);
        }

        let mut model = pb.optimise(Sense::Minimise);
        if !self.config.verbose {
            model.make_quiet();
        }
        if let Some(limit) = self.config.time_limit {
            model.set_option("time_limit", limit);
        }

        let solved = model
            .try_solve()
            .map_err(|status| EngineError::Backend(format!("HiGHS failed to run: {status:?}")))?;
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;

        // Process result
        match solved.status() {
            HighsModelStatus::Optimal => {
                let values = solved
                    .get_solution()
                    .columns()
                    .iter()
                    .zip(&self.problem.columns)
                    .map(|(&value, column)| snap(value, column.integer))
                    .collect();
                debug!(
                    component = "solver",
                    operation = "solve",
                    status = "found",
                    solve_time_ms = solve_time,
                    "Solution found"
                );
                Ok(Some(values))
            }
            HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
                debug!(
                    component = "solver",
                    operation = "solve",
                    status = "exhausted",
                    solve_time_ms = solve_time,
                    "No further solution"
                );
                Ok(None)
            }
            status => {
                warn!(
                    component = "solver",
                    operation = "solve",
                    status = "error",
                    ?status,
                    "HiGHS did not reach a conclusion"
                );
                Err(EngineError::Backend(format!(
                    "HiGHS solver returned status: {:?}",
                    status
                )))
            }
        }
    }
}

impl SolutionStream for HighsSolutions {
    fn next_solution(&mut self) -> Result<Option<Vec<f64>>> {
        if self.exhausted {
            return Ok(None);
        }

        if self.problem.num_variables() == 0 {
            // An empty model has exactly one (empty) solution.
            self.exhausted = true;
            return Ok(Some(Vec::new()));
        }

        if let Some(previous) = self.previous.take() {
            if !self.problem.has_integer_columns() {
                self.exhausted = true;
                return Ok(None);
            }
            if let Err(e) = self.add_enumeration_rows(&previous) {
                // Keep the last solution so every later call fails the same way.
                self.previous = Some(previous);
                return Err(e);
            }
        }

        let result = self.run()?;
        match &result {
            Some(values) => self.previous = Some(values.clone()),
            None => self.exhausted = true,
        }
        Ok(result)
    }
}

fn snap(value: f64, integer: bool) -> f64 {
    let rounded = value.round();
    if integer && (rounded - value).abs() < INTEGRALITY_TOLERANCE {
        rounded
    } else {
        value
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::domain::problem::Column;

    fn boolean(cost: f64) -> Column {
        Column {
            lower: 0.0,
            upper: 1.0,
            cost,
            integer: true,
        }
    }

    fn drain(stream: &mut dyn SolutionStream) -> Vec<Vec<f64>> {
        let mut all = Vec::new();
        while let Some(values) = stream.next_solution().unwrap() {
            all.push(values);
        }
        all
    }

    #[test]
    fn enumerates_all_covering_assignments() {
        let problem = Problem {
            columns: vec![boolean(0.0), boolean(0.0), boolean(0.0)],
            rows: vec![Row {
                terms: vec![(0, 1.0), (1, 1.0), (2, 1.0)],
                lower: 1.0,
                upper: f64::INFINITY,
            }],
            objective_constant: 0.0,
        };
        let mut stream = HighsSolver::new()
            .solve(&problem, &SolverConfig::default())
            .unwrap();
        let mut all = drain(stream.as_mut());
        all.sort_by(|a, b| a.partial_cmp(b).unwrap());
        all.dedup();
        assert_eq!(all.len(), 7);
        assert!(!all.contains(&vec![0.0, 0.0, 0.0]));
    }

    #[test]
    fn enumeration_keeps_the_optimum() {
        // minimize x0 + x1 + x2 subject to x0 + x1 + x2 >= 2
        let problem = Problem {
            columns: vec![boolean(1.0), boolean(1.0), boolean(1.0)],
            rows: vec![Row {
                terms: vec![(0, 1.0), (1, 1.0), (2, 1.0)],
                lower: 2.0,
                upper: f64::INFINITY,
            }],
            objective_constant: 0.0,
        };
        let mut stream = HighsSolver::new()
            .solve(&problem, &SolverConfig::default())
            .unwrap();
        let all = drain(stream.as_mut());
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|v| v.iter().sum::<f64>() == 2.0));
    }

    #[test]
    fn continuous_model_has_one_solution() {
        let problem = Problem {
            columns: vec![Column {
                lower: 0.0,
                upper: 1.0,
                cost: -1.0,
                integer: false,
            }],
            rows: vec![],
            objective_constant: 0.0,
        };
        let mut stream = HighsSolver::new()
            .solve(&problem, &SolverConfig::default())
            .unwrap();
        let first = stream.next_solution().unwrap().unwrap();
        assert!((first[0] - 1.0).abs() < 1e-9);
        assert_eq!(stream.next_solution().unwrap(), None);
    }

    #[test]
    fn empty_model_is_found_once() {
        let mut stream = HighsSolver::new()
            .solve(&Problem::default(), &SolverConfig::default())
            .unwrap();
        assert_eq!(stream.next_solution().unwrap(), Some(vec![]));
        assert_eq!(stream.next_solution().unwrap(), None);
    }

    #[test]
    fn empty_interval_is_exhausted_without_solving() {
        let problem = Problem {
            columns: vec![Column {
                lower: 2.0,
                upper: 1.0,
                cost: 0.0,
                integer: false,
            }],
            rows: vec![],
            objective_constant: 0.0,
        };
        let mut stream = HighsSolver::new()
            .solve(&problem, &SolverConfig::default())
            .unwrap();
        assert_eq!(stream.next_solution().unwrap(), None);
    }

    #[test]
    fn general_integers_cannot_be_enumerated() {
        let problem = Problem {
            columns: vec![Column {
                lower: 0.0,
                upper: 5.0,
                cost: 1.0,
                integer: true,
            }],
            rows: vec![],
            objective_constant: 0.0,
        };
        let mut stream = HighsSolver::new()
            .solve(&problem, &SolverConfig::default())
            .unwrap();
        assert_eq!(stream.next_solution().unwrap(), Some(vec![0.0]));
        let err = stream.next_solution().unwrap_err();
        assert_eq!(err.code(), "ENGINE_UNSUPPORTED");
        // The failure is stable: the first solution is never reported again.
        let err = stream.next_solution().unwrap_err();
        assert_eq!(err.code(), "ENGINE_UNSUPPORTED");
    }
}
