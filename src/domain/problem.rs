// Engine-side view of a decoded model

/// One decision variable as the engine receives it.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub lower: f64,
    pub upper: f64,
    pub cost: f64,
    pub integer: bool,
}

impl Column {
    /// Integer column whose bound lies inside `[0, 1]`.
    pub fn is_boolean(&self) -> bool {
        self.integer && self.lower >= 0.0 && self.upper <= 1.0
    }
}

/// One general constraint row: `lower ≤ Σ coefficient·x ≤ upper`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub terms: Vec<(usize, f64)>,
    pub lower: f64,
    pub upper: f64,
}

impl Row {
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(i, k)| k * values[i]).sum()
    }
}

/// Minimization problem handed to a backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Problem {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub objective_constant: f64,
}

impl Problem {
    pub fn num_variables(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn has_integer_columns(&self) -> bool {
        self.columns.iter().any(|c| c.integer)
    }

    pub fn is_pure_boolean(&self) -> bool {
        self.columns.iter().all(Column::is_boolean)
    }

    /// A column or row whose interval is already empty can never be satisfied.
    pub fn has_empty_bounds(&self) -> bool {
        self.columns.iter().any(|c| c.lower > c.upper) || self.rows.iter().any(|r| r.lower > r.upper)
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective_constant
            + self
                .columns
                .iter()
                .zip(values)
                .map(|(c, v)| c.cost * v)
                .sum::<f64>()
    }
}
