// CPLEX LP text for a decoded problem.
//
// Columns are named `C<index>` and rows `R<index>`, so a solver transcript can be
// mapped back onto variable indices. The objective constant is not written; it
// does not change which assignments are optimal.

use std::fmt::Write;

use crate::domain::problem::{Column, Problem, Row};

/// Render `problem` as an LP file.
pub fn write_lp(problem: &Problem) -> String {
    let mut out = String::new();
    out.push_str("\\ linip model\n");
    out.push_str("Minimize\n obj: ");
    let objective: Vec<(usize, f64)> = problem
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.cost != 0.0)
        .map(|(i, c)| (i, c.cost))
        .collect();
    out.push_str(&fmt_lin(&objective));
    out.push('\n');

    out.push_str("Subject To\n");
    for (i, row) in problem.rows.iter().enumerate() {
        write_row(&mut out, i, row);
    }

    out.push_str("Bounds\n");
    for (i, column) in problem.columns.iter().enumerate() {
        write_bound(&mut out, i, column);
    }

    let integers: Vec<String> = problem
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.integer)
        .map(|(i, _)| format!("C{i}"))
        .collect();
    if !integers.is_empty() {
        out.push_str("General\n");
        for chunk in integers.chunks(10) {
            let _ = writeln!(out, " {}", chunk.join(" "));
        }
    }
    out.push_str("End\n");
    out
}

fn write_row(out: &mut String, index: usize, row: &Row) {
    let lhs = fmt_lin(&row.terms);
    let lower = row.lower.is_finite();
    let upper = row.upper.is_finite();
    // Writing to a String cannot fail.
    let _ = match (lower, upper) {
        (true, true) if row.lower == row.upper => {
            writeln!(out, " R{index}: {lhs} = {}", fmt_num(row.lower))
        }
        (true, true) => writeln!(out, " R{index}_lo: {lhs} >= {}", fmt_num(row.lower))
            .and_then(|_| writeln!(out, " R{index}_hi: {lhs} <= {}", fmt_num(row.upper))),
        (true, false) => writeln!(out, " R{index}: {lhs} >= {}", fmt_num(row.lower)),
        (false, true) => writeln!(out, " R{index}: {lhs} <= {}", fmt_num(row.upper)),
        (false, false) => Ok(()),
    };
}

fn write_bound(out: &mut String, index: usize, column: &Column) {
    let _ = match (column.lower.is_finite(), column.upper.is_finite()) {
        (true, true) => writeln!(
            out,
            " {} <= C{index} <= {}",
            fmt_num(column.lower),
            fmt_num(column.upper)
        ),
        (true, false) => writeln!(out, " C{index} >= {}", fmt_num(column.lower)),
        (false, true) => writeln!(out, " -inf <= C{index} <= {}", fmt_num(column.upper)),
        (false, false) => writeln!(out, " C{index} free"),
    };
}

fn fmt_num(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn fmt_lin(terms: &[(usize, f64)]) -> String {
    let mut out = String::new();
    for (n, &(index, coefficient)) in terms.iter().enumerate() {
        let magnitude = fmt_num(coefficient.abs());
        match (n, coefficient < 0.0) {
            (0, false) => out.push_str(&format!("{magnitude} C{index}")),
            (0, true) => out.push_str(&format!("-{magnitude} C{index}")),
            (_, false) => out.push_str(&format!(" + {magnitude} C{index}")),
            (_, true) => out.push_str(&format!(" - {magnitude} C{index}")),
        }
    }
    if out.is_empty() {
        out.push('0');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(lower: f64, upper: f64, cost: f64, integer: bool) -> Column {
        Column {
            lower,
            upper,
            cost,
            integer,
        }
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(3.0), "3");
        assert_eq!(fmt_num(-2.0), "-2");
        assert_eq!(fmt_num(0.5), "0.5");
    }

    #[test]
    fn writes_all_sections() {
        let problem = Problem {
            columns: vec![
                column(0.0, 1.0, -1.0, true),
                column(f64::NEG_INFINITY, f64::INFINITY, 2.5, false),
                column(f64::NEG_INFINITY, 4.0, 0.0, false),
            ],
            rows: vec![
                Row {
                    terms: vec![(0, 1.0), (1, -2.0)],
                    lower: f64::NEG_INFINITY,
                    upper: 3.0,
                },
                Row {
                    terms: vec![(0, 1.0), (2, 1.0)],
                    lower: 1.0,
                    upper: 1.0,
                },
                Row {
                    terms: vec![(1, 1.0), (2, 1.0)],
                    lower: -1.0,
                    upper: 5.0,
                },
            ],
            objective_constant: 9.0,
        };
        let lp = write_lp(&problem);
        let expected = "\\ linip model
Minimize
 obj: -1 C0 + 2.5 C1
Subject To
 R0: 1 C0 - 2 C1 <= 3
 R1: 1 C0 + 1 C2 = 1
 R2_lo: 1 C1 + 1 C2 >= -1
 R2_hi: 1 C1 + 1 C2 <= 5
Bounds
 0 <= C0 <= 1
 C1 free
 -inf <= C2 <= 4
General
 C0
End
";
        assert_eq!(lp, expected);
    }

    #[test]
    fn empty_problem() {
        let lp = write_lp(&Problem::default());
        assert!(lp.contains(" obj: 0\n"));
        assert!(!lp.contains("General"));
    }
}
