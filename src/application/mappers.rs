// Mappers: Convert between the wire messages, the builder model and the engine problem
// This keeps prost types out of the modeling core and the backends

use prost::Message;
use tracing::{debug, trace};

use super::proto;
use crate::domain::{
    models::{ConstraintRecord, Model, VariableRecord},
    problem::{Column, Problem, Row},
    solver_service::{EngineError, Result},
    value_objects::VariableType,
};

/// Convert a builder variable to its wire message
pub fn domain_to_proto_variable(record: &VariableRecord) -> proto::Variable {
    let mut variable = proto::Variable {
        bound: Some(proto::Bound::from_interval(
            record.bounds.lower,
            record.bounds.upper,
        )),
        cost: record.cost,
        ..Default::default()
    };
    variable.set_type(match record.variable_type {
        VariableType::Continuous => proto::VariableKind::Continuous,
        VariableType::Integer => proto::VariableKind::Integer,
    });
    variable
}

/// Convert a builder constraint row to its wire message
pub fn domain_to_proto_constraint(record: &ConstraintRecord) -> proto::Constraint {
    proto::Constraint {
        sum: record
            .terms
            .iter()
            .map(|&(index, coefficient)| proto::Entry {
                variable: index as i32,
                coefficient,
            })
            .collect(),
        bound: Some(proto::Bound::from_interval(
            record.bounds.lower,
            record.bounds.upper,
        )),
    }
}

/// Convert a whole builder model to its wire message
pub fn domain_to_proto_model(model: &Model) -> proto::Ip {
    proto::Ip {
        variable: model.variables().iter().map(domain_to_proto_variable).collect(),
        constraint: model
            .constraints()
            .iter()
            .map(domain_to_proto_constraint)
            .collect(),
        objective_constant: model.objective_constant(),
    }
}

/// Convert a wire variable to an engine column
pub fn proto_to_column(index: usize, variable: &proto::Variable) -> Result<Column> {
    let kind = proto::VariableKind::try_from(variable.r#type).map_err(|_| {
        EngineError::InvalidModel(format!(
            "Variable {index} has invalid type {}",
            variable.r#type
        ))
    })?;
    let bound = variable.bound.clone().unwrap_or_default();
    Ok(Column {
        lower: bound.lower_bound(),
        upper: bound.upper_bound(),
        cost: variable.cost,
        integer: kind == proto::VariableKind::Integer,
    })
}

/// Convert a wire constraint to an engine row
pub fn proto_to_row(index: usize, constraint: &proto::Constraint) -> Result<Row> {
    let terms = constraint
        .sum
        .iter()
        .map(|entry| {
            usize::try_from(entry.variable)
                .map(|variable| (variable, entry.coefficient))
                .map_err(|_| {
                    EngineError::InvalidModel(format!(
                        "Constraint {index} refers to negative variable {}",
                        entry.variable
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;
    let bound = constraint.bound.clone().unwrap_or_default();
    Ok(Row {
        terms,
        lower: bound.lower_bound(),
        upper: bound.upper_bound(),
    })
}

/// Convert a wire model to the engine problem
pub fn proto_to_problem(ip: &proto::Ip) -> Result<Problem> {
    let columns = ip
        .variable
        .iter()
        .enumerate()
        .map(|(i, v)| proto_to_column(i, v))
        .collect::<Result<Vec<_>>>()?;
    let rows = ip
        .constraint
        .iter()
        .enumerate()
        .map(|(i, c)| proto_to_row(i, c))
        .collect::<Result<Vec<_>>>()?;
    Ok(Problem {
        columns,
        rows,
        objective_constant: ip.objective_constant,
    })
}

/// Parse serialized model bytes into the engine problem
pub fn decode_problem(bytes: &[u8]) -> Result<Problem> {
    let ip = proto::Ip::decode(bytes)
        .map_err(|e| EngineError::InvalidModel(format!("Could not parse model: {e}")))?;
    let problem = proto_to_problem(&ip)?;
    debug!(
        component = "mapper",
        operation = "decode",
        num_variables = problem.num_variables(),
        num_rows = problem.num_rows(),
        "Decoded model"
    );
    Ok(problem)
}

impl Model {
    /// Wire message for this model.
    pub fn to_proto(&self) -> proto::Ip {
        domain_to_proto_model(self)
    }

    /// Serialize the model into the bytes handed to the engine.
    pub fn serialize(&self) -> Vec<u8> {
        let bytes = self.to_proto().encode_to_vec();
        trace!(
            component = "mapper",
            operation = "serialize",
            model = %self.id(),
            len = bytes.len(),
            "Serialized model"
        );
        bytes
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn single_variable_constraints_are_not_rows() {
        let mut model = Model::new();
        let x = model.add_variable(VariableType::Integer);
        let y = model.add_variable(VariableType::Continuous);
        model.add_constraint((3.0 * x).le(6.0).unwrap()).unwrap();
        model.add_constraint((x + y).ge(1.0).unwrap()).unwrap();

        let ip = model.to_proto();
        assert_eq!(ip.variable.len(), 2);
        assert_eq!(ip.constraint.len(), 1);
        assert_eq!(ip.variable[0].bound.as_ref().unwrap().upper, Some(2.0));
        assert_eq!(ip.variable[0].bound.as_ref().unwrap().lower, None);
        assert_eq!(ip.variable[0].r#type(), proto::VariableKind::Integer);
    }

    #[test]
    fn decode_restores_bounds_and_rows() {
        let mut model = Model::new();
        let x = model.add_boolean();
        let y = model.add_variable(VariableType::Continuous);
        model.add_constraint((x - 2.0 * y).equals(1.0).unwrap()).unwrap();
        model.add_objective(-x + 7.0).unwrap();

        let problem = decode_problem(&model.serialize()).unwrap();
        assert_eq!(problem.num_variables(), 2);
        assert_eq!(problem.num_rows(), 1);
        assert_eq!(problem.columns[0].lower, 0.0);
        assert_eq!(problem.columns[0].upper, 1.0);
        assert!(problem.columns[0].integer);
        assert_eq!(problem.columns[0].cost, -1.0);
        assert_eq!(problem.columns[1].lower, f64::NEG_INFINITY);
        assert_eq!(problem.columns[1].upper, f64::INFINITY);
        assert_eq!(problem.rows[0].terms, vec![(0, 1.0), (1, -2.0)]);
        assert_eq!((problem.rows[0].lower, problem.rows[0].upper), (1.0, 1.0));
        assert_eq!(problem.objective_constant, 7.0);
    }

    #[test]
    fn garbage_is_rejected() {
        let err = decode_problem(&[0xff, 0xff, 0xff]).unwrap_err();
        assert_eq!(err.code(), "ENGINE_INVALID_MODEL");
    }

    #[test]
    fn unknown_variable_type_is_rejected() {
        let ip = proto::Ip {
            variable: vec![proto::Variable {
                r#type: 9,
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(proto_to_problem(&ip).is_err());
    }
}
