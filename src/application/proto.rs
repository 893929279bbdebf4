// Wire representation of a model, as exchanged with the engine
//
// Hand-written prost messages; field tags are part of the wire format.

/// Interval on a variable or constraint row. Absent ends are unbounded.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Bound {
    #[prost(double, optional, tag = "1")]
    pub lower: Option<f64>,
    #[prost(double, optional, tag = "2")]
    pub upper: Option<f64>,
}

impl Bound {
    pub fn from_interval(lower: f64, upper: f64) -> Self {
        Self {
            lower: (lower != f64::NEG_INFINITY).then_some(lower),
            upper: (upper != f64::INFINITY).then_some(upper),
        }
    }

    /// Lower end, `-inf` when absent.
    pub fn lower_bound(&self) -> f64 {
        self.lower.unwrap_or(f64::NEG_INFINITY)
    }

    /// Upper end, `+inf` when absent.
    pub fn upper_bound(&self) -> f64 {
        self.upper.unwrap_or(f64::INFINITY)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum VariableKind {
    Continuous = 0,
    Integer = 1,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Variable {
    #[prost(message, optional, tag = "1")]
    pub bound: Option<Bound>,
    #[prost(double, tag = "2")]
    pub cost: f64,
    #[prost(enumeration = "VariableKind", tag = "3")]
    pub r#type: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Entry {
    #[prost(int32, tag = "1")]
    pub variable: i32,
    #[prost(double, tag = "2")]
    pub coefficient: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Constraint {
    #[prost(message, repeated, tag = "1")]
    pub sum: Vec<Entry>,
    #[prost(message, optional, tag = "2")]
    pub bound: Option<Bound>,
}

/// A complete model: variables, general rows and the objective constant.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Ip {
    #[prost(message, repeated, tag = "1")]
    pub variable: Vec<Variable>,
    #[prost(message, repeated, tag = "2")]
    pub constraint: Vec<Constraint>,
    #[prost(double, tag = "3")]
    pub objective_constant: f64,
}
