//! Data perspective: typed variables and the guards that read them.
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::net::core::{NetError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Int,
    Float,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariableValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl VariableValue {
    pub fn kind(self) -> VariableKind {
        match self {
            VariableValue::Int(_) => VariableKind::Int,
            VariableValue::Float(_) => VariableKind::Float,
            VariableValue::Bool(_) => VariableKind::Bool,
        }
    }

    /// Numeric view used by comparisons; booleans map to 0 and 1.
    pub fn as_number(self) -> f64 {
        match self {
            VariableValue::Int(v) => v as f64,
            VariableValue::Float(v) => v,
            VariableValue::Bool(v) => f64::from(u8::from(v)),
        }
    }

    pub fn is_truthy(self) -> bool {
        self.as_number() != 0.0
    }

    /// Integers compare exactly; any other pairing compares numerically.
    pub fn compare(self, other: VariableValue) -> Option<Ordering> {
        match (self, other) {
            (VariableValue::Int(left), VariableValue::Int(right)) => Some(left.cmp(&right)),
            _ => self.as_number().partial_cmp(&other.as_number()),
        }
    }
}

impl From<i64> for VariableValue {
    fn from(value: i64) -> Self {
        VariableValue::Int(value)
    }
}

impl From<f64> for VariableValue {
    fn from(value: f64) -> Self {
        VariableValue::Float(value)
    }
}

impl From<bool> for VariableValue {
    fn from(value: bool) -> Self {
        VariableValue::Bool(value)
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Int(v) => write!(f, "{v}"),
            VariableValue::Float(v) => write!(f, "{v}"),
            VariableValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: Option<VariableValue>,
    pub kind: VariableKind,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

impl Variable {
    fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        Self {
            name: name.into(),
            value: None,
            kind,
            lower_bound: None,
            upper_bound: None,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, VariableKind::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, VariableKind::Float)
    }

    /// Boolean variables are implicitly bounded by 0 and 1.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, VariableKind::Bool)
    }

    pub fn with_value(mut self, value: impl Into<VariableValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_bounds(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn value_as_number(&self) -> Option<f64> {
        self.value.map(VariableValue::as_number)
    }

    pub fn lower_bound_as_number(&self) -> Option<f64> {
        match self.kind {
            VariableKind::Bool => Some(0.0),
            _ => self.lower_bound,
        }
    }

    pub fn upper_bound_as_number(&self) -> Option<f64> {
        match self.kind {
            VariableKind::Bool => Some(1.0),
            _ => self.upper_bound,
        }
    }

    /// Checks kind and declared bounds without assigning.
    pub fn validate(&self, value: VariableValue) -> Result<()> {
        let compatible = matches!(
            (self.kind, value.kind()),
            (VariableKind::Int, VariableKind::Int)
                | (VariableKind::Float, VariableKind::Float | VariableKind::Int)
                | (VariableKind::Bool, VariableKind::Bool)
        );
        if !compatible {
            return Err(NetError::InvalidValue {
                name: self.name.clone(),
                reason: format!("{:?} value for {:?} variable", value.kind(), self.kind),
            });
        }
        let number = value.as_number();
        if let Some(lower) = self.lower_bound_as_number() {
            if number < lower {
                return Err(NetError::InvalidValue {
                    name: self.name.clone(),
                    reason: format!("{value} is below lower bound {lower}"),
                });
            }
        }
        if let Some(upper) = self.upper_bound_as_number() {
            if number > upper {
                return Err(NetError::InvalidValue {
                    name: self.name.clone(),
                    reason: format!("{value} is above upper bound {upper}"),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equal,
    Smaller,
    SmallerOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comparison {
    fn holds(self, left: VariableValue, right: VariableValue) -> bool {
        let Some(ordering) = left.compare(right) else {
            return false;
        };
        match self {
            Comparison::Equal => ordering.is_eq(),
            Comparison::Smaller => ordering.is_lt(),
            Comparison::SmallerOrEqual => ordering.is_le(),
            Comparison::Greater => ordering.is_gt(),
            Comparison::GreaterOrEqual => ordering.is_ge(),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Comparison::Equal => "==",
            Comparison::Smaller => "<",
            Comparison::SmallerOrEqual => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
        }
    }
}

pub type GuardFn = dyn Fn(VariableValue) -> bool + Send + Sync;

/// Boolean predicate gating a transition.
///
/// Guards name their variables instead of holding them, so a guard keeps
/// working on a copied or merged net: it is always evaluated against the
/// variables of the net that owns the transition.
#[derive(Clone, Default)]
pub enum Guard {
    #[default]
    AcceptAlways,
    Compare {
        variable: String,
        op: Comparison,
        value: VariableValue,
    },
    Truth {
        variable: String,
        expected: bool,
    },
    Predicate {
        variable: String,
        func: Arc<GuardFn>,
    },
    AllOf(Vec<Guard>),
}

impl Guard {
    fn compare(variable: impl Into<String>, op: Comparison, value: impl Into<VariableValue>) -> Self {
        Guard::Compare {
            variable: variable.into(),
            op,
            value: value.into(),
        }
    }

    pub fn equal(variable: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Self::compare(variable, Comparison::Equal, value)
    }

    pub fn smaller(variable: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Self::compare(variable, Comparison::Smaller, value)
    }

    pub fn smaller_or_equal(variable: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Self::compare(variable, Comparison::SmallerOrEqual, value)
    }

    pub fn greater(variable: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Self::compare(variable, Comparison::Greater, value)
    }

    pub fn greater_or_equal(variable: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Self::compare(variable, Comparison::GreaterOrEqual, value)
    }

    pub fn is_true(variable: impl Into<String>) -> Self {
        Guard::Truth {
            variable: variable.into(),
            expected: true,
        }
    }

    pub fn is_false(variable: impl Into<String>) -> Self {
        Guard::Truth {
            variable: variable.into(),
            expected: false,
        }
    }

    pub fn lambda<F>(variable: impl Into<String>, func: F) -> Self
    where
        F: Fn(VariableValue) -> bool + Send + Sync + 'static,
    {
        Guard::Predicate {
            variable: variable.into(),
            func: Arc::new(func),
        }
    }

    pub fn all_of(guards: impl IntoIterator<Item = Guard>) -> Self {
        Guard::AllOf(guards.into_iter().collect())
    }

    pub fn is_accept_always(&self) -> bool {
        matches!(self, Guard::AcceptAlways)
    }

    /// Evaluates the guard. Reading a variable that has no value is an
    /// error rather than a rejection.
    pub fn accept(&self, variables: &IndexMap<String, Variable>) -> Result<bool> {
        match self {
            Guard::AcceptAlways => Ok(true),
            Guard::Compare { variable, op, value } => {
                let current = read(variables, variable)?;
                Ok(op.holds(current, *value))
            }
            Guard::Truth { variable, expected } => {
                Ok(read(variables, variable)?.is_truthy() == *expected)
            }
            Guard::Predicate { variable, func } => Ok(func(read(variables, variable)?)),
            Guard::AllOf(guards) => {
                for guard in guards {
                    if !guard.accept(variables)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Names of every variable this guard reads, in evaluation order.
    pub fn variables(&self) -> Vec<&str> {
        match self {
            Guard::AcceptAlways => Vec::new(),
            Guard::Compare { variable, .. }
            | Guard::Truth { variable, .. }
            | Guard::Predicate { variable, .. } => vec![variable.as_str()],
            Guard::AllOf(guards) => guards.iter().flat_map(Guard::variables).collect(),
        }
    }

    /// Points every variable reference at `rename(name)`.
    pub(crate) fn rename_variables(&mut self, rename: &impl Fn(&str) -> String) {
        match self {
            Guard::AcceptAlways => {}
            Guard::Compare { variable, .. }
            | Guard::Truth { variable, .. }
            | Guard::Predicate { variable, .. } => *variable = rename(variable.as_str()),
            Guard::AllOf(guards) => {
                for guard in guards {
                    guard.rename_variables(rename);
                }
            }
        }
    }
}

fn read(variables: &IndexMap<String, Variable>, name: &str) -> Result<VariableValue> {
    let variable = variables.get(name).ok_or_else(|| NetError::UnknownReference {
        kind: "variable",
        id: name.to_owned(),
    })?;
    variable
        .value
        .ok_or_else(|| NetError::UnsetVariable(name.to_owned()))
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::AcceptAlways => f.write_str("AcceptAlways"),
            Guard::Compare { variable, op, value } => {
                write!(f, "Compare({variable} {} {value})", op.symbol())
            }
            Guard::Truth { variable, expected } => write!(f, "Truth({variable} is {expected})"),
            Guard::Predicate { variable, .. } => write!(f, "Predicate({variable})"),
            Guard::AllOf(guards) => f.debug_tuple("AllOf").field(guards).finish(),
        }
    }
}
