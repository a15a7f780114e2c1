//! Form arguments: basis functions and coefficients.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A basis function (test or trial function) of a form.
///
/// Arguments are identified by their number: `0` for the test function, `1` for the trial
/// function, and so on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Argument {
    /// The argument number.
    pub number: usize,

    /// The value shape of the argument; empty for scalar elements.
    pub shape: Vec<usize>,
}

impl Argument {
    /// Creates a scalar argument with the given number.
    pub fn scalar(number: usize) -> Self {
        Self { number, shape: Vec::new() }
    }

    /// Creates an argument with the given number and value shape.
    pub fn new(number: usize, shape: Vec<usize>) -> Self {
        Self { number, shape }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v_{}", self.number)
    }
}

/// A coefficient of a form: a function whose values are only known at runtime.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coefficient {
    /// Identifies the coefficient among all coefficients.
    pub count: usize,

    /// A user-facing name, used when printing and in diagnostics.
    pub name: Option<String>,

    /// The value shape of the coefficient; empty for scalar elements.
    pub shape: Vec<usize>,
}

impl Coefficient {
    /// Creates an unnamed scalar coefficient.
    pub fn scalar(count: usize) -> Self {
        Self { count, name: None, shape: Vec::new() }
    }

    /// Creates a named coefficient with the given value shape.
    pub fn new(count: usize, name: impl Into<String>, shape: Vec<usize>) -> Self {
        Self { count, name: Some(name.into()), shape }
    }

    /// Returns the name of the coefficient, or a generated one if it has none.
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "w_{}", self.count),
        }
    }
}
