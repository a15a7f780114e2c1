//! Dependency sets: which evaluation contexts an expression depends on.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{fmt, ops::{BitAnd, BitOr}};

/// Records which evaluation contexts a subexpression depends on.
///
/// A dependency set has a flag for runtime-only quantities (coefficient values, facet normals,
/// anything differentiated in space), a flag for the spatial coordinates, and one flag per
/// basis-function slot of the form. Sets form a lattice under [`union`](Self::union) (`|`) and
/// [`intersection`](Self::intersection) (`&`).
///
/// Both operands of `|` and `&` must have the same number of basis-function slots; combining
/// sets of different [`rank`](Self::rank) is a bug in the caller and panics.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DependencySet {
    /// Depends on values only known at runtime.
    runtime: bool,

    /// Depends on the spatial coordinates.
    coordinates: bool,

    /// Depends on the basis function in each slot.
    basis_functions: Vec<bool>,
}

impl DependencySet {
    /// Creates a dependency set from the given flags.
    pub fn new(basis_functions: impl Into<Vec<bool>>, runtime: bool, coordinates: bool) -> Self {
        Self {
            runtime,
            coordinates,
            basis_functions: basis_functions.into(),
        }
    }

    /// Creates a dependency set with `rank` basis-function slots and no flags set.
    pub fn empty(rank: usize) -> Self {
        Self::new(vec![false; rank], false, false)
    }

    /// Creates a dependency set with `rank` basis-function slots, only depending on the basis
    /// function in the given slot.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not less than `rank`.
    pub fn basis_function(rank: usize, slot: usize) -> Self {
        assert!(slot < rank, "basis function slot {} is out of range for a form of rank {}", slot, rank);
        let mut basis_functions = vec![false; rank];
        basis_functions[slot] = true;
        Self::new(basis_functions, false, false)
    }

    /// Returns this set with the runtime flag set.
    pub fn with_runtime(mut self) -> Self {
        self.runtime = true;
        self
    }

    /// Returns this set with the coordinates flag set.
    pub fn with_coordinates(mut self) -> Self {
        self.coordinates = true;
        self
    }

    /// Returns true if the set depends on runtime values.
    pub fn runtime(&self) -> bool {
        self.runtime
    }

    /// Returns true if the set depends on the spatial coordinates.
    pub fn coordinates(&self) -> bool {
        self.coordinates
    }

    /// Returns the basis-function flags, one per slot.
    pub fn basis_functions(&self) -> &[bool] {
        &self.basis_functions
    }

    /// Returns true if the set depends on the basis function in the given slot. Slots past the
    /// rank of the set are never depended on.
    pub fn depends_on(&self, slot: usize) -> bool {
        self.basis_functions.get(slot).copied().unwrap_or(false)
    }

    /// Returns the number of basis-function slots.
    pub fn rank(&self) -> usize {
        self.basis_functions.len()
    }

    /// Returns true if no flag is set, i.e. the expression is a compile-time constant.
    pub fn is_empty(&self) -> bool {
        !self.runtime && !self.coordinates && self.basis_functions.iter().all(|flag| !flag)
    }

    fn zip_with(&self, other: &Self, op: &str, f: impl Fn(bool, bool) -> bool) -> Self {
        assert_eq!(
            self.rank(),
            other.rank(),
            "cannot compute the {} of dependency sets with different numbers of basis functions",
            op,
        );
        Self {
            runtime: f(self.runtime, other.runtime),
            coordinates: f(self.coordinates, other.coordinates),
            basis_functions: self.basis_functions
                .iter()
                .zip(&other.basis_functions)
                .map(|(a, b)| f(*a, *b))
                .collect(),
        }
    }

    /// Returns the set depending on everything either set depends on.
    pub fn union(&self, other: &Self) -> Self {
        self.zip_with(other, "union", |a, b| a || b)
    }

    /// Returns the set depending on everything both sets depend on.
    pub fn intersection(&self, other: &Self) -> Self {
        self.zip_with(other, "intersection", |a, b| a && b)
    }

    /// Returns true if every dependency of `other` is also a dependency of `self`.
    ///
    /// Code that is staged by dependency set can place a block for `self` inside a block for
    /// `other` exactly when `self` covers `other`.
    pub fn covers(&self, other: &Self) -> bool {
        self.union(other) == *self
    }
}

impl BitOr for &DependencySet {
    type Output = DependencySet;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitOr for DependencySet {
    type Output = DependencySet;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(&rhs)
    }
}

impl BitAnd for &DependencySet {
    type Output = DependencySet;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs)
    }
}

impl BitAnd for DependencySet {
    type Output = DependencySet;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(&rhs)
    }
}

/// Lists the set flags, e.g. `{runtime, x, v_0}`. The coordinates flag is shown as `x`.
impl fmt::Display for DependencySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.runtime {
            flags.push("runtime".to_string());
        }
        if self.coordinates {
            flags.push("x".to_string());
        }
        flags.extend(
            (0..self.rank())
                .filter(|slot| self.depends_on(*slot))
                .map(|slot| format!("v_{}", slot)),
        );
        write!(f, "{{{}}}", flags.join(", "))
    }
}
