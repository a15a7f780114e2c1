//! Slot numbering for the basis functions and coefficients of a form.

use crate::deps::DependencySet;
use form_expr::{Argument, Coefficient, Expr, ExprKind};
use std::collections::{BTreeMap, HashMap};

/// Maps the basis functions and coefficients of a form to dense slot indices.
///
/// The slot of a basis function selects its entry in the basis-function dependency declarations
/// given to the splitter, and selects the basis-function flag of a [`DependencySet`]. The slot of
/// a coefficient selects its entry in the coefficient dependency declarations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormData {
    /// The slot of each basis function.
    pub basis_function_renumbering: HashMap<Argument, usize>,

    /// The slot of each coefficient.
    pub coefficient_renumbering: HashMap<Coefficient, usize>,
}

impl FormData {
    /// Creates form data from explicit renumbering tables.
    pub fn new(
        basis_function_renumbering: HashMap<Argument, usize>,
        coefficient_renumbering: HashMap<Coefficient, usize>,
    ) -> Self {
        Self { basis_function_renumbering, coefficient_renumbering }
    }

    /// Numbers the basis functions and coefficients found in the given expression.
    ///
    /// Basis functions are numbered by their argument number, and coefficients by their count,
    /// so the numbering does not depend on where in the expression each one appears.
    pub fn collect(expr: &Expr) -> Self {
        let mut arguments = BTreeMap::new();
        let mut coefficients = BTreeMap::new();
        for node in expr.post_order_iter() {
            match node.kind() {
                ExprKind::BasisFunction(arg) => {
                    arguments.entry((arg.number, arg.shape.clone())).or_insert_with(|| arg.clone());
                },
                ExprKind::Function(coeff) => {
                    coefficients.entry(coeff.count).or_insert_with(|| coeff.clone());
                },
                _ => (),
            }
        }

        Self {
            basis_function_renumbering: arguments
                .into_values()
                .enumerate()
                .map(|(slot, arg)| (arg, slot))
                .collect(),
            coefficient_renumbering: coefficients
                .into_values()
                .enumerate()
                .map(|(slot, coeff)| (coeff, slot))
                .collect(),
        }
    }

    /// Returns the number of basis functions of the form.
    pub fn rank(&self) -> usize {
        self.basis_function_renumbering.len()
    }

    /// Returns the number of coefficients of the form.
    pub fn num_coefficients(&self) -> usize {
        self.coefficient_renumbering.len()
    }

    /// Returns the slot of the given basis function.
    pub fn basis_function_slot(&self, arg: &Argument) -> Option<usize> {
        self.basis_function_renumbering.get(arg).copied()
    }

    /// Returns the slot of the given coefficient.
    pub fn coefficient_slot(&self, coeff: &Coefficient) -> Option<usize> {
        self.coefficient_renumbering.get(coeff).copied()
    }

    /// Returns the names of the coefficients of the form, in slot order.
    pub fn coefficient_names(&self) -> Vec<String> {
        let mut coefficients = self.coefficient_renumbering.iter().collect::<Vec<_>>();
        coefficients.sort_by_key(|(_, slot)| **slot);
        coefficients
            .into_iter()
            .map(|(coeff, _)| coeff.display_name())
            .collect()
    }

    /// Conservative dependency declarations for the basis functions: the basis function in slot
    /// `i` depends on itself and on the spatial coordinates.
    pub fn default_basis_function_deps(&self) -> Vec<DependencySet> {
        let rank = self.rank();
        (0..rank)
            .map(|slot| DependencySet::basis_function(rank, slot).with_coordinates())
            .collect()
    }

    /// Conservative dependency declarations for the coefficients: every coefficient depends on
    /// runtime values and on the spatial coordinates.
    pub fn default_function_deps(&self) -> Vec<DependencySet> {
        let rank = self.rank();
        (0..self.num_coefficients())
            .map(|_| DependencySet::empty(rank).with_runtime().with_coordinates())
            .collect()
    }
}
