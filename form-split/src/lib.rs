//! Splits integrands of a finite element form by what their subexpressions depend on.
//!
//! A code generator evaluating a form wants to compute every subexpression in the outermost loop
//! where its inputs are available: constants once, coefficient values once per quadrature point,
//! products with a test function once per test function, and so on. [`split_by_dependencies`]
//! computes the [`DependencySet`] of every subexpression of an integrand, and whenever the
//! operands of a node depend on different things, names them as variables. The result is a
//! [`CodeStructure`], with the variables grouped into stacks that share the same dependency set.
//!
//! ```
//! use form_expr::{Argument, Coefficient, Expr};
//! use form_split::{split_by_dependencies, FormData};
//!
//! let v = Expr::basis_function(Argument::scalar(0));
//! let u = Expr::basis_function(Argument::scalar(1));
//! let w = Expr::coefficient(Coefficient::new(0, "w", vec![]));
//! let integrand = (1.23 + w) * u * v;
//!
//! let data = FormData::collect(&integrand);
//! let (root, code) = split_by_dependencies(
//!     &integrand,
//!     &data,
//!     &data.default_basis_function_deps(),
//!     &data.default_function_deps(),
//! ).unwrap();
//!
//! // the root depends on everything
//! assert!(root.deps.runtime() && root.deps.coordinates());
//! assert_eq!(root.deps.basis_functions(), &[true, true]);
//!
//! // `1.23 + w`, `u`, `(1.23 + w) * u`, `v`, and the root each depend on something different
//! assert_eq!(code.num_stacks(), 5);
//! ```
//!
//! Errors carry spans into the rendering of the integrand, so they can be reported with
//! [`Error::report_to_stderr`]:
//!
//! ```no_run
//! # use form_expr::{Argument, Expr};
//! # use form_split::{split_by_dependencies, FormData};
//! let integrand = Expr::basis_function(Argument::scalar(0));
//! if let Err(err) = split_by_dependencies(&integrand, &FormData::default(), &[], &[]) {
//!     err.report_to_stderr("integrand", &integrand.to_string()).unwrap();
//! }
//! ```

pub mod code;
pub mod deps;
pub mod error;
pub mod form_data;
pub mod options;
pub mod splitter;

pub use code::{CodeStructure, VariableInfo};
pub use deps::DependencySet;
pub use form_data::FormData;
pub use options::{CollisionPolicy, SplitOptions};
pub use splitter::DependencySplitter;

use form_error::Error;
use form_expr::Expr;
use rayon::prelude::*;

/// Splits an expression with the default [`SplitOptions`].
///
/// See [`split_by_dependencies_with`].
pub fn split_by_dependencies(
    expr: &Expr,
    form_data: &FormData,
    basis_function_deps: &[DependencySet],
    function_deps: &[DependencySet],
) -> Result<(VariableInfo, CodeStructure), Error> {
    split_by_dependencies_with(expr, form_data, basis_function_deps, function_deps, SplitOptions::default())
}

/// Splits an expression into named variables grouped by dependency set.
///
/// `basis_function_deps` and `function_deps` give the dependency set of the basis function and
/// coefficient in each slot of `form_data`. Returns the variable for the whole expression and the
/// [`CodeStructure`] of every variable it depends on, itself included.
///
/// Variables already present in the expression keep their labels, and are split before the
/// expressions referring to them. Splitting an expression that was already split gives back the
/// same structure.
pub fn split_by_dependencies_with(
    expr: &Expr,
    form_data: &FormData,
    basis_function_deps: &[DependencySet],
    function_deps: &[DependencySet],
    options: SplitOptions,
) -> Result<(VariableInfo, CodeStructure), Error> {
    DependencySplitter::new(form_data, basis_function_deps, function_deps, options)?
        .split(expr)
}

/// Splits several integrands of the same form in parallel.
///
/// Each integrand is split independently, in its own run, so labels are only unique within the
/// result of one integrand. The results are in the same order as `integrands`.
pub fn split_all(
    integrands: &[Expr],
    form_data: &FormData,
    basis_function_deps: &[DependencySet],
    function_deps: &[DependencySet],
    options: &SplitOptions,
) -> Vec<Result<(VariableInfo, CodeStructure), Error>> {
    integrands
        .par_iter()
        .map(|integrand| {
            split_by_dependencies_with(
                integrand,
                form_data,
                basis_function_deps,
                function_deps,
                options.clone(),
            )
        })
        .collect()
}
