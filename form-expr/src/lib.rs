//! Symbolic expressions for the form compiler.
//!
//! Expressions are immutable, reference-counted trees (really DAGs) of [`Expr`] nodes. See the
//! [`expr`] module for how nodes are represented and compared, and [`index`] for the tensor index
//! rules.
//!
//! ```
//! use form_expr::{Argument, Coefficient, Expr};
//!
//! let v = Expr::basis_function(Argument::scalar(0));
//! let w = Expr::coefficient(Coefficient::new(0, "w", vec![]));
//! let expr = (1.23 + w) * v;
//!
//! assert_eq!(expr.to_string(), "(1.23 + w) * v_0");
//! assert_eq!(expr.operands().len(), 2);
//! assert_eq!(expr.rank(), 0);
//! ```

pub mod error;
pub mod expr;
pub mod fmt;
pub mod index;
pub mod label;
pub mod terminal;

pub use expr::{Expr, ExprIter, ExprKind, Float, Shape};
pub use index::{Index, IndexDimensions, IndexItem};
pub use label::{Label, LabelAllocator};
pub use terminal::{Argument, Coefficient};
