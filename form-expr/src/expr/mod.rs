//! The expression node type shared by every pass of the form compiler.
//!
//! An expression is a tree of immutable nodes. Each node is either a *terminal* (a literal, a
//! symbol, a basis function, a coefficient, a multi-index, ...) or an *operator* with an ordered
//! list of operands. Nodes are reference-counted: cloning an [`Expr`] is cheap and never copies
//! the tree, and transformations build new nodes instead of mutating existing ones. A node can
//! therefore be shared by several parents, so an expression is really a DAG.
//!
//! # Structural equality and identity
//!
//! There are two ways to compare expressions:
//!
//! - The [`PartialEq`], [`Eq`], and [`Hash`] implementations compare **structure**: two nodes are
//!   equal if they are the same variant with equal parameters and equal operands. This is not
//!   mathematical equivalence; `a + b` and `b + a` are different expressions.
//! - [`Expr::ptr_eq`] compares **identity**: whether two handles point at the very same node.
//!   Passes use it to detect that a subtree was left untouched, so that the original node can be
//!   reused instead of rebuilding an equal copy.
//!
//! Floating-point literals are compared by bit pattern, so `0.0` and `-0.0` are different
//! expressions. Expressions **must never** contain `NaN` literals.
//!
//! # Tensor metadata
//!
//! Every node knows its tensor [`shape`](Expr::shape) and its [free
//! indices](Expr::free_indices). Both are computed once when the node is created. Constructors
//! assume their operands are well-formed (matching shapes for sums, scalar denominators, and so
//! on); no checking is done.

mod iter;

use crate::{
    error::ReconstructArity,
    fmt::{Named, Renderer},
    index::{self, Index, IndexDimensions, IndexItem},
    label::{Label, LabelAllocator},
    terminal::{Argument, Coefficient},
};
use form_error::Error;
pub use iter::ExprIter;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    hash::{Hash, Hasher},
    ops::{Add, Div, Mul, Range},
    sync::Arc,
};

/// The tensor shape of an expression; empty for scalars.
pub type Shape = Vec<usize>;

/// A floating-point literal, compared and hashed by its bit pattern.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Float(pub f64);

impl PartialEq for Float {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Float {}

impl Hash for Float {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// The kind of an expression node, along with its parameters and operands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExprKind {
    /// A named scalar symbol, such as `x`.
    Symbol(String),

    /// A zero-valued tensor of the given shape.
    Zero(Shape),

    /// A floating-point literal, such as `1.23`.
    FloatValue(Float),

    /// An integer literal, such as `2`.
    IntValue(i64),

    /// The identity matrix of the given dimension.
    Identity(usize),

    /// A list of indices, used as an operand of [`ExprKind::Indexed`],
    /// [`ExprKind::ComponentTensor`] and [`ExprKind::SpatialDerivative`].
    MultiIndex(Vec<IndexItem>),

    /// A basis function of the form.
    BasisFunction(Argument),

    /// A coefficient of the form.
    Function(Coefficient),

    /// The facet normal of a cell in the given geometric dimension.
    FacetNormal(usize),

    /// The sum of two expressions of equal shape.
    Sum(Expr, Expr),

    /// The product of two expressions, at least one of which is scalar.
    Product(Expr, Expr),

    /// The quotient of an expression and a scalar.
    Division(Expr, Expr),

    /// A scalar raised to a scalar power.
    Power(Expr, Expr),

    /// A component of a tensor expression, selected by a [`ExprKind::MultiIndex`].
    Indexed(Expr, Expr),

    /// A tensor built by turning free indices of a scalar expression into axes.
    ComponentTensor(Expr, Expr),

    /// A tensor built from a list of subtensors of equal shape.
    ListTensor(Vec<Expr>),

    /// The derivative of an expression with respect to the spatial coordinates given by a
    /// [`ExprKind::MultiIndex`].
    SpatialDerivative(Expr, Expr),

    /// A named subexpression.
    Variable(Expr, Label),
}

impl ExprKind {
    /// Returns the name of the variant, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Symbol(_) => "Symbol",
            Self::Zero(_) => "Zero",
            Self::FloatValue(_) => "FloatValue",
            Self::IntValue(_) => "IntValue",
            Self::Identity(_) => "Identity",
            Self::MultiIndex(_) => "MultiIndex",
            Self::BasisFunction(_) => "BasisFunction",
            Self::Function(_) => "Function",
            Self::FacetNormal(_) => "FacetNormal",
            Self::Sum(_, _) => "Sum",
            Self::Product(_, _) => "Product",
            Self::Division(_, _) => "Division",
            Self::Power(_, _) => "Power",
            Self::Indexed(_, _) => "Indexed",
            Self::ComponentTensor(_, _) => "ComponentTensor",
            Self::ListTensor(_) => "ListTensor",
            Self::SpatialDerivative(_, _) => "SpatialDerivative",
            Self::Variable(_, _) => "Variable",
        }
    }
}

/// A node together with the tensor metadata computed when it was created.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct ExprNode {
    kind: ExprKind,
    shape: Shape,
    free_indices: Vec<Index>,
}

/// A handle to an immutable expression node.
///
/// For more information about this type, see the [module-level documentation](self).
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Expr(Arc<ExprNode>);

impl std::fmt::Debug for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.kind.fmt(f)
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.0.kind == other.0.kind
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.kind.hash(state);
    }
}

/// Computes the shape and free indices of a node of the given kind.
fn metadata(kind: &ExprKind) -> (Shape, Vec<Index>) {
    match kind {
        ExprKind::Symbol(_)
            | ExprKind::FloatValue(_)
            | ExprKind::IntValue(_) => (Vec::new(), Vec::new()),
        ExprKind::Zero(shape) => (shape.clone(), Vec::new()),
        ExprKind::Identity(dim) => (vec![*dim, *dim], Vec::new()),
        ExprKind::MultiIndex(items) => (Vec::new(), index::contract(&[&index::free_items(items)[..]])),
        ExprKind::BasisFunction(arg) => (arg.shape.clone(), Vec::new()),
        ExprKind::Function(coeff) => (coeff.shape.clone(), Vec::new()),
        ExprKind::FacetNormal(dim) => (vec![*dim], Vec::new()),
        ExprKind::Sum(lhs, _) => (lhs.shape().to_vec(), lhs.free_indices().to_vec()),
        ExprKind::Product(lhs, rhs) => {
            let shape = if lhs.rank() == 0 { rhs.shape() } else { lhs.shape() };
            (shape.to_vec(), index::contract(&[lhs.free_indices(), rhs.free_indices()]))
        },
        ExprKind::Division(num, den) => {
            (num.shape().to_vec(), index::union(&[num.free_indices(), den.free_indices()]))
        },
        ExprKind::Power(base, exp) => {
            (Vec::new(), index::union(&[base.free_indices(), exp.free_indices()]))
        },
        ExprKind::Indexed(expr, ii) => {
            let items = ii.multi_index_items();
            let shape = expr.shape().get(items.len()..).unwrap_or_default().to_vec();
            let free = index::contract(&[expr.free_indices(), &index::free_items(items)[..]]);
            (shape, free)
        },
        ExprKind::ComponentTensor(expr, ii) => {
            let axes = index::free_items(ii.multi_index_items());
            let shape = axes.iter().map(|index| index.dim).collect();
            let free = expr.free_indices()
                .iter()
                .filter(|index| !axes.contains(index))
                .copied()
                .collect();
            (shape, free)
        },
        ExprKind::ListTensor(ops) => match ops.first() {
            Some(first) => {
                let mut shape = vec![ops.len()];
                shape.extend_from_slice(first.shape());
                (shape, first.free_indices().to_vec())
            },
            None => (vec![0], Vec::new()),
        },
        ExprKind::SpatialDerivative(expr, ii) => {
            let free = index::contract(&[
                expr.free_indices(),
                &index::free_items(ii.multi_index_items())[..],
            ]);
            (expr.shape().to_vec(), free)
        },
        ExprKind::Variable(expr, _) => (expr.shape().to_vec(), expr.free_indices().to_vec()),
    }
}

impl Expr {
    /// Creates a node of the given kind, computing its tensor metadata.
    pub fn new(kind: ExprKind) -> Self {
        let (shape, free_indices) = metadata(&kind);
        Self(Arc::new(ExprNode { kind, shape, free_indices }))
    }

    /// Returns the kind of this node.
    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    /// Returns true if both handles point at the very same node.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Returns the address of the node, usable as an identity key while the node is alive.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Returns the operands of this node, in order. Terminals have no operands.
    pub fn operands(&self) -> Vec<&Expr> {
        match self.kind() {
            ExprKind::Symbol(_)
                | ExprKind::Zero(_)
                | ExprKind::FloatValue(_)
                | ExprKind::IntValue(_)
                | ExprKind::Identity(_)
                | ExprKind::MultiIndex(_)
                | ExprKind::BasisFunction(_)
                | ExprKind::Function(_)
                | ExprKind::FacetNormal(_) => Vec::new(),
            ExprKind::Sum(a, b)
                | ExprKind::Product(a, b)
                | ExprKind::Division(a, b)
                | ExprKind::Power(a, b)
                | ExprKind::Indexed(a, b)
                | ExprKind::ComponentTensor(a, b)
                | ExprKind::SpatialDerivative(a, b) => vec![a, b],
            ExprKind::ListTensor(ops) => ops.iter().collect(),
            ExprKind::Variable(expr, _) => vec![expr],
        }
    }

    /// Returns true if this node is a terminal (has no operands).
    pub fn is_terminal(&self) -> bool {
        self.operands().is_empty()
    }

    /// Returns a new node of the same kind as this one, with the given operands.
    ///
    /// Terminals are returned as-is (they must be given no operands). Returns an error if the
    /// number of operands does not match the kind of this node.
    pub fn reconstruct(&self, operands: Vec<Expr>) -> Result<Self, Error> {
        let expected = match self.kind() {
            ExprKind::ListTensor(ops) => ops.len(),
            _ => self.operands().len(),
        };
        if operands.len() != expected {
            return Err(Error::new(Vec::new(), ReconstructArity {
                kind: self.kind().name(),
                expected,
                given: operands.len(),
            }));
        }

        if expected == 0 {
            return Ok(self.clone());
        }

        let mut operands = operands.into_iter();
        let mut next = || operands.next().unwrap_or_else(|| unreachable!("operand count was checked"));
        let kind = match self.kind() {
            ExprKind::Sum(_, _) => ExprKind::Sum(next(), next()),
            ExprKind::Product(_, _) => ExprKind::Product(next(), next()),
            ExprKind::Division(_, _) => ExprKind::Division(next(), next()),
            ExprKind::Power(_, _) => ExprKind::Power(next(), next()),
            ExprKind::Indexed(_, _) => ExprKind::Indexed(next(), next()),
            ExprKind::ComponentTensor(_, _) => ExprKind::ComponentTensor(next(), next()),
            ExprKind::SpatialDerivative(_, _) => ExprKind::SpatialDerivative(next(), next()),
            ExprKind::ListTensor(ops) => ExprKind::ListTensor((0..ops.len()).map(|_| next()).collect()),
            ExprKind::Variable(_, label) => ExprKind::Variable(next(), *label),
            _ => unreachable!("terminals have no operands"),
        };
        Ok(Self::new(kind))
    }

    /// Returns the tensor shape of the expression.
    pub fn shape(&self) -> &[usize] {
        &self.0.shape
    }

    /// Returns the tensor rank of the expression.
    pub fn rank(&self) -> usize {
        self.0.shape.len()
    }

    /// Returns the free (unassigned) indices of the expression, in order of first occurrence.
    pub fn free_indices(&self) -> &[Index] {
        &self.0.free_indices
    }

    /// Returns the dimensions of every free or repeated index in the expression.
    pub fn index_dimensions(&self) -> IndexDimensions {
        let mut dims = IndexDimensions::new();
        for node in self.post_order_iter() {
            if let ExprKind::MultiIndex(items) = node.kind() {
                dims.extend(items.iter().filter_map(IndexItem::as_free).map(|i| (i.id, i.dim)));
            }
        }
        dims
    }

    /// If the expression is a [`ExprKind::MultiIndex`], returns its items. Otherwise, returns an
    /// empty slice.
    pub fn multi_index_items(&self) -> &[IndexItem] {
        match self.kind() {
            ExprKind::MultiIndex(items) => items,
            _ => &[],
        }
    }

    /// If the expression is a [`ExprKind::Variable`], returns its inner expression and label.
    pub fn as_variable(&self) -> Option<(&Expr, Label)> {
        match self.kind() {
            ExprKind::Variable(expr, label) => Some((expr, *label)),
            _ => None,
        }
    }

    /// If the expression is a [`ExprKind::Variable`], returns its label.
    pub fn label(&self) -> Option<Label> {
        self.as_variable().map(|(_, label)| label)
    }

    /// Returns an iterator that traverses the expression in left-to-right post-order (i.e.
    /// depth-first). Nodes shared by several parents are yielded once.
    pub fn post_order_iter(&self) -> ExprIter {
        ExprIter::new(self)
    }

    /// Returns every [`ExprKind::Variable`] node reachable from this expression, in post-order,
    /// keeping the first node found for each label.
    ///
    /// Post-order guarantees that the variables a variable depends on come before it.
    pub fn extract_variables(&self) -> Vec<Expr> {
        let mut seen = HashSet::new();
        self.post_order_iter()
            .filter(|node| node.label().is_some_and(|label| seen.insert(label)))
            .cloned()
            .collect()
    }

    /// Renders the expression, returning the byte ranges at which `target` (compared by
    /// identity) appears in the rendering.
    pub fn render_with_spans(&self, target: &Expr) -> (String, Vec<Range<usize>>) {
        let mut renderer = Renderer::new(Some(target), true);
        renderer.render(self);
        renderer.finish()
    }

    /// Returns a value that displays the expression with variables shown by name (`var3`)
    /// instead of inline (`var3(...)`).
    pub fn named(&self) -> Named<'_> {
        Named(self)
    }

    /// Creates a [`ExprKind::Symbol`].
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Symbol(name.into()))
    }

    /// Creates a [`ExprKind::FloatValue`].
    pub fn float(value: f64) -> Self {
        Self::new(ExprKind::FloatValue(Float(value)))
    }

    /// Creates a [`ExprKind::IntValue`].
    pub fn int(value: i64) -> Self {
        Self::new(ExprKind::IntValue(value))
    }

    /// Creates a [`ExprKind::Zero`] of the given shape.
    pub fn zero(shape: Shape) -> Self {
        Self::new(ExprKind::Zero(shape))
    }

    /// Creates a [`ExprKind::Identity`].
    pub fn identity(dim: usize) -> Self {
        Self::new(ExprKind::Identity(dim))
    }

    /// Creates a [`ExprKind::MultiIndex`].
    pub fn multi_index(items: impl IntoIterator<Item = impl Into<IndexItem>>) -> Self {
        Self::new(ExprKind::MultiIndex(items.into_iter().map(Into::into).collect()))
    }

    /// Creates a [`ExprKind::BasisFunction`].
    pub fn basis_function(arg: Argument) -> Self {
        Self::new(ExprKind::BasisFunction(arg))
    }

    /// Creates a [`ExprKind::Function`].
    pub fn coefficient(coeff: Coefficient) -> Self {
        Self::new(ExprKind::Function(coeff))
    }

    /// Creates a [`ExprKind::FacetNormal`].
    pub fn facet_normal(dim: usize) -> Self {
        Self::new(ExprKind::FacetNormal(dim))
    }

    /// Creates a [`ExprKind::Sum`].
    pub fn sum(lhs: Self, rhs: Self) -> Self {
        Self::new(ExprKind::Sum(lhs, rhs))
    }

    /// Creates a [`ExprKind::Product`].
    pub fn product(lhs: Self, rhs: Self) -> Self {
        Self::new(ExprKind::Product(lhs, rhs))
    }

    /// Creates a [`ExprKind::Division`].
    pub fn division(num: Self, den: Self) -> Self {
        Self::new(ExprKind::Division(num, den))
    }

    /// Creates a [`ExprKind::Power`].
    pub fn power(base: Self, exp: Self) -> Self {
        Self::new(ExprKind::Power(base, exp))
    }

    /// Creates a [`ExprKind::Indexed`] selecting the given components of this expression.
    pub fn index(self, items: impl IntoIterator<Item = impl Into<IndexItem>>) -> Self {
        Self::new(ExprKind::Indexed(self, Self::multi_index(items)))
    }

    /// Creates a [`ExprKind::ComponentTensor`] turning the given free indices into axes.
    pub fn as_tensor(self, indices: impl IntoIterator<Item = Index>) -> Self {
        Self::new(ExprKind::ComponentTensor(self, Self::multi_index(indices)))
    }

    /// Creates a [`ExprKind::ListTensor`].
    pub fn list_tensor(ops: Vec<Self>) -> Self {
        Self::new(ExprKind::ListTensor(ops))
    }

    /// Creates a [`ExprKind::SpatialDerivative`] of this expression in the given directions.
    pub fn dx(self, items: impl IntoIterator<Item = impl Into<IndexItem>>) -> Self {
        Self::new(ExprKind::SpatialDerivative(self, Self::multi_index(items)))
    }

    /// Creates a [`ExprKind::Variable`] with the given label.
    pub fn variable(expr: Self, label: Label) -> Self {
        Self::new(ExprKind::Variable(expr, label))
    }

    /// Creates a [`ExprKind::Variable`] with a new label from the given allocator.
    pub fn labelled(expr: Self, labels: &mut LabelAllocator) -> Self {
        Self::variable(expr, labels.next_label())
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Self::float(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::int(value)
    }
}

/// Adds two [`Expr`]s together. No simplification is done.
impl Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::sum(self, rhs)
    }
}

impl Add<Expr> for f64 {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Self::Output {
        Expr::sum(Expr::float(self), rhs)
    }
}

/// Multiplies two [`Expr`]s together. No simplification is done.
impl Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::product(self, rhs)
    }
}

impl Mul<Expr> for f64 {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Self::Output {
        Expr::product(Expr::float(self), rhs)
    }
}

/// Divides an [`Expr`] by another. No simplification is done.
impl Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Self::division(self, rhs)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn v(number: usize) -> Expr {
        Expr::basis_function(Argument::scalar(number))
    }

    #[test]
    fn structural_equality() {
        let a = 1.23 * v(0);
        let b = 1.23 * v(0);
        assert_eq!(a, b);
        assert!(!Expr::ptr_eq(&a, &b));

        // not mathematical equality
        assert_ne!(v(0) * v(1), v(1) * v(0));
        assert_ne!(Expr::float(0.0), Expr::float(-0.0));
        assert_ne!(Expr::float(2.0), Expr::int(2));
    }

    #[test]
    fn operands_and_reconstruct() {
        let lhs = Expr::float(1.23);
        let rhs = v(0);
        let product = lhs.clone() * rhs.clone();

        let ops = product.operands();
        assert_eq!(ops.len(), 2);
        assert!(Expr::ptr_eq(ops[0], &lhs));
        assert!(Expr::ptr_eq(ops[1], &rhs));

        let swapped = product.reconstruct(vec![rhs.clone(), lhs.clone()]).unwrap();
        assert_eq!(swapped, rhs * lhs);
    }

    #[test]
    fn reconstruct_arity() {
        let product = Expr::float(1.23) * v(0);
        let err = product.reconstruct(vec![v(1)]).unwrap_err();
        let kind = err.downcast_ref::<ReconstructArity>().unwrap();
        assert_eq!(kind.kind, "Product");
        assert_eq!(kind.expected, 2);
        assert_eq!(kind.given, 1);

        // terminals reconstruct to themselves
        let leaf = v(0);
        assert!(Expr::ptr_eq(&leaf.reconstruct(vec![]).unwrap(), &leaf));
    }

    #[test]
    fn variable_reconstruct_keeps_label() {
        let var = Expr::variable(v(0), Label::new(7));
        let rebuilt = var.reconstruct(vec![v(1)]).unwrap();
        assert_eq!(rebuilt.label(), Some(Label::new(7)));
        assert_eq!(rebuilt.as_variable().unwrap().0, &v(1));
    }

    #[test]
    fn shapes() {
        let vector = Expr::basis_function(Argument::new(0, vec![3]));
        assert_eq!(vector.shape(), &[3]);
        assert_eq!((2.0 * vector.clone()).shape(), &[3]);
        assert_eq!(Expr::identity(2).rank(), 2);
        assert_eq!(Expr::facet_normal(3).shape(), &[3]);

        let list = Expr::list_tensor(vec![v(0), v(1)]);
        assert_eq!(list.shape(), &[2]);
        assert_eq!(Expr::list_tensor(vec![list.clone(), list]).shape(), &[2, 2]);
    }

    #[test]
    fn index_accounting() {
        let i = Index::new(0, 3);
        let j = Index::new(1, 3);
        let vector = Expr::basis_function(Argument::new(0, vec![3]));
        let matrix = Expr::coefficient(Coefficient::new(0, "K", vec![3, 3]));

        // v[i] has one free index
        let vi = vector.clone().index([i]);
        assert!(vi.shape().is_empty());
        assert_eq!(vi.free_indices(), &[i]);

        // K[i, j] * v[j] sums over j
        let kij = matrix.clone().index([i, j]);
        let contracted = kij * vector.index([j]);
        assert_eq!(contracted.free_indices(), &[i]);
        assert_eq!(contracted.index_dimensions(), IndexDimensions::from([(0, 3), (1, 3)]));

        // K[i, i] is the trace
        assert!(matrix.clone().index([i, i]).free_indices().is_empty());

        // K[0] is a vector
        assert_eq!(matrix.index([0usize]).shape(), &[3]);

        // as_tensor(v[i], (i,)) is a vector again
        let tensor = contracted.as_tensor([i]);
        assert_eq!(tensor.shape(), &[3]);
        assert!(tensor.free_indices().is_empty());
    }

    #[test]
    fn derivative_indices() {
        let i = Index::new(4, 2);
        let dv = v(0).dx([i]);
        assert_eq!(dv.free_indices(), &[i]);

        // div: v[i].dx(i) has no free indices
        let vector = Expr::basis_function(Argument::new(0, vec![2]));
        let div = vector.index([i]).dx([i]);
        assert!(div.free_indices().is_empty());
    }

    #[test]
    fn extract_variables_post_order() {
        let mut labels = LabelAllocator::new();
        let inner = Expr::labelled(v(0) * v(1), &mut labels);
        let outer = Expr::labelled(inner.clone() + Expr::float(1.0), &mut labels);
        let root = outer.clone() * inner.clone();

        let vars = root.extract_variables();
        assert_eq!(vars.len(), 2);
        assert!(Expr::ptr_eq(&vars[0], &inner));
        assert!(Expr::ptr_eq(&vars[1], &outer));
    }

    #[test]
    fn shared_nodes_visited_once() {
        let shared = v(0) * v(1);
        let root = shared.clone() + shared.clone();
        let nodes = root.post_order_iter().collect::<Vec<_>>();

        // v0, v1, shared, root
        assert_eq!(nodes.len(), 4);
        assert!(Expr::ptr_eq(nodes[2], &shared));
        assert!(Expr::ptr_eq(nodes[3], &root));
    }
}
