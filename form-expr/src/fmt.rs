//! Rendering of expressions to text.
//!
//! The [`Renderer`] can additionally record where a given node (compared by identity) ends up in
//! the output, which is how diagnostics point at the offending part of an expression.

use crate::expr::{Expr, ExprKind};
use std::{fmt, ops::Range};

/// Binding strength of an expression when printed; higher binds tighter.
fn precedence(expr: &Expr) -> u8 {
    match expr.kind() {
        ExprKind::Sum(_, _) => 1,
        ExprKind::Product(_, _) | ExprKind::Division(_, _) => 2,
        ExprKind::Power(_, _) => 3,
        ExprKind::FloatValue(value) if value.0 < 0.0 => 2,
        ExprKind::IntValue(value) if *value < 0 => 2,
        _ => 4,
    }
}

/// Renders expressions to a [`String`].
pub(crate) struct Renderer<'t> {
    out: String,

    /// Node whose occurrences should be recorded.
    target: Option<&'t Expr>,

    /// Byte ranges at which `target` was rendered.
    spans: Vec<Range<usize>>,

    /// Whether to render the contents of variables, or just their label.
    inline_variables: bool,
}

impl<'t> Renderer<'t> {
    pub(crate) fn new(target: Option<&'t Expr>, inline_variables: bool) -> Self {
        Self {
            out: String::new(),
            target,
            spans: Vec::new(),
            inline_variables,
        }
    }

    /// Returns the rendered text and the recorded spans.
    pub(crate) fn finish(self) -> (String, Vec<Range<usize>>) {
        (self.out, self.spans)
    }

    fn items(&mut self, ii: &Expr) {
        let items = ii.multi_index_items()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        self.out.push_str(&items.join(", "));
    }

    /// Renders the expression.
    ///
    /// Nodes are expanded on an explicit stack, so arbitrarily deep expressions can be rendered.
    pub(crate) fn render(&mut self, expr: &Expr) {
        let mut stack = vec![Step::Node(expr)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Text(text) => self.out.push_str(text),
                Step::Items(ii) => self.items(ii),
                Step::Child(child, min) if precedence(child) < min => {
                    stack.extend([Step::Text(")"), Step::Node(child), Step::Text("(")]);
                },
                Step::Child(child, _) => stack.push(Step::Node(child)),
                Step::End(node, start) => {
                    if self.target.is_some_and(|target| Expr::ptr_eq(target, node)) {
                        self.spans.push(start..self.out.len());
                    }
                },
                Step::Node(node) => {
                    stack.push(Step::End(node, self.out.len()));
                    let parts = self.expand(node);
                    stack.extend(parts.into_iter().rev());
                },
            }
        }
    }

    /// Writes the leading text of `node` and returns the steps rendering the rest of it, in
    /// order.
    fn expand<'e>(&mut self, node: &'e Expr) -> Vec<Step<'e>> {
        match node.kind() {
            ExprKind::Symbol(name) => self.out.push_str(name),
            ExprKind::Zero(shape) if shape.is_empty() => self.out.push('0'),
            ExprKind::Zero(shape) => {
                let dims = shape.iter().map(ToString::to_string).collect::<Vec<_>>();
                self.out.push_str(&format!("zero({})", dims.join(", ")));
            },
            ExprKind::FloatValue(value) => self.out.push_str(&format!("{:?}", value.0)),
            ExprKind::IntValue(value) => self.out.push_str(&value.to_string()),
            ExprKind::Identity(_) => self.out.push('I'),
            ExprKind::MultiIndex(_) => {
                self.out.push('(');
                self.items(node);
                self.out.push(')');
            },
            ExprKind::BasisFunction(arg) => self.out.push_str(&arg.to_string()),
            ExprKind::Function(coeff) => self.out.push_str(&coeff.to_string()),
            ExprKind::FacetNormal(_) => self.out.push('n'),
            ExprKind::Sum(lhs, rhs) => return binary(lhs, " + ", rhs, 1, 2),
            ExprKind::Product(lhs, rhs) => return binary(lhs, " * ", rhs, 2, 3),
            ExprKind::Division(num, den) => return binary(num, " / ", den, 2, 3),
            ExprKind::Power(base, exp) => return binary(base, "^", exp, 4, 3),
            ExprKind::Indexed(inner, ii) => {
                return vec![Step::Child(inner, 4), Step::Text("["), Step::Items(ii), Step::Text("]")];
            },
            ExprKind::ComponentTensor(inner, ii) => {
                return vec![
                    Step::Text("as_tensor("),
                    Step::Node(inner),
                    Step::Text(", "),
                    Step::Node(ii),
                    Step::Text(")"),
                ];
            },
            ExprKind::ListTensor(ops) => {
                let mut parts = vec![Step::Text("[")];
                for (i, op) in ops.iter().enumerate() {
                    if i > 0 {
                        parts.push(Step::Text(", "));
                    }
                    parts.push(Step::Node(op));
                }
                parts.push(Step::Text("]"));
                return parts;
            },
            ExprKind::SpatialDerivative(inner, ii) => {
                return vec![Step::Child(inner, 4), Step::Text(".dx("), Step::Items(ii), Step::Text(")")];
            },
            ExprKind::Variable(inner, label) => {
                self.out.push_str(&label.to_string());
                if self.inline_variables {
                    return vec![Step::Text("("), Step::Node(inner), Step::Text(")")];
                }
            },
        }
        Vec::new()
    }
}

/// A pending piece of work of the [`Renderer`].
enum Step<'e> {
    /// Render a node.
    Node(&'e Expr),

    /// Render an operand, in parentheses if it binds weaker than the given precedence.
    Child(&'e Expr, u8),

    Text(&'static str),

    /// Render the items of a multi-index, without parentheses.
    Items(&'e Expr),

    /// A node that started rendering at the given offset is done.
    End(&'e Expr, usize),
}

fn binary<'e>(lhs: &'e Expr, op: &'static str, rhs: &'e Expr, lhs_min: u8, rhs_min: u8) -> Vec<Step<'e>> {
    vec![Step::Child(lhs, lhs_min), Step::Text(op), Step::Child(rhs, rhs_min)]
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut renderer = Renderer::new(None, true);
        renderer.render(self);
        f.write_str(&renderer.finish().0)
    }
}

/// Displays an expression with variables shown by name.
///
/// This type is created by [`Expr::named`].
pub struct Named<'a>(pub(crate) &'a Expr);

impl fmt::Display for Named<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut renderer = Renderer::new(None, false);
        renderer.render(self.0);
        f.write_str(&renderer.finish().0)
    }
}
