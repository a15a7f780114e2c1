use super::Expr;
use std::collections::HashSet;

/// An iterator that iteratively traverses the tree of expressions in left-to-right post-order
/// (i.e. depth-first).
///
/// Expressions are DAGs, so a node may be reachable through several parents. Each node (by
/// identity) is yielded once, at the position of its first occurrence.
///
/// This iterator is created by [`Expr::post_order_iter`].
pub struct ExprIter<'a> {
    /// Nodes waiting to be visited, along with whether their operands were already pushed.
    stack: Vec<(&'a Expr, bool)>,

    /// Addresses of nodes that were already expanded.
    expanded: HashSet<usize>,
}

impl<'a> ExprIter<'a> {
    /// Creates a new iterator that traverses the tree of expressions in left-to-right post-order
    /// (i.e. depth-first).
    pub fn new(expr: &'a Expr) -> Self {
        Self {
            stack: vec![(expr, false)],
            expanded: HashSet::new(),
        }
    }
}

impl<'a> Iterator for ExprIter<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((expr, operands_pushed)) = self.stack.pop() {
            if operands_pushed {
                return Some(expr);
            }

            if !self.expanded.insert(expr.addr()) {
                continue;
            }

            self.stack.push((expr, true));
            for operand in expr.operands().into_iter().rev() {
                if !self.expanded.contains(&operand.addr()) {
                    self.stack.push((operand, false));
                }
            }
        }

        None
    }
}
