//! The output of a split: named variables grouped by dependency set.

use crate::deps::DependencySet;
use form_expr::{Expr, Label};
use indexmap::IndexMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{collections::{HashMap, HashSet}, fmt};

/// A named variable discovered while splitting, along with its dependency set.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VariableInfo {
    /// The label of the variable.
    pub label: Label,

    /// The [`ExprKind::Variable`](form_expr::ExprKind::Variable) node, wrapping the rewritten
    /// expression.
    pub variable: Expr,

    /// What the variable depends on.
    pub deps: DependencySet,
}

impl VariableInfo {
    /// Returns the expression wrapped by the variable.
    pub fn expression(&self) -> &Expr {
        self.variable
            .as_variable()
            .map(|(expr, _)| expr)
            .unwrap_or(&self.variable)
    }
}

/// Named variables, grouped into stacks of variables sharing the same dependency set.
///
/// Within a stack, a variable always comes after the variables its expression refers to, so each
/// stack can be emitted as one block of assignments. Stacks are kept in the order they were first
/// needed.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CodeStructure {
    /// Every registered variable.
    variable_info: HashMap<Label, VariableInfo>,

    /// The labels of the registered variables, grouped by dependency set.
    stacks: IndexMap<DependencySet, Vec<Label>>,
}

impl CodeStructure {
    /// Creates an empty code structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the variable with the given label.
    pub fn get(&self, label: Label) -> Option<&VariableInfo> {
        self.variable_info.get(&label)
    }

    /// Returns true if a variable with the given label was registered.
    pub fn contains(&self, label: Label) -> bool {
        self.variable_info.contains_key(&label)
    }

    /// Returns the number of registered variables.
    pub fn len(&self) -> usize {
        self.variable_info.len()
    }

    /// Returns true if no variable was registered.
    pub fn is_empty(&self) -> bool {
        self.variable_info.is_empty()
    }

    /// Returns the number of stacks.
    pub fn num_stacks(&self) -> usize {
        self.stacks.len()
    }

    /// Returns the variables depending on exactly the given dependency set, in order.
    pub fn stack(&self, deps: &DependencySet) -> Vec<&VariableInfo> {
        self.stacks
            .get(deps)
            .map(|labels| self.resolve(labels))
            .unwrap_or_default()
    }

    /// Returns every stack with its dependency set, in order.
    pub fn stacks(&self) -> impl Iterator<Item = (&DependencySet, Vec<&VariableInfo>)> + '_ {
        self.stacks
            .iter()
            .map(|(deps, labels)| (deps, self.resolve(labels)))
    }

    /// Returns every variable, stack by stack.
    pub fn iter(&self) -> impl Iterator<Item = &VariableInfo> + '_ {
        self.stacks
            .values()
            .flatten()
            .filter_map(|label| self.variable_info.get(label))
    }

    fn resolve(&self, labels: &[Label]) -> Vec<&VariableInfo> {
        labels
            .iter()
            .filter_map(|label| self.variable_info.get(label))
            .collect()
    }

    /// Adds a variable to the end of the stack for its dependency set.
    ///
    /// The caller must make sure the label is not registered yet.
    pub(crate) fn insert(&mut self, info: VariableInfo) {
        self.stacks
            .entry(info.deps.clone())
            .or_default()
            .push(info.label);
        self.variable_info.insert(info.label, info);
    }

    /// Reorders the stacks and their contents by the order in which the given labels are listed.
    /// Registered variables that are not listed keep their relative order, after the listed
    /// ones.
    pub(crate) fn reorder(&mut self, order: impl IntoIterator<Item = Label>) {
        let mut placed = HashSet::new();
        let mut stacks = IndexMap::<DependencySet, Vec<Label>>::new();
        let rest = self.stacks.values().flatten().copied().collect::<Vec<_>>();

        for label in order.into_iter().chain(rest) {
            let Some(info) = self.variable_info.get(&label) else {
                continue;
            };
            if placed.insert(label) {
                stacks.entry(info.deps.clone()).or_default().push(label);
            }
        }

        self.stacks = stacks;
    }
}

/// Structural equality that also compares the order of the stacks and of their contents.
impl PartialEq for CodeStructure {
    fn eq(&self, other: &Self) -> bool {
        self.variable_info == other.variable_info && self.stacks.iter().eq(other.stacks.iter())
    }
}

/// Lists every stack, one assignment per line:
///
/// ```text
/// {v_0}:
///   var3 = 2.0 * v_0
/// ```
impl fmt::Display for CodeStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (deps, stack)) in self.stacks().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", deps)?;
            for info in stack {
                writeln!(f, "  {} = {}", info.label, info.expression().named())?;
            }
        }
        Ok(())
    }
}
