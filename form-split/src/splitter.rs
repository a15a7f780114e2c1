//! The dependency splitter.
//!
//! The splitter walks an expression bottom-up, computing the [`DependencySet`] of every node. When
//! the operands of a node depend on different things, each of them is promoted to a named variable
//! and registered in the [`CodeStructure`], so that a code generator can evaluate it in the
//! outermost block where all of its dependencies are available. The node itself then refers to the
//! variables instead of the original operands.
//!
//! Every node is visited once per run, no matter how many parents it has, and a node whose
//! operands were left untouched is reused as-is instead of being rebuilt.

use crate::{
    code::{CodeStructure, VariableInfo},
    deps::DependencySet,
    error::{
        DependencyArityMismatch,
        ExpressionTooDeep,
        MalformedRenumbering,
        NotAVariable,
        RegistrationCollision,
        UnknownBasisFunction,
        UnknownCoefficient,
        UnprocessedVariable,
    },
    form_data::FormData,
    options::{CollisionPolicy, SplitOptions},
};
use form_error::{Error, ErrorKind};
use form_expr::{Argument, Coefficient, Expr, ExprKind, Label, LabelAllocator};
use levenshtein::levenshtein;
use std::{collections::HashMap, hash::{Hash, Hasher}};
use tracing::{debug, trace, warn};

/// An expression compared and hashed by identity.
///
/// Holding the handle keeps the node alive, so its address cannot be reused by another node
/// while it is a key.
#[derive(Clone, Debug)]
struct ById(Expr);

impl PartialEq for ById {
    fn eq(&self, other: &Self) -> bool {
        Expr::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ById {}

impl Hash for ById {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.addr().hash(state);
    }
}

/// Returns true if the expression is worth promoting to a variable of its own.
///
/// Literals and multi-indices are cheaper to repeat than to name.
fn is_nontrivial(expr: &Expr) -> bool {
    !matches!(
        expr.kind(),
        ExprKind::MultiIndex(_) | ExprKind::Zero(_) | ExprKind::FloatValue(_) | ExprKind::IntValue(_)
    )
}

/// Splits expressions into named variables grouped by [`DependencySet`].
///
/// A splitter holds the state of a single run: create one, then consume it with
/// [`DependencySplitter::split`]. Use [`split_by_dependencies`](crate::split_by_dependencies) for
/// the common case.
#[derive(Debug)]
pub struct DependencySplitter<'a> {
    /// Slot numbering of the form's basis functions and coefficients.
    form_data: &'a FormData,

    /// Dependency set of the basis function in each slot.
    basis_function_deps: &'a [DependencySet],

    /// Dependency set of the coefficient in each slot.
    function_deps: &'a [DependencySet],

    options: SplitOptions,

    /// The variables registered so far.
    code: CodeStructure,

    labels: LabelAllocator,

    /// The rewritten node and dependency set of every visited node.
    visited: HashMap<ById, (Expr, DependencySet)>,

    /// The variable each promoted node was registered as.
    promoted: HashMap<ById, Expr>,

    /// The expression being split, which error spans point into.
    source: Option<Expr>,

    /// The current recursion depth.
    depth: usize,
}

impl<'a> DependencySplitter<'a> {
    /// Creates a splitter, checking that the dependency declarations agree with each other and
    /// with the form data.
    ///
    /// Every declaration must have one basis-function flag per entry of `basis_function_deps`,
    /// and every slot assigned by `form_data` must have a declaration.
    pub fn new(
        form_data: &'a FormData,
        basis_function_deps: &'a [DependencySet],
        function_deps: &'a [DependencySet],
        options: SplitOptions,
    ) -> Result<Self, Error> {
        let rank = basis_function_deps.len();
        let declarations = basis_function_deps
            .iter()
            .map(|deps| ("basis function", deps))
            .enumerate()
            .chain(function_deps.iter().map(|deps| ("coefficient", deps)).enumerate());
        for (slot, (what, deps)) in declarations {
            if deps.rank() != rank {
                return Err(Error::new(Vec::new(), DependencyArityMismatch {
                    what,
                    slot,
                    expected: rank,
                    given: deps.rank(),
                }));
            }
        }

        let mut arguments = form_data.basis_function_renumbering.iter().collect::<Vec<_>>();
        arguments.sort_by_key(|(_, slot)| **slot);
        if let Some((arg, slot)) = arguments.into_iter().find(|(_, slot)| **slot >= rank) {
            return Err(Error::new(Vec::new(), MalformedRenumbering {
                what: "basis function",
                name: arg.to_string(),
                slot: *slot,
                declared: rank,
            }));
        }

        let mut coefficients = form_data.coefficient_renumbering.iter().collect::<Vec<_>>();
        coefficients.sort_by_key(|(_, slot)| **slot);
        if let Some((coeff, slot)) = coefficients.into_iter().find(|(_, slot)| **slot >= function_deps.len()) {
            return Err(Error::new(Vec::new(), MalformedRenumbering {
                what: "coefficient",
                name: coeff.display_name(),
                slot: *slot,
                declared: function_deps.len(),
            }));
        }

        Ok(Self {
            form_data,
            basis_function_deps,
            function_deps,
            options,
            code: CodeStructure::new(),
            labels: LabelAllocator::new(),
            visited: HashMap::new(),
            promoted: HashMap::new(),
            source: None,
            depth: 0,
        })
    }

    /// Splits the given expression, returning the variable for the whole expression and the
    /// structure of every variable it depends on.
    ///
    /// Variables already present in the expression keep their labels. Unless the expression is a
    /// variable itself, it is wrapped in a new one. The spans of a returned error point into the
    /// [`Display`](std::fmt::Display) rendering of `expr`.
    pub fn split(mut self, expr: &Expr) -> Result<(VariableInfo, CodeStructure), Error> {
        self.source = Some(expr.clone());

        let existing = expr.extract_variables();
        for label in existing.iter().filter_map(Expr::label) {
            self.labels.reserve(label);
        }

        let root = match expr.label() {
            Some(_) => expr.clone(),
            None => Expr::labelled(expr.clone(), &mut self.labels),
        };
        debug!(root = ?root.label(), variables = existing.len(), "splitting expression");

        for variable in root.extract_variables() {
            self.handle(&variable)?;
        }
        let root_info = self.handle(&root)?;

        let order = root_info.variable
            .extract_variables()
            .into_iter()
            .filter_map(|variable| variable.label());
        self.code.reorder(order);

        debug!(
            variables = self.code.len(),
            stacks = self.code.num_stacks(),
            deps = %root_info.deps,
            "split expression"
        );
        Ok((root_info, self.code))
    }

    /// Splits the expression of a variable and registers the variable under its label, unless
    /// the label is already registered.
    ///
    /// Returns [`NotAVariable`] if `variable` is not an [`ExprKind::Variable`].
    pub fn handle(&mut self, variable: &Expr) -> Result<VariableInfo, Error> {
        let Some((expr, label)) = variable.as_variable() else {
            return Err(self.error_at(variable, NotAVariable { expr: variable.named().to_string() }));
        };

        if let Some(info) = self.code.get(label) {
            return Ok(info.clone());
        }

        // promotions below must not take the label of this variable or of one it refers to
        for label in variable.extract_variables().iter().filter_map(Expr::label) {
            self.labels.reserve(label);
        }

        let (rewritten, deps) = self.visit(expr)?;
        let variable = if Expr::ptr_eq(&rewritten, expr) {
            trace!(%label, "variable left untouched");
            variable.clone()
        } else {
            Expr::variable(rewritten, label)
        };
        self.register_expression(variable, deps, Some(label))
    }

    /// Registers an expression as a variable with the given dependency set.
    ///
    /// A variable keeps its own label. Any other expression is wrapped in a variable with the
    /// given label, or a new one if `label` is `None`.
    ///
    /// Registering a label again with the same expression and dependency set returns the first
    /// registration. Registering it with different contents is a collision, handled according to
    /// [`SplitOptions::collisions`].
    pub fn register_expression(
        &mut self,
        expr: Expr,
        deps: DependencySet,
        label: Option<Label>,
    ) -> Result<VariableInfo, Error> {
        let (variable, label) = match (expr.label(), label) {
            (Some(own), _) => (expr, own),
            (None, Some(label)) => (Expr::variable(expr, label), label),
            (None, None) => {
                let label = self.labels.next_label();
                (Expr::variable(expr, label), label)
            },
        };
        self.labels.reserve(label);

        if let Some(existing) = self.code.get(label) {
            if existing.variable == variable && existing.deps == deps {
                return Ok(existing.clone());
            }

            let existing = existing.clone();
            return match self.options.collisions {
                CollisionPolicy::Error => Err(self.error_at(&variable, RegistrationCollision {
                    label: label.to_string(),
                    first: existing.expression().named().to_string(),
                    first_deps: existing.deps.to_string(),
                    second: variable.as_variable().map(|(expr, _)| expr).unwrap_or(&variable).named().to_string(),
                    second_deps: deps.to_string(),
                })),
                CollisionPolicy::Warn => {
                    warn!(%label, first = %existing.deps, second = %deps, "variable registered twice, keeping the first registration");
                    Ok(existing)
                },
            };
        }

        let info = VariableInfo { label, variable, deps };
        debug!(%label, deps = %info.deps, expr = %info.expression().named(), "registered variable");
        self.code.insert(info.clone());
        Ok(info)
    }

    /// Returns the variables registered so far.
    pub fn code(&self) -> &CodeStructure {
        &self.code
    }

    /// Returns a dependency set with no flags set.
    fn constant(&self) -> DependencySet {
        DependencySet::empty(self.basis_function_deps.len())
    }

    /// Builds an error pointing at every occurrence of `node` in the expression being split.
    fn error_at(&self, node: &Expr, kind: impl ErrorKind + 'static) -> Error {
        let spans = match &self.source {
            Some(source) => {
                let (text, spans) = source.render_with_spans(node);
                if spans.is_empty() {
                    vec![0..text.len()]
                } else {
                    spans
                }
            },
            None => Vec::new(),
        };
        Error::new(spans, kind)
    }

    /// Returns the rewritten node and the dependency set of the given node.
    fn visit(&mut self, expr: &Expr) -> Result<(Expr, DependencySet), Error> {
        let key = ById(expr.clone());
        if let Some(result) = self.visited.get(&key) {
            return Ok(result.clone());
        }

        // reported without spans
        if self.depth >= self.options.max_depth {
            return Err(Error::new(Vec::new(), ExpressionTooDeep { max_depth: self.options.max_depth }));
        }

        self.depth += 1;
        let result = self.visit_node(expr);
        self.depth -= 1;

        let result = result?;
        self.visited.insert(key, result.clone());
        Ok(result)
    }

    fn visit_node(&mut self, expr: &Expr) -> Result<(Expr, DependencySet), Error> {
        match expr.kind() {
            ExprKind::BasisFunction(arg) => Ok((expr.clone(), self.basis_function(expr, arg)?)),
            ExprKind::Function(coeff) => Ok((expr.clone(), self.coefficient(expr, coeff)?)),
            ExprKind::FacetNormal(_) => Ok((expr.clone(), self.constant().with_runtime())),
            ExprKind::Variable(_, label) => match self.code.get(*label) {
                Some(info) => Ok((info.variable.clone(), info.deps.clone())),
                None => Err(self.error_at(expr, UnprocessedVariable { label: label.to_string() })),
            },
            ExprKind::SpatialDerivative(operand, ii) => self.spatial_derivative(expr, operand, ii),
            _ if expr.is_terminal() => Ok((expr.clone(), self.constant())),
            _ => self.operator(expr),
        }
    }

    fn basis_function(&self, expr: &Expr, arg: &Argument) -> Result<DependencySet, Error> {
        let slot = self.form_data
            .basis_function_slot(arg)
            .ok_or_else(|| self.error_at(expr, UnknownBasisFunction {
                name: arg.to_string(),
                rank: self.form_data.rank(),
            }))?;
        Ok(self.basis_function_deps[slot].clone())
    }

    fn coefficient(&self, expr: &Expr, coeff: &Coefficient) -> Result<DependencySet, Error> {
        let slot = self.form_data
            .coefficient_slot(coeff)
            .ok_or_else(|| {
                let name = coeff.display_name();
                let suggestions = self.form_data
                    .coefficient_names()
                    .into_iter()
                    .filter(|other| levenshtein(other, &name) < 2)
                    .collect();
                self.error_at(expr, UnknownCoefficient { name, suggestions })
            })?;
        Ok(self.function_deps[slot].clone())
    }

    /// Derivatives are evaluated at runtime, so they depend on runtime values in addition to
    /// whatever their operand depends on.
    fn spatial_derivative(
        &mut self,
        expr: &Expr,
        operand: &Expr,
        ii: &Expr,
    ) -> Result<(Expr, DependencySet), Error> {
        let (rewritten, deps) = self.visit(operand)?;
        let deps = deps.with_runtime();

        if Expr::ptr_eq(&rewritten, operand) {
            return Ok((expr.clone(), deps));
        }

        let node = expr.reconstruct(vec![rewritten, ii.clone()])?;
        Ok((node, deps))
    }

    fn operator(&mut self, expr: &Expr) -> Result<(Expr, DependencySet), Error> {
        let operands = expr.operands();
        let mut rewritten = Vec::with_capacity(operands.len());
        let mut operand_deps = Vec::with_capacity(operands.len());
        for operand in &operands {
            let (new, deps) = self.visit(operand)?;
            rewritten.push(new);
            operand_deps.push(deps);
        }

        let deps = operand_deps.iter().fold(self.constant(), |acc, deps| &acc | deps);

        // if the operands depend on different things, each of them gets its own variable
        let mixed = rewritten
            .iter()
            .zip(&operand_deps)
            .any(|(operand, operand_deps)| is_nontrivial(operand) && *operand_deps != deps);
        if mixed {
            for (operand, operand_deps) in rewritten.iter_mut().zip(operand_deps) {
                if is_nontrivial(operand) {
                    *operand = self.promote(operand.clone(), operand_deps)?;
                }
            }
        }

        let unchanged = rewritten
            .iter()
            .zip(&operands)
            .all(|(new, old)| Expr::ptr_eq(new, old));
        if unchanged {
            return Ok((expr.clone(), deps));
        }

        trace!(kind = expr.kind().name(), "rebuilding node over rewritten operands");
        let node = expr.reconstruct(rewritten)?;
        Ok((node, deps))
    }

    /// Returns the variable for the given rewritten operand, registering it the first time it is
    /// promoted.
    fn promote(&mut self, operand: Expr, deps: DependencySet) -> Result<Expr, Error> {
        let key = ById(operand.clone());
        if let Some(variable) = self.promoted.get(&key) {
            trace!(label = ?variable.label(), "reusing promoted subexpression");
            return Ok(variable.clone());
        }

        let info = self.register_expression(operand, deps, None)?;
        trace!(label = %info.label, deps = %info.deps, "promoted subexpression");
        self.promoted.insert(key, info.variable.clone());
        Ok(info.variable)
    }
}
