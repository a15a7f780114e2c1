use ariadne::Fmt;
use form_attrs::ErrorKind;
use form_error::EXPR;

/// A basis function has no slot in the form data.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the basis function `{}` is not an argument of this form", self.name),
    labels = ["this basis function"],
    help = format!(
        "the form has {} basis function{}; make sure the form data was collected from this integrand",
        self.rank,
        if self.rank == 1 { "" } else { "s" },
    ),
)]
pub struct UnknownBasisFunction {
    /// The name of the basis function.
    pub name: String,

    /// The number of basis functions in the form data.
    pub rank: usize,
}

/// A coefficient has no slot in the form data.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the coefficient `{}` is not a coefficient of this form", self.name),
    labels = ["this coefficient"],
    help = if self.suggestions.is_empty() {
        "make sure the form data was collected from this integrand".to_string()
    } else if self.suggestions.len() == 1 {
        format!("did you mean the `{}` coefficient?", (&*self.suggestions[0]).fg(EXPR))
    } else {
        format!(
            "did you mean one of these coefficients? {}",
            self.suggestions
                .iter()
                .map(|s| format!("`{}`", s.fg(EXPR)))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
)]
pub struct UnknownCoefficient {
    /// The name of the coefficient.
    pub name: String,

    /// Coefficients of the form with a similar name, if any.
    pub suggestions: Vec<String>,
}

/// The form data assigns a slot that has no dependency declaration.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the {} `{}` was assigned slot {}, which is not declared", self.what, self.name, self.slot),
    labels = [""],
    help = format!(
        "only {} {} dependency set{} were given",
        self.declared,
        self.what,
        if self.declared == 1 { "" } else { "s" },
    ),
)]
pub struct MalformedRenumbering {
    /// Either `basis function` or `coefficient`.
    pub what: &'static str,

    /// The name of the renumbered basis function or coefficient.
    pub name: String,

    /// The slot it was assigned.
    pub slot: usize,

    /// The number of dependency sets declared for that kind of terminal.
    pub declared: usize,
}

/// A dependency declaration has the wrong number of basis-function flags.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!(
        "the dependency set declared for {} slot {} has {} basis-function flag{}",
        self.what,
        self.slot,
        self.given,
        if self.given == 1 { "" } else { "s" },
    ),
    labels = [""],
    help = format!("every dependency set must have one flag per basis function ({} here)", self.expected),
)]
pub struct DependencyArityMismatch {
    /// Either `basis function` or `coefficient`.
    pub what: &'static str,

    /// The slot of the offending declaration.
    pub slot: usize,

    /// The number of basis functions of the form.
    pub expected: usize,

    /// The number of flags in the declaration.
    pub given: usize,
}

/// A variable was referenced before its own definition was split.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the variable `{}` is referenced before it was processed", self.label),
    labels = ["this variable"],
    note = "variables are processed in post-order, so a variable must only refer to variables reachable from the expression being split",
)]
pub struct UnprocessedVariable {
    /// The label of the variable.
    pub label: String,
}

/// A label was registered twice, with different expressions or dependency sets.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the variable `{}` was registered twice with different contents", self.label),
    labels = ["this variable"],
    help = format!(
        "it was first registered as `{}` with dependencies {}, then as `{}` with dependencies {}",
        (&*self.first).fg(EXPR),
        self.first_deps,
        (&*self.second).fg(EXPR),
        self.second_deps,
    ),
    note = "use `CollisionPolicy::Warn` to keep the first registration instead",
)]
pub struct RegistrationCollision {
    /// The label of the variable.
    pub label: String,

    /// The expression of the first registration.
    pub first: String,

    /// The dependencies of the first registration.
    pub first_deps: String,

    /// The expression of the second registration.
    pub second: String,

    /// The dependencies of the second registration.
    pub second_deps: String,
}

/// The expression is nested deeper than allowed.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "the expression is nested too deeply to split",
    labels = ["this subexpression is too deep"],
    help = format!("the maximum depth is {}; raise it with `SplitOptions::max_depth`", self.max_depth),
)]
pub struct ExpressionTooDeep {
    /// The maximum depth that was exceeded.
    pub max_depth: usize,
}

/// A non-variable expression was given where a variable was expected.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("expected a variable, got `{}`", self.expr),
    labels = ["this expression"],
    help = "wrap the expression with `Expr::variable` or `Expr::labelled` first",
)]
pub struct NotAVariable {
    /// The rendering of the expression.
    pub expr: String,
}
