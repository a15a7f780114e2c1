use form_attrs::ErrorKind;

/// A node was reconstructed with the wrong number of operands.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!(
        "cannot reconstruct a `{}` node from {} operand{}",
        self.kind,
        self.given,
        if self.given == 1 { "" } else { "s" },
    ),
    labels = ["this expression"],
    help = format!("a `{}` node takes exactly {} operand(s)", self.kind, self.expected),
)]
pub struct ReconstructArity {
    /// The name of the node kind.
    pub kind: &'static str,

    /// The number of operands the node takes.
    pub expected: usize,

    /// The number of operands given.
    pub given: usize,
}
