#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A label identifying a named variable (see [`ExprKind::Variable`]).
///
/// Two variable nodes carrying the same label refer to the same logical variable, even if they
/// were constructed independently. Labels are minted by a [`LabelAllocator`].
///
/// [`ExprKind::Variable`]: crate::ExprKind::Variable
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Label(usize);

impl Label {
    /// Creates a label with the given raw value.
    ///
    /// Prefer [`LabelAllocator::next_label`], which guarantees uniqueness within one allocator.
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Returns the raw value of the label.
    pub const fn value(self) -> usize {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var{}", self.0)
    }
}

/// Mints unique [`Label`]s.
///
/// There is no global label counter; whoever builds expressions (or splits them) owns an
/// allocator and passes it around explicitly.
#[derive(Clone, Debug, Default)]
pub struct LabelAllocator {
    /// The value of the next label to mint.
    next: usize,
}

impl LabelAllocator {
    /// Creates an allocator whose first label is `var0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a new label.
    pub fn next_label(&mut self) -> Label {
        let label = Label(self.next);
        self.next += 1;
        label
    }

    /// Makes sure this allocator never mints the given label.
    pub fn reserve(&mut self, label: Label) {
        self.next = self.next.max(label.0 + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_unique() {
        let mut labels = LabelAllocator::new();
        let a = labels.next_label();
        let b = labels.next_label();
        assert_ne!(a, b);
        assert_eq!(a.value() + 1, b.value());
    }

    #[test]
    fn reserved_labels() {
        let mut labels = LabelAllocator::new();
        for label in [3, 9, 1] {
            labels.reserve(Label::new(label));
        }
        assert_eq!(labels.next_label(), Label::new(10));

        labels.reserve(Label::new(20));
        assert_eq!(labels.next_label(), Label::new(21));

        // reserving a smaller label does nothing
        labels.reserve(Label::new(2));
        assert_eq!(labels.next_label(), Label::new(22));
    }
}
