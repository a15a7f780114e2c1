//! Tensor indices and the index accounting rules shared by the expression nodes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// A free index, such as the `i` in `A[i, i]` or `v.dx(i)`.
///
/// An index ranges over `0..dim`. Indices are compared by both their identifier and dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Index {
    /// The identifier of the index.
    pub id: usize,

    /// The number of values the index ranges over.
    pub dim: usize,
}

impl Index {
    /// Creates a new index.
    pub const fn new(id: usize, dim: usize) -> Self {
        Self { id, dim }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i_{}", self.id)
    }
}

/// One entry of a multi-index: either a fixed component or a free index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IndexItem {
    /// A fixed component, such as the `0` in `A[0, i]`.
    Fixed(usize),

    /// A free index.
    Free(Index),
}

impl IndexItem {
    /// If the item is a free index, returns it.
    pub fn as_free(&self) -> Option<Index> {
        match self {
            Self::Free(index) => Some(*index),
            Self::Fixed(_) => None,
        }
    }
}

impl From<Index> for IndexItem {
    fn from(index: Index) -> Self {
        Self::Free(index)
    }
}

impl From<usize> for IndexItem {
    fn from(component: usize) -> Self {
        Self::Fixed(component)
    }
}

impl fmt::Display for IndexItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(component) => write!(f, "{}", component),
            Self::Free(index) => write!(f, "{}", index),
        }
    }
}

/// Maps the identifier of every free or repeated index in an expression to its dimension.
pub type IndexDimensions = BTreeMap<usize, usize>;

/// Returns the indices that occur exactly once in the concatenation of the given lists, in order
/// of first occurrence. Indices occurring more than once are summed over (contracted).
pub(crate) fn contract(lists: &[&[Index]]) -> Vec<Index> {
    let all = lists.iter().flat_map(|list| list.iter());
    let mut out = Vec::new();
    for index in all.clone() {
        let count = all.clone().filter(|other| *other == index).count();
        if count == 1 {
            out.push(*index);
        }
    }
    out
}

/// Returns the union of the given lists, in order of first occurrence.
pub(crate) fn union(lists: &[&[Index]]) -> Vec<Index> {
    let mut out: Vec<Index> = Vec::new();
    for index in lists.iter().flat_map(|list| list.iter()) {
        if !out.contains(index) {
            out.push(*index);
        }
    }
    out
}

/// Returns the free indices in `items` (with repeats).
pub(crate) fn free_items(items: &[IndexItem]) -> Vec<Index> {
    items.iter().filter_map(IndexItem::as_free).collect()
}
