use crate::logger::{Log, NoopLogger};
use crate::node::Node;
use std::sync::Arc;

/// A tree of folders.
///
/// The tree starts out as a single root folder, reached by the path
/// `"/"`. All operations take `&self` and may be called from any number
/// of threads; operations on independent subtrees proceed in parallel.
pub struct Tree<L = NoopLogger>
where
    L: Log,
{
    root: Arc<Node<L>>,
}

impl<L> Tree<L>
where
    L: Log,
{
    /// Returns a reference to the root node of the tree.
    pub(crate) fn root(&self) -> &Arc<Node<L>> {
        &self.root
    }

    /// Creates a tree from a root node.
    pub(crate) fn from_root_node(root: Arc<Node<L>>) -> Self {
        Self { root }
    }
}
