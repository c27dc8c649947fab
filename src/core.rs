use crate::error::TreeError;
use crate::logger::Log;
use crate::node::{Node, ReadPermit, WritePermit};
use crate::path;
use crate::tree::Tree;
use std::sync::Arc;

// Operations that only look at a node's children hold reader permission
// on it; operations that change the children hold writer permission.
// Every descent goes top-down and acquires the child before releasing
// the parent, so a node that holds permission at some depth knows the
// path above it cannot change under its feet.
//
// Removal drains the doomed folder first: with the parent writer-held,
// nothing new can reach the folder, and the drain waits out everything
// already inside. A move writer-locks the lowest common ancestor of the
// two endpoints before touching either branch, which both serializes
// overlapping moves and keeps fresh descents out of the branches while
// the endpoints are being locked; the moved subtree is then drained the
// same way before it changes parents.

impl Tree {
    /// Creates a new tree with only the root folder.
    pub fn new() -> Self {
        Self::with_logger()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> Tree<L>
where
    L: Log,
{
    /// Creates a new tree with only the root folder, reporting node
    /// creation and destruction through `L`.
    pub fn with_logger() -> Self {
        Tree::from_root_node(Node::new())
    }

    /// Lists the immediate children of the folder at `path`, as a
    /// comma-separated string of names in lexicographic order.
    ///
    /// Returns `None` if the path is invalid or some folder on it does
    /// not exist.
    pub fn list(&self, path: &str) -> Option<String> {
        if !path::is_valid(path) {
            return None;
        }
        let mut cur = ReadPermit::acquire(self.root());
        for name in path::components(path) {
            let child = match cur.children().get(name) {
                Some(child) => Arc::clone(child),
                None => return None,
            };
            // The child is acquired before `cur` is released.
            let next = ReadPermit::acquire(&child);
            cur = next;
        }
        let mut names = cur.children().iter().map(|(name, _)| name).collect::<Vec<_>>();
        names.sort_unstable();
        Some(names.join(","))
    }

    /// Creates an empty folder at `path`. The parent must already exist.
    pub fn create(&self, path: &str) -> Result<(), TreeError> {
        if !path::is_valid(path) {
            return Err(TreeError::InvalidPath);
        }
        if path::is_root(path) {
            return Err(TreeError::AlreadyExists);
        }
        let (parent_path, name) = path::parent_of(path);
        let mut parent = descend(self.root(), parent_path, path::depth(parent_path))?;
        if parent.children().get(name).is_some() {
            return Err(TreeError::AlreadyExists);
        }
        parent.children_mut().insert(name.to_owned(), Node::new());
        Ok(())
    }

    /// Removes the folder at `path`. The folder must be empty.
    pub fn remove(&self, path: &str) -> Result<(), TreeError> {
        if !path::is_valid(path) {
            return Err(TreeError::InvalidPath);
        }
        if path::is_root(path) {
            return Err(TreeError::Busy);
        }
        let (parent_path, name) = path::parent_of(path);
        let mut parent = descend(self.root(), parent_path, path::depth(parent_path))?;
        let child = match parent.children().get(name) {
            Some(child) => Arc::clone(child),
            None => return Err(TreeError::NotFound),
        };
        {
            // With the parent writer-held, no new descent can reach the
            // child; the drain waits out everything already inside it.
            let _idle = child.sync.drain();
            // Safety: the child is drained and unreachable from above,
            // and its mutex is held for the duration of the borrow.
            if !unsafe { child.children() }.is_empty() {
                return Err(TreeError::NotEmpty);
            }
        }
        parent.children_mut().remove(name);
        Ok(())
    }

    /// Moves the folder at `source`, with everything under it, to
    /// `target`. The target must not exist yet; its parent must.
    pub fn mv(&self, source: &str, target: &str) -> Result<(), TreeError> {
        if !path::is_valid(source) || !path::is_valid(target) {
            return Err(TreeError::InvalidPath);
        }
        if path::is_root(source) {
            return Err(TreeError::Busy);
        }
        if path::is_root(target) {
            return Err(TreeError::AlreadyExists);
        }
        // Canonical paths end in a slash, so a string prefix is exactly
        // a component prefix. Equality counts: a folder cannot be moved
        // onto itself either.
        if target.starts_with(source) {
            return Err(TreeError::MoveIntoOwnSubtree);
        }

        let (source_parent_path, source_name) = path::parent_of(source);
        let (target_parent_path, target_name) = path::parent_of(target);
        let lca_depth = path::common_prefix_depth(source_parent_path, target_parent_path);

        // Writer-lock the lowest common ancestor of the two endpoint
        // parents. While it is held, no descent from above can enter
        // either branch.
        let lca = descend(self.root(), source_parent_path, lca_depth)?;

        let target_permit = descend_below(
            &lca,
            path::skip_components(target_parent_path, lca_depth),
            path::depth(target_parent_path) - lca_depth,
        )?;
        {
            let target_children = match &target_permit {
                Some(permit) => permit.children(),
                None => lca.children(),
            };
            if target_children.get(target_name).is_some() {
                return Err(TreeError::AlreadyExists);
            }
        }

        let source_permit = descend_below(
            &lca,
            path::skip_components(source_parent_path, lca_depth),
            path::depth(source_parent_path) - lca_depth,
        )?;
        let moved = {
            let source_children = match &source_permit {
                Some(permit) => permit.children(),
                None => lca.children(),
            };
            match source_children.get(source_name) {
                Some(moved) => Arc::clone(moved),
                None => return Err(TreeError::NotFound),
            }
        };

        let (mut source_parent, target_parent) = match (source_permit, target_permit) {
            (Some(source), Some(target)) => {
                // Both endpoints are writer-held on their own, and their
                // branches cannot be entered without re-passing them.
                drop(lca);
                (source, Some(target))
            }
            (Some(source), None) => (source, Some(lca)),
            (None, Some(target)) => (lca, Some(target)),
            (None, None) => (lca, None),
        };

        drain_subtree(&moved);
        source_parent.children_mut().remove(source_name);
        match target_parent {
            Some(mut target_parent) => {
                target_parent.children_mut().insert(target_name.to_owned(), moved);
                drop(source_parent);
                drop(target_parent);
            }
            None => {
                source_parent.children_mut().insert(target_name.to_owned(), moved);
            }
        }
        Ok(())
    }
}

/// Descends from the root along `path`, reader permission at every
/// step, writer permission on the node `writer_depth` components down.
fn descend<L>(
    root: &Arc<Node<L>>,
    path: &str,
    writer_depth: usize,
) -> Result<WritePermit<L>, TreeError>
where
    L: Log,
{
    if writer_depth == 0 {
        return Ok(WritePermit::acquire(root));
    }
    let cur = ReadPermit::acquire(root);
    advance(cur, path, writer_depth)
}

/// Descends from a writer-held node along `path` toward the node
/// `writer_depth` components below it, without ever releasing the
/// origin. Returns `None` when the origin itself is the destination.
fn descend_below<L>(
    from: &WritePermit<L>,
    path: &str,
    writer_depth: usize,
) -> Result<Option<WritePermit<L>>, TreeError>
where
    L: Log,
{
    if writer_depth == 0 {
        return Ok(None);
    }
    let (name, rest) = match path::split_head(path) {
        Some(split) => split,
        None => unreachable!("path shorter than its descent depth"),
    };
    let child = match from.children().get(name) {
        Some(child) => Arc::clone(child),
        None => return Err(TreeError::NotFound),
    };
    if writer_depth == 1 {
        return Ok(Some(WritePermit::acquire(&child)));
    }
    let cur = ReadPermit::acquire(&child);
    advance(cur, rest, writer_depth - 1).map(Some)
}

/// Hand-over-hand descent: the next node is acquired before the held
/// one is released, reader permission at intermediates and writer
/// permission at the end of the countdown.
fn advance<L>(
    mut cur: ReadPermit<L>,
    mut path: &str,
    mut remaining: usize,
) -> Result<WritePermit<L>, TreeError>
where
    L: Log,
{
    loop {
        let (name, rest) = match path::split_head(path) {
            Some(split) => split,
            None => unreachable!("path shorter than its descent depth"),
        };
        let child = match cur.children().get(name) {
            Some(child) => Arc::clone(child),
            None => return Err(TreeError::NotFound),
        };
        if remaining == 1 {
            let permit = WritePermit::acquire(&child);
            // `cur` is released when it goes out of scope, after the
            // child is already held.
            return Ok(permit);
        }
        let next = ReadPermit::acquire(&child);
        cur = next;
        path = rest;
        remaining -= 1;
    }
}

/// Waits until every node in a subtree is idle.
///
/// The subtree must be unreachable from above (the parent of its root
/// is writer-held by the caller). Each node's mutex stays held while
/// its children are drained, so nothing re-enters a node after it has
/// been drained.
fn drain_subtree<L>(node: &Arc<Node<L>>)
where
    L: Log,
{
    let _idle = node.sync.drain();
    // Safety: the node is drained and unreachable from above, and its
    // mutex is held for the duration of the borrow.
    let children = unsafe { node.children() };
    for (_, child) in children.iter() {
        drain_subtree(child);
    }
}
