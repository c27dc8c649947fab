use crate::logger::Log;
use crate::map::Map;
use crate::sync::Monitor;
use std::cell::UnsafeCell;
use std::marker::PhantomData as marker;
use std::sync::Arc;

/// A single folder: its children and its synchronization block.
///
/// The children map has no lock of its own. Shared access requires
/// reader or writer permission on this node's monitor, exclusive access
/// requires writer permission, and the two drain sites get exclusive
/// access from holding the node's mutex while the node is unreachable
/// from above.
pub(crate) struct Node<L: Log> {
    children: UnsafeCell<Map<Arc<Node<L>>>>,
    pub(crate) sync: Monitor,
    marker: marker<L>,
}

// The children map is only ever touched under the monitor protocol laid
// out above, which is exactly a readers/writer discipline.
unsafe impl<L: Log> Send for Node<L> {}
unsafe impl<L: Log> Sync for Node<L> {}

impl<L: Log> Node<L> {
    /// Creates a fresh empty folder.
    pub(crate) fn new() -> Arc<Self> {
        let node = Arc::new(Node {
            children: UnsafeCell::new(Map::default()),
            sync: Monitor::new(),
            marker,
        });
        L::folder_created(Arc::as_ptr(&node) as *const ());
        node
    }

    /// Returns a shared reference to the children map.
    ///
    /// # Safety
    ///
    /// The caller must hold reader or writer permission on this node, or
    /// its mutex while the node is drained and unreachable from above.
    pub(crate) unsafe fn children(&self) -> &Map<Arc<Node<L>>> {
        &*self.children.get()
    }

    /// Returns an exclusive reference to the children map.
    ///
    /// # Safety
    ///
    /// The caller must hold writer permission on this node, and must not
    /// hold any other reference into the map.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn children_mut(&self) -> &mut Map<Arc<Node<L>>> {
        &mut *self.children.get()
    }
}

impl<L: Log> Drop for Node<L> {
    fn drop(&mut self) {
        L::folder_destroyed(self as *const Self as *const ());
    }
}

/// Reader permission on a node, released on drop.
pub(crate) struct ReadPermit<L: Log> {
    node: Arc<Node<L>>,
}

impl<L: Log> ReadPermit<L> {
    /// Blocks until the node admits a reader.
    pub(crate) fn acquire(node: &Arc<Node<L>>) -> Self {
        node.sync.acquire_read();
        ReadPermit {
            node: Arc::clone(node),
        }
    }

    pub(crate) fn children(&self) -> &Map<Arc<Node<L>>> {
        // Safety: reader permission is held for as long as the permit lives.
        unsafe { self.node.children() }
    }
}

impl<L: Log> Drop for ReadPermit<L> {
    fn drop(&mut self) {
        self.node.sync.release_read();
    }
}

/// Writer permission on a node, released on drop.
pub(crate) struct WritePermit<L: Log> {
    node: Arc<Node<L>>,
}

impl<L: Log> WritePermit<L> {
    /// Blocks until the node admits a writer.
    pub(crate) fn acquire(node: &Arc<Node<L>>) -> Self {
        node.sync.acquire_write();
        WritePermit {
            node: Arc::clone(node),
        }
    }

    pub(crate) fn children(&self) -> &Map<Arc<Node<L>>> {
        // Safety: writer permission is held for as long as the permit lives.
        unsafe { self.node.children() }
    }

    pub(crate) fn children_mut(&mut self) -> &mut Map<Arc<Node<L>>> {
        // Safety: writer permission is exclusive, and the `&mut self`
        // receiver keeps this the only live reference into the map.
        unsafe { self.node.children_mut() }
    }
}

impl<L: Log> Drop for WritePermit<L> {
    fn drop(&mut self) {
        self.node.sync.release_write();
    }
}
