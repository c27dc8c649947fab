/// A trait to trace the lifecycle of folders in a tree.
///
/// A folder is identified by the address of its node, which is stable
/// from creation to destruction; every destruction event pairs with an
/// earlier creation event for the same address.
pub trait Log {
    /// A folder came into existence, at tree creation or through
    /// `create`.
    fn folder_created(node: *const ());

    /// A folder was torn down, through `remove` or because its tree
    /// was dropped. Moved folders keep their identity and report
    /// nothing.
    fn folder_destroyed(node: *const ());
}

/// A logger that discards every event.
pub struct NoopLogger;

impl Log for NoopLogger {
    fn folder_created(_node: *const ()) {}
    fn folder_destroyed(_node: *const ()) {}
}
