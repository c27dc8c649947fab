use thiserror::Error;

/// An error returned by a tree operation.
///
/// These are the domain errors: the tree is left consistent and the
/// failing operation has had no structural effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The path is not canonical.
    #[error("invalid path")]
    InvalidPath,

    /// A folder on the path does not exist.
    #[error("no such folder")]
    NotFound,

    /// The folder to be created, or the move target, already exists.
    #[error("folder already exists")]
    AlreadyExists,

    /// The root folder cannot be removed or moved.
    #[error("folder is busy")]
    Busy,

    /// Only empty folders can be removed.
    #[error("folder is not empty")]
    NotEmpty,

    /// A folder cannot be moved into itself or its own subtree.
    #[error("cannot move a folder into its own subtree")]
    MoveIntoOwnSubtree,
}

impl TreeError {
    /// Maps the error to its raw errno-style code. The move-into-own-subtree
    /// case has no errno equivalent and maps to `-1`.
    pub fn to_errno(self) -> i32 {
        match self {
            TreeError::InvalidPath => libc::EINVAL,
            TreeError::NotFound => libc::ENOENT,
            TreeError::AlreadyExists => libc::EEXIST,
            TreeError::Busy => libc::EBUSY,
            TreeError::NotEmpty => libc::ENOTEMPTY,
            TreeError::MoveIntoOwnSubtree => -1,
        }
    }
}
