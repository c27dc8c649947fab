mod core;
mod error;
mod logger;
mod map;
mod node;
mod path;
mod sync;
mod tree;

pub use self::error::TreeError;
pub use self::logger::{Log, NoopLogger};
pub use self::tree::Tree;
