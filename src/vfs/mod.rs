//! # Virtual Filesystem Resolution
//!
//! Maps caller-facing virtual paths (`/home/...`, `/shared/<drive>/...`)
//! onto contained real paths under the configured storage bases. Every
//! protocol adapter must resolve through here before touching the
//! filesystem.

pub mod errors;
pub mod path;
pub mod resolver;

pub use errors::{VfsError, VfsResult};
pub use path::{normalize, StorageRoot};
pub use resolver::{Resolved, Resolver};
