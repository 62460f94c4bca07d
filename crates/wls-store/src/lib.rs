//! Content-addressed payload storage for the WorldLine Store.
//!
//! Every recorded version of every object lands here exactly once, keyed by
//! its [`ContentKey`](wls_types::ContentKey) (`type:id:digest`). History
//! nodes only ever hold pointers; the payloads live in this store and are
//! shared by every world-line.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsContentStore`] -- one file per payload under a root directory
//!
//! # Design Rules
//!
//! 1. Payloads are immutable once written. A key is never overwritten.
//! 2. `put_if_absent` is idempotent and reports whether it wrote.
//! 3. A missing key on read is `Ok(None)`, not an error.
//! 4. The store never interprets payload bytes.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsContentStore;
pub use memory::InMemoryContentStore;
pub use traits::{ContentStore, Payload};
