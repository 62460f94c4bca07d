//! Canonical encoding and content digests for the WorldLine Store.
//!
//! [`CanonicalEncoder`] renders any JSON-like value into one normalized
//! string: object keys sorted, arrays kept in order, numbers normalized.
//! [`ContentHasher`] folds those bytes through 64-bit FNV-1a.
//!
//! Digests here detect change and drive deduplication. They are not meant to
//! resist a deliberate collision search.

pub mod canonical;
pub mod hasher;

pub use canonical::CanonicalEncoder;
pub use hasher::{ContentHasher, Fnv1a64, HasherError};
