//! Foundation types for the WorldLine Store (WLS).
//!
//! This crate provides the identity and pointer types shared by every other
//! WLS crate. None of them carry payloads: they name objects, versions of
//! objects, and history nodes.
//!
//! # Key Types
//!
//! - [`Digest`] -- 64-bit content digest, rendered as 16 lowercase hex chars
//! - [`ObjectKey`] -- `type:id` identity of one versioned application object
//! - [`ContentKey`] -- `type:id:digest` key of one stored payload
//! - [`StateSnapshot`] -- pointer to one version of one object
//! - [`NodeId`] -- opaque, generated history node identifier
//! - [`Timestamp`] -- wall-clock milliseconds since the Unix epoch

pub mod digest;
pub mod error;
pub mod key;
pub mod node_id;
pub mod snapshot;
pub mod temporal;

pub use digest::Digest;
pub use error::TypeError;
pub use key::{ContentKey, ObjectKey};
pub use node_id::NodeId;
pub use snapshot::StateSnapshot;
pub use temporal::Timestamp;
