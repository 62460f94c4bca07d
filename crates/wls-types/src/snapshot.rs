use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::TypeError;
use crate::key::{ContentKey, ObjectKey};

/// Pointer to one version of one object's value. Never the payload itself.
///
/// Two snapshots are the same *object* when `type` and `id` match, and the
/// same *version* when the digest matches too.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(rename = "type")]
    pub object_type: String,
    pub id: String,
    pub digest: Digest,
}

impl StateSnapshot {
    /// Pointer for `key` at `digest`.
    pub fn new(key: &ObjectKey, digest: Digest) -> Self {
        Self {
            object_type: key.object_type().to_string(),
            id: key.id().to_string(),
            digest,
        }
    }

    /// The `type:id` key of the object this snapshot points into.
    pub fn object_key(&self) -> Result<ObjectKey, TypeError> {
        ObjectKey::new(self.object_type.clone(), self.id.clone())
    }

    /// The `type:id:digest` key of the payload this snapshot points at.
    pub fn content_key(&self) -> Result<ContentKey, TypeError> {
        Ok(self.object_key()?.with_digest(self.digest))
    }

    /// `true` if both snapshots point into the same object.
    pub fn same_object(&self, other: &Self) -> bool {
        self.object_type == other.object_type && self.id == other.id
    }

    /// `true` if both snapshots point at the same version of the same object.
    pub fn same_version(&self, other: &Self) -> bool {
        self.same_object(other) && self.digest == other.digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> ObjectKey {
        ObjectKey::parse(s).unwrap()
    }

    #[test]
    fn identity_rules() {
        let a = StateSnapshot::new(&key("counter:c1"), Digest::from_u64(1));
        let b = StateSnapshot::new(&key("counter:c1"), Digest::from_u64(2));
        let c = StateSnapshot::new(&key("counter:c2"), Digest::from_u64(1));

        assert!(a.same_object(&b));
        assert!(!a.same_version(&b));
        assert!(!a.same_object(&c));
        assert!(a.same_version(&a.clone()));
    }

    #[test]
    fn content_key_includes_digest() {
        let snap = StateSnapshot::new(&key("memo:m1"), Digest::from_u64(0xff));
        assert_eq!(
            snap.content_key().unwrap().to_string(),
            "memo:m1:00000000000000ff"
        );
    }

    #[test]
    fn json_shape_uses_type_field() {
        let snap = StateSnapshot::new(&key("counter:c1"), Digest::from_u64(3));
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["type"], "counter");
        assert_eq!(json["id"], "c1");
        assert_eq!(json["digest"], "0000000000000003");
    }
}
