//! Object and content keys.
//!
//! An [`ObjectKey`] (`type:id`) names one application object across its whole
//! history. A [`ContentKey`] (`type:id:digest`) names one stored version of
//! that object's value and is the key of the content-addressed store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::{Digest, DIGEST_HEX_LEN};
use crate::error::TypeError;

/// Separator between key components.
pub const KEY_SEPARATOR: char = ':';

/// Identity of one versioned object: its type plus its id within that type.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    object_type: String,
    id: String,
}

impl ObjectKey {
    /// Build a key, validating both components.
    ///
    /// The type must be non-empty and must not contain `:`. The id must be
    /// non-empty and may contain anything, including `:`.
    pub fn new(object_type: impl Into<String>, id: impl Into<String>) -> Result<Self, TypeError> {
        let object_type = object_type.into();
        let id = id.into();
        if object_type.is_empty() {
            return Err(TypeError::InvalidObjectKey {
                key: format!("{object_type}{KEY_SEPARATOR}{id}"),
                reason: "type must not be empty".into(),
            });
        }
        if object_type.contains(KEY_SEPARATOR) {
            return Err(TypeError::InvalidObjectKey {
                key: format!("{object_type}{KEY_SEPARATOR}{id}"),
                reason: "type must not contain ':'".into(),
            });
        }
        if id.is_empty() {
            return Err(TypeError::InvalidObjectKey {
                key: format!("{object_type}{KEY_SEPARATOR}{id}"),
                reason: "id must not be empty".into(),
            });
        }
        Ok(Self { object_type, id })
    }

    /// Parse `type:id`, splitting at the first `:`.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let Some((object_type, id)) = s.split_once(KEY_SEPARATOR) else {
            return Err(TypeError::InvalidObjectKey {
                key: s.to_string(),
                reason: "expected 'type:id'".into(),
            });
        };
        Self::new(object_type, id)
    }

    /// The object's type (e.g. `counter`, `memo`).
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// The object's id within its type.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The content key of one version of this object.
    pub fn with_digest(&self, digest: Digest) -> ContentKey {
        ContentKey {
            object: self.clone(),
            digest,
        }
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({self})")
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.object_type, self.id)
    }
}

impl FromStr for ObjectKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ObjectKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Key of one stored payload: `type:id:digest`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey {
    object: ObjectKey,
    digest: Digest,
}

impl ContentKey {
    /// Build a content key from its parts.
    pub fn new(object: ObjectKey, digest: Digest) -> Self {
        Self { object, digest }
    }

    /// Parse `type:id:digest`. The digest is split off the right so that ids
    /// containing `:` survive.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let Some((object, digest)) = s.rsplit_once(KEY_SEPARATOR) else {
            return Err(TypeError::InvalidContentKey {
                key: s.to_string(),
                reason: "expected 'type:id:digest'".into(),
            });
        };
        if digest.len() != DIGEST_HEX_LEN {
            return Err(TypeError::InvalidContentKey {
                key: s.to_string(),
                reason: format!("digest must be {DIGEST_HEX_LEN} hex characters"),
            });
        }
        let digest = Digest::from_hex(digest)?;
        let object = ObjectKey::parse(object).map_err(|e| TypeError::InvalidContentKey {
            key: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { object, digest })
    }

    /// The object this content belongs to.
    pub fn object(&self) -> &ObjectKey {
        &self.object
    }

    /// The content digest.
    pub fn digest(&self) -> Digest {
        self.digest
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey({self})")
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.object, self.digest)
    }
}

impl FromStr for ContentKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ContentKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
