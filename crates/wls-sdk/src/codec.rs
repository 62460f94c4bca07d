//! Payload codecs: how object values become stored bytes.
//!
//! The content store only sees bytes. A [`PayloadCodec`] is chosen per object
//! type from a [`CodecRegistry`]; types without a registered codec use the
//! registry's fallback (compact JSON).
//!
//! Codecs never affect identity. The digest of a value is always taken over
//! its canonical encoding, so two codecs that write different bytes for the
//! same value still dedup to one content key.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use wls_hash::CanonicalEncoder;

use crate::error::{SdkError, SdkResult};

/// Encodes and decodes values of one object type.
pub trait PayloadCodec: Send + Sync {
    /// Short identifier, used in logs.
    fn name(&self) -> &str;

    fn encode(&self, value: &Value) -> Result<Vec<u8>, String>;

    fn decode(&self, bytes: &[u8]) -> Result<Value, String>;
}

/// Compact `serde_json` output. The default.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn name(&self) -> &str {
        "json"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, String> {
        serde_json::to_vec(value).map_err(|e| e.to_string())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, String> {
        serde_json::from_slice(bytes).map_err(|e| e.to_string())
    }
}

/// Stores the canonical encoding itself, so payload bytes hash to the
/// content digest.
#[derive(Clone, Copy, Debug, Default)]
pub struct CanonicalJsonCodec;

impl PayloadCodec for CanonicalJsonCodec {
    fn name(&self) -> &str {
        "canonical-json"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, String> {
        Ok(CanonicalEncoder::encode_bytes(value))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, String> {
        serde_json::from_slice(bytes).map_err(|e| e.to_string())
    }
}

/// Per-type codec lookup with a fallback.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn PayloadCodec>>,
    fallback: Arc<dyn PayloadCodec>,
}

impl CodecRegistry {
    /// A registry with no per-type codecs and [`JsonCodec`] as fallback.
    pub fn new() -> Self {
        Self {
            codecs: HashMap::new(),
            fallback: Arc::new(JsonCodec),
        }
    }

    /// Use `codec` for every value of `object_type`.
    pub fn register(&mut self, object_type: impl Into<String>, codec: Arc<dyn PayloadCodec>) {
        self.codecs.insert(object_type.into(), codec);
    }

    /// Replace the codec used for unregistered types.
    pub fn set_fallback(&mut self, codec: Arc<dyn PayloadCodec>) {
        self.fallback = codec;
    }

    pub fn codec_for(&self, object_type: &str) -> &dyn PayloadCodec {
        self.codecs
            .get(object_type)
            .map(|c| c.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    pub fn encode(&self, object_type: &str, value: &Value) -> SdkResult<Vec<u8>> {
        self.codec_for(object_type)
            .encode(value)
            .map_err(|reason| SdkError::Codec {
                object_type: object_type.to_string(),
                reason,
            })
    }

    pub fn decode(&self, object_type: &str, bytes: &[u8]) -> SdkResult<Value> {
        self.codec_for(object_type)
            .decode(bytes)
            .map_err(|reason| SdkError::Codec {
                object_type: object_type.to_string(),
                reason,
            })
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<(&str, &str)> = self
            .codecs
            .iter()
            .map(|(t, c)| (t.as_str(), c.name()))
            .collect();
        types.sort();
        f.debug_struct("CodecRegistry")
            .field("codecs", &types)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}
