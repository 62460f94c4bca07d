use serde::Serialize;
use serde_json::Value;
use wls_types::Digest;

use crate::canonical::CanonicalEncoder;

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Streaming 64-bit FNV-1a accumulator.
#[derive(Clone, Copy, Debug)]
pub struct Fnv1a64 {
    state: u64,
}

impl Fnv1a64 {
    /// Start from the offset basis.
    pub const fn new() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }

    /// Fold `data` into the accumulator.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    /// The digest of everything folded in so far.
    pub fn finish(&self) -> Digest {
        Digest::from_u64(self.state)
    }
}

impl Default for Fnv1a64 {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes content digests of JSON-like values.
///
/// The digest is a pure, synchronous function of the value's canonical
/// encoding: equal values (regardless of object key order) always produce
/// equal digests, and any structural difference, array order included,
/// changes the digest with overwhelming probability.
pub struct ContentHasher;

impl ContentHasher {
    /// Digest of a JSON value.
    pub fn digest(value: &Value) -> Digest {
        Self::digest_bytes(CanonicalEncoder::encode(value).as_bytes())
    }

    /// Digest of raw bytes, without canonicalization.
    pub fn digest_bytes(data: &[u8]) -> Digest {
        let mut hasher = Fnv1a64::new();
        hasher.update(data);
        hasher.finish()
    }

    /// Digest of any serializable value, via its JSON form.
    pub fn digest_serializable<T: Serialize>(value: &T) -> Result<Digest, HasherError> {
        let value =
            serde_json::to_value(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(Self::digest(&value))
    }

    /// Verify that `value` produces the expected digest.
    pub fn verify(value: &Value, expected: &Digest) -> bool {
        Self::digest(value) == *expected
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Map};

    #[test]
    fn fnv_reference_vectors() {
        // Published FNV-1a 64 test vectors.
        assert_eq!(ContentHasher::digest_bytes(b"").as_u64(), 0xcbf2_9ce4_8422_2325);
        assert_eq!(ContentHasher::digest_bytes(b"a").as_u64(), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(
            ContentHasher::digest_bytes(b"foobar").as_u64(),
            0x8594_4171_f739_67e8
        );
    }

    #[test]
    fn streaming_matches_one_shot() {
        let mut hasher = Fnv1a64::new();
        hasher.update(b"foo");
        hasher.update(b"bar");
        assert_eq!(hasher.finish(), ContentHasher::digest_bytes(b"foobar"));
    }

    #[test]
    fn digest_is_deterministic() {
        let v = json!({"value": 1, "label": "c1"});
        assert_eq!(ContentHasher::digest(&v), ContentHasher::digest(&v));
    }

    #[test]
    fn digest_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"{"x":1,"y":[1,2],"z":{"p":true,"q":null}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"z":{"q":null,"p":true},"y":[1,2],"x":1}"#).unwrap();
        assert_eq!(ContentHasher::digest(&a), ContentHasher::digest(&b));
    }

    #[test]
    fn digest_sees_array_order() {
        assert_ne!(
            ContentHasher::digest(&json!([1, 2, 3])),
            ContentHasher::digest(&json!([3, 2, 1]))
        );
    }

    #[test]
    fn digest_sees_value_change() {
        assert_ne!(
            ContentHasher::digest(&json!({"value": 0})),
            ContentHasher::digest(&json!({"value": 1}))
        );
    }

    #[test]
    fn digest_serializable_matches_value_digest() {
        #[derive(Serialize)]
        struct Counter {
            value: i64,
        }
        let typed = ContentHasher::digest_serializable(&Counter { value: 5 }).unwrap();
        assert_eq!(typed, ContentHasher::digest(&json!({"value": 5})));
    }

    #[test]
    fn verify_checks_digest() {
        let v = json!({"x": 1});
        let d = ContentHasher::digest(&v);
        assert!(ContentHasher::verify(&v, &d));
        assert!(!ContentHasher::verify(&json!({"x": 2}), &d));
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec(("[a-z]{1,4}", inner), 0..6).prop_map(|entries| {
                    Value::Object(entries.into_iter().collect::<Map<String, Value>>())
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_digest_is_repeatable(v in arb_json()) {
            prop_assert_eq!(ContentHasher::digest(&v), ContentHasher::digest(&v));
        }

        #[test]
        fn prop_canonical_text_sorts_keys_from_any_input_order(
            entries in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..12)
        ) {
            let object_text = |pairs: Vec<(&String, &i64)>| {
                let fields: Vec<String> =
                    pairs.iter().map(|(k, v)| format!("\"{k}\":{v}")).collect();
                format!("{{{}}}", fields.join(","))
            };
            let sorted = object_text(entries.iter().collect());
            let reversed = object_text(entries.iter().rev().collect());

            let parsed: Value = serde_json::from_str(&reversed).unwrap();
            prop_assert_eq!(CanonicalEncoder::encode(&parsed), sorted.clone());

            let sorted_value: Value = serde_json::from_str(&sorted).unwrap();
            prop_assert_eq!(ContentHasher::digest(&parsed), ContentHasher::digest(&sorted_value));
        }

        #[test]
        fn prop_canonical_form_reparses_to_same_digest(v in arb_json()) {
            let text = CanonicalEncoder::encode(&v);
            let reparsed: Value = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(ContentHasher::digest(&reparsed), ContentHasher::digest(&v));
        }
    }
}
