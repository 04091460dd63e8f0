//! Value encoding for stores that hold opaque bytes.
//!
//! Raw `Vec<u8>` values pass through untouched in both directions; everything
//! else is encoded as JSON. Integers therefore land in the store as their
//! decimal text, which is what the counter operations expect.
//!
//! JSON has no form for NaN or infinity. A bare non-finite `f32`/`f64` is
//! rejected with [`CacheError::Encoding`]; one nested inside a larger value is
//! written as `null` by `serde_json` and fails later when decoded as a float.

use serde::{Serialize, de::DeserializeOwned};
use std::any::Any;

use crate::error::CacheError;

/// Encode a value into the byte form kept by stores.
pub fn serialize<T>(value: T) -> Result<Vec<u8>, CacheError>
where
    T: Serialize + 'static,
{
    let mut slot = Some(value);
    let any: &mut dyn Any = &mut slot;
    if let Some(bytes) = any.downcast_mut::<Option<Vec<u8>>>().and_then(Option::take) {
        return Ok(bytes);
    }
    if is_non_finite(any) {
        return Err(CacheError::Encoding(
            "non-finite float has no JSON representation".into(),
        ));
    }

    // `Some(v)` encodes exactly as `v`.
    serde_json::to_vec(&slot).map_err(|e| CacheError::Encoding(e.to_string()))
}

fn is_non_finite(slot: &dyn Any) -> bool {
    slot.downcast_ref::<Option<f64>>()
        .is_some_and(|v| v.is_some_and(|f| !f.is_finite()))
        || slot
            .downcast_ref::<Option<f32>>()
            .is_some_and(|v| v.is_some_and(|f| !f.is_finite()))
}

/// Decode bytes previously produced by [`serialize`].
pub fn deserialize<T>(bytes: Vec<u8>) -> Result<T, CacheError>
where
    T: DeserializeOwned + 'static,
{
    let mut target: Option<T> = None;
    let any: &mut dyn Any = &mut target;
    if let Some(raw) = any.downcast_mut::<Option<Vec<u8>>>() {
        *raw = Some(bytes);
        return target.ok_or_else(|| CacheError::Decoding("byte passthrough failed".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| CacheError::Decoding(e.to_string()))
}
