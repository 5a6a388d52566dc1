use rmp_serde::{decode, encode};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{Command, Event, SessionSnapshot};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event did not serialize to an object")]
    NotAnObject,
}

pub fn serialize_command(cmd: &Command) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(cmd)?)
}

pub fn deserialize_command(bytes: &[u8]) -> Result<Command, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_event(event: &Event) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(event)?)
}

pub fn deserialize_event(bytes: &[u8]) -> Result<Event, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_snapshot(snapshot: &SessionSnapshot) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(snapshot)?)
}

pub fn deserialize_snapshot(bytes: &[u8]) -> Result<SessionSnapshot, WireError> {
    Ok(decode::from_slice(bytes)?)
}

/// Flat `name -> value` view of an event, without the kind tag.
///
/// Nested objects are flattened with dotted keys (`resources.sheep`); arrays are kept as values.
pub fn event_fields(event: &Event) -> Result<Map<String, Value>, WireError> {
    let Value::Object(mut object) = serde_json::to_value(event)? else {
        return Err(WireError::NotAnObject);
    };
    object.remove("type");

    let mut out = Map::new();
    flatten_into(&mut out, None, object);
    Ok(out)
}

fn flatten_into(out: &mut Map<String, Value>, prefix: Option<&str>, object: Map<String, Value>) {
    for (key, value) in object {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key,
        };
        match value {
            Value::Object(inner) => flatten_into(out, Some(&name), inner),
            other => {
                out.insert(name, other);
            }
        }
    }
}

/// Deterministic snapshot hash for resume verification and desync checks.
///
/// Hashes the MessagePack-serialized snapshot using FNV-1a 64-bit.
pub fn snapshot_hash(snapshot: &SessionSnapshot) -> Result<u64, WireError> {
    let bytes = serialize_snapshot(snapshot)?;
    Ok(hash_bytes_fnv1a64(&bytes))
}

/// Deterministic, stable 64-bit hash for raw bytes (FNV-1a).
pub fn hash_bytes_fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
