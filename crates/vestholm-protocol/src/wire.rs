use rmp_serde::{decode, encode};
use serde_json;
use thiserror::Error;

use crate::{MapSection, MapSnapshot};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn serialize_snapshot(snapshot: &MapSnapshot) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(snapshot)?)
}

pub fn deserialize_snapshot(bytes: &[u8]) -> Result<MapSnapshot, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_sections(sections: &[MapSection]) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(sections)?)
}

pub fn deserialize_sections(bytes: &[u8]) -> Result<Vec<MapSection>, WireError> {
    Ok(decode::from_slice(bytes)?)
}

/// Deterministic snapshot hash for desync detection and soak verification.
///
/// Hashes the MessagePack-serialized snapshot using FNV-1a 64-bit.
pub fn snapshot_hash(snapshot: &MapSnapshot) -> Result<u64, WireError> {
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

pub fn serialize_snapshot_json(snapshot: &MapSnapshot) -> Result<String, WireError> {
    Ok(serde_json::to_string(snapshot)?)
}

pub fn deserialize_snapshot_json(json: &str) -> Result<MapSnapshot, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn serialize_sections_json(sections: &[MapSection]) -> Result<String, WireError> {
    Ok(serde_json::to_string(sections)?)
}

pub fn deserialize_sections_json(json: &str) -> Result<Vec<MapSection>, WireError> {
    Ok(serde_json::from_str(json)?)
}
