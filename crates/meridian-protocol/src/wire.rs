//! Wire encoding for update messages.
//!
//! MessagePack is the transport encoding; JSON mirrors exist for tooling and
//! logs. Decode dispatch by kind tag is a compile-time match table built
//! into the binary; there is no runtime-populated registry to guard.

use rmp_serde::{decode, encode};
use thiserror::Error;

use crate::Message;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a {expected} message, got {got}")]
    WrongKind {
        expected: &'static str,
        got: &'static str,
    },
}

pub fn serialize_message(message: &Message) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec_named(message)?)
}

pub fn deserialize_message(bytes: &[u8]) -> Result<Message, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_messages(messages: &[Message]) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec_named(messages)?)
}

pub fn deserialize_messages(bytes: &[u8]) -> Result<Vec<Message>, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_message_json(message: &Message) -> Result<String, WireError> {
    Ok(serde_json::to_string(message)?)
}

pub fn deserialize_message_json(json: &str) -> Result<Message, WireError> {
    Ok(serde_json::from_str(json)?)
}

/// Deterministic hash of an encoded payload, for delivery logs and
/// client-side receipt acknowledgement.
pub fn payload_hash(bytes: &[u8]) -> u64 {
    hash_bytes_fnv1a64(bytes)
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

fn decode_checked(bytes: &[u8], expected: &'static str) -> Result<Message, WireError> {
    let message = deserialize_message(bytes)?;
    if message.tag() == expected {
        Ok(message)
    } else {
        Err(WireError::WrongKind {
            expected,
            got: message.tag(),
        })
    }
}

/// Decoder lookup by kind tag.
///
/// The table is an exhaustive compile-time match over the closed kind set;
/// an unknown tag yields `None` so callers can reject it explicitly.
pub fn decoder_for(tag: &str) -> Option<fn(&[u8]) -> Result<Message, WireError>> {
    Some(match tag {
        "Update" => |b: &[u8]| decode_checked(b, "Update"),
        "Partial" => |b: &[u8]| decode_checked(b, "Partial"),
        "Attributes" => |b: &[u8]| decode_checked(b, "Attributes"),
        "Feature" => |b: &[u8]| decode_checked(b, "Feature"),
        "Animate" => |b: &[u8]| decode_checked(b, "Animate"),
        "Attack" => |b: &[u8]| decode_checked(b, "Attack"),
        "Remove" => |b: &[u8]| decode_checked(b, "Remove"),
        "AddPlayer" => |b: &[u8]| decode_checked(b, "AddPlayer"),
        "SetStance" => |b: &[u8]| decode_checked(b, "SetStance"),
        "SpyReport" => |b: &[u8]| decode_checked(b, "SpyReport"),
        "Error" => |b: &[u8]| decode_checked(b, "Error"),
        "Multi" => |b: &[u8]| decode_checked(b, "Multi"),
        _ => return None,
    })
}
