//! Tradução entre `StorageError` e respostas de erro RESP.
//!
//! O servidor usa `error_frame` para responder; o cliente de rede usa
//! `storage_error` para reconstruir a mesma classe de erro do engine local.

use twinkv_common::StorageError;

use crate::Frame;

pub const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";
pub const NOT_AN_INTEGER: &str = "ERR value is not an integer or out of range";
pub const NOT_A_FLOAT: &str = "ERR value is not a valid float";
pub const INVALID_BOUND: &str = "ERR min or max is not a float";
const INVALID_PATTERN: &str = "ERR invalid pattern";
const INVALID_EXPIRE: &str = "ERR invalid expire time";

/// Frame de erro para um `StorageError`. `NotFound` não é erro na rede:
/// o chamador responde Null.
pub fn error_frame(err: &StorageError) -> Frame {
    let msg = match err {
        StorageError::NotFound => return Frame::Null,
        StorageError::WrongType => WRONGTYPE.to_string(),
        StorageError::NotAnInteger => NOT_AN_INTEGER.to_string(),
        StorageError::NotAFloat => NOT_A_FLOAT.to_string(),
        StorageError::InvalidBound(bound) => format!("{INVALID_BOUND}: {bound}"),
        StorageError::InvalidPattern(detail) => format!("{INVALID_PATTERN}: {detail}"),
        StorageError::InvalidExpire(ttl) => format!("{INVALID_EXPIRE}: {ttl}"),
    };
    Frame::Error(msg)
}

/// Reconhece a mensagem de erro de um servidor. Mensagens desconhecidas → None.
pub fn storage_error(msg: &str) -> Option<StorageError> {
    if msg.starts_with("WRONGTYPE") {
        return Some(StorageError::WrongType);
    }
    if msg.contains("not an integer") {
        return Some(StorageError::NotAnInteger);
    }
    if msg.contains("not a valid float")
        || (msg.contains("is not a float") && !msg.contains("min or max"))
    {
        return Some(StorageError::NotAFloat);
    }
    if let Some(rest) = msg.strip_prefix(INVALID_BOUND) {
        return Some(StorageError::InvalidBound(detail(rest)));
    }
    if let Some(rest) = msg.strip_prefix(INVALID_PATTERN) {
        return Some(StorageError::InvalidPattern(detail(rest)));
    }
    if let Some(rest) = msg.strip_prefix(INVALID_EXPIRE) {
        let ttl = detail(rest).parse().unwrap_or(0);
        return Some(StorageError::InvalidExpire(ttl));
    }
    None
}

fn detail(rest: &str) -> String {
    rest.trim_start_matches(':').trim().to_string()
}
