use thiserror::Error;

mod bvalue;
mod decoder;
mod encoder;

pub use bvalue::{BValue, Dict};

/// Errors produced while decoding bencode or projecting a decoded value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unexpected byte 0x{byte:02x} at position {position}")]
    InvalidByte { position: usize, byte: u8 },
    #[error("invalid integer at position {position}")]
    InvalidInteger { position: usize },
    #[error("non-canonical encoding at position {position}: {reason}")]
    NonCanonical {
        position: usize,
        reason: &'static str,
    },
    #[error("nesting too deep at position {position}")]
    TooDeep { position: usize },
    #[error("trailing data at position {position}")]
    TrailingData { position: usize },
    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
}

pub use decoder::MAX_DEPTH;

/// Decodes a complete, canonically encoded buffer.
pub fn decode(bytes: &[u8]) -> Result<BValue, DecodeError> {
    BValue::from_bytes(bytes)
}

/// Decodes the first value in `bytes`, tolerating unsorted or duplicate keys,
/// redundant zeros and trailing bytes.
pub fn decode_lenient(bytes: &[u8]) -> Result<BValue, DecodeError> {
    decoder::Decoder::lenient(bytes).parse()
}

/// Encodes a value into canonical bencode bytes.
pub fn encode(value: &BValue) -> Vec<u8> {
    value.to_bytes()
}

/// Encodes a borrowed dictionary without wrapping it in a [`BValue`].
pub fn encode_dict(dict: &Dict) -> Vec<u8> {
    let mut encoder = encoder::Encoder::new();
    encoder.encode_dict(dict);
    encoder.finish()
}
