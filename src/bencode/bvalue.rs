use std::collections::BTreeMap;
use std::fmt::Display;

use super::DecodeError;

/// Dictionary representation shared by the decoder and encoder.
///
/// Keys are raw byte strings; `BTreeMap` keeps them in the bytewise order that
/// bencoding requires, which is what makes re-encoding deterministic.
pub type Dict = BTreeMap<Vec<u8>, BValue>;

/// Represents a Bencode value as defined in the BitTorrent specification.
///
/// Bencode (pronounced like B-encode) supports four different types of values:
/// - Byte strings (represented as raw bytes, not necessarily UTF-8)
/// - Integers
/// - Lists
/// - Dictionaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BValue {
    /// An integer value, can be positive or negative
    /// Example: `i42e` represents 42
    Integer(i64),

    /// A byte string, prefixed with its length
    /// Example: `4:spam` represents "spam"
    Bytes(Vec<u8>),

    /// A list of BValue elements
    /// Example: `l4:spami42ee` represents ["spam", 42]
    List(Vec<BValue>),

    /// A dictionary mapping byte strings to BValues
    /// Example: `d3:bar4:spam3:fooi42ee` represents {"bar": "spam", "foo": 42}
    Dict(Dict),
}

impl BValue {
    /// Strict decode: canonical input only, nothing after the value.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        super::decoder::Decoder::strict(bytes).parse()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut encoder = super::encoder::Encoder::new();
        encoder.encode(self);
        encoder.finish()
    }

    /// Short name of the variant, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            BValue::Integer(_) => "integer",
            BValue::Bytes(_) => "byte string",
            BValue::List(_) => "list",
            BValue::Dict(_) => "dictionary",
        }
    }

    pub fn as_dict(&self) -> Result<&Dict, DecodeError> {
        match self {
            BValue::Dict(dict) => Ok(dict),
            other => Err(other.mismatch("dictionary")),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], DecodeError> {
        match self {
            BValue::Bytes(bytes) => Ok(bytes),
            other => Err(other.mismatch("byte string")),
        }
    }

    pub fn as_list(&self) -> Result<&[BValue], DecodeError> {
        match self {
            BValue::List(list) => Ok(list),
            other => Err(other.mismatch("list")),
        }
    }

    pub fn as_integer(&self) -> Result<i64, DecodeError> {
        match self {
            BValue::Integer(n) => Ok(*n),
            other => Err(other.mismatch("integer")),
        }
    }

    /// Byte string that must also be valid UTF-8 (URLs, names).
    pub fn as_str(&self) -> Result<&str, DecodeError> {
        std::str::from_utf8(self.as_bytes()?).map_err(|_| DecodeError::UnexpectedType {
            expected: "utf-8 string",
            found: "non utf-8 byte string",
        })
    }

    fn mismatch(&self, expected: &'static str) -> DecodeError {
        DecodeError::UnexpectedType {
            expected,
            found: self.kind(),
        }
    }
}

fn is_printable(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| (32..=126).contains(&b))
}

impl Display for BValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BValue::Integer(n) => write!(f, "{}", n),
            BValue::Bytes(s) => {
                if is_printable(s) {
                    write!(f, "\"{}\"", String::from_utf8_lossy(s))
                } else {
                    write!(f, "\"{}\"", hex::encode(s))
                }
            }
            BValue::List(list) => {
                write!(f, "[")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            BValue::Dict(dict) => {
                write!(f, "{{")?;
                for (i, (key, value)) in dict.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "\"{}\":{}", String::from_utf8_lossy(key), value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
