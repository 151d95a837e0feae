//! Bencode encoder implementation following the BitTorrent protocol specification.
//!
//! This module provides functionality to encode data into the Bencode format as defined in the
//! [BitTorrent protocol specification](http://www.bittorrent.org/beps/bep_0003.html#bencoding).
//!
//! The encoding rules are:
//! - Strings are length-prefixed base10 followed by a colon and the raw bytes
//! - Integers are 'i' followed by the number in base10 followed by 'e'
//! - Lists are 'l' followed by their elements followed by 'e'
//! - Dictionaries are 'd' followed by alternating keys and values followed by 'e',
//!   keys sorted as raw bytes
//!
//! Output is always canonical, so hashing the encoding of a decoded sub-tree
//! yields the same digest as hashing the original bytes.

use crate::bencode::bvalue::{BValue, Dict};

/// An encoder for converting [`BValue`] trees into Bencode bytes.
///
/// The encoder appends to an internal buffer; call [`Encoder::finish`] to take it.
pub struct Encoder {
    output: Vec<u8>,
}

impl Encoder {
    /// Creates a new encoder with an empty output buffer.
    pub fn new() -> Self {
        Self { output: Vec::new() }
    }

    /// Appends the encoding of `value` to the buffer.
    pub fn encode(&mut self, value: &BValue) {
        match value {
            BValue::Integer(n) => self.encode_integer(*n),
            BValue::Bytes(s) => self.encode_bytes(s),
            BValue::List(list) => self.encode_list(list),
            BValue::Dict(dict) => self.encode_dict(dict),
        }
    }

    /// Consumes the encoder and returns the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.output
    }

    /// Encodes an integer in the format: i<number>e
    fn encode_integer(&mut self, n: i64) {
        self.output.push(b'i');
        self.output.extend_from_slice(n.to_string().as_bytes());
        self.output.push(b'e');
    }

    /// Encodes a byte string in the format: <length>:<bytes>
    fn encode_bytes(&mut self, s: &[u8]) {
        self.output.extend_from_slice(s.len().to_string().as_bytes());
        self.output.push(b':');
        self.output.extend_from_slice(s);
    }

    /// Encodes a list in the format: l<bencoded values>e
    fn encode_list(&mut self, list: &[BValue]) {
        self.output.push(b'l');
        for item in list {
            self.encode(item);
        }
        self.output.push(b'e');
    }

    /// Encodes a dictionary in the format: d<bencoded string><bencoded value>e
    pub fn encode_dict(&mut self, dict: &Dict) {
        self.output.push(b'd');
        for (key, value) in dict {
            self.encode_bytes(key);
            self.encode(value);
        }
        self.output.push(b'e');
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &BValue) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.encode(value);
        encoder.finish()
    }

    #[test]
    fn test_encode_integer() {
        assert_eq!(encode(&BValue::Integer(42)), b"i42e");
        assert_eq!(encode(&BValue::Integer(-42)), b"i-42e");
        assert_eq!(encode(&BValue::Integer(0)), b"i0e");
    }

    #[test]
    fn test_encode_string() {
        assert_eq!(encode(&BValue::Bytes(b"spam".to_vec())), b"4:spam");
        assert_eq!(encode(&BValue::Bytes(Vec::new())), b"0:");
        assert_eq!(encode(&BValue::Bytes(vec![0, 255])), b"2:\x00\xff");
    }

    #[test]
    fn test_encode_list() {
        let list = BValue::List(vec![BValue::Bytes(b"spam".to_vec()), BValue::Integer(42)]);
        assert_eq!(encode(&list), b"l4:spami42ee");
        assert_eq!(encode(&BValue::List(vec![])), b"le");
    }

    #[test]
    fn test_encode_dict_sorts_keys() {
        let mut dict = Dict::new();
        dict.insert(b"foo".to_vec(), BValue::Integer(42));
        dict.insert(b"bar".to_vec(), BValue::Bytes(b"spam".to_vec()));
        assert_eq!(encode(&BValue::Dict(dict)), b"d3:bar4:spam3:fooi42ee");
        assert_eq!(encode(&BValue::Dict(Dict::new())), b"de");
    }

    #[test]
    fn test_encode_borrowed_dict() {
        let dict = Dict::from([(b"name".to_vec(), BValue::Bytes(b"x".to_vec()))]);
        let mut encoder = Encoder::new();
        encoder.encode_dict(&dict);
        assert_eq!(encoder.finish(), encode(&BValue::Dict(dict)));
    }

    #[test]
    fn test_decoded_tree_reencodes_to_same_bytes() {
        let original: &[u8] =
            b"d8:announce17:http://a/announce4:infod6:lengthi-7e4:name1:x6:pieces2:\x00\x01ee";
        let decoded = BValue::from_bytes(original).unwrap();
        assert_eq!(decoded.to_bytes(), original);
    }
}
