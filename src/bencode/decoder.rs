use tracing::trace;

use super::bvalue::{BValue, Dict};
use super::DecodeError;

/// Deepest list/dictionary nesting accepted before decoding gives up.
pub const MAX_DEPTH: usize = 256;

/// Bencode decoder over raw bytes.
///
/// In strict mode only canonical encodings are accepted: no leading zeros, no
/// `-0`, dictionary keys in strictly ascending order and nothing after the
/// value. Anything a strict decoder accepts re-encodes to exactly the bytes it
/// came from. Lenient mode drops those checks (unsorted keys are sorted, the
/// last duplicate wins) for input that is never hashed, like tracker responses.
pub struct Decoder<'a> {
    input: &'a [u8],
    position: usize,
    depth: usize,
    strict: bool,
}

impl<'a> Decoder<'a> {
    pub fn strict(input: &'a [u8]) -> Self {
        Self {
            input,
            position: 0,
            depth: 0,
            strict: true,
        }
    }

    pub fn lenient(input: &'a [u8]) -> Self {
        Self {
            strict: false,
            ..Self::strict(input)
        }
    }

    /// Parses a single value. Strict decoders require it to span the whole input.
    pub fn parse(&mut self) -> Result<BValue, DecodeError> {
        let value = self.parse_value()?;
        if self.strict && self.position != self.input.len() {
            return Err(DecodeError::TrailingData {
                position: self.position,
            });
        }
        Ok(value)
    }

    fn non_canonical(&self, position: usize, reason: &'static str) -> Result<(), DecodeError> {
        if self.strict {
            Err(DecodeError::NonCanonical { position, reason })
        } else {
            Ok(())
        }
    }

    fn enter(&mut self) -> Result<(), DecodeError> {
        if self.depth == MAX_DEPTH {
            return Err(DecodeError::TooDeep {
                position: self.position,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) -> Result<u8, DecodeError> {
        let byte = self.peek().ok_or(DecodeError::UnexpectedEof)?;
        self.position += 1;
        Ok(byte)
    }

    fn consume_until(&mut self, delimiter: u8) -> Result<&'a [u8], DecodeError> {
        let start = self.position;
        let offset = self.input[start..]
            .iter()
            .position(|&b| b == delimiter)
            .ok_or(DecodeError::UnexpectedEof)?;
        self.position = start + offset + 1; // skip the delimiter
        Ok(&self.input[start..start + offset])
    }

    fn parse_value(&mut self) -> Result<BValue, DecodeError> {
        match self.peek() {
            Some(b'i') => Ok(BValue::Integer(self.parse_integer()?)),
            Some(b'l') => self.parse_list(),
            Some(b'd') => self.parse_dict(),
            Some(b'0'..=b'9') => Ok(BValue::Bytes(self.parse_string()?)),
            Some(byte) => {
                trace!(position = self.position, byte, "unexpected byte");
                Err(DecodeError::InvalidByte {
                    position: self.position,
                    byte,
                })
            }
            None => Err(DecodeError::UnexpectedEof),
        }
    }

    fn parse_integer(&mut self) -> Result<i64, DecodeError> {
        self.advance()?; // consume 'i'
        let position = self.position;
        let digits = self.consume_until(b'e')?;

        let unsigned = digits.strip_prefix(b"-").unwrap_or(digits);
        if unsigned.is_empty() || !unsigned.iter().all(u8::is_ascii_digit) {
            return Err(DecodeError::InvalidInteger { position });
        }
        if unsigned.len() > 1 && unsigned[0] == b'0' {
            self.non_canonical(position, "integer with leading zero")?;
        }
        if digits == b"-0" {
            self.non_canonical(position, "negative zero")?;
        }

        // Only ASCII digits and an optional sign remain at this point.
        std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or(DecodeError::InvalidInteger { position })
    }

    fn parse_string(&mut self) -> Result<Vec<u8>, DecodeError> {
        let position = self.position;
        let len_digits = self.consume_until(b':')?;
        if !len_digits.iter().all(u8::is_ascii_digit) {
            return Err(DecodeError::InvalidInteger { position });
        }
        if len_digits.len() > 1 && len_digits[0] == b'0' {
            self.non_canonical(position, "string length with leading zero")?;
        }
        let len = std::str::from_utf8(len_digits)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or(DecodeError::InvalidInteger { position })?;

        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.input.len())
            .ok_or(DecodeError::UnexpectedEof)?;
        let bytes = self.input[self.position..end].to_vec();
        self.position = end;
        Ok(bytes)
    }

    fn parse_list(&mut self) -> Result<BValue, DecodeError> {
        self.enter()?;
        self.advance()?; // consume 'l'
        let mut values = Vec::new();

        while let Some(byte) = self.peek() {
            if byte == b'e' {
                self.position += 1;
                self.depth -= 1;
                return Ok(BValue::List(values));
            }
            values.push(self.parse_value()?);
        }
        Err(DecodeError::UnexpectedEof)
    }

    fn parse_dict(&mut self) -> Result<BValue, DecodeError> {
        self.enter()?;
        self.advance()?; // consume 'd'
        let mut map = Dict::new();

        while let Some(byte) = self.peek() {
            if byte == b'e' {
                self.position += 1;
                self.depth -= 1;
                return Ok(BValue::Dict(map));
            }
            let position = self.position;
            let key = match byte {
                b'0'..=b'9' => self.parse_string()?,
                _ => {
                    return Err(DecodeError::InvalidByte { position, byte });
                }
            };
            if let Some((last, _)) = map.last_key_value() {
                if key.as_slice() <= last.as_slice() {
                    self.non_canonical(position, "dictionary keys not strictly ascending")?;
                }
            }
            let value = self.parse_value()?;
            map.insert(key, value);
        }
        Err(DecodeError::UnexpectedEof)
    }
}
