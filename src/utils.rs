use percent_encoding::{percent_encode, NON_ALPHANUMERIC};
use rand::Rng;

use crate::torrent::peer::PeerId;

const PEER_ID_ALPHABET: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Source of the 20-byte identity a client announces itself with.
///
/// Plain function pointer so tests can swap in a fixed id.
pub type PeerIdGenerator = fn() -> PeerId;

/// Random peer id over `[a-z0-9]`. Not a security token, collisions are tolerated.
pub fn generate_peer_id() -> PeerId {
    let mut rng = rand::thread_rng();
    let mut id = [0u8; 20];
    for byte in id.iter_mut() {
        *byte = PEER_ID_ALPHABET[rng.gen_range(0..PEER_ID_ALPHABET.len())];
    }
    id
}

/// Percent-encodes raw bytes for a tracker query string.
pub fn url_encode_bytes(bytes: &[u8]) -> String {
    percent_encode(bytes, NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_alphabet() {
        let id = generate_peer_id();
        assert!(id
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
    }

    #[test]
    fn test_url_encode_bytes() {
        assert_eq!(url_encode_bytes(b"abc123"), "abc123");
        assert_eq!(url_encode_bytes(&[0x00, 0xab, b' ', b'-']), "%00%AB%20%2D");
    }
}
