use serde::Serialize;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

/// 20-byte client identity sent to trackers as `peer_id`.
pub type PeerId = [u8; 20];

/// 20-byte SHA-1 digest of a torrent's bencoded `info` dictionary.
pub type InfoHash = [u8; 20];

/// Size of one entry in the compact peer list: 4 address bytes, 2 port bytes.
const COMPACT_PEER_LEN: usize = 6;

/// A peer address as handed out by a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PeerRecord {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl PeerRecord {
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }

    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.ip, self.port)
    }
}

impl fmt::Display for PeerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Decodes the compact peer list from a tracker response.
///
/// Each peer is six bytes: IPv4 address then port, both big-endian. A trailing
/// partial entry is dropped rather than reported.
pub fn decode_compact(blob: &[u8]) -> Vec<PeerRecord> {
    blob.chunks_exact(COMPACT_PEER_LEN)
        .map(|chunk| {
            let ip = Ipv4Addr::new(chunk[0], chunk[1], chunk[2], chunk[3]);
            let port = u16::from_be_bytes([chunk[4], chunk[5]]);
            PeerRecord { ip, port }
        })
        .collect()
}
