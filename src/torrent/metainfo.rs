//! BitTorrent metainfo file parser and utilities.
//!
//! A torrent file (also known as a metainfo file) contains metadata about files to be shared
//! in the BitTorrent protocol. This module only reads what is needed to talk to trackers.
//!
//! # Structure
//!
//! The torrent file is a bencoded dictionary containing:
//!
//! - `announce`: URL of the tracker server that coordinates peers
//! - `announce-list`: optional list of tracker tiers (BEP 12), each a list of URLs
//! - `info`: dictionary describing the content; its canonical encoding is hashed
//!   into the info hash that identifies the torrent to trackers
//!
//! Tier semantics of `announce-list` are not honoured: every URL of every tier is
//! returned in file order and announced to uniformly.

use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::bencode::{self, BValue, DecodeError, Dict};

use super::peer::InfoHash;

/// Why a torrent file could not be turned into a [`TorrentMetainfo`].
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed bencode: {0}")]
    Decode(#[from] DecodeError),
    #[error("torrent file is not a dictionary")]
    NotADictionary,
    #[error("missing or invalid info dictionary")]
    MissingInfo,
    #[error("invalid {key} field: {reason}")]
    InvalidField {
        key: &'static str,
        reason: DecodeError,
    },
}

impl DescriptorError {
    /// Stable short code used when reporting per-path failures.
    pub fn code(&self) -> &'static str {
        match self {
            DescriptorError::Io { .. } => "unreadable",
            DescriptorError::Decode(_) => "malformed",
            DescriptorError::NotADictionary => "not-a-dictionary",
            DescriptorError::MissingInfo => "missing-info",
            DescriptorError::InvalidField { .. } => "invalid-field",
        }
    }
}

/// A parsed torrent file.
///
/// Immutable once built. Owns the raw file bytes next to the decoded tree so the
/// info hash can always be checked against the source.
#[derive(Debug, Clone)]
pub struct TorrentMetainfo {
    source: Vec<u8>,
    info: Dict,
    endpoints: Vec<String>,
}

impl TorrentMetainfo {
    /// Reads and parses a torrent file from disk without blocking the runtime.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DescriptorError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| DescriptorError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_bytes(bytes)
    }

    /// Parses a torrent file from its raw bytes.
    ///
    /// Fails unless the bytes decode to a dictionary with an `info` dictionary and
    /// well-typed `announce` / `announce-list` entries.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DescriptorError> {
        let mut root = match bencode::decode(&bytes)? {
            BValue::Dict(dict) => dict,
            _ => return Err(DescriptorError::NotADictionary),
        };
        let info = match root.remove(&b"info"[..]) {
            Some(BValue::Dict(info)) => info,
            _ => return Err(DescriptorError::MissingInfo),
        };
        let endpoints = collect_endpoints(&root)?;

        Ok(Self {
            source: bytes,
            info,
            endpoints,
        })
    }

    /// The raw bytes this torrent was parsed from.
    pub fn as_bytes(&self) -> &[u8] {
        &self.source
    }

    pub fn info(&self) -> &Dict {
        &self.info
    }

    /// Suggested name from the info dictionary, if present.
    pub fn name(&self) -> Option<String> {
        self.info()
            .get(&b"name"[..])
            .and_then(|value| value.as_bytes().ok())
            .map(|name| String::from_utf8_lossy(name).into_owned())
    }

    /// All tracker URLs, flattened across tiers in file order.
    ///
    /// `announce-list` wins over `announce` when both are present.
    pub fn announce_endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// The first tracker URL, if the torrent names any.
    pub fn primary_endpoint(&self) -> Option<&str> {
        self.endpoints.first().map(String::as_str)
    }

    /// Calculate the SHA-1 hash of the bencoded info dictionary.
    ///
    /// This hash uniquely identifies the torrent and is used in tracker communications.
    pub fn info_hash(&self) -> InfoHash {
        Sha1::digest(bencode::encode_dict(&self.info)).into()
    }
}

fn collect_endpoints(root: &Dict) -> Result<Vec<String>, DescriptorError> {
    if let Some(tiers) = root.get(&b"announce-list"[..]) {
        let invalid = |reason| DescriptorError::InvalidField {
            key: "announce-list",
            reason,
        };
        let mut urls = Vec::new();
        for tier in tiers.as_list().map_err(invalid)? {
            for url in tier.as_list().map_err(invalid)? {
                urls.push(url.as_str().map_err(invalid)?.to_owned());
            }
        }
        return Ok(urls);
    }

    match root.get(&b"announce"[..]) {
        Some(url) => {
            let url = url.as_str().map_err(|reason| DescriptorError::InvalidField {
                key: "announce",
                reason,
            })?;
            Ok(vec![url.to_owned()])
        }
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const INFO: &[u8] = b"d6:lengthi1024e4:name8:file.bin12:piece lengthi512e6:pieces3:\x01\x02\x03e";

    fn torrent_with(prefix: &[u8]) -> Vec<u8> {
        let mut bytes = b"d".to_vec();
        bytes.extend_from_slice(prefix);
        bytes.extend_from_slice(b"4:info");
        bytes.extend_from_slice(INFO);
        bytes.push(b'e');
        bytes
    }

    #[test]
    fn test_flattens_announce_list() {
        let bytes = torrent_with(
            b"13:announce-listll8:http://ael8:http://b8:http://cee",
        );
        let torrent = TorrentMetainfo::from_bytes(bytes).unwrap();
        assert_eq!(
            torrent.announce_endpoints(),
            ["http://a", "http://b", "http://c"]
        );
        assert_eq!(torrent.primary_endpoint(), Some("http://a"));
    }

    #[test]
    fn test_single_announce() {
        let torrent = TorrentMetainfo::from_bytes(torrent_with(b"8:announce8:http://x")).unwrap();
        assert_eq!(torrent.announce_endpoints(), ["http://x"]);
    }

    #[test]
    fn test_announce_list_takes_precedence() {
        let bytes = torrent_with(b"8:announce8:http://x13:announce-listll8:http://aee");
        let torrent = TorrentMetainfo::from_bytes(bytes).unwrap();
        assert_eq!(torrent.announce_endpoints(), ["http://a"]);
    }

    #[test]
    fn test_no_trackers() {
        let torrent = TorrentMetainfo::from_bytes(torrent_with(b"")).unwrap();
        assert!(torrent.announce_endpoints().is_empty());
        assert_eq!(torrent.primary_endpoint(), None);
    }

    #[test]
    fn test_info_hash_matches_original_bytes() {
        let bytes = torrent_with(b"8:announce8:http://x");
        let torrent = TorrentMetainfo::from_bytes(bytes).unwrap();

        let expected: InfoHash = Sha1::digest(INFO).into();
        assert_eq!(torrent.info_hash(), expected);
        assert_eq!(torrent.info_hash(), torrent.info_hash());
        assert_eq!(bencode::encode_dict(torrent.info()), INFO);
        assert_eq!(torrent.name().as_deref(), Some("file.bin"));
    }

    #[test]
    fn test_rejects_bad_descriptors() {
        assert!(matches!(
            TorrentMetainfo::from_bytes(b"li1ee".to_vec()),
            Err(DescriptorError::NotADictionary)
        ));
        assert!(matches!(
            TorrentMetainfo::from_bytes(b"d8:announce8:http://xe".to_vec()),
            Err(DescriptorError::MissingInfo)
        ));
        assert!(matches!(
            TorrentMetainfo::from_bytes(b"d4:infoi1ee".to_vec()),
            Err(DescriptorError::MissingInfo)
        ));
        assert!(matches!(
            TorrentMetainfo::from_bytes(b"d4:info".to_vec()),
            Err(DescriptorError::Decode(DecodeError::UnexpectedEof))
        ));

        let err = TorrentMetainfo::from_bytes(torrent_with(b"13:announce-listl8:http://ae"))
            .unwrap_err();
        assert_eq!(err.code(), "invalid-field");
        let err = TorrentMetainfo::from_bytes(torrent_with(b"8:announcei5e")).unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::InvalidField {
                key: "announce",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&torrent_with(b"8:announce8:http://x")).unwrap();

        let torrent = TorrentMetainfo::load(file.path()).await.unwrap();
        assert_eq!(torrent.announce_endpoints(), ["http://x"]);
        assert_eq!(torrent.as_bytes(), torrent_with(b"8:announce8:http://x"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TorrentMetainfo::load(dir.path().join("missing.torrent"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "unreadable");
    }

    #[tokio::test]
    async fn test_load_reports_decode_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"d4:info").unwrap();

        let err = TorrentMetainfo::load(file.path()).await.unwrap_err();
        assert_eq!(err.code(), "malformed");
    }
}
