//! HTTP tracker announce (BEP 3) with compact peer lists (BEP 23).
//!
//! UDP trackers are recognised but not spoken to: announcing to one yields an
//! empty peer list.

use bytes::Bytes;
use reqwest::{Client, Url};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::bencode::{self, BValue};
use crate::utils::url_encode_bytes;

use super::peer::{decode_compact, InfoHash, PeerId, PeerRecord};

pub const DEFAULT_PORT: u16 = 6881;

/// Client state reported with an announce. Only the initial announce is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnounceEvent {
    Started,
}

/// Everything a tracker needs to hear about one torrent.
#[derive(Debug, Clone)]
pub struct AnnounceRequest {
    pub info_hash: InfoHash,
    pub peer_id: PeerId,
    pub port: u16,
    pub uploaded: u64,
    pub downloaded: u64,
    pub left: u64,
    pub event: AnnounceEvent,
}

impl AnnounceRequest {
    /// A fresh `started` announce with zeroed transfer counters.
    pub fn started(info_hash: InfoHash, peer_id: PeerId, port: u16) -> Self {
        Self {
            info_hash,
            peer_id,
            port,
            uploaded: 0,
            downloaded: 0,
            left: 0,
            event: AnnounceEvent::Started,
        }
    }
}

// The raw byte parameters are percent-encoded by hand, serde_urlencoded only
// handles the textual ones.
#[derive(Debug, Serialize)]
struct TrackerParams {
    port: u16,
    uploaded: u64,
    downloaded: u64,
    left: u64,
    event: AnnounceEvent,
}

/// Decoded body of a successful announce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnounceResponse {
    pub interval: Option<i64>,
    pub min_interval: Option<i64>,
    pub complete: Option<i64>,
    pub incomplete: Option<i64>,
    pub tracker_id: Option<String>,
    pub peers: Vec<PeerRecord>,
}

#[derive(Debug, Error)]
pub enum AnnounceError {
    #[error("invalid tracker endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("tracker unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("tracker returned HTTP {0}")]
    HttpStatus(u16),
    #[error("tracker declined: {0}")]
    Declined(String),
    #[error("malformed tracker response: {0}")]
    Malformed(String),
    #[error("announce task aborted: {0}")]
    Aborted(String),
}

impl AnnounceResponse {
    /// Interprets a bencoded tracker response body.
    ///
    /// Trackers are not held to canonical encoding: unsorted keys and trailing
    /// bytes are accepted, only structurally broken bodies are `Malformed`.
    pub fn from_body(body: &[u8]) -> Result<Self, AnnounceError> {
        let value = bencode::decode_lenient(body)
            .map_err(|e| AnnounceError::Malformed(e.to_string()))?;
        trace!(response = %value, "tracker response");

        let dict = value
            .as_dict()
            .map_err(|e| AnnounceError::Malformed(e.to_string()))?;

        if let Some(reason) = dict.get(&b"failure reason"[..]) {
            let reason = match reason {
                BValue::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                other => other.to_string(),
            };
            return Err(AnnounceError::Declined(reason));
        }

        let peers = match dict.get(&b"peers"[..]) {
            Some(BValue::Bytes(blob)) => decode_compact(blob),
            Some(other) => {
                return Err(AnnounceError::Malformed(format!(
                    "peers is a {}, expected compact byte string",
                    other.kind()
                )))
            }
            None => return Err(AnnounceError::Malformed("missing peers".to_string())),
        };

        let integer = |key: &[u8]| dict.get(key).and_then(|v| v.as_integer().ok());
        Ok(Self {
            interval: integer(b"interval"),
            min_interval: integer(b"min interval"),
            complete: integer(b"complete"),
            incomplete: integer(b"incomplete"),
            tracker_id: dict
                .get(&b"tracker id"[..])
                .and_then(|v| v.as_str().ok())
                .map(str::to_owned),
            peers,
        })
    }
}

/// Builds the full announce URL, keeping any query the endpoint already carries.
pub fn build_announce_url(endpoint: &str, request: &AnnounceRequest) -> Result<Url, AnnounceError> {
    let invalid = |reason: String| AnnounceError::InvalidEndpoint {
        url: endpoint.to_string(),
        reason,
    };
    let mut url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;

    let params = serde_urlencoded::to_string(TrackerParams {
        port: request.port,
        uploaded: request.uploaded,
        downloaded: request.downloaded,
        left: request.left,
        event: request.event,
    })
    .map_err(|e| invalid(e.to_string()))?;
    let announce = format!(
        "info_hash={}&peer_id={}&{}",
        url_encode_bytes(&request.info_hash),
        url_encode_bytes(&request.peer_id),
        params
    );

    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{announce}"),
        _ => announce,
    };
    url.set_query(Some(&query));
    Ok(url)
}

/// Performs announces against HTTP trackers.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct TrackerClient {
    client: Client,
}

impl TrackerClient {
    pub fn new(timeout: Option<Duration>) -> Result<Self, AnnounceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Announces to one tracker endpoint and returns what it said.
    pub async fn announce(
        &self,
        endpoint: &str,
        request: &AnnounceRequest,
    ) -> Result<AnnounceResponse, AnnounceError> {
        let url = build_announce_url(endpoint, request)?;
        match url.scheme() {
            "http" | "https" => {}
            "udp" => {
                debug!(endpoint, "udp trackers are not supported, skipping");
                return Ok(AnnounceResponse::default());
            }
            scheme => {
                return Err(AnnounceError::InvalidEndpoint {
                    url: endpoint.to_string(),
                    reason: format!("unsupported scheme {scheme}"),
                })
            }
        }

        debug!(endpoint, "announcing");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body: Bytes = response.bytes().await?;

        if !status.is_success() {
            warn!(endpoint, %status, "tracker returned error status");
            return match AnnounceResponse::from_body(&body) {
                Err(declined @ AnnounceError::Declined(_)) => Err(declined),
                _ => Err(AnnounceError::HttpStatus(status.as_u16())),
            };
        }
        AnnounceResponse::from_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn request() -> AnnounceRequest {
        AnnounceRequest::started([0xab; 20], *b"abcdefghij0123456789", DEFAULT_PORT)
    }

    const EXPECTED_QUERY: &str = "info_hash=%AB%AB%AB%AB%AB%AB%AB%AB%AB%AB%AB%AB%AB%AB%AB%AB%AB%AB%AB%AB\
        &peer_id=abcdefghij0123456789&port=6881&uploaded=0&downloaded=0&left=0&event=started";

    #[test]
    fn test_build_announce_url() {
        let url = build_announce_url("http://tracker.example/announce", &request()).unwrap();
        assert_eq!(url.path(), "/announce");
        assert_eq!(url.query(), Some(EXPECTED_QUERY));
    }

    #[test]
    fn test_build_announce_url_keeps_existing_query() {
        let url =
            build_announce_url("https://tracker.example/announce?passkey=s3cret", &request()).unwrap();
        assert_eq!(
            url.query().unwrap(),
            format!("passkey=s3cret&{EXPECTED_QUERY}")
        );
    }

    #[test]
    fn test_build_announce_url_rejects_garbage() {
        assert!(matches!(
            build_announce_url("not a url", &request()),
            Err(AnnounceError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_response_with_peers() {
        let body = b"d8:completei3e10:incompletei1e8:intervali1800e5:peers6:\x7f\x00\x00\x01\x1a\xe1e";
        let response = AnnounceResponse::from_body(body).unwrap();
        assert_eq!(response.interval, Some(1800));
        assert_eq!(response.complete, Some(3));
        assert_eq!(response.incomplete, Some(1));
        assert_eq!(response.min_interval, None);
        assert_eq!(
            response.peers,
            vec![PeerRecord::new(Ipv4Addr::LOCALHOST, 6881)]
        );
    }

    #[test]
    fn test_response_failure_reason_is_declined() {
        let body = b"d14:failure reason17:torrent not founde";
        match AnnounceResponse::from_body(body) {
            Err(AnnounceError::Declined(reason)) => assert_eq!(reason, "torrent not found"),
            other => panic!("expected declined, got {:?}", other),
        }
    }

    #[test]
    fn test_response_with_unsorted_keys() {
        let body = b"d5:peers6:\x7f\x00\x00\x01\x1a\xe18:intervali1800ee";
        let response = AnnounceResponse::from_body(body).unwrap();
        assert_eq!(response.interval, Some(1800));
        assert_eq!(
            response.peers,
            vec![PeerRecord::new(Ipv4Addr::LOCALHOST, 6881)]
        );
    }

    #[test]
    fn test_response_nested_too_deep() {
        let mut body = b"d5:peers0:4:junk".to_vec();
        body.extend(vec![b'l'; 100_000]);
        body.extend(vec![b'e'; 100_001]);
        match AnnounceResponse::from_body(&body) {
            Err(AnnounceError::Malformed(reason)) => assert!(reason.contains("too deep")),
            other => panic!("expected malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_response_malformed() {
        for body in [
            &b"not bencode"[..],
            &b"li1ee"[..],
            &b"d8:intervali1800ee"[..],
            &b"d5:peerslee"[..],
        ] {
            assert!(matches!(
                AnnounceResponse::from_body(body),
                Err(AnnounceError::Malformed(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_udp_endpoint_yields_no_peers() {
        let client = TrackerClient::new(None).unwrap();
        let response = client
            .announce("udp://tracker.example:6969/announce", &request())
            .await
            .unwrap();
        assert!(response.peers.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let client = TrackerClient::new(None).unwrap();
        let result = client.announce("ftp://tracker.example/", &request()).await;
        assert!(matches!(result, Err(AnnounceError::InvalidEndpoint { .. })));
    }
}
