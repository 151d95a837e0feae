use std::collections::HashSet;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::metainfo::TorrentMetainfo;
use super::peer::{InfoHash, PeerId, PeerRecord};
use super::tracker::{AnnounceError, AnnounceRequest, AnnounceResponse, TrackerClient, DEFAULT_PORT};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Port reported to trackers as the one we accept peers on.
    pub port: u16,
    /// Per-request HTTP timeout; `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: None,
        }
    }
}

/// Result of announcing to a single tracker endpoint.
#[derive(Debug)]
pub struct AnnounceOutcome {
    pub endpoint: String,
    pub result: Result<AnnounceResponse, AnnounceError>,
}

impl AnnounceOutcome {
    pub fn peers(&self) -> &[PeerRecord] {
        match &self.result {
            Ok(response) => &response.peers,
            Err(_) => &[],
        }
    }
}

/// Everything one client run learned about its torrent.
#[derive(Debug)]
pub struct TorrentReport {
    pub name: Option<String>,
    pub info_hash: InfoHash,
    pub peer_id: PeerId,
    pub primary_endpoint: Option<String>,
    /// One entry per announce endpoint, in file order.
    pub announces: Vec<AnnounceOutcome>,
}

impl TorrentReport {
    /// Distinct peers across all endpoints, first occurrence wins.
    pub fn peers(&self) -> Vec<PeerRecord> {
        let mut seen = HashSet::new();
        self.announces
            .iter()
            .flat_map(AnnounceOutcome::peers)
            .filter(|peer| seen.insert(**peer))
            .copied()
            .collect()
    }
}

/// Announces one torrent to every tracker it lists.
pub struct TorrentClient {
    metainfo: TorrentMetainfo,
    peer_id: PeerId,
    port: u16,
    tracker: TrackerClient,
}

impl TorrentClient {
    pub fn new(metainfo: TorrentMetainfo, peer_id: PeerId, port: u16, tracker: TrackerClient) -> Self {
        Self {
            metainfo,
            peer_id,
            port,
            tracker,
        }
    }

    /// Announces to all endpoints concurrently and waits for every one of them.
    pub async fn run(&self) -> TorrentReport {
        let info_hash = self.metainfo.info_hash();
        let endpoints = self.metainfo.announce_endpoints();
        let request = AnnounceRequest::started(info_hash, self.peer_id, self.port);
        info!(
            info_hash = %hex::encode(info_hash),
            endpoints = endpoints.len(),
            "starting torrent client"
        );

        let mut tasks = JoinSet::new();
        for (index, endpoint) in endpoints.iter().enumerate() {
            let tracker = self.tracker.clone();
            let endpoint = endpoint.clone();
            let request = request.clone();
            tasks.spawn(async move {
                let result = tracker.announce(&endpoint, &request).await;
                (index, AnnounceOutcome { endpoint, result })
            });
        }

        let mut slots: Vec<Option<AnnounceOutcome>> = endpoints.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    match &outcome.result {
                        Ok(response) => {
                            info!(endpoint = %outcome.endpoint, peers = response.peers.len(), "announce succeeded");
                            for peer in &response.peers {
                                debug!(endpoint = %outcome.endpoint, %peer, "peer");
                            }
                        }
                        Err(e) => warn!(endpoint = %outcome.endpoint, error = %e, "announce failed"),
                    }
                    slots[index] = Some(outcome);
                }
                Err(e) => error!(error = %e, "announce task did not finish"),
            }
        }

        let announces = slots
            .into_iter()
            .zip(endpoints)
            .map(|(slot, endpoint)| {
                slot.unwrap_or_else(|| AnnounceOutcome {
                    endpoint: endpoint.clone(),
                    result: Err(AnnounceError::Aborted(
                        "task panicked or was cancelled".to_string(),
                    )),
                })
            })
            .collect();

        TorrentReport {
            name: self.metainfo.name(),
            info_hash,
            peer_id: self.peer_id,
            primary_endpoint: self.metainfo.primary_endpoint().map(str::to_owned),
            announces,
        }
    }
}
