//! Runs one torrent client per input file and joins them all.
//!
//! Every input path gets its own task. A path that cannot be read or parsed
//! fails only its own report; sibling clients keep running.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::torrent::{
    AnnounceError, ClientConfig, DescriptorError, PeerId, TorrentClient, TorrentMetainfo,
    TorrentReport, TrackerClient,
};
use crate::utils::{generate_peer_id, PeerIdGenerator};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error("client task aborted: {0}")]
    Aborted(String),
}

impl ClientError {
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Descriptor(e) => e.code(),
            ClientError::Aborted(_) => "aborted",
        }
    }
}

/// Outcome of one input path.
#[derive(Debug)]
pub struct ClientReport {
    pub path: PathBuf,
    pub outcome: Result<TorrentReport, ClientError>,
}

pub struct Orchestrator {
    config: ClientConfig,
    tracker: TrackerClient,
    peer_ids: PeerIdGenerator,
}

impl Orchestrator {
    pub fn new(config: ClientConfig) -> Result<Self, AnnounceError> {
        let tracker = TrackerClient::new(config.timeout)?;
        Ok(Self::with_tracker(config, tracker))
    }

    pub fn with_tracker(config: ClientConfig, tracker: TrackerClient) -> Self {
        Self {
            config,
            tracker,
            peer_ids: generate_peer_id,
        }
    }

    /// Replaces the random peer id source, e.g. with a fixed id in tests.
    pub fn with_peer_id_generator(mut self, peer_ids: PeerIdGenerator) -> Self {
        self.peer_ids = peer_ids;
        self
    }

    /// Announces every torrent in `paths` concurrently.
    ///
    /// Returns once all clients and all of their announces have finished, with
    /// one report per path in input order.
    pub async fn run(&self, paths: &[PathBuf]) -> Vec<ClientReport> {
        info!(torrents = paths.len(), "starting clients");

        let mut tasks = JoinSet::new();
        for (index, path) in paths.iter().enumerate() {
            let path = path.clone();
            let peer_id = (self.peer_ids)();
            let port = self.config.port;
            let tracker = self.tracker.clone();
            tasks.spawn(async move {
                let outcome = run_client(&path, peer_id, port, tracker).await;
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<Result<TorrentReport, ClientError>>> =
            paths.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if let Err(e) = &outcome {
                        warn!(path = %paths[index].display(), code = e.code(), error = %e, "client failed");
                    }
                    outcomes[index] = Some(outcome);
                }
                Err(e) => error!(error = %e, "client task did not finish"),
            }
        }

        outcomes
            .into_iter()
            .zip(paths)
            .map(|(outcome, path)| ClientReport {
                path: path.clone(),
                outcome: outcome.unwrap_or_else(|| {
                    Err(ClientError::Aborted(
                        "task panicked or was cancelled".to_string(),
                    ))
                }),
            })
            .collect()
    }
}

async fn run_client(
    path: &Path,
    peer_id: PeerId,
    port: u16,
    tracker: TrackerClient,
) -> Result<TorrentReport, ClientError> {
    let metainfo = TorrentMetainfo::load(path).await?;
    info!(path = %path.display(), "loaded torrent");

    Ok(TorrentClient::new(metainfo, peer_id, port, tracker).run().await)
}
