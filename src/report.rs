//! Human and JSON renderings of a run.

use serde::Serialize;
use std::fmt;

use crate::orchestrator::ClientReport;
use crate::torrent::{AnnounceOutcome, PeerRecord, TorrentReport};

#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torrent: Option<TorrentSummary>,
}

#[derive(Debug, Serialize)]
pub struct ErrorSummary {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TorrentSummary {
    pub name: Option<String>,
    pub info_hash: String,
    pub peer_id: String,
    pub announces: Vec<AnnounceSummary>,
    pub peers: Vec<PeerRecord>,
}

#[derive(Debug, Serialize)]
pub struct AnnounceSummary {
    pub endpoint: String,
    pub peers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&AnnounceOutcome> for AnnounceSummary {
    fn from(outcome: &AnnounceOutcome) -> Self {
        Self {
            endpoint: outcome.endpoint.clone(),
            peers: outcome.peers().len(),
            interval: outcome.result.as_ref().ok().and_then(|r| r.interval),
            error: outcome.result.as_ref().err().map(ToString::to_string),
        }
    }
}

impl From<&TorrentReport> for TorrentSummary {
    fn from(report: &TorrentReport) -> Self {
        Self {
            name: report.name.clone(),
            info_hash: hex::encode(report.info_hash),
            peer_id: String::from_utf8_lossy(&report.peer_id).into_owned(),
            announces: report.announces.iter().map(AnnounceSummary::from).collect(),
            peers: report.peers(),
        }
    }
}

impl From<&ClientReport> for ReportSummary {
    fn from(report: &ClientReport) -> Self {
        let (torrent, error) = match &report.outcome {
            Ok(torrent) => (Some(TorrentSummary::from(torrent)), None),
            Err(e) => (
                None,
                Some(ErrorSummary {
                    code: e.code(),
                    message: e.to_string(),
                }),
            ),
        };
        Self {
            path: report.path.display().to_string(),
            error,
            torrent,
        }
    }
}

pub fn to_json(reports: &[ClientReport]) -> serde_json::Result<String> {
    let summaries: Vec<ReportSummary> = reports.iter().map(ReportSummary::from).collect();
    serde_json::to_string_pretty(&summaries)
}

impl fmt::Display for ClientReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Torrent: {}", self.path.display())?;
        let report = match &self.outcome {
            Ok(report) => report,
            Err(e) => return writeln!(f, "Error [{}]: {}", e.code(), e),
        };

        if let Some(name) = &report.name {
            writeln!(f, "Name: {}", name)?;
        }
        writeln!(f, "Info Hash: {}", hex::encode(report.info_hash))?;
        match &report.primary_endpoint {
            Some(url) => writeln!(f, "Tracker URL: {}", url)?,
            None => writeln!(f, "Tracker URL: none")?,
        }
        for outcome in &report.announces {
            match &outcome.result {
                Ok(response) => {
                    writeln!(f, "  {}: {} peers", outcome.endpoint, response.peers.len())?
                }
                Err(e) => writeln!(f, "  {}: {}", outcome.endpoint, e)?,
            }
        }
        let peers = report.peers();
        writeln!(f, "Peers: {}", peers.len())?;
        for peer in peers {
            writeln!(f, "{}", peer)?;
        }
        Ok(())
    }
}
