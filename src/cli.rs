use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::torrent::tracker::DEFAULT_PORT;
use crate::torrent::ClientConfig;

/// Announce torrent files to their trackers and list the peers they return
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Torrent files to announce
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Port reported to trackers
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Per-request HTTP timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            port: self.port,
            timeout: self.timeout.map(Duration::from_secs),
        }
    }
}
