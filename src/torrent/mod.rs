pub mod client;
pub mod metainfo;
pub mod peer;
pub mod tracker;


pub use client::{AnnounceOutcome, ClientConfig, TorrentClient, TorrentReport};
pub use metainfo::{DescriptorError, TorrentMetainfo};
pub use peer::{InfoHash, PeerId, PeerRecord};
pub use tracker::{AnnounceError, AnnounceEvent, AnnounceRequest, AnnounceResponse, TrackerClient};
