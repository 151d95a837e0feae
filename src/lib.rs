//! Tracker announce client: reads torrent files, computes their info hashes
//! and asks every listed HTTP tracker for peers.

pub mod bencode;
pub mod cli;
pub mod orchestrator;
pub mod report;
pub mod torrent;
pub mod utils;
