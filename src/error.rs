use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("couldn't open {}: {source}", path.display())]
    OpenFile { path: PathBuf, source: pcap::Error },

    #[error("couldn't listen on {interface}: {source}")]
    OpenLive { interface: String, source: pcap::Error },

    #[error("filter compilation failure: {0}")]
    Filter(#[source] pcap::Error),

    #[error("Exiting; use --force if you really want to do this.")]
    MissingFilter,

    #[error("capture read failure: {0}")]
    Read(#[source] pcap::Error),

    #[error("couldn't write payload: {0}")]
    Write(#[source] io::Error),

    #[error("failed to list devices: {0}")]
    Devices(#[source] pcap::Error),

    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
