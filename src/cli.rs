use std::path::PathBuf;

use clap::Parser;

use crate::interface;

pub const DEFAULT_SNAPLEN: i32 = 1600;

/// flowdump - stream transport-layer payloads of captured packets to stdout
#[derive(Parser, Debug)]
#[command(
    name = "flowdump",
    version,
    about = "Dump the TCP/UDP payload of every matching packet to stdout",
    override_usage = "flowdump [options] [filter]"
)]
pub struct CliArgs {
    /// Interface to listen on (defaults to the first non-loopback interface that's up)
    #[arg(short, long, value_name = "NAME")]
    pub interface: Option<String>,

    /// Maximum number of bytes to read from each packet
    #[arg(
        short,
        long,
        value_name = "BYTES",
        default_value_t = DEFAULT_SNAPLEN,
        value_parser = clap::value_parser!(i32).range(1..)
    )]
    pub snaplen: i32,

    /// Read from a pcap file instead of listening
    #[arg(short = 'r', long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Run even if no filter is provided
    #[arg(short, long)]
    pub force: bool,

    /// BPF filter expression, e.g. `tcp port 80`
    #[arg(value_name = "FILTER")]
    pub filter: Vec<String>,
}

/// Where packets come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Live { interface: String, snaplen: i32 },
}

/// Immutable run configuration handed to the source selector and capture loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source: Source,
    pub filter: Option<String>,
    pub force: bool,
}

impl CliArgs {
    /// Builds the run configuration. The default interface is only resolved
    /// for live capture, so reading a file never touches the device list.
    pub fn into_config(self) -> Config {
        self.into_config_with(interface::default_interface)
    }

    fn into_config_with(self, default_interface: impl FnOnce() -> String) -> Config {
        let source = match self.file {
            Some(path) => Source::File(path),
            None => Source::Live {
                interface: self.interface.unwrap_or_else(default_interface),
                snaplen: self.snaplen,
            },
        };

        Config {
            source,
            filter: join_filter(&self.filter),
            force: self.force,
        }
    }
}

/// Joins trailing arguments into a single filter expression.
pub fn join_filter(parts: &[String]) -> Option<String> {
    let expr = parts.join(" ");
    if expr.trim().is_empty() { None } else { Some(expr) }
}
