use std::path::Path;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use pcap::{Activated, Active, BreakLoop, Capture};

use crate::cli::Source;
use crate::error::DumpError;
use crate::packet::LinkKind;

/// Frames buffered between the reader thread and the capture loop.
const PACKET_BUFFER: usize = 1000;

/// What the reader thread hands to the capture loop. A closed channel means
/// the source is exhausted.
#[derive(Debug)]
pub enum ReadEvent {
    Frame(Vec<u8>),
    Failed(pcap::Error),
}

/// Whether a filter ended up attached to the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Attached,
    Skipped,
}

pub fn open_device_capture(interface: &str, snaplen: i32) -> Result<Capture<Active>, pcap::Error> {
    Capture::from_device(interface)?
        .promisc(true)
        .snaplen(snaplen)
        // no read timeout: block until a packet arrives, deliver it right away
        .timeout(0)
        .immediate_mode(true)
        .open()
}

pub fn open_file_capture(path: &Path) -> Result<Capture<dyn Activated>, DumpError> {
    Capture::from_file(path)
        .map(Into::into)
        .map_err(|e| DumpError::OpenFile { path: path.to_path_buf(), source: e })
}

/// Opens the configured source. Snaplen only applies to live capture.
pub fn open_source(source: &Source) -> Result<Capture<dyn Activated>, DumpError> {
    match source {
        Source::File(path) => open_file_capture(path),
        Source::Live { interface, snaplen } => {
            let cap = open_device_capture(interface, *snaplen).map_err(|e| DumpError::OpenLive {
                interface: interface.clone(),
                source: e,
            })?;
            tracing::info!("Listening on {} (snaplen {} bytes)", interface, snaplen);
            Ok(cap.into())
        }
    }
}

/// Decides what to do about the filter expression before any packet is read.
///
/// Returns the expression to compile, `None` when running unfiltered was
/// explicitly forced, or [`DumpError::MissingFilter`] otherwise.
pub fn filter_policy(filter: Option<&str>, force: bool) -> Result<Option<&str>, DumpError> {
    match filter {
        Some(expr) => Ok(Some(expr)),
        None => {
            tracing::warn!("No packet filter provided - this probably isn't what you want!");
            if force { Ok(None) } else { Err(DumpError::MissingFilter) }
        }
    }
}

pub fn apply_filter(
    cap: &mut Capture<dyn Activated>,
    filter: Option<&str>,
    force: bool,
) -> Result<FilterState, DumpError> {
    match filter_policy(filter, force)? {
        Some(expr) => {
            cap.filter(expr, true).map_err(DumpError::Filter)?;
            tracing::debug!("Filter applied: {}", expr);
            Ok(FilterState::Attached)
        }
        None => Ok(FilterState::Skipped),
    }
}

/// A capture handle moved onto its own thread, which blocks in libpcap and
/// forwards owned frames over a bounded channel.
pub struct PacketReader {
    packets: Receiver<ReadEvent>,
    link: LinkKind,
    breaker: BreakLoop,
    thread: JoinHandle<()>,
}

impl PacketReader {
    pub fn spawn(mut cap: Capture<dyn Activated>) -> Self {
        let link = LinkKind::from_linktype(cap.get_datalink().0);
        let breaker = cap.breakloop_handle();
        let (tx, rx) = crossbeam_channel::bounded(PACKET_BUFFER);

        let thread = thread::spawn(move || read_frames(cap, tx));

        Self { packets: rx, link, breaker, thread }
    }

    pub fn packets(&self) -> &Receiver<ReadEvent> {
        &self.packets
    }

    pub fn link(&self) -> LinkKind {
        self.link
    }

    /// Waits for a reader that has already closed its channel, i.e. the source
    /// is exhausted or failed, so the handle is released before returning.
    pub fn join(self) {
        let Self { packets, thread, .. } = self;
        drop(packets);
        if thread.join().is_err() {
            tracing::error!("Capture thread panicked");
        }
    }

    /// Stops a reader that may still be waiting for packets. The handle is
    /// dropped on the reader thread as soon as libpcap returns; if it is still
    /// blocked in the kernel the thread is left behind and the handle goes
    /// away with the process.
    pub fn shutdown(self) {
        self.breaker.breakloop();

        if self.thread.is_finished() {
            self.join();
        } else {
            tracing::debug!("Capture thread still blocked in read, detaching");
        }
    }
}

fn read_frames(mut cap: Capture<dyn Activated>, tx: Sender<ReadEvent>) {
    loop {
        let event = match cap.next_packet() {
            Ok(packet) => ReadEvent::Frame(packet.data.to_vec()),
            // end of file, or breakloop() from shutdown
            Err(pcap::Error::NoMorePackets) => break,
            Err(pcap::Error::TimeoutExpired) => continue,
            Err(e) => ReadEvent::Failed(e),
        };

        let fatal = matches!(event, ReadEvent::Failed(_));
        if tx.send(event).is_err() || fatal {
            break;
        }
    }
    tracing::debug!("Capture source closed");
}
