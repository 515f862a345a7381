use std::io::{self, Write};

use crossbeam_channel::{select, Receiver};

use crate::capture::ReadEvent;
use crate::core::signal::CancelToken;
use crate::core::summary::CaptureStats;
use crate::error::DumpError;
use crate::packet::{transport_payload, LinkKind};

/// How a read loop that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The source ran out of packets.
    Done,
    /// Cancellation was requested, by a signal or a closed stdout.
    Cancelled,
}

/// Writes the transport payload of every frame received on `packets` to `out`
/// until the channel closes or `cancel` fires.
///
/// Each iteration waits on "next frame or cancellation", and a frame that
/// arrives after cancellation was requested is dropped unwritten.
pub fn dump_payloads<W: Write>(
    packets: &Receiver<ReadEvent>,
    link: LinkKind,
    cancel: &CancelToken,
    out: &mut W,
    stats: &mut CaptureStats,
) -> Result<Outcome, DumpError> {
    loop {
        let event = select! {
            recv(cancel.done()) -> _ => None,
            recv(packets) -> event => Some(event),
        };
        let Some(event) = event else {
            return Ok(Outcome::Cancelled);
        };

        let frame = match event {
            Ok(ReadEvent::Frame(frame)) => frame,
            Ok(ReadEvent::Failed(e)) => return Err(DumpError::Read(e)),
            Err(_) => return Ok(Outcome::Done),
        };

        if cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }
        stats.record_packet();

        let Some(payload) = transport_payload(link, &frame) else {
            continue;
        };
        match write_payload(out, payload) {
            Ok(()) => stats.record_payload(payload.len()),
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                tracing::debug!("stdout closed: {}", e);
                cancel.cancel();
                return Ok(Outcome::Cancelled);
            }
            Err(e) => return Err(DumpError::Write(e)),
        }
    }
}

/// Raw bytes, no framing. Flushed so a live capture streams as it arrives.
fn write_payload<W: Write>(out: &mut W, payload: &[u8]) -> io::Result<()> {
    out.write_all(payload)?;
    out.flush()
}
