use std::io::Write;

use crate::capture::{apply_filter, open_source, PacketReader};
use crate::cli::Config;
use crate::core::capture_loop::{dump_payloads, Outcome};
use crate::core::signal::CancelToken;
use crate::core::summary::{print_capture_summary, CaptureStats};
use crate::error::DumpError;

/// Runs one capture from opening the source to releasing it.
///
/// The handle is opened first; a filter problem or a missing filter stops the
/// run before a single packet is read. Only then is the handle moved onto the
/// reader thread and drained into `out`.
pub fn run<W: Write>(config: &Config, cancel: &CancelToken, out: &mut W) -> Result<Outcome, DumpError> {
    let mut cap = open_source(&config.source)?;
    let filter_state = apply_filter(&mut cap, config.filter.as_deref(), config.force)?;
    tracing::debug!("filter {:?}, reading packets", filter_state);

    let reader = PacketReader::spawn(cap);
    let mut stats = CaptureStats::default();

    let result = dump_payloads(reader.packets(), reader.link(), cancel, out, &mut stats);

    match &result {
        // the reader already closed its channel
        Ok(Outcome::Done) | Err(DumpError::Read(_)) => reader.join(),
        _ => reader.shutdown(),
    }

    print_capture_summary(&stats);
    result
}
