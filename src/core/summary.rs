/// Counters kept by the capture loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptureStats {
    pub packets_seen: u64,
    pub payloads_written: u64,
    pub bytes_written: u64,
}

impl CaptureStats {
    pub fn record_packet(&mut self) {
        self.packets_seen += 1;
    }

    pub fn record_payload(&mut self, len: usize) {
        self.payloads_written += 1;
        self.bytes_written += len as u64;
    }
}

/// Logs a one-line summary of the capture to stderr.
pub fn print_capture_summary(stats: &CaptureStats) {
    tracing::info!(
        "{} packets captured, {} payloads written ({} bytes)",
        stats.packets_seen,
        stats.payloads_written,
        stats.bytes_written
    );
}
