use std::path::{Path, PathBuf};
use std::process::{Command, Output};
#[cfg(unix)]
use std::io::Read;
#[cfg(unix)]
use std::process::Stdio;

use etherparse::PacketBuilder;
use pcap::{Capture, Linktype, Packet, PacketHeader};
use tempfile::TempDir;

const SRC_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x01];
const DST_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x02];

fn udp_frame(payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
        .udp(5000, 6000);
    let mut frame = Vec::new();
    builder.write(&mut frame, payload).unwrap();
    frame
}

fn tcp_frame(payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
        .tcp(40000, 80, 1000, 65535);
    let mut frame = Vec::new();
    builder.write(&mut frame, payload).unwrap();
    frame
}

fn icmp_frame() -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
        .icmpv4_echo_request(1, 1);
    let mut frame = Vec::new();
    builder.write(&mut frame, b"ping").unwrap();
    frame
}

fn arp_frame() -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(&[0xff; 6]);
    frame.extend_from_slice(&SRC_MAC);
    frame.extend_from_slice(&[0x08, 0x06]);
    // who-has 10.0.0.2 tell 10.0.0.1
    frame.extend_from_slice(&[0x00, 0x01, 0x08, 0x00, 6, 4, 0x00, 0x01]);
    frame.extend_from_slice(&SRC_MAC);
    frame.extend_from_slice(&[10, 0, 0, 1]);
    frame.extend_from_slice(&[0; 6]);
    frame.extend_from_slice(&[10, 0, 0, 2]);
    frame
}

fn write_pcap(path: &Path, frames: &[Vec<u8>]) {
    let records: Vec<(&[u8], u32)> = frames
        .iter()
        .map(|frame| (frame.as_slice(), frame.len() as u32))
        .collect();
    write_records(path, &records);
}

/// Writes `(captured bytes, original wire length)` records.
fn write_records(path: &Path, records: &[(&[u8], u32)]) {
    let cap = Capture::dead(Linktype::ETHERNET).unwrap();
    let mut savefile = cap.savefile(path).unwrap();
    for (i, (data, wire_len)) in records.iter().enumerate() {
        let header = PacketHeader {
            ts: libc::timeval { tv_sec: i as _, tv_usec: 0 },
            caplen: data.len() as u32,
            len: *wire_len,
        };
        savefile.write(&Packet::new(&header, data));
    }
    savefile.flush().unwrap();
}

/// udp "alpha", arp, tcp "beta", icmp, udp "gamma"
fn mixed_capture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("mixed.pcap");
    write_pcap(
        &path,
        &[
            udp_frame(b"alpha"),
            arp_frame(),
            tcp_frame(b"beta"),
            icmp_frame(),
            udp_frame(b"gamma"),
        ],
    );
    path
}

fn flowdump(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flowdump"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_dumps_transport_payloads_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = mixed_capture(&dir);

    let output = flowdump(&["-r", path.to_str().unwrap(), "ip"]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(output.stdout, b"alphabetagamma");
}

#[test]
fn test_filter_restricts_packets() {
    let dir = tempfile::tempdir().unwrap();
    let path = mixed_capture(&dir);

    let output = flowdump(&["--file", path.to_str().unwrap(), "udp", "and", "port", "6000"]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(output.stdout, b"alphagamma");
}

#[test]
fn test_snaplen_ignored_for_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = mixed_capture(&dir);

    let output = flowdump(&["-s", "1", "-r", path.to_str().unwrap(), "tcp"]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(output.stdout, b"beta");
}

#[test]
fn test_missing_filter_refuses_to_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = mixed_capture(&dir);

    let output = flowdump(&["-r", path.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let err = stderr(&output);
    assert!(err.contains("this probably isn't what you want"), "stderr: {}", err);
    assert!(err.contains("use --force"), "stderr: {}", err);
}

#[test]
fn test_forced_run_without_filter() {
    let dir = tempfile::tempdir().unwrap();
    let path = mixed_capture(&dir);

    let output = flowdump(&["--force", "-r", path.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(output.stdout, b"alphabetagamma");
    assert!(stderr(&output).contains("this probably isn't what you want"));
}

#[test]
fn test_invalid_filter_reads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = mixed_capture(&dir);

    let output = flowdump(&["-r", path.to_str().unwrap(), "port", "and", "(("]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("filter compilation failure"));
}

#[test]
fn test_nonexistent_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.pcap");

    let output = flowdump(&["-r", path.to_str().unwrap(), "udp"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("missing.pcap"));
}

#[test]
fn test_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.pcap");
    std::fs::write(&path, b"").unwrap();

    let output = flowdump(&["-r", path.to_str().unwrap(), "udp"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_capture_without_packets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-packets.pcap");
    write_pcap(&path, &[]);

    let output = flowdump(&["-r", path.to_str().unwrap(), "udp"]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_snaplen_truncated_records_keep_partial_payload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short-snaplen.pcap");

    let payload: Vec<u8> = (0..200u8).collect();
    let frame = tcp_frame(&payload);
    let small = udp_frame(b"tiny");
    write_records(
        &path,
        &[(&frame[..96], frame.len() as u32), (&small[..], small.len() as u32)],
    );

    let output = flowdump(&["-r", path.to_str().unwrap(), "ip"]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let mut expected = payload[..42].to_vec();
    expected.extend_from_slice(b"tiny");
    assert_eq!(output.stdout, expected);
}

#[cfg(unix)]
#[test]
fn test_interrupt_stops_capture_cleanly() {
    use std::ffi::CString;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();

    // header + one record, replayed through a pipe that never reaches EOF
    let source = dir.path().join("one.pcap");
    write_pcap(&source, &[udp_frame(b"only-payload")]);
    let bytes = std::fs::read(&source).unwrap();

    let fifo = dir.path().join("live.pcap");
    let c_path = CString::new(fifo.as_os_str().as_bytes()).unwrap();
    assert_eq!(unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) }, 0);

    let mut child = Command::new(env!("CARGO_BIN_EXE_flowdump"))
        .args(["-r", fifo.to_str().unwrap(), "udp"])
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // blocks until the child opens the read end
    let mut writer = OpenOptions::new().write(true).open(&fifo).unwrap();
    writer.write_all(&bytes).unwrap();
    writer.flush().unwrap();

    let mut first = vec![0u8; b"only-payload".len()];
    child.stdout.as_mut().unwrap().read_exact(&mut first).unwrap();
    assert_eq!(first, b"only-payload");

    assert_eq!(unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGINT) }, 0);

    let output = child.wait_with_output().unwrap();
    drop(writer);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("Terminated by user"));
}
