// src/packet/link.rs

/// Link-layer framings we know how to strip before the network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Ethernet,
    /// BSD loopback encapsulation: 4-byte address family, then IP
    Null,
    /// Raw IPv4 or IPv6, no link header
    Raw,
    /// Linux cooked capture v1 (16-byte header)
    LinuxSll,
    /// Linux cooked capture v2 (20-byte header)
    LinuxSll2,
    Unsupported(i32),
}

impl LinkKind {
    /// Maps a pcap LINKTYPE_/DLT_ value.
    pub fn from_linktype(value: i32) -> Self {
        match value {
            1 => LinkKind::Ethernet,
            0 | 108 => LinkKind::Null,
            // DLT_RAW is 12 everywhere but OpenBSD, where 12 is DLT_LOOP
            #[cfg(not(target_os = "openbsd"))]
            12 => LinkKind::Raw,
            #[cfg(target_os = "openbsd")]
            12 => LinkKind::Null,
            #[cfg(target_os = "openbsd")]
            14 => LinkKind::Raw,
            101 | 228 | 229 => LinkKind::Raw,
            113 => LinkKind::LinuxSll,
            276 => LinkKind::LinuxSll2,
            other => LinkKind::Unsupported(other),
        }
    }
}

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86DD;

const SLL_HEADER_LEN: usize = 16;
const SLL2_HEADER_LEN: usize = 20;
const NULL_HEADER_LEN: usize = 4;

/// Strips a cooked or loopback link header, returning the IP datagram that
/// follows it. `None` when the frame is too short or does not carry IP.
pub fn strip_to_ip(kind: LinkKind, data: &[u8]) -> Option<&[u8]> {
    match kind {
        LinkKind::Raw => Some(data),
        LinkKind::Null => data.get(NULL_HEADER_LEN..),
        LinkKind::LinuxSll => {
            // protocol type lives in the last two header bytes
            let proto = u16::from_be_bytes([*data.get(14)?, *data.get(15)?]);
            carries_ip(proto).then(|| &data[SLL_HEADER_LEN..])
        }
        LinkKind::LinuxSll2 => {
            let proto = u16::from_be_bytes([*data.first()?, *data.get(1)?]);
            if data.len() < SLL2_HEADER_LEN || !carries_ip(proto) {
                return None;
            }
            Some(&data[SLL2_HEADER_LEN..])
        }
        LinkKind::Ethernet | LinkKind::Unsupported(_) => None,
    }
}

fn carries_ip(ethertype: u16) -> bool {
    ethertype == ETHERTYPE_IPV4 || ethertype == ETHERTYPE_IPV6
}
