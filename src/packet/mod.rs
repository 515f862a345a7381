mod link;

pub use link::LinkKind;

use etherparse::{LaxSlicedPacket, TransportSlice};

/// Returns the transport-layer (TCP/UDP) payload of a captured frame.
///
/// Slicing is lax: a frame cut short by the snapshot length still yields
/// whatever part of the payload was captured. Trailing Ethernet padding is
/// dropped using the IP length fields. Frames that fail to decode, or that
/// decode without a TCP or UDP layer (ARP, ICMP, non-first IP fragments,
/// ...), yield `None`.
pub fn transport_payload(kind: LinkKind, data: &[u8]) -> Option<&[u8]> {
    let sliced = match kind {
        LinkKind::Ethernet => LaxSlicedPacket::from_ethernet(data)
            .map_err(|e| tracing::trace!("undecodable frame ({} bytes): {:?}", data.len(), e))
            .ok()?,
        LinkKind::Unsupported(_) => return None,
        _ => LaxSlicedPacket::from_ip(link::strip_to_ip(kind, data)?)
            .map_err(|e| tracing::trace!("undecodable frame ({} bytes): {:?}", data.len(), e))
            .ok()?,
    };

    match sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => Some(tcp.payload()),
        Some(TransportSlice::Udp(udp)) => Some(udp.payload()),
        _ => None,
    }
}
