//! Turns a dissected frame into the fields the tracker keys on.
use super::containers::{ClassifiedPacket, TcpFlags, Transport};
use super::utils::{parse_bitmask, parse_flag, parse_ipv4, parse_port, Dissection};

/// Extracts IPv4 addresses plus TCP or UDP ports (and TCP flags) from a frame.
///
/// Returns `None` for anything else: non-IPv4 frames, frames with no TCP/UDP layer,
/// ICMP messages quoting a transport header, or frames with missing fields.
pub fn classify(frame: &impl Dissection) -> Option<ClassifiedPacket> {
    if !frame.has_layer("ip") {
        log::trace!("Skipping frame without an IPv4 layer");
        return None;
    }
    // Headers quoted inside ICMP errors are dissected as layers too
    if frame.has_layer("icmp") {
        log::trace!("Skipping ICMP frame");
        return None;
    }

    let src = parse_ipv4(frame, "ip", "ip.src")?;
    let dst = parse_ipv4(frame, "ip", "ip.dst")?;

    let transport = if frame.has_layer("tcp") {
        Transport::Tcp {
            src_port: parse_port(frame, "tcp", "tcp.srcport")?,
            dst_port: parse_port(frame, "tcp", "tcp.dstport")?,
            flags: tcp_flags(frame)?,
        }
    } else if frame.has_layer("udp") {
        Transport::Udp {
            src_port: parse_port(frame, "udp", "udp.srcport")?,
            dst_port: parse_port(frame, "udp", "udp.dstport")?,
        }
    } else {
        log::trace!("Skipping frame {src} -> {dst} without TCP or UDP");
        return None;
    };

    Some(ClassifiedPacket { src, dst, transport })
}

fn tcp_flags(frame: &impl Dissection) -> Option<TcpFlags> {
    if let Some(bits) = frame.field("tcp", "tcp.flags").and_then(parse_bitmask) {
        return Some(TcpFlags::from_bits(bits));
    }

    let bit = |name: &str| frame.field("tcp", name).and_then(parse_flag);
    Some(TcpFlags {
        syn: bit("tcp.flags.syn")?,
        ack: bit("tcp.flags.ack")?,
        fin: bit("tcp.flags.fin")?,
        rst: bit("tcp.flags.reset")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::containers::Protocol;
    use crate::tracker::utils::fake::FakeFrame;
    use std::net::Ipv4Addr;

    #[test]
    fn tcp_frame() {
        let frame = FakeFrame::ipv4("10.0.0.1", "93.184.216.34").tcp(5000, 443, 0x002);
        let packet = classify(&frame).unwrap();

        assert_eq!(packet.src, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(packet.dst, Ipv4Addr::new(93, 184, 216, 34));
        match packet.transport {
            Transport::Tcp { src_port, dst_port, flags } => {
                assert_eq!((src_port, dst_port), (5000, 443));
                assert!(flags.is_initiation());
            }
            other => panic!("expected TCP, got {other:?}"),
        }
    }

    #[test]
    fn udp_frame() {
        let frame = FakeFrame::ipv4("10.0.0.1", "8.8.8.8").udp(40000, 53);
        let packet = classify(&frame).unwrap();
        assert_eq!(packet.key().protocol, Protocol::Udp);
        assert_eq!(packet.transport.ports(), (40000, 53));
    }

    #[test]
    fn individual_flag_fields() {
        let frame = FakeFrame::ipv4("10.0.0.1", "10.0.0.2")
            .with("tcp", "tcp.srcport", "5000")
            .with("tcp", "tcp.dstport", "22")
            .with("tcp", "tcp.flags.syn", "False")
            .with("tcp", "tcp.flags.ack", "True")
            .with("tcp", "tcp.flags.fin", "False")
            .with("tcp", "tcp.flags.reset", "False");

        match classify(&frame).unwrap().transport {
            Transport::Tcp { flags, .. } => assert!(flags.is_bare_ack()),
            other => panic!("expected TCP, got {other:?}"),
        }
    }

    #[test]
    fn tcp_wins_over_udp() {
        let frame = FakeFrame::ipv4("10.0.0.1", "10.0.0.2").tcp(1, 2, 0x010).udp(3, 4);
        assert_eq!(classify(&frame).unwrap().key().protocol, Protocol::Tcp);
    }

    #[test]
    fn skips_unrecognised_frames() {
        // IPv6
        let v6 = FakeFrame::new()
            .with("ipv6", "ipv6.src", "::1")
            .with("ipv6", "ipv6.dst", "::1")
            .udp(1, 2);
        assert!(classify(&v6).is_none());

        // No transport layer
        assert!(classify(&FakeFrame::ipv4("10.0.0.1", "10.0.0.2").layer("igmp")).is_none());

        // ICMP port unreachable quoting a UDP header
        let icmp = FakeFrame::ipv4("10.0.0.2", "10.0.0.1").layer("icmp").udp(53, 40000);
        assert!(classify(&icmp).is_none());

        // Missing flags entirely
        let no_flags = FakeFrame::ipv4("10.0.0.1", "10.0.0.2")
            .with("tcp", "tcp.srcport", "1")
            .with("tcp", "tcp.dstport", "2");
        assert!(classify(&no_flags).is_none());

        // Garbage port
        let bad_port = FakeFrame::ipv4("10.0.0.1", "10.0.0.2")
            .with("udp", "udp.srcport", "70000")
            .with("udp", "udp.dstport", "53");
        assert!(classify(&bad_port).is_none());
    }
}
