//! Helpers for pulling typed fields out of dissected frames.
use rtshark::Packet;
use std::net::Ipv4Addr;

/// A frame that has already been split into protocol layers.
///
/// Field names follow tshark's naming (`ip.src`, `tcp.srcport`, ...). The
/// rtshark [Packet] is the production implementation; tests use a map-backed fake.
pub trait Dissection {
    fn has_layer(&self, layer: &str) -> bool;

    /// Value of `field` in the first `layer` of the frame, if present.
    fn field(&self, layer: &str, field: &str) -> Option<&str>;
}

impl Dissection for Packet {
    fn has_layer(&self, layer: &str) -> bool {
        self.layer_name(layer).is_some()
    }

    fn field(&self, layer: &str, field: &str) -> Option<&str> {
        self.layer_name(layer)?.metadata(field).map(|m| m.value())
    }
}

pub fn parse_ipv4(frame: &impl Dissection, layer: &str, field: &str) -> Option<Ipv4Addr> {
    frame.field(layer, field)?.trim().parse().ok()
}

pub fn parse_port(frame: &impl Dissection, layer: &str, field: &str) -> Option<u16> {
    frame.field(layer, field)?.trim().parse().ok()
}

/// tshark prints bitmask fields as hex, e.g. `0x0012`. Plain decimal is accepted too.
pub fn parse_bitmask(value: &str) -> Option<u16> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Boolean fields show up as `1`/`0` in older tshark output and `True`/`False` in newer.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "1" => Some(true),
        "0" => Some(false),
        v if v.eq_ignore_ascii_case("true") => Some(true),
        v if v.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmask_formats() {
        assert_eq!(parse_bitmask("0x0012"), Some(0x12));
        assert_eq!(parse_bitmask("0X0002"), Some(0x02));
        assert_eq!(parse_bitmask("16"), Some(16));
        assert_eq!(parse_bitmask("0xzz"), None);
    }

    #[test]
    fn flag_formats() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("False"), Some(false));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("set"), None);
    }

    #[test]
    fn typed_fields() {
        let frame = fake::FakeFrame::ipv4("192.168.1.4", "not-an-ip").udp(68, 67);
        assert_eq!(parse_ipv4(&frame, "ip", "ip.src"), Some(Ipv4Addr::new(192, 168, 1, 4)));
        assert_eq!(parse_ipv4(&frame, "ip", "ip.dst"), None);
        assert_eq!(parse_port(&frame, "udp", "udp.dstport"), Some(67));
        assert_eq!(parse_port(&frame, "tcp", "tcp.dstport"), None);
    }
}
