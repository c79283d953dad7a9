use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Protocol {
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
        }
    }
}

/// Directional 5-tuple. The reverse direction of a connection is a different key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FlowKey {
    pub src: Ipv4Addr,
    pub src_port: u16,
    pub dst: Ipv4Addr,
    pub dst_port: u16,
    pub protocol: Protocol,
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}:{} -> {}:{}", self.protocol, self.src, self.src_port, self.dst, self.dst_port)
    }
}

/// A connection ready to be reported. Fields are private so a record can't change after construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FlowRecord {
    src: Ipv4Addr,
    src_port: u16,
    dst: Ipv4Addr,
    dst_port: u16,
    protocol: Protocol,
}

impl FlowRecord {
    pub fn src(&self) -> Ipv4Addr {
        self.src
    }

    pub fn src_port(&self) -> u16 {
        self.src_port
    }

    pub fn dst(&self) -> Ipv4Addr {
        self.dst
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }
}

impl From<&FlowKey> for FlowRecord {
    fn from(key: &FlowKey) -> Self {
        Self {
            src: key.src,
            src_port: key.src_port,
            dst: key.dst,
            dst_port: key.dst_port,
            protocol: key.protocol,
        }
    }
}

/// The TCP control bits the tracker cares about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TcpFlags {
    pub syn: bool,
    pub ack: bool,
    pub fin: bool,
    pub rst: bool,
}

impl TcpFlags {
    const FIN: u16 = 0x01;
    const SYN: u16 = 0x02;
    const RST: u16 = 0x04;
    const ACK: u16 = 0x10;

    pub fn from_bits(bits: u16) -> Self {
        Self {
            syn: bits & Self::SYN != 0,
            ack: bits & Self::ACK != 0,
            fin: bits & Self::FIN != 0,
            rst: bits & Self::RST != 0,
        }
    }

    /// SYN without ACK: the client's opening packet.
    pub fn is_initiation(&self) -> bool {
        self.syn && !self.ack
    }

    /// ACK with no SYN, FIN or RST. Taken as the handshake's final ACK.
    pub fn is_bare_ack(&self) -> bool {
        self.ack && !self.syn && !self.fin && !self.rst
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    Tcp { src_port: u16, dst_port: u16, flags: TcpFlags },
    Udp { src_port: u16, dst_port: u16 },
}

impl Transport {
    pub fn protocol(&self) -> Protocol {
        match self {
            Transport::Tcp { .. } => Protocol::Tcp,
            Transport::Udp { .. } => Protocol::Udp,
        }
    }

    pub fn ports(&self) -> (u16, u16) {
        match *self {
            Transport::Tcp { src_port, dst_port, .. } => (src_port, dst_port),
            Transport::Udp { src_port, dst_port } => (src_port, dst_port),
        }
    }
}

/// What the classifier pulls out of a captured frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassifiedPacket {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub transport: Transport,
}

impl ClassifiedPacket {
    pub fn key(&self) -> FlowKey {
        let (src_port, dst_port) = self.transport.ports();
        FlowKey {
            src: self.src,
            src_port,
            dst: self.dst,
            dst_port,
            protocol: self.transport.protocol(),
        }
    }
}
