//! Live capture through tshark, via rtshark.
use rtshark::{Packet, RTShark, RTSharkBuilder};
use crate::error::Error;

/// BPF expression handed to the capture device.
pub fn capture_filter(include_udp: bool) -> &'static str {
    if include_udp {
        "tcp or udp"
    } else {
        "tcp"
    }
}

/// A running tshark process capturing from one device.
///
/// Reads block until the next frame arrives. There is no timeout; the capture
/// ends when tshark exits or the process is killed.
pub struct LiveCapture {
    rtshark: RTShark,
}

impl LiveCapture {
    pub fn open(device: &str, filter: &str) -> Result<Self, Error> {
        log::info!("Opening {device} with capture filter \"{filter}\"");

        let builder = RTSharkBuilder::builder()
            .input_path(device)
            .live_capture()
            .capture_filter(filter);

        let rtshark = builder.spawn().map_err(|source| {
            log::error!("Error spawning tshark: {source}");
            Error::CaptureSpawn {
                device: device.to_string(),
                source,
            }
        })?;

        log::info!("Capturing on {device}");
        Ok(Self { rtshark })
    }

    /// Next frame, or `None` once the capture has ended.
    pub fn next_frame(&mut self) -> Result<Option<Packet>, Error> {
        self.rtshark.read().map_err(Error::CaptureRead)
    }
}

impl Drop for LiveCapture {
    fn drop(&mut self) {
        self.rtshark.kill();
    }
}
