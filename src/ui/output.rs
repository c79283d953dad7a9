use crate::tracker::containers::FlowRecord;
use chrono::Local;
use serde::Serialize;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

/// Default pause after each reported line, keeps bursts readable on a terminal.
pub const DEFAULT_SPACING: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(flatten)]
    record: &'a FlowRecord,
    observed_at: String,
}

/// Renders a record as a single line, without the trailing newline.
pub fn format_record(record: &FlowRecord, format: OutputFormat) -> serde_json::Result<String> {
    let line = match format {
        OutputFormat::Text => format!(
            "Initiated Connection - Src: {}:{} -> Dst: {}:{}, Protocol: {}",
            record.src(),
            record.src_port(),
            record.dst(),
            record.dst_port(),
            record.protocol()
        ),
        OutputFormat::Csv => format!(
            "{},{},{}:{}",
            record.src(),
            record.dst(),
            record.protocol(),
            record.dst_port()
        ),
        OutputFormat::Json => serde_json::to_string(&JsonLine {
            record,
            observed_at: Local::now().to_rfc3339(),
        })?,
    };
    Ok(line)
}

/// Writes one line per reported flow, then sleeps for `spacing`.
///
/// The sleep runs on the capture thread, so a burst of new flows slows packet
/// processing down rather than queueing output.
pub struct Reporter<W: Write> {
    out: W,
    format: OutputFormat,
    spacing: Duration,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: OutputFormat, spacing: Duration) -> Self {
        Self { out, format, spacing }
    }

    pub fn report(&mut self, record: &FlowRecord) -> io::Result<()> {
        let line = format_record(record, self.format)?;
        writeln!(self.out, "{line}")?;
        self.out.flush()?;

        if !self.spacing.is_zero() {
            thread::sleep(self.spacing);
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
