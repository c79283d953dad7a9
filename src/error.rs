use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Anything wrong with an individual frame is skipped, never raised.
#[derive(Debug, Error)]
pub enum Error {
    /// tshark could not be started or could not open the device
    #[error("failed to start capture on {device}: {source}")]
    CaptureSpawn {
        device: String,
        #[source]
        source: io::Error,
    },

    /// The capture stream broke after it was opened
    #[error("failed to read from capture: {0}")]
    CaptureRead(#[source] io::Error),

    /// The connections CSV given to `--plot` could not be read
    #[error("failed to read connections from {}: {source}", path.display())]
    PlotInput {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Writing a report line failed, e.g. stdout was closed
    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}
