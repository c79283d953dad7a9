mod error;
mod tracker;
mod ui;

use clap::{ArgAction, Parser};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use error::Error;
use tracker::capture::{capture_filter, LiveCapture};
use tracker::core::FlowTracker;
use tracker::filter::AddressFilter;
use tracker::pipeline::Pipeline;
use ui::output::{OutputFormat, Reporter, DEFAULT_SPACING};
use ui::plot::{self, PlotFormat};

/// connsniff reports new TCP and UDP connections seen on a network device
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network device to monitor (e.g. eth0)
    #[arg(short = 'd', long, default_value = "eth0", value_parser)]
    device: String,

    /// Exclude connections to/from public IP addresses
    #[arg(long, action = ArgAction::SetTrue)]
    exclude_public: bool,

    /// Exclude UDP connections
    #[arg(long, action = ArgAction::SetTrue)]
    exclude_udp: bool,

    /// Output CSV lines (src,dst,protocol:port) for plotting
    #[arg(short = 'c', long, action = ArgAction::SetTrue)]
    generate_csv: bool,

    /// Output one JSON object per connection
    #[arg(short = 'j', long, action = ArgAction::SetTrue, conflicts_with = "generate_csv")]
    json: bool,

    /// Pause after each reported connection, in milliseconds
    #[arg(long, default_value_t = DEFAULT_SPACING.as_millis() as u64, value_parser)]
    spacing_ms: u64,

    /// Instead of capturing, read a CSV written by --generate-csv and print it for plotting
    #[arg(short = 'p', long, value_name = "CSV", value_parser)]
    plot: Option<PathBuf>,

    /// Plot output: Graphviz DOT edges or Sankey node/link JSON
    #[arg(long, value_enum, default_value_t = PlotFormat::Dot, requires = "plot")]
    plot_format: PlotFormat,
}

impl Args {
    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.generate_csv {
            OutputFormat::Csv
        } else {
            OutputFormat::Text
        }
    }
}

fn run_plot(path: &Path, format: PlotFormat) -> Result<(), Error> {
    log::info!("Reading connections from {}", path.display());

    let plot_err = |source: csv::Error| Error::PlotInput { path: path.to_path_buf(), source };
    let file = File::open(path).map_err(|e| plot_err(csv::Error::from(e)))?;
    let connections = plot::read_connections(file).map_err(plot_err)?;
    log::info!("Loaded {} connections", connections.len());

    let rendered = plot::render(&connections, format).map_err(io::Error::from)?;
    let mut out = io::stdout().lock();
    out.write_all(rendered.as_bytes())?;
    if format == PlotFormat::Sankey {
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn run(args: &Args) -> Result<(), Error> {
    if let Some(path) = &args.plot {
        return run_plot(path, args.plot_format);
    }

    let filter = capture_filter(!args.exclude_udp);
    let mut capture = LiveCapture::open(&args.device, filter)?;

    if args.exclude_public {
        log::info!("Excluding connections with public addresses");
    }

    let reporter = Reporter::new(io::stdout().lock(), args.format(), Duration::from_millis(args.spacing_ms));
    let mut pipeline = Pipeline::new(
        AddressFilter::new(args.exclude_public),
        FlowTracker::new(!args.exclude_udp),
        reporter,
    );

    let result = loop {
        match capture.next_frame() {
            Ok(Some(packet)) => {
                if let Err(err) = pipeline.process(&packet) {
                    break Err(err);
                }
            }
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        }
    };

    log::info!("Capture on {} ended", args.device);
    pipeline.log_summary();
    result
}

fn main() {
    if let Err(err) = SimpleLogger::new().with_level(LevelFilter::Info).env().init() {
        eprintln!("Failed to initialise logging: {err}");
    }

    let args = Args::parse();
    log::debug!("{args:?}");

    if let Err(err) = run(&args) {
        log::error!("{err}");
        process::exit(1);
    }
}
