use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use clap::{Args, Subcommand};
use spikelink_filter::{FilterKind, DEFAULT_MU, DEFAULT_ORDER};
use spikelink_session::{DEFAULT_MAX_CHANNELS, DEFAULT_PORT};

use crate::dataset::DatasetFormat;
use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod probe;
pub mod processor;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream a dataset to a processor and time every round trip.
    Probe(ProbeArgs),
    /// Accept one probe and answer each sample with a filter prediction.
    Processor(ProcessorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Probe(args) => probe::run(args, format),
        Command::Processor(args) => processor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// Processor address: where the probe connects and the processor binds.
    #[arg(long, env = "SPIKELINK_HOST", default_value = "127.0.0.1")]
    pub host: String,
    /// TCP port.
    #[arg(long, env = "SPIKELINK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Largest channel count to negotiate.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_CHANNELS)]
    pub max_channels: usize,
    /// Leave Nagle's algorithm enabled on the socket.
    #[arg(long)]
    pub no_nodelay: bool,
}

impl LinkArgs {
    /// Resolve host and port to the first matching socket address.
    pub fn socket_addr(&self) -> CliResult<SocketAddr> {
        let mut addrs = (self.host.as_str(), self.port).to_socket_addrs().map_err(|err| {
            CliError::new(USAGE, format!("cannot resolve {}:{}: {err}", self.host, self.port))
        })?;
        addrs.next().ok_or_else(|| {
            CliError::new(
                USAGE,
                format!("{}:{} resolved to no addresses", self.host, self.port),
            )
        })
    }
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Dataset to stream: a channel-major `spks` matrix in JSON or HDF5.
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: PathBuf,
    /// Format of `--input`, guessed from its extension when omitted.
    #[arg(long, value_name = "FORMAT")]
    pub input_format: Option<DatasetFormat>,
    /// Write `filter_preds` and `rt_times_us` here.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Format of `--output`, guessed from its extension when omitted.
    #[arg(long, value_name = "FORMAT")]
    pub output_format: Option<DatasetFormat>,
}

#[derive(Args, Debug)]
pub struct ProcessorArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Filter to run on each sample.
    #[arg(long, env = "SPIKELINK_FILTER", default_value = "lms")]
    pub filter: FilterKind,
    /// LMS history depth in ticks.
    #[arg(long, default_value_t = DEFAULT_ORDER)]
    pub order: usize,
    /// LMS step size.
    #[arg(long, default_value_t = DEFAULT_MU)]
    pub mu: f64,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
