mod cmd;
mod dataset;
mod exit;
mod logging;
mod output;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "spikelink",
    version,
    about = "Lock-step latency probe and adaptive-filter processor"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Option<Command>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // An unknown mode is not an error: show usage and leave.
        Err(err) if err.kind() == ErrorKind::InvalidSubcommand => print_usage(),
        Err(err) => err.exit(),
    };
    let Some(command) = cli.command else {
        print_usage();
    };

    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

fn print_usage() -> ! {
    print!("{}", Cli::command().render_help());
    std::process::exit(exit::SUCCESS);
}
