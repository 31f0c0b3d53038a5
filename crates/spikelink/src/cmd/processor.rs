use spikelink_filter::{FilterSpec, LmsConfig};
use spikelink_session::{HandshakeConfig, ProcessorConfig, ProcessorDriver};
use tracing::info;

use crate::cmd::ProcessorArgs;
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_processor_report, OutputFormat, ProcessorReport};

pub fn run(args: ProcessorArgs, format: OutputFormat) -> CliResult<i32> {
    let config = processor_config(&args)?;
    let driver = ProcessorDriver::bind(config).map_err(|err| session_error("bind failed", err))?;
    let addr = driver.local_addr();

    info!(%addr, filter = %args.filter, "waiting for probe");
    let summary = driver
        .serve()
        .map_err(|err| session_error("session failed", err))?;

    let report = ProcessorReport {
        mode: "processor",
        addr: addr.to_string(),
        summary,
    };
    print_processor_report(&report, format);

    Ok(SUCCESS)
}

fn processor_config(args: &ProcessorArgs) -> CliResult<ProcessorConfig> {
    let addr = args.link.socket_addr()?;
    Ok(ProcessorConfig {
        addr,
        nodelay: !args.link.no_nodelay,
        filter: FilterSpec {
            kind: args.filter,
            lms: LmsConfig::new(args.order, args.mu),
        },
        handshake: HandshakeConfig {
            max_channels: args.link.max_channels,
            ..HandshakeConfig::default()
        },
    })
}
