use spikelink_session::{HandshakeConfig, ProbeConfig, ProbeDriver};
use tracing::{info, warn};

use crate::cmd::ProbeArgs;
use crate::dataset::{load_samples, save_run, DatasetFormat};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_probe_report, OutputFormat, ProbeReport};

pub fn run(args: ProbeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = probe_config(&args)?;
    let input_format = DatasetFormat::resolve(args.input_format, &args.input);
    let samples = load_samples(&args.input, input_format)?;
    info!(
        input = %args.input.display(),
        format = ?input_format,
        channel_count = samples.channel_count(),
        ticks = samples.tick_count(),
        "loaded dataset"
    );

    let driver = ProbeDriver::new(config);
    let run = driver
        .run(&samples)
        .map_err(|err| session_error("probe failed", err))?;

    if let Some(path) = &args.output {
        save_run(path, &run, DatasetFormat::resolve(args.output_format, path))?;
        info!(output = %path.display(), "wrote results");
    }

    let latency = run.latencies.summary();
    if latency.is_none() {
        warn!("no ticks were streamed");
    }

    let output = args.output.as_deref().and_then(|p| p.to_str());
    let report = ProbeReport {
        mode: "probe",
        addr: driver.config().addr.to_string(),
        channel_count: samples.channel_count(),
        ticks: run.latencies.len(),
        latency,
        output,
    };
    print_probe_report(&report, format);

    Ok(SUCCESS)
}

fn probe_config(args: &ProbeArgs) -> CliResult<ProbeConfig> {
    let addr = args.link.socket_addr()?;
    Ok(ProbeConfig {
        addr,
        nodelay: !args.link.no_nodelay,
        handshake: HandshakeConfig {
            max_channels: args.link.max_channels,
            ..HandshakeConfig::default()
        },
    })
}
