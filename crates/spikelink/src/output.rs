use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use spikelink_session::{LatencySummary, ServeSummary};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// What the probe prints once its run is over.
#[derive(Debug, Serialize)]
pub struct ProbeReport<'a> {
    pub mode: &'static str,
    pub addr: String,
    pub channel_count: usize,
    pub ticks: usize,
    pub latency: Option<LatencySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<&'a str>,
}

/// What the processor prints once the probe has gone.
#[derive(Debug, Serialize)]
pub struct ProcessorReport {
    pub mode: &'static str,
    pub addr: String,
    #[serde(flatten)]
    pub summary: ServeSummary,
}

pub fn print_probe_report(report: &ProbeReport<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut rows = vec![
                ("processor".to_string(), report.addr.clone()),
                ("channels".to_string(), report.channel_count.to_string()),
                ("ticks".to_string(), report.ticks.to_string()),
            ];
            if let Some(latency) = &report.latency {
                rows.extend(latency_rows(latency));
            }
            if let Some(path) = report.output {
                rows.push(("output".to_string(), path.to_string()));
            }
            print_table(rows);
        }
        OutputFormat::Pretty => match &report.latency {
            Some(latency) => println!(
                "{} ticks x {} channels via {}: mean {:.2}us, median {:.2}us, p99 {:.2}us",
                report.ticks,
                report.channel_count,
                report.addr,
                latency.mean_us,
                latency.median_us,
                latency.p99_us
            ),
            None => println!(
                "{} ticks x {} channels via {}: no latency samples",
                report.ticks, report.channel_count, report.addr
            ),
        },
    }
}

pub fn print_processor_report(report: &ProcessorReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => print_table(vec![
            ("listen".to_string(), report.addr.clone()),
            ("filter".to_string(), report.summary.filter.to_string()),
            (
                "channels".to_string(),
                report.summary.channel_count.to_string(),
            ),
            ("ticks".to_string(), report.summary.ticks.to_string()),
        ]),
        OutputFormat::Pretty => println!(
            "served {} ticks x {} channels with {} on {}",
            report.summary.ticks, report.summary.channel_count, report.summary.filter, report.addr
        ),
    }
}

fn latency_rows(latency: &LatencySummary) -> Vec<(String, String)> {
    [
        ("mean (us)", latency.mean_us),
        ("median (us)", latency.median_us),
        ("min (us)", latency.min_us),
        ("max (us)", latency.max_us),
        ("p99 (us)", latency.p99_us),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), format!("{value:.2}")))
    .collect()
}

fn print_table(rows: Vec<(String, String)>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["METRIC", "VALUE"]);
    for (name, value) in rows {
        table.add_row(vec![name, value]);
    }
    println!("{table}");
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}
