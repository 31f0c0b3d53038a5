#![cfg(feature = "cli")]

use std::io::{BufRead, BufReader};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_spikelink"));
    // Keep the caller's environment from steering defaults.
    cmd.env_remove("SPIKELINK_HOST")
        .env_remove("SPIKELINK_PORT")
        .env_remove("SPIKELINK_FILTER");
    cmd
}

fn run(args: &[&str]) -> Output {
    bin().args(args).output().expect("spikelink should run")
}

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "spikelink-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

/// Start a processor on an ephemeral port and return it with its address,
/// read from the JSON "waiting for probe" log line.
fn spawn_processor(extra: &[&str]) -> (Child, SocketAddr) {
    let mut child = bin()
        .args(["--log-format", "json", "--format", "json", "processor", "--port", "0"])
        .args(extra)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("processor should start");

    let stderr = child.stderr.take().expect("stderr should be piped");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut sent = false;
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            if sent {
                continue;
            }
            let Ok(event) = serde_json::from_str::<serde_json::Value>(&line) else {
                continue;
            };
            if event["fields"]["message"] == "waiting for probe" {
                if let Some(addr) = event["fields"]["addr"].as_str() {
                    let _ = tx.send(addr.to_string());
                    sent = true;
                }
            }
        }
    });

    let addr = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("processor should report its address");
    (child, addr.parse().expect("logged address should parse"))
}

fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    listener.local_addr().expect("local addr").port()
}

#[test]
fn no_mode_prints_usage_and_succeeds() {
    let out = run(&[]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Usage"), "stdout: {stdout}");
    assert!(stdout.contains("probe"));
    assert!(stdout.contains("processor"));
    assert!(!stdout.ends_with("\n\n"), "trailing blank line: {stdout:?}");
}

#[test]
fn unknown_mode_prints_usage_and_succeeds() {
    let out = run(&["bogus"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Usage"));
}

#[test]
fn version_prints_package_version() {
    let out = run(&["version"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        format!("spikelink {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn probe_and_processor_run_golden_trace() {
    let dir = unique_temp_dir("golden");
    let input = dir.join("spikes.json");
    let output = dir.join("results.json");
    std::fs::write(&input, r#"{"spks": [[1, 0, 1], [0, 1, 1]]}"#).expect("write dataset");

    let (processor, addr) = spawn_processor(&["--filter", "lms", "--order", "1", "--mu", "0.1"]);
    let port = addr.port().to_string();

    let probe = run(&[
        "--format",
        "json",
        "--log-level",
        "error",
        "probe",
        "--port",
        &port,
        "--input",
        input.to_str().expect("utf-8 path"),
        "--output",
        output.to_str().expect("utf-8 path"),
    ]);
    assert_eq!(
        probe.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&probe.stderr)
    );

    let report: serde_json::Value =
        serde_json::from_slice(&probe.stdout).expect("probe report should be json");
    assert_eq!(report["mode"], "probe");
    assert_eq!(report["ticks"], 3);
    assert_eq!(report["channel_count"], 2);
    assert_eq!(report["latency"]["count"], 3);

    let results: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).expect("results written"))
            .expect("results should be json");
    let preds = results["filter_preds"].as_array().expect("channel rows");
    assert_eq!(preds.len(), 2);
    let expected = [[0.0, 0.0, 0.1], [0.0, 0.0, 0.2]];
    for (row, want) in preds.iter().zip(expected) {
        let row: Vec<f64> = row
            .as_array()
            .expect("tick values")
            .iter()
            .map(|v| v.as_f64().expect("number"))
            .collect();
        assert_eq!(row.len(), 3);
        for (got, want) in row.iter().zip(want) {
            assert!((got - want).abs() < 1e-12, "{row:?}");
        }
    }
    assert_eq!(results["rt_times_us"].as_array().map(Vec::len), Some(3));

    let done = processor.wait_with_output().expect("processor should exit");
    assert_eq!(done.status.code(), Some(0));
    let summary: serde_json::Value =
        serde_json::from_slice(&done.stdout).expect("processor report should be json");
    assert_eq!(summary["mode"], "processor");
    assert_eq!(summary["filter"], "lms");
    assert_eq!(summary["ticks"], 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn echo_processor_via_environment() {
    let dir = unique_temp_dir("echo");
    let input = dir.join("spikes.json");
    std::fs::write(&input, r#"{"spks": [[3, 4], [5, 6], [7, 8]]}"#).expect("write dataset");

    let mut processor = bin()
        .env("SPIKELINK_FILTER", "echo")
        .args(["--log-format", "json", "--format", "json", "processor", "--port", "0"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("processor should start");

    let stderr = processor.stderr.take().expect("stderr should be piped");
    let mut lines = BufReader::new(stderr).lines();
    let addr = loop {
        let line = lines
            .next()
            .expect("processor should log before exiting")
            .expect("stderr should be readable");
        let event: serde_json::Value = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(_) => continue,
        };
        if event["fields"]["message"] == "waiting for probe" {
            assert_eq!(event["fields"]["filter"], "echo");
            break event["fields"]["addr"]
                .as_str()
                .expect("addr field")
                .to_string();
        }
    };
    thread::spawn(move || lines.for_each(drop));

    let port = addr
        .parse::<SocketAddr>()
        .expect("logged address should parse")
        .port()
        .to_string();
    let probe = bin()
        .env("SPIKELINK_PORT", &port)
        .args(["--format", "json", "--log-level", "error", "probe", "--input"])
        .arg(&input)
        .output()
        .expect("probe should run");
    assert_eq!(probe.status.code(), Some(0));

    let done = processor.wait_with_output().expect("processor should exit");
    let summary: serde_json::Value =
        serde_json::from_slice(&done.stdout).expect("processor report should be json");
    assert_eq!(summary["filter"], "echo");
    assert_eq!(summary["channel_count"], 3);
    assert_eq!(summary["ticks"], 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn probe_without_processor_is_transport_error() {
    let dir = unique_temp_dir("refused");
    let input = dir.join("spikes.json");
    std::fs::write(&input, r#"{"spks": [[1]]}"#).expect("write dataset");

    let port = unused_port().to_string();
    let out = run(&[
        "--log-level",
        "error",
        "probe",
        "--port",
        &port,
        "--input",
        input.to_str().expect("utf-8 path"),
    ]);

    assert_eq!(out.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("error: "));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn probe_rejects_missing_dataset() {
    let out = run(&[
        "--log-level",
        "error",
        "probe",
        "--input",
        "/nonexistent/spikelink/spikes.json",
    ]);
    assert_eq!(out.status.code(), Some(60));
}

#[test]
fn probe_rejects_ragged_dataset() {
    let dir = unique_temp_dir("ragged");
    let input = dir.join("spikes.json");
    std::fs::write(&input, r#"{"spks": [[1, 2], [3]]}"#).expect("write dataset");

    let out = run(&["probe", "--input", input.to_str().expect("utf-8 path")]);
    assert_eq!(out.status.code(), Some(60));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn processor_rejects_zero_order() {
    let out = run(&["--log-level", "error", "processor", "--port", "0", "--order", "0"]);
    assert_eq!(out.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&out.stderr).contains("order"));
}

#[test]
fn processor_rejects_oversized_order_before_listening() {
    let out = run(&[
        "--log-level",
        "error",
        "processor",
        "--port",
        "0",
        "--order",
        "9223372036854775809",
    ]);
    assert_eq!(out.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&out.stderr).contains("exceeds maximum"));
}

#[cfg(not(feature = "hdf5"))]
#[test]
fn hdf5_input_needs_hdf5_support() {
    let out = run(&["--log-level", "error", "probe", "--input", "test_spks.h5"]);
    assert_eq!(out.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&out.stderr).contains("HDF5"));
}
