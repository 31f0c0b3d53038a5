//! Dataset files read by the probe and written after a run.
//!
//! JSON and HDF5 files carry the same named arrays:
//!
//! - `spks` (input): one integer row per channel, one column per tick.
//! - `filter_preds` (output): one prediction row per channel.
//! - `rt_times_us` (output): one round-trip latency per tick.

use std::path::Path;

use clap::ValueEnum;
use spikelink_session::{ProbeRun, SampleMatrix};
use tracing::warn;

use crate::exit::CliResult;

#[cfg(feature = "hdf5")]
mod h5;
mod json;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DatasetFormat {
    Json,
    Hdf5,
}

impl DatasetFormat {
    /// `.h5` and `.hdf5` files are HDF5, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("h5") || ext.eq_ignore_ascii_case("hdf5") => {
                Self::Hdf5
            }
            _ => Self::Json,
        }
    }

    /// An explicit choice wins over the extension.
    pub fn resolve(explicit: Option<Self>, path: &Path) -> Self {
        explicit.unwrap_or_else(|| Self::from_path(path))
    }
}

pub fn load_samples(path: &Path, format: DatasetFormat) -> CliResult<SampleMatrix> {
    match format {
        DatasetFormat::Json => json::load_samples(path),
        DatasetFormat::Hdf5 => load_hdf5(path),
    }
}

pub fn save_run(path: &Path, run: &ProbeRun, format: DatasetFormat) -> CliResult<()> {
    if let Some((channel, tick)) = first_non_finite(run) {
        warn!(channel, tick, "predictions diverged to non-finite values");
    }
    match format {
        DatasetFormat::Json => json::save_run(path, run),
        DatasetFormat::Hdf5 => save_hdf5(path, run),
    }
}

/// Channel and tick of the first NaN or infinite prediction.
fn first_non_finite(run: &ProbeRun) -> Option<(usize, usize)> {
    let channels = run.predictions.channel_count();
    run.predictions
        .as_slice()
        .iter()
        .position(|v| !v.is_finite())
        .map(|index| (index % channels, index / channels))
}

#[cfg(feature = "hdf5")]
fn load_hdf5(path: &Path) -> CliResult<SampleMatrix> {
    h5::load_samples(path)
}

#[cfg(feature = "hdf5")]
fn save_hdf5(path: &Path, run: &ProbeRun) -> CliResult<()> {
    h5::save_run(path, run)
}

#[cfg(not(feature = "hdf5"))]
fn load_hdf5(path: &Path) -> CliResult<SampleMatrix> {
    Err(hdf5_unavailable(path))
}

#[cfg(not(feature = "hdf5"))]
fn save_hdf5(path: &Path, _run: &ProbeRun) -> CliResult<()> {
    Err(hdf5_unavailable(path))
}

#[cfg(not(feature = "hdf5"))]
fn hdf5_unavailable(path: &Path) -> crate::exit::CliError {
    crate::exit::CliError::new(
        crate::exit::USAGE,
        format!(
            "{}: HDF5 support is not built in (rebuild with --features hdf5)",
            path.display()
        ),
    )
}

#[cfg(test)]
mod tests {
    use spikelink_session::{LatencyLog, PredictionMatrix};

    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            DatasetFormat::from_path(Path::new("test_spks.h5")),
            DatasetFormat::Hdf5
        );
        assert_eq!(
            DatasetFormat::from_path(Path::new("out/run.HDF5")),
            DatasetFormat::Hdf5
        );
        assert_eq!(
            DatasetFormat::from_path(Path::new("spikes.json")),
            DatasetFormat::Json
        );
        assert_eq!(DatasetFormat::from_path(Path::new("spikes")), DatasetFormat::Json);
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let path = Path::new("spikes.h5");
        assert_eq!(
            DatasetFormat::resolve(Some(DatasetFormat::Json), path),
            DatasetFormat::Json
        );
        assert_eq!(DatasetFormat::resolve(None, path), DatasetFormat::Hdf5);
    }

    #[test]
    fn locates_first_non_finite_prediction() {
        let mut predictions = PredictionMatrix::with_capacity(2, 3);
        predictions.push(&[0.0, 1.0]).unwrap();
        predictions.push(&[2.0, f64::INFINITY]).unwrap();
        predictions.push(&[f64::NAN, 3.0]).unwrap();
        let run = ProbeRun {
            predictions,
            latencies: LatencyLog::new(),
        };
        assert_eq!(first_non_finite(&run), Some((1, 1)));
    }

    #[cfg(not(feature = "hdf5"))]
    #[test]
    fn hdf5_without_support_is_usage_error() {
        let err = load_samples(Path::new("spikes.h5"), DatasetFormat::Hdf5).unwrap_err();
        assert_eq!(err.code, crate::exit::USAGE);
        assert!(err.message.contains("hdf5"));
    }
}
