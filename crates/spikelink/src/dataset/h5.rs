//! HDF5 datasets, as written by the test-signal scripts.
//!
//! `spks` may be stored with any integer type; it is widened to `i32` on
//! read. Predictions keep NaN and infinity as-is.

use std::path::Path;

use ndarray::Array2;
use spikelink_session::{ProbeRun, SampleMatrix};

use crate::exit::{session_error, CliError, CliResult, DATA_INVALID, FAILURE, INTERNAL};

pub(super) fn load_samples(path: &Path) -> CliResult<SampleMatrix> {
    let invalid = |err: hdf5::Error| CliError::new(DATA_INVALID, format!("{}: {err}", path.display()));

    let file = hdf5::File::open(path).map_err(invalid)?;
    let spks = file
        .dataset("spks")
        .map_err(invalid)?
        .read_2d::<i32>()
        .map_err(invalid)?;

    // Stored one row per channel; the wire wants one row per tick.
    let data: Vec<i32> = spks.t().iter().copied().collect();
    SampleMatrix::new(spks.nrows(), data)
        .map_err(|err| session_error(&path.display().to_string(), err))
}

pub(super) fn save_run(path: &Path, run: &ProbeRun) -> CliResult<()> {
    let failed =
        |err: hdf5::Error| CliError::new(FAILURE, format!("cannot write {}: {err}", path.display()));

    let shape = (run.predictions.tick_count(), run.predictions.channel_count());
    let preds = Array2::from_shape_vec(shape, run.predictions.as_slice().to_vec())
        .map_err(|err| CliError::new(INTERNAL, format!("prediction buffer: {err}")))?
        .reversed_axes()
        .as_standard_layout()
        .into_owned();

    let file = hdf5::File::create(path).map_err(failed)?;
    file.new_dataset_builder()
        .with_data(&preds)
        .create("filter_preds")
        .map_err(failed)?;
    file.new_dataset_builder()
        .with_data(run.latencies.samples())
        .create("rt_times_us")
        .map_err(failed)?;
    Ok(())
}
