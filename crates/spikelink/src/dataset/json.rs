//! JSON datasets: `{"spks": [[...], ...]}` in,
//! `{"filter_preds": [[...], ...], "rt_times_us": [...]}` out.
//!
//! JSON has no NaN or infinity, so non-finite predictions are written as the
//! strings `"NaN"`, `"Infinity"` and `"-Infinity"`.

use std::path::Path;

use serde::{Deserialize, Serialize, Serializer};
use spikelink_session::{ProbeRun, SampleMatrix};

use crate::exit::{io_error, session_error, CliError, CliResult, DATA_INVALID, INTERNAL};

#[derive(Debug, Deserialize)]
struct SpikeFile {
    spks: Vec<Vec<i32>>,
}

#[derive(Debug, Serialize)]
struct RunFile<'a> {
    filter_preds: Vec<Vec<Prediction>>,
    rt_times_us: &'a [f64],
}

#[derive(Debug, Clone, Copy)]
struct Prediction(f64);

impl Serialize for Prediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if value.is_finite() {
            serializer.serialize_f64(value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value > 0.0 {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }
}

pub(super) fn load_samples(path: &Path) -> CliResult<SampleMatrix> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| io_error(&format!("cannot read {}", path.display()), err))?;
    parse_samples(&text).map_err(|err| CliError::new(err.code, format!("{}: {err}", path.display())))
}

pub(super) fn parse_samples(text: &str) -> CliResult<SampleMatrix> {
    let file: SpikeFile = serde_json::from_str(text)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid dataset: {err}")))?;
    SampleMatrix::from_channel_major(&file.spks).map_err(|err| session_error("invalid dataset", err))
}

pub(super) fn save_run(path: &Path, run: &ProbeRun) -> CliResult<()> {
    let text = render_run(run)?;
    std::fs::write(path, text)
        .map_err(|err| io_error(&format!("cannot write {}", path.display()), err))
}

pub(super) fn render_run(run: &ProbeRun) -> CliResult<String> {
    let filter_preds = run
        .predictions
        .to_channel_major()
        .into_iter()
        .map(|row| row.into_iter().map(Prediction).collect())
        .collect();
    let file = RunFile {
        filter_preds,
        rt_times_us: run.latencies.samples(),
    };
    serde_json::to_string(&file)
        .map_err(|err| CliError::new(INTERNAL, format!("cannot encode results: {err}")))
}

#[cfg(test)]
mod tests {
    use spikelink_filter::{LmsConfig, LmsFilter};
    use spikelink_session::{LatencyLog, PredictionMatrix};

    use super::*;

    #[test]
    fn parses_channel_major_spikes() {
        let samples = parse_samples(r#"{"spks": [[1, 0, 1], [0, 1, 1]]}"#).unwrap();
        assert_eq!(samples.channel_count(), 2);
        assert_eq!(samples.tick_count(), 3);
        assert_eq!(samples.tick(2), Some(&[1, 1][..]));
    }

    #[test]
    fn extra_keys_are_ignored() {
        let samples = parse_samples(r#"{"spks": [[4]], "fs": 1000}"#).unwrap();
        assert_eq!(samples.tick(0), Some(&[4][..]));
    }

    #[test]
    fn rejects_bad_datasets() {
        for text in [
            "not json",
            r#"{"spikes": [[1]]}"#,
            r#"{"spks": []}"#,
            r#"{"spks": [[1, 2], [3]]}"#,
            r#"{"spks": [[1.5]]}"#,
        ] {
            let err = parse_samples(text).unwrap_err();
            assert_eq!(err.code, DATA_INVALID, "{text}");
        }
    }

    #[test]
    fn renders_predictions_channel_major() {
        let mut predictions = PredictionMatrix::with_capacity(2, 2);
        predictions.push(&[0.0, 0.5]).unwrap();
        predictions.push(&[1.0, 1.5]).unwrap();
        let mut latencies = LatencyLog::new();
        latencies.push_us(12.0);
        latencies.push_us(9.5);

        let text = render_run(&ProbeRun {
            predictions,
            latencies,
        })
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["filter_preds"], serde_json::json!([[0.0, 1.0], [0.5, 1.5]]));
        assert_eq!(json["rt_times_us"], serde_json::json!([12.0, 9.5]));
    }

    #[test]
    fn diverged_predictions_survive_rendering() {
        // mu = 10 makes the weight oscillate with growing amplitude until it
        // overflows to infinity and then NaN.
        let mut filter = LmsFilter::new(1, LmsConfig::new(1, 10.0)).unwrap();
        let ticks = 400;
        let mut predictions = PredictionMatrix::with_capacity(1, ticks);
        let mut latencies = LatencyLog::new();
        for _ in 0..ticks {
            predictions.push(filter.predict_next(&[1.0]).unwrap()).unwrap();
            latencies.push_us(1.0);
        }
        assert!(filter.prediction()[0].is_nan());

        let text = render_run(&ProbeRun {
            predictions,
            latencies,
        })
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        let row = json["filter_preds"][0].as_array().unwrap();

        assert_eq!(row.len(), ticks);
        assert!(row.iter().all(|v| !v.is_null()));
        assert_eq!(row[0], serde_json::json!(0.0));
        assert_eq!(row[ticks - 1], "NaN");
        assert!(row
            .iter()
            .any(|v| v == "Infinity" || v == "-Infinity"));
    }

    #[test]
    fn non_finite_values_use_named_strings() {
        let values = [
            Prediction(f64::NAN),
            Prediction(f64::INFINITY),
            Prediction(f64::NEG_INFINITY),
            Prediction(-2.5),
        ];
        assert_eq!(
            serde_json::to_string(&values).unwrap(),
            r#"["NaN","Infinity","-Infinity",-2.5]"#
        );
    }
}
