use crate::config::FilterKind;
use crate::echo::EchoFilter;
use crate::error::{FilterError, Result};
use crate::lms::LmsFilter;

/// One-step-ahead prediction over a fixed number of channels.
///
/// Implementations are stateful: each call consumes the current input vector
/// and returns the prediction for the next one. The returned slice borrows
/// from the predictor and stays valid until the next call.
pub trait Predictor {
    /// Channel count fixed at construction.
    fn dim(&self) -> usize;

    /// Consume `x` and return the prediction for the next input.
    ///
    /// `x` must have exactly [`dim`](Predictor::dim) entries.
    fn predict_next(&mut self, x: &[f64]) -> Result<&[f64]>;

    /// Most recent prediction, zero before the first tick.
    fn prediction(&self) -> &[f64];

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

impl Predictor for LmsFilter {
    fn dim(&self) -> usize {
        LmsFilter::dim(self)
    }

    fn predict_next(&mut self, x: &[f64]) -> Result<&[f64]> {
        LmsFilter::predict_next(self, x)
    }

    fn prediction(&self) -> &[f64] {
        LmsFilter::prediction(self)
    }

    fn name(&self) -> &'static str {
        FilterKind::Lms.name()
    }
}

impl Predictor for EchoFilter {
    fn dim(&self) -> usize {
        EchoFilter::dim(self)
    }

    fn predict_next(&mut self, x: &[f64]) -> Result<&[f64]> {
        EchoFilter::predict_next(self, x)
    }

    fn prediction(&self) -> &[f64] {
        EchoFilter::prediction(self)
    }

    fn name(&self) -> &'static str {
        FilterKind::Echo.name()
    }
}

/// A predictor chosen at startup.
#[derive(Debug)]
pub enum Filter {
    Lms(LmsFilter),
    Echo(EchoFilter),
}

impl Filter {
    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Lms(_) => FilterKind::Lms,
            Filter::Echo(_) => FilterKind::Echo,
        }
    }
}

impl Predictor for Filter {
    fn dim(&self) -> usize {
        match self {
            Filter::Lms(f) => f.dim(),
            Filter::Echo(f) => f.dim(),
        }
    }

    fn predict_next(&mut self, x: &[f64]) -> Result<&[f64]> {
        match self {
            Filter::Lms(f) => f.predict_next(x),
            Filter::Echo(f) => f.predict_next(x),
        }
    }

    fn prediction(&self) -> &[f64] {
        match self {
            Filter::Lms(f) => f.prediction(),
            Filter::Echo(f) => f.prediction(),
        }
    }

    fn name(&self) -> &'static str {
        self.kind().name()
    }
}

pub(crate) fn check_dim(expected: usize, x: &[f64]) -> Result<()> {
    if x.len() != expected {
        return Err(FilterError::DimensionMismatch {
            expected,
            got: x.len(),
        });
    }
    Ok(())
}
