//! Autoregressive least-mean-squares predictor.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use tracing::debug;

use crate::config::{LmsConfig, MAX_WEIGHTS};
use crate::error::{FilterError, Result};
use crate::predictor::check_dim;

/// One-step-ahead LMS predictor over a sliding window of past inputs.
///
/// State layout, for `dim` channels and `order` retained ticks:
///
/// - `history`: `dim * order` values, the last `order` inputs concatenated,
///   newest first.
/// - `weights`: `dim × (dim * order)`, one row per output channel.
/// - `prediction`: always equal to `weights · history` between ticks. Kept as
///   a plain buffer since it goes straight onto the wire.
pub struct LmsFilter {
    dim: usize,
    order: usize,
    mu: f64,
    history: Array1<f64>,
    weights: Array2<f64>,
    prediction: Vec<f64>,
    error: Array1<f64>,
}

impl LmsFilter {
    /// Allocate a zero-initialized filter.
    pub fn new(dim: usize, config: LmsConfig) -> Result<Self> {
        let history_size = Self::check_shape(dim, config)?;
        Self::with_weights(dim, config, Array2::zeros((dim, history_size)))
    }

    /// Allocate a filter with explicit initial weights.
    ///
    /// History starts at zero, so the initial prediction is zero too.
    pub fn with_weights(dim: usize, config: LmsConfig, weights: Array2<f64>) -> Result<Self> {
        let history_size = Self::check_shape(dim, config)?;
        if weights.dim() != (dim, history_size) {
            return Err(FilterError::WeightShape {
                expected: (dim, history_size),
                got: weights.dim(),
            });
        }

        debug!(dim, order = config.order, mu = config.mu, "allocated lms filter");

        Ok(Self {
            dim,
            order: config.order,
            mu: config.mu,
            history: Array1::zeros(history_size),
            weights,
            prediction: vec![0.0; dim],
            error: Array1::zeros(dim),
        })
    }

    /// Validate the shape and return the history length.
    fn check_shape(dim: usize, config: LmsConfig) -> Result<usize> {
        if dim == 0 {
            return Err(FilterError::ZeroDimension);
        }
        config.validate()?;

        let too_large = || FilterError::StateTooLarge {
            dim,
            order: config.order,
            max: MAX_WEIGHTS,
        };
        let history_size = dim.checked_mul(config.order).ok_or_else(too_large)?;
        let entries = dim.checked_mul(history_size).ok_or_else(too_large)?;
        if entries > MAX_WEIGHTS {
            return Err(too_large());
        }
        Ok(history_size)
    }

    /// Consume one input vector and return the prediction for the next one.
    pub fn predict_next(&mut self, x: &[f64]) -> Result<&[f64]> {
        check_dim(self.dim, x)?;
        let x = ArrayView1::from(x);

        // Residual against the previous tick's prediction.
        Zip::from(&mut self.error)
            .and(x)
            .and(ArrayView1::from(self.prediction.as_slice()))
            .for_each(|err, &xi, &pred| *err = xi - pred);

        // Rank-1 update: weights += mu * error ⊗ history.
        for (mut row, &err) in self.weights.axis_iter_mut(Axis(0)).zip(&self.error) {
            row.scaled_add(self.mu * err, &self.history);
        }

        // Newest input goes first; the oldest vector falls off the end.
        let dim = self.dim;
        for k in (1..self.order).rev() {
            let (older, mut newer) = self
                .history
                .multi_slice_mut((s![(k - 1) * dim..k * dim], s![k * dim..(k + 1) * dim]));
            newer.assign(&older);
        }
        self.history.slice_mut(s![..dim]).assign(&x);

        for (pred, row) in self.prediction.iter_mut().zip(self.weights.outer_iter()) {
            *pred = row.dot(&self.history);
        }
        Ok(&self.prediction)
    }

    /// Number of channels.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of past input vectors retained.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Learning rate.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Length of the history vector (`dim * order`).
    pub fn history_size(&self) -> usize {
        self.history.len()
    }

    /// Past inputs, newest first.
    pub fn history(&self) -> ArrayView1<'_, f64> {
        self.history.view()
    }

    pub fn weights(&self) -> ArrayView2<'_, f64> {
        self.weights.view()
    }

    /// Weights that produce the prediction for output channel `channel`.
    pub fn weight_row(&self, channel: usize) -> Option<ArrayView1<'_, f64>> {
        (channel < self.dim).then(|| self.weights.row(channel))
    }

    /// Prediction for the next input.
    pub fn prediction(&self) -> &[f64] {
        &self.prediction
    }

    /// Residual from the most recent tick.
    pub fn error(&self) -> ArrayView1<'_, f64> {
        self.error.view()
    }
}

impl std::fmt::Debug for LmsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmsFilter")
            .field("dim", &self.dim)
            .field("order", &self.order)
            .field("mu", &self.mu)
            .finish()
    }
}
