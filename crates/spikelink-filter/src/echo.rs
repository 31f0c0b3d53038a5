use crate::error::{FilterError, Result};
use crate::predictor::check_dim;

/// Baseline predictor: the prediction for the next tick is the current input.
#[derive(Debug, Clone)]
pub struct EchoFilter {
    last: Vec<f64>,
}

impl EchoFilter {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(FilterError::ZeroDimension);
        }
        Ok(Self {
            last: vec![0.0; dim],
        })
    }

    pub fn dim(&self) -> usize {
        self.last.len()
    }

    pub fn predict_next(&mut self, x: &[f64]) -> Result<&[f64]> {
        check_dim(self.last.len(), x)?;
        self.last.copy_from_slice(x);
        Ok(&self.last)
    }

    pub fn prediction(&self) -> &[f64] {
        &self.last
    }
}
