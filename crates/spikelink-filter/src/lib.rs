//! Online predictors run by the processor once per tick.
//!
//! Two variants exist behind the [`Predictor`] capability:
//!
//! - [`LmsFilter`]: autoregressive least-mean-squares predictor. Each tick it
//!   scores its previous prediction against the new input, takes one
//!   stochastic-gradient step on its weights, pushes the input into its
//!   history and predicts the next input.
//! - [`EchoFilter`]: returns the input unchanged. It has no compute cost and
//!   serves as the baseline when measuring protocol overhead.
//!
//! The processor picks one variant at startup through [`FilterSpec`] and gets
//! back a [`Filter`], sized to the negotiated channel count.

pub mod config;
pub mod echo;
pub mod error;
pub mod lms;
pub mod predictor;

pub use config::{
    FilterKind, FilterSpec, LmsConfig, DEFAULT_MU, DEFAULT_ORDER, MAX_ORDER, MAX_WEIGHTS,
};
pub use echo::EchoFilter;
pub use error::{FilterError, Result};
pub use lms::LmsFilter;
pub use predictor::{Filter, Predictor};
