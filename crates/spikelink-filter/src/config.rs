//! Filter selection and LMS parameters

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::echo::EchoFilter;
use crate::error::{FilterError, Result};
use crate::lms::LmsFilter;
use crate::predictor::Filter;

/// Default LMS history depth, in ticks.
pub const DEFAULT_ORDER: usize = 1;

/// Default LMS step size.
pub const DEFAULT_MU: f64 = 0.01;

/// Largest accepted LMS history depth.
pub const MAX_ORDER: usize = 4096;

/// Largest weight matrix an LMS filter will allocate, in entries (1 GiB of `f64`).
pub const MAX_WEIGHTS: usize = 1 << 27;

/// Parameters of the LMS predictor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LmsConfig {
    /// Number of past input vectors kept in the history.
    pub order: usize,

    /// Learning rate. Used as given: no clamping, no normalization.
    pub mu: f64,
}

impl LmsConfig {
    /// Create a configuration.
    pub fn new(order: usize, mu: f64) -> Self {
        Self { order, mu }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.order == 0 {
            return Err(FilterError::ZeroOrder);
        }
        if self.order > MAX_ORDER {
            return Err(FilterError::OrderTooLarge {
                order: self.order,
                max: MAX_ORDER,
            });
        }
        if !self.mu.is_finite() {
            return Err(FilterError::InvalidStepSize(self.mu));
        }
        Ok(())
    }
}

impl Default for LmsConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            mu: DEFAULT_MU,
        }
    }
}

/// The closed set of filter variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Lms,
    Echo,
}

impl FilterKind {
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Lms => "lms",
            FilterKind::Echo => "echo",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lms" => Ok(FilterKind::Lms),
            "echo" => Ok(FilterKind::Echo),
            other => Err(FilterError::UnknownKind(other.to_string())),
        }
    }
}

/// Which filter the processor runs, decided once at startup.
///
/// The dimension is not stored here: it comes from the probe's handshake
/// and is supplied to [`FilterSpec::build`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub lms: LmsConfig,
}

impl FilterSpec {
    /// LMS filter with the given parameters.
    pub fn lms(config: LmsConfig) -> Self {
        Self {
            kind: FilterKind::Lms,
            lms: config,
        }
    }

    /// Echo baseline.
    pub fn echo() -> Self {
        Self {
            kind: FilterKind::Echo,
            lms: LmsConfig::default(),
        }
    }

    /// Validate the parameters that apply to the selected kind.
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            FilterKind::Lms => self.lms.validate(),
            FilterKind::Echo => Ok(()),
        }
    }

    /// Allocate a zero-initialized filter for `dim` channels.
    pub fn build(&self, dim: usize) -> Result<Filter> {
        match self.kind {
            FilterKind::Lms => Ok(Filter::Lms(LmsFilter::new(dim, self.lms)?)),
            FilterKind::Echo => Ok(Filter::Echo(EchoFilter::new(dim)?)),
        }
    }
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self::lms(LmsConfig::default())
    }
}
