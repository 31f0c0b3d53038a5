/// Errors that can occur while building or running a filter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// The filter was asked for zero channels.
    #[error("filter dimension must be greater than zero")]
    ZeroDimension,

    /// The LMS history depth is zero.
    #[error("filter order must be greater than zero")]
    ZeroOrder,

    /// The LMS history depth is above [`MAX_ORDER`](crate::config::MAX_ORDER).
    #[error("filter order {order} exceeds maximum {max}")]
    OrderTooLarge { order: usize, max: usize },

    /// The LMS step size is NaN or infinite.
    #[error("step size must be finite (got {0})")]
    InvalidStepSize(f64),

    /// An input vector does not match the filter dimension.
    #[error("input has {got} channels, filter expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Initial weights do not form a `dim × dim*order` matrix.
    #[error("weight matrix is {got:?}, expected {expected:?}")]
    WeightShape {
        expected: (usize, usize),
        got: (usize, usize),
    },

    /// The weight matrix for this dimension and order would exceed
    /// [`MAX_WEIGHTS`](crate::config::MAX_WEIGHTS) entries.
    #[error("lms state for {dim} channels at order {order} exceeds {max} weights")]
    StateTooLarge { dim: usize, order: usize, max: usize },

    /// Unrecognized filter name.
    #[error("unknown filter '{0}' (expected 'lms' or 'echo')")]
    UnknownKind(String),
}

pub type Result<T> = std::result::Result<T, FilterError>;
