//! Error taxonomy shared by the selector, transform, factorization and eigensystem layers.

/// Errors surfaced by every fallible operation in the crate.
///
/// `code()` maps each variant onto the integer status convention used by
/// callers that speak status codes: argument errors are the negative 1-based
/// index of the offending argument, everything else is a fixed positive code.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RcwaError {
    #[error("argument {index} is invalid: {reason}")]
    InvalidArgument { index: usize, reason: String },

    #[error("degenerate lattice: {0}")]
    DegenerateLattice(String),

    #[error("singular matrix while {context}")]
    SingularMatrix { context: &'static str },

    #[error("eigendecomposition did not converge: {context}")]
    NoConvergence { context: String },

    #[error("failed to create FFT plan: {0}")]
    FftPlan(String),

    #[error("workspace of {elements} complex values cannot be allocated")]
    Allocation { elements: usize },

    #[error("unsupported configuration: {0}")]
    Unsupported(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RcwaError {
    pub fn invalid_argument(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            index,
            reason: reason.into(),
        }
    }

    /// Integer status for the error.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidArgument { index, .. } => -(*index as i32),
            Self::DegenerateLattice(_) => 1,
            Self::SingularMatrix { .. } => 2,
            Self::NoConvergence { .. } => 3,
            Self::FftPlan(_) => 4,
            Self::Allocation { .. } => 5,
            Self::Unsupported(_) => 6,
            Self::Config(_) => 7,
        }
    }
}

impl From<toml::de::Error> for RcwaError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RcwaError>;
