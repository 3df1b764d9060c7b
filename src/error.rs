use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Axis – which dimension of the matrix an error refers to
// ---------------------------------------------------------------------------

/// Matrix dimension: features are rows, samples are columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Feature,
    Sample,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Feature => write!(f, "feature"),
            Axis::Sample => write!(f, "sample"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Everything that can go wrong while building, slicing, combining or
/// persisting an [`ExpressionSet`](crate::ExpressionSet).
#[derive(Debug, Error)]
pub enum Error {
    #[error("dimension mismatch in {field}: expected length {expected}, found {found}")]
    DimensionMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("{axis} name not found: '{name}'")]
    NameNotFound { axis: Axis, name: String },

    #[error("{axis} index {index} out of bounds (valid range 1..={len})")]
    IndexOutOfBounds { axis: Axis, index: usize, len: usize },

    #[error("incompatible features: input {index} does not share the first input's feature names")]
    IncompatibleFeatures { index: usize },

    #[error("cannot combine an empty list of expression sets")]
    EmptyInput,

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed {format} data: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[cfg(feature = "hdf5")]
    #[error(transparent)]
    Hdf5(#[from] hdf5::Error),
}

impl Error {
    pub(crate) fn malformed(format: &'static str, message: impl Into<String>) -> Self {
        Error::Malformed {
            format,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
