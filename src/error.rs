use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use ndarray::ShapeError;

/// The result type used in the entire loader crate.
pub type Result<T> = std::result::Result<T, LoaderErr>;

/// The loader's error type.
///
/// Every variant is fatal for the call that produced it, there is no recovery path other than
/// reconfiguring and rebuilding the loader.
#[derive(Debug)]
pub enum LoaderErr {
    /// The total amount of expanded samples is not a multiple of the batch size.
    Divisibility {
        total: usize,
        batch_size: usize,
    },
    /// Nothing of what was requested is available in the dataset.
    ConfigMismatch(String),
    /// A shape invariant was violated while loading or assembling a configuration.
    ShapeInvariant {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A configuration has more real context objects than the context can hold.
    PaddingOverflow {
        config: String,
        real: usize,
        capacity: usize,
    },
    /// A configuration's expanded sample count is not a multiple of the batch size.
    MisalignedConfig {
        config: String,
        samples: usize,
        batch_size: usize,
    },
    InvalidConfig(String),
    InvalidAbbreviation(String),
    Sampling(String),
    Shape(ShapeError),
    Io(io::Error),
    Json(serde_json::Error),
}

impl Display for LoaderErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderErr::Divisibility { total, batch_size } => write!(
                f,
                "the total amount of samples {total} is not divisible by the batch size {batch_size}"
            ),
            LoaderErr::ConfigMismatch(msg) => write!(f, "config mismatch: {msg}"),
            LoaderErr::ShapeInvariant {
                what,
                got,
                expected,
            } => write!(
                f,
                "shape invariant violated for {what}: got {got}, expected {expected}"
            ),
            LoaderErr::PaddingOverflow {
                config,
                real,
                capacity,
            } => write!(
                f,
                "config {config} has {real} context objects but the context only holds {capacity}"
            ),
            LoaderErr::MisalignedConfig {
                config,
                samples,
                batch_size,
            } => write!(
                f,
                "config {config} has {samples} samples, which is not a multiple of the batch size {batch_size}"
            ),
            LoaderErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            LoaderErr::InvalidAbbreviation(abbrev) => {
                write!(f, "invalid config abbreviation: {abbrev}")
            }
            LoaderErr::Sampling(msg) => write!(f, "sampling error: {msg}"),
            LoaderErr::Shape(e) => write!(f, "shape error: {e}"),
            LoaderErr::Io(e) => write!(f, "io error: {e}"),
            LoaderErr::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl Error for LoaderErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoaderErr::Shape(e) => Some(e),
            LoaderErr::Io(e) => Some(e),
            LoaderErr::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShapeError> for LoaderErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}

impl From<io::Error> for LoaderErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for LoaderErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Fails with `LoaderErr::ShapeInvariant` unless `got == expected`.
pub(crate) fn check(what: &'static str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(LoaderErr::ShapeInvariant {
            what,
            got,
            expected,
        });
    }

    Ok(())
}
