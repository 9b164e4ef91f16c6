use std::{fmt, io, path::PathBuf};

/// Errors raised by the network itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The layer sizes cannot describe a network (fewer than two layers, or an empty layer).
    InvalidTopology(String),
    /// An input vector does not match the size of the input layer.
    InvalidInputSize { expected: usize, actual: usize },
    /// An expected-output vector does not match the size of the output layer.
    InvalidExpectedSize { expected: usize, actual: usize },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTopology(msg) => write!(f, "invalid topology: {msg}"),
            Self::InvalidInputSize { expected, actual } => {
                write!(f, "invalid input size {actual}, expected {expected}")
            }
            Self::InvalidExpectedSize { expected, actual } => {
                write!(f, "invalid expected output size {actual}, expected {expected}")
            }
        }
    }
}

impl std::error::Error for NetworkError {}

/// Errors raised while decoding MNIST IDX files.
#[derive(Debug)]
pub enum MnistError {
    Io { path: PathBuf, source: io::Error },
    /// The file does not start with the magic number of the expected IDX type.
    InvalidMagic { path: PathBuf, expected: u32, actual: u32 },
    /// The file ended before its header or its declared payload.
    Truncated { path: PathBuf },
    /// The image header declares dimensions that cannot describe its images: a zero-sized image
    /// in a non-empty file, or a pixel count too large to address.
    InvalidDimensions {
        count: usize,
        rows: usize,
        columns: usize,
    },
    /// The image and label files describe a different number of examples.
    CountMismatch { images: usize, labels: usize },
    /// A label does not name one of the ten digit classes.
    InvalidLabel { index: usize, label: u8 },
    /// More examples were requested for validation than the training file holds.
    ValidationTooLarge { requested: usize, available: usize },
}

impl fmt::Display for MnistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "could not read {}: {source}", path.display()),
            Self::InvalidMagic {
                path,
                expected,
                actual,
            } => write!(
                f,
                "invalid format: {} has magic number {actual}, expected {expected}",
                path.display()
            ),
            Self::Truncated { path } => write!(f, "invalid format: {} is truncated", path.display()),
            Self::InvalidDimensions {
                count,
                rows,
                columns,
            } => write!(
                f,
                "invalid format: {count} images of {rows}x{columns} pixels"
            ),
            Self::CountMismatch { images, labels } => {
                write!(f, "data size does not match: {images} images, {labels} labels")
            }
            Self::InvalidLabel { index, label } => {
                write!(f, "label {label} at index {index} is not a digit")
            }
            Self::ValidationTooLarge {
                requested,
                available,
            } => write!(
                f,
                "cannot hold out {requested} validation examples from {available} training examples"
            ),
        }
    }
}

impl std::error::Error for MnistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors raised while loading or validating a training configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "could not read config {}: {source}", path.display())
            }
            Self::Parse(e) => write!(f, "could not parse config: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}
