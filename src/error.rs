use std::path::PathBuf;

/// failures that can be raised by the classification job
#[derive(Debug, thiserror::Error)]
pub enum KnnError {
    /// a training or test source could not be reached
    #[error("failed to access {}: {source}", .path.display())]
    Configuration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// a job setting was rejected before anything was processed
    #[error("invalid job configuration: {0}")]
    InvalidConfig(String),

    /// a line could not be turned into a feature vector or labeled sample
    #[error("failed to parse line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// two vectors were compared that do not share the same length
    #[error("dimension mismatch. expected: {expected} found: {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// the training source did not provide any samples
    #[error("training source {0} contains no samples")]
    EmptyTrainingSet(String),

    /// a record was handed to a worker that has not finished setup
    #[error("classification worker received a record before setup completed")]
    NotReady,

    /// writing the final decisions failed
    #[error("failed to write output: {0}")]
    Output(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl KnnError {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }

    /// true if the error originated from a malformed line
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::DimensionMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, KnnError>;
