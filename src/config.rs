use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::cli::{AlgoType, MalformedPolicy};
use crate::error::{KnnError, Result};

/// settings for a single classification job, fixed before the job starts
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// the number of neighbors that vote for each test record
    pub k: NonZeroUsize,

    pub algo: AlgoType,

    /// file containing the labeled training samples
    pub training: PathBuf,

    /// files or directories containing the test records
    pub inputs: Vec<PathBuf>,

    /// directory the decisions are written to. must not exist yet
    pub output: PathBuf,

    /// the number of classification workers to split the input across
    pub partitions: NonZeroUsize,

    pub on_malformed: MalformedPolicy,
}

impl JobConfig {
    /// checks that every source can be reached and that the output will not
    /// clobber anything before a single record is processed
    pub fn validate(&self) -> Result<()> {
        std::fs::metadata(&self.training).map_err(|source| KnnError::Configuration {
            path: self.training.clone(),
            source,
        })?;

        if self.inputs.is_empty() {
            return Err(KnnError::InvalidConfig("no test inputs specified".into()));
        }

        for input in &self.inputs {
            std::fs::metadata(input).map_err(|source| KnnError::Configuration {
                path: input.clone(),
                source,
            })?;
        }

        if self.output.exists() {
            return Err(KnnError::InvalidConfig(format!(
                "output directory already exists: {}",
                self.output.display()
            )));
        }

        Ok(())
    }
}
