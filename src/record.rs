//! line parsing for training and test records
//!
//! both kinds of line are whitespace separated decimal numbers. a training
//! line carries one trailing integer token that is the label of the sample,
//! a test line is nothing but feature values.
//!
//! the first line parsed by a [`Parser`] establishes the dimensionality for
//! every line that follows it unless one was given up front.
use std::str::FromStr;

use crate::error::{KnnError, Result};

/// integer class identifier attached to a training sample
pub type Label = i32;

/// ordered list of real valued features
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// a single training example
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSample {
    pub features: FeatureVector,
    pub label: Label,
}

impl LabeledSample {
    pub fn new(features: impl Into<FeatureVector>, label: Label) -> Self {
        Self {
            features: features.into(),
            label,
        }
    }
}

/// an unlabeled record along with the raw text it was parsed from. the raw
/// text is the grouping key for its votes and the identifier in the output
#[derive(Debug, Clone, PartialEq)]
pub struct TestRecord {
    pub key: String,
    pub features: FeatureVector,
}

/// converts lines of text into feature vectors while tracking the
/// dimensionality shared by every vector of a job
#[derive(Debug, Clone, Default)]
pub struct Parser {
    dims: Option<usize>,
}

impl Parser {
    pub fn new() -> Self {
        Self { dims: None }
    }

    /// creates a parser that only accepts vectors of the given length
    pub fn with_dims(dims: usize) -> Self {
        Self { dims: Some(dims) }
    }

    pub fn dims(&self) -> Option<usize> {
        self.dims
    }

    /// parses a test line, every token is a feature value
    pub fn test_record(&mut self, line_no: usize, line: &str) -> Result<TestRecord> {
        let features = self.parse(line_no, line, true)?.0;

        Ok(TestRecord {
            key: line.to_owned(),
            features,
        })
    }

    /// parses a training line, the last token is the label
    pub fn training_sample(&mut self, line_no: usize, line: &str) -> Result<LabeledSample> {
        let (features, label) = self.parse(line_no, line, false)?;

        // parse only hands back no label for test data
        let Some(label) = label else {
            return Err(KnnError::parse(line_no, "missing label token"));
        };

        Ok(LabeledSample::new(features, label))
    }

    /// splits the line on whitespace and converts the tokens. when
    /// `test_data` is false the final token is parsed as the label
    pub fn parse(
        &mut self,
        line_no: usize,
        line: &str,
        test_data: bool,
    ) -> Result<(FeatureVector, Option<Label>)> {
        let mut tokens: Vec<&str> = line.split_whitespace().collect();

        let label = if test_data {
            None
        } else {
            let Some(last) = tokens.pop() else {
                return Err(KnnError::parse(line_no, "missing label token"));
            };

            let Ok(label) = Label::from_str(last) else {
                return Err(KnnError::parse(
                    line_no,
                    format!("label is not an integer. token: {last:?}"),
                ));
            };

            Some(label)
        };

        if tokens.is_empty() {
            return Err(KnnError::parse(line_no, "no feature values"));
        }

        let mut values = Vec::with_capacity(tokens.len());

        for (column, token) in tokens.iter().enumerate() {
            let Ok(value) = f64::from_str(token) else {
                return Err(KnnError::parse(
                    line_no,
                    format!("feature is not numeric. column: {} token: {token:?}", column + 1),
                ));
            };

            if !value.is_finite() {
                return Err(KnnError::parse(
                    line_no,
                    format!("feature is not finite. column: {} token: {token:?}", column + 1),
                ));
            }

            values.push(value);
        }

        match self.dims {
            Some(expected) if expected != values.len() => {
                return Err(KnnError::parse(
                    line_no,
                    format!(
                        "expected {expected} feature values but found {}",
                        values.len()
                    ),
                ));
            }
            Some(_) => {}
            None => self.dims = Some(values.len()),
        }

        Ok((FeatureVector(values), label))
    }
}
