//! the per-record and per-key units of a classification job
//!
//! a [`ClassificationWorker`] loads its own copy of the training set once in
//! [`Mapper::setup`] and then turns every test record it is handed into one
//! vote per nearest neighbor, keyed by the raw text of the record.
//!
//! a [`DecisionWorker`] receives every vote for one key and emits the
//! majority label.
use std::io::BufRead;
use std::sync::Arc;

use tracing::{debug, info};

use crate::classify::{NeighborCandidate, nearest_labels_buffered};
use crate::distance::DistanceFn;
use crate::error::{KnnError, Result};
use crate::record::{Label, LabeledSample, Parser};
use crate::source::{InputRecord, LineSource};
use crate::vote::aggregate;

/// per-record step of a map/reduce job
pub trait Mapper {
    type Key;
    type Value;

    /// called once before any record is handed to [`Mapper::map`]
    fn setup(&mut self) -> Result<()>;

    /// processes a single record, emitting zero or more key/value pairs
    fn map<F>(&mut self, record: &InputRecord, emit: &mut F) -> Result<()>
    where
        F: FnMut(Self::Key, Self::Value);
}

/// per-key step of a map/reduce job
pub trait Reducer {
    type Key;
    type ValueIn;
    type ValueOut;

    /// called with every value grouped under `key`
    fn reduce<I, F>(&self, key: Self::Key, values: I, emit: &mut F)
    where
        I: IntoIterator<Item = Self::ValueIn>,
        F: FnMut(Self::Key, Self::ValueOut);
}

/// immutable set of labeled samples that share one dimensionality
#[derive(Debug, Clone)]
pub struct TrainingSet {
    samples: Vec<LabeledSample>,
    dims: usize,
}

impl TrainingSet {
    /// parses every line of the source into a sample. blank lines are
    /// ignored, any other malformed line fails the load
    pub fn load(source: &dyn LineSource) -> Result<Self> {
        let reader = source.open()?;
        let mut parser = Parser::new();
        let mut samples = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            samples.push(parser.training_sample(index + 1, &line)?);
        }

        let Some(dims) = parser.dims() else {
            return Err(KnnError::EmptyTrainingSet(source.name()));
        };

        Ok(Self { samples, dims })
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[LabeledSample] {
        &self.samples
    }
}

/// lifecycle of a [`ClassificationWorker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Uninitialized,
    TrainingLoaded,
    Ready,
}

/// finds the nearest training samples of each test record and emits their
/// labels as votes
pub struct ClassificationWorker {
    k: usize,
    algo: DistanceFn,
    source: Arc<dyn LineSource>,
    state: WorkerState,
    training: Option<TrainingSet>,
    parser: Parser,
    collected: Vec<NeighborCandidate>,
    labels: Vec<Label>,
}

impl ClassificationWorker {
    pub fn new(k: usize, algo: DistanceFn, source: Arc<dyn LineSource>) -> Self {
        Self {
            k,
            algo,
            source,
            state: WorkerState::Uninitialized,
            training: None,
            parser: Parser::new(),
            collected: Vec::new(),
            labels: Vec::with_capacity(k),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }
}

impl Mapper for ClassificationWorker {
    type Key = String;
    type Value = Label;

    fn setup(&mut self) -> Result<()> {
        if self.state != WorkerState::Uninitialized {
            debug!("classification worker already set up");
            return Ok(());
        }

        let training = TrainingSet::load(self.source.as_ref())?;
        self.state = WorkerState::TrainingLoaded;

        // test records have to match the training set
        self.parser = Parser::with_dims(training.dims());
        self.collected = Vec::with_capacity(training.len());

        info!(
            source = %self.source.name(),
            samples = training.len(),
            dims = training.dims(),
            "loaded training set"
        );

        self.training = Some(training);
        self.state = WorkerState::Ready;

        Ok(())
    }

    fn map<F>(&mut self, record: &InputRecord, emit: &mut F) -> Result<()>
    where
        F: FnMut(Self::Key, Self::Value),
    {
        let (WorkerState::Ready, Some(training)) = (self.state, self.training.as_ref()) else {
            return Err(KnnError::NotReady);
        };

        let line = record.text()?;

        if line.trim().is_empty() {
            return Ok(());
        }

        let test = self.parser.test_record(record.number, line)?;

        nearest_labels_buffered(
            self.k,
            training.samples(),
            self.algo,
            test.features.as_slice(),
            &mut self.collected,
            &mut self.labels,
        )?;

        for label in &self.labels {
            emit(test.key.clone(), *label);
        }

        Ok(())
    }
}

/// reduces the votes of one test record to its majority label
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionWorker;

impl Reducer for DecisionWorker {
    type Key = String;
    type ValueIn = Label;
    type ValueOut = Label;

    fn reduce<I, F>(&self, key: Self::Key, values: I, emit: &mut F)
    where
        I: IntoIterator<Item = Self::ValueIn>,
        F: FnMut(Self::Key, Self::ValueOut),
    {
        if let Some(label) = aggregate(values) {
            emit(key, label);
        }
    }
}

#[cfg(test)]
mod test {
    use crate::distance;
    use crate::source::MemorySource;

    use super::*;

    const TRAINING: &str = "0 0 0\n10 10 1\n\n0 1 0\n";

    fn worker(k: usize, text: &str) -> ClassificationWorker {
        ClassificationWorker::new(
            k,
            distance::euclidean,
            Arc::new(MemorySource::new("training", text)),
        )
    }

    fn record(number: usize, line: &str) -> InputRecord {
        InputRecord {
            offset: 0,
            number,
            line: Ok(line.into()),
        }
    }

    fn map_votes(worker: &mut ClassificationWorker, line: &str) -> Result<Vec<(String, Label)>> {
        let mut votes = Vec::new();

        worker.map(&record(1, line), &mut |key, label| votes.push((key, label)))?;

        Ok(votes)
    }

    #[test]
    fn setup_moves_worker_to_ready() {
        let mut worker = worker(2, TRAINING);
        assert_eq!(worker.state(), WorkerState::Uninitialized);

        worker.setup().unwrap();

        assert_eq!(worker.state(), WorkerState::Ready);
    }

    #[test]
    fn training_set_skips_blank_lines() {
        let training = TrainingSet::load(&MemorySource::new("training", TRAINING)).unwrap();

        assert_eq!(training.len(), 3);
        assert_eq!(training.dims(), 2);
        assert_eq!(training.samples()[2], LabeledSample::new(vec![0.0, 1.0], 0));
    }

    #[test]
    fn map_before_setup_fails() {
        let mut worker = worker(2, TRAINING);

        assert!(matches!(
            map_votes(&mut worker, "0 0"),
            Err(KnnError::NotReady)
        ));
    }

    #[test]
    fn emits_one_vote_per_neighbor() {
        let mut worker = worker(2, TRAINING);
        worker.setup().unwrap();

        let votes = map_votes(&mut worker, "0 0").unwrap();

        assert_eq!(votes, vec![("0 0".to_owned(), 0), ("0 0".to_owned(), 0)]);
    }

    #[test]
    fn votes_capped_by_training_size() {
        let mut worker = worker(5, TRAINING);
        worker.setup().unwrap();

        let votes = map_votes(&mut worker, "9 9").unwrap();

        assert_eq!(votes.len(), 3);
        assert_eq!(votes[0], ("9 9".to_owned(), 1));
    }

    #[test]
    fn blank_record_emits_nothing() {
        let mut worker = worker(2, TRAINING);
        worker.setup().unwrap();

        assert!(map_votes(&mut worker, "  ").unwrap().is_empty());
    }

    #[test]
    fn malformed_record_is_parse_error() {
        let mut worker = worker(2, TRAINING);
        worker.setup().unwrap();

        assert!(map_votes(&mut worker, "0 x").unwrap_err().is_parse());
        // dimensionality is pinned to the training set
        assert!(map_votes(&mut worker, "0 0 0").unwrap_err().is_parse());
    }

    #[test]
    fn invalid_utf8_record_is_parse_error() {
        let mut worker = worker(2, TRAINING);
        worker.setup().unwrap();

        let bad = InputRecord {
            offset: 4,
            number: 2,
            line: String::from_utf8(vec![0xff, b' ', b'1']),
        };
        let err = worker.map(&bad, &mut |_, _| {}).unwrap_err();

        assert!(matches!(err, KnnError::Parse { line: 2, .. }));
    }

    #[test]
    fn malformed_training_fails_setup() {
        let mut worker = worker(2, "0 0 0\n1 1\n");

        let err = worker.setup().unwrap_err();

        assert!(matches!(err, KnnError::Parse { line: 2, .. }));
        assert_eq!(worker.state(), WorkerState::Uninitialized);
    }

    #[test]
    fn empty_training_fails_setup() {
        let mut worker = worker(2, "\n\n");

        assert!(matches!(
            worker.setup(),
            Err(KnnError::EmptyTrainingSet(_))
        ));
    }

    #[test]
    fn decision_picks_majority() {
        let mut out = Vec::new();

        DecisionWorker.reduce("1 2".to_owned(), [3, 1, 3], &mut |key, label| {
            out.push((key, label))
        });

        assert_eq!(out, vec![("1 2".to_owned(), 3)]);
    }

    #[test]
    fn decision_tie_goes_to_smallest_label() {
        let mut out = Vec::new();

        DecisionWorker.reduce("q".to_owned(), [1, 1, 0, 0], &mut |key, label| {
            out.push((key, label))
        });

        assert_eq!(out, vec![("q".to_owned(), 0)]);
    }

    #[test]
    fn decision_without_votes_emits_nothing() {
        let mut out: Vec<(String, Label)> = Vec::new();

        DecisionWorker.reduce("q".to_owned(), Vec::<Label>::new(), &mut |key, label| {
            out.push((key, label))
        });

        assert!(out.is_empty());
    }
}
