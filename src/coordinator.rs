//! a local stand-in for the distributed runtime
//!
//! the test records are split into contiguous partitions, each of which is
//! handled by its own [`ClassificationWorker`] on the rayon thread pool. the
//! emitted votes are grouped by key into an ordered map and every group is
//! handed to a [`DecisionWorker`]. decisions are written tab separated into
//! `part-r-00000` inside of the output directory followed by an empty
//! `_SUCCESS` marker.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cli::MalformedPolicy;
use crate::config::JobConfig;
use crate::distance::DistanceFn;
use crate::error::{KnnError, Result};
use crate::record::Label;
use crate::source::{FileSource, InputRecord, LineSource, expand_inputs, read_records};
use crate::worker::{ClassificationWorker, DecisionWorker, Mapper, Reducer};

/// name of the file holding the decisions
pub const OUTPUT_FILE: &str = "part-r-00000";

/// marker written once every decision has been written
pub const SUCCESS_FILE: &str = "_SUCCESS";

/// the final label for a single test record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub key: String,
    pub label: Label,
}

/// counters collected over a job run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSummary {
    /// lines read from the test inputs
    pub records: usize,

    /// malformed lines that were skipped
    pub skipped: usize,

    /// votes emitted by the classification workers
    pub votes: usize,

    /// decisions written
    pub decisions: usize,
}

/// votes emitted by a single partition
#[derive(Debug, Default)]
struct PartitionOutput {
    votes: Vec<(String, Label)>,
    records: usize,
    skipped: usize,
}

/// runs the whole job described by the config
pub fn run_job(config: &JobConfig) -> Result<JobSummary> {
    config.validate()?;

    info!(
        k = config.k.get(),
        algo = ?config.algo,
        partitions = config.partitions.get(),
        inputs = config.inputs.len(),
        training = %config.training.display(),
        "starting knn job"
    );

    let mut records = Vec::new();

    for path in expand_inputs(&config.inputs)? {
        let file = File::open(&path).map_err(|source| KnnError::Configuration {
            path: path.clone(),
            source,
        })?;

        let found = read_records(BufReader::new(file))?;

        debug!(path = %path.display(), records = found.len(), "read test input");

        records.extend(found);
    }

    let source: Arc<dyn LineSource> = Arc::new(FileSource::new(&config.training));

    let (decisions, mut summary) = classify_records(
        config.k.get(),
        config.algo.distance(),
        source,
        &records,
        config.partitions.get(),
        config.on_malformed,
    )?;

    summary.decisions = write_output(&config.output, &decisions)?;

    info!(
        records = summary.records,
        skipped = summary.skipped,
        votes = summary.votes,
        decisions = summary.decisions,
        output = %config.output.display(),
        "knn job complete"
    );

    Ok(summary)
}

/// runs the map, shuffle and reduce phases over the given records
pub fn classify_records(
    k: usize,
    algo: DistanceFn,
    source: Arc<dyn LineSource>,
    records: &[InputRecord],
    partitions: usize,
    policy: MalformedPolicy,
) -> Result<(Vec<Decision>, JobSummary)> {
    let partitions = std::cmp::max(partitions, 1);
    let chunk_size = std::cmp::max(records.len().div_ceil(partitions), 1);

    // an empty input still gets one worker so the training set is checked
    let outputs = if records.is_empty() {
        vec![run_partition(0, records, k, algo, &source, policy)?]
    } else {
        records
            .par_chunks(chunk_size)
            .enumerate()
            .map(|(index, chunk)| run_partition(index, chunk, k, algo, &source, policy))
            .collect::<Result<Vec<PartitionOutput>>>()?
    };

    let mut summary = JobSummary::default();

    for output in &outputs {
        summary.records += output.records;
        summary.skipped += output.skipped;
        summary.votes += output.votes.len();
    }

    let groups = shuffle(outputs);

    debug!(keys = groups.len(), "shuffled votes");

    let decisions = groups
        .into_par_iter()
        .filter_map(|(key, votes)| {
            let mut decision = None;

            DecisionWorker.reduce(key, votes, &mut |key, label| {
                decision = Some(Decision { key, label })
            });

            decision
        })
        .collect::<Vec<Decision>>();

    summary.decisions = decisions.len();

    Ok((decisions, summary))
}

/// sets up a worker with its own copy of the training set and feeds it every
/// record of the partition
fn run_partition(
    index: usize,
    chunk: &[InputRecord],
    k: usize,
    algo: DistanceFn,
    source: &Arc<dyn LineSource>,
    policy: MalformedPolicy,
) -> Result<PartitionOutput> {
    let mut worker = ClassificationWorker::new(k, algo, Arc::clone(source));
    worker.setup()?;

    let mut output = PartitionOutput {
        records: chunk.len(),
        ..PartitionOutput::default()
    };

    for record in chunk {
        let result = worker.map(record, &mut |key, label| output.votes.push((key, label)));

        match result {
            Ok(()) => {}
            Err(err) if err.is_parse() && policy == MalformedPolicy::Skip => {
                warn!(
                    partition = index,
                    line = record.number,
                    offset = record.offset,
                    error = %err,
                    "skipping malformed record"
                );

                output.skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    debug!(
        partition = index,
        records = output.records,
        votes = output.votes.len(),
        "partition complete"
    );

    Ok(output)
}

/// groups the votes of every partition by their key
fn shuffle(outputs: Vec<PartitionOutput>) -> BTreeMap<String, Vec<Label>> {
    let mut groups: BTreeMap<String, Vec<Label>> = BTreeMap::new();

    for output in outputs {
        for (key, label) in output.votes {
            groups.entry(key).or_default().push(label);
        }
    }

    groups
}

/// writes one `<record>\t<label>` line per decision and returns how many
/// were written
pub fn write_output(dir: &Path, decisions: &[Decision]) -> Result<usize> {
    std::fs::create_dir_all(dir)?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .has_headers(false)
        .from_path(dir.join(OUTPUT_FILE))?;

    for decision in decisions {
        writer.write_record([decision.key.as_str(), decision.label.to_string().as_str()])?;
    }

    writer.flush()?;

    File::create(dir.join(SUCCESS_FILE))?;

    Ok(decisions.len())
}
