use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Args;

use crate::classify::nearest_labels;
use crate::cli::{AlgoType, Datapoint, KValue};
use crate::source::{FileSource, LineSource, MemorySource};
use crate::vote::VoteTally;
use crate::worker::TrainingSet;

#[derive(Debug, Args)]
pub struct PredictArgs {
    /// the number of neighbors to lookup
    #[arg(short, default_value = "5")]
    k: KValue,

    /// specifies the algorithm to use when calculating distances
    #[arg(long, default_value = "euclidean")]
    algo: AlgoType,

    /// path to the training data, "-" reads it from stdin
    #[arg(short, long)]
    training: PathBuf,

    /// a comma delimitered list of numbers to estimate its label for
    #[arg(long)]
    datapoint: Datapoint,
}

pub fn knn_predict(arg: PredictArgs) -> anyhow::Result<()> {
    let source: Box<dyn LineSource> = if arg.training.as_os_str() == "-" {
        let mut text = String::new();

        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read training data from stdin")?;

        Box::new(MemorySource::new("stdin", text))
    } else {
        Box::new(FileSource::new(arg.training))
    };

    let training = TrainingSet::load(source.as_ref())
        .with_context(|| format!("failed to load training data from {}", source.name()))?;

    let datapoint = arg.datapoint.into_inner();

    if datapoint.len() != training.dims() {
        bail!(
            "number of datapoint values does not match the training data. expected: {} found: {}",
            training.dims(),
            datapoint.len()
        );
    }

    let algo = arg.algo.distance();
    let mut stdout = std::io::stdout().lock();

    // k will be the min of the specified high value or the total number of
    // samples
    for k in arg.k.get_range(training.len()) {
        let labels = nearest_labels(k, training.samples(), algo, &datapoint)?;
        let tally: VoteTally = labels.into_iter().collect();

        write_prediction(&mut stdout, k, &datapoint, &tally)?;
    }

    Ok(())
}

/// prints the votes for a single k value along with the share of each label
/// and the final decision
fn write_prediction<W>(
    output: &mut W,
    k: usize,
    datapoint: &[f64],
    tally: &VoteTally,
) -> std::io::Result<()>
where
    W: Write,
{
    write!(output, "k value: {k} |")?;

    for v in datapoint {
        write!(output, " {v}")?;
    }

    writeln!(output)?;

    for (label, count) in tally.iter() {
        writeln!(output, "  {label}: {count} {:.2}", tally.share(label))?;
    }

    if let Some(winner) = tally.winner() {
        writeln!(output, "  decision: {winner}")?;
    }

    Ok(())
}
