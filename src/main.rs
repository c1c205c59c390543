use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod classify;
mod cli;
mod config;
mod coordinator;
mod distance;
mod error;
mod predict;
mod record;
mod source;
mod vote;
mod worker;

use cli::{AlgoType, MalformedPolicy};
use config::JobConfig;
use predict::PredictArgs;

fn main() -> anyhow::Result<()> {
    // logs go to stderr so stdout only carries results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    match args.cmd {
        KnnCmd::Run(arg) => knn_run(arg),
        KnnCmd::Predict(arg) => predict::knn_predict(arg),
    }
}

/// k nearest neighbors (knn) classification of unlabeled records against a
/// labeled training set, run as a map/reduce style batch job.
#[derive(Debug, Parser)]
struct CliArgs {
    #[command(subcommand)]
    cmd: KnnCmd,
}

#[derive(Debug, Subcommand)]
pub enum KnnCmd {
    /// classifies every record of the test inputs and writes the decisions
    Run(RunArgs),

    /// attempts to predict a specific datapoint with the training data
    Predict(PredictArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// the number of neighbors that vote for each record
    #[arg(short, default_value = "5")]
    k: NonZeroUsize,

    /// specifies the algorithm to use when calculating distances
    #[arg(long, default_value = "euclidean")]
    algo: AlgoType,

    /// path to the labeled training data
    #[arg(short, long)]
    training: PathBuf,

    /// the number of workers to split the test records across. defaults to
    /// the number of available threads
    #[arg(long)]
    partitions: Option<NonZeroUsize>,

    /// what to do with test records that cannot be parsed
    #[arg(long, default_value = "fail")]
    on_malformed: MalformedPolicy,

    /// directory to write the decisions to, must not exist
    #[arg(short, long)]
    output: PathBuf,

    /// test data files or directories of test data files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn knn_run(arg: RunArgs) -> anyhow::Result<()> {
    let partitions = arg.partitions.unwrap_or_else(|| {
        NonZeroUsize::new(rayon::current_num_threads()).unwrap_or(NonZeroUsize::MIN)
    });

    let config = JobConfig {
        k: arg.k,
        algo: arg.algo,
        training: arg.training,
        inputs: arg.inputs,
        output: arg.output,
        partitions,
        on_malformed: arg.on_malformed,
    };

    coordinator::run_job(&config).context("knn job failed")?;

    Ok(())
}
