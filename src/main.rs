use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use ranforest_io::{ExperimentName, ResultWriter, TableReader};
use ranforest_tree::{Criterion, GrowInputs, RanTree, SortIndex, Targets, TreeConfig};

#[derive(Parser)]
#[command(name = "ranforest")]
#[command(about = "Grow, dump and evaluate random-forest decision trees")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Tree growth parameters.
#[derive(Args, Debug, Clone)]
struct GrowArgs {
    /// Split criterion: "gini" (classification) or "variance" (regression)
    #[arg(long, default_value = "gini")]
    criterion: String,

    /// Number of classes (defaults to the largest label + 1)
    #[arg(long)]
    n_classes: Option<usize>,

    /// Nodes with at most this many samples become leaves
    #[arg(long, default_value_t = 1)]
    min_node_size: usize,

    /// Features drawn (with replacement) at each node
    #[arg(long, default_value_t = 3)]
    n_try: usize,

    /// Cap on the node array (defaults to 2N + 1)
    #[arg(long)]
    max_nodes: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Grow a single tree from a CSV table and write its dump and summary
    Grow {
        /// Path to the training CSV file
        #[arg(long)]
        data: PathBuf,

        /// Name of the target column
        #[arg(long)]
        target: String,

        /// Name of a bootstrap weight column (unit weights if omitted)
        #[arg(long)]
        weight: Option<String>,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        grow: GrowArgs,
    },

    /// Evaluate a dumped tree on every row of a CSV table
    Predict {
        /// Path to a tree dump written by `grow`
        #[arg(long)]
        tree: PathBuf,

        /// Path to the CSV file to predict
        #[arg(long)]
        data: PathBuf,

        /// Name of a target column to exclude from features and report alongside
        #[arg(long)]
        target: Option<String>,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

// --- Stdout summaries ---

#[derive(Serialize)]
struct GrowOutput {
    experiment: String,
    criterion: Criterion,
    n_samples: usize,
    n_inbag: usize,
    n_features: usize,
    n_classes: usize,
    n_nodes: usize,
    n_terminal: usize,
    depth: usize,
    capacity_exhausted: bool,
    tree_path: PathBuf,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_rows: usize,
    tree_n_nodes: usize,
    tree_n_classes: usize,
    /// Fraction of rows whose predicted class equals the target, when a
    /// target column was given and holds class ids.
    accuracy: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Grow {
            data,
            target,
            weight,
            experiment,
            output_dir,
            grow,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let criterion = parse_criterion(&grow.criterion)?;

            // 1. Read table
            let table = TableReader::new(&data)
                .with_target(target)
                .with_weight(weight)
                .read()
                .context("failed to read training CSV")?;

            // 2. Build inputs
            let matrix = table.to_matrix().context("invalid feature matrix")?;
            let targets = match criterion {
                Criterion::Gini => {
                    let labels = table.class_labels()?;
                    let inferred = labels.iter().max().map_or(1, |&m| m + 1);
                    let n_classes = grow.n_classes.unwrap_or(inferred);
                    Targets::classification(&labels, n_classes)?
                }
                Criterion::Variance => {
                    if grow.n_classes.is_some() {
                        warn!("--n-classes is ignored for the variance criterion");
                    }
                    let values = table.target().context("table has no target column")?;
                    Targets::regression(values)?
                }
            };
            let weights = table.weights_or_unit();
            let sort = SortIndex::build(&matrix);
            let inputs = GrowInputs::new(&matrix, &targets, &weights, &sort)
                .context("invalid growth inputs")?;

            // 3. Grow
            let config = TreeConfig::new()
                .with_criterion(criterion)
                .with_min_node_size(grow.min_node_size)
                .with_n_try(grow.n_try)
                .with_max_nodes(grow.max_nodes)
                .with_seed(cli.seed);
            let (tree, summary) = config.grow(&inputs).into_parts();
            info!(
                n_nodes = tree.n_nodes(),
                n_terminal = tree.n_terminal(),
                "tree grown"
            );

            // 4. Write artifacts
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let tree_path = writer.write_tree(&tree)?;
            writer.write_growth(table.feature_names(), &tree, &summary)?;

            // 5. Print summary
            let output = GrowOutput {
                experiment,
                criterion,
                n_samples: summary.n_samples,
                n_inbag: summary.n_inbag,
                n_features: matrix.n_features(),
                n_classes: tree.n_classes(),
                n_nodes: tree.n_nodes(),
                n_terminal: tree.n_terminal(),
                depth: tree.depth(),
                capacity_exhausted: summary.capacity_exhausted,
                tree_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            tree,
            data,
            target,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Load tree
            let ran_tree = RanTree::load(&tree).context("failed to load tree dump")?;
            info!(
                n_nodes = ran_tree.n_nodes(),
                n_classes = ran_tree.n_classes(),
                "tree loaded"
            );

            // 2. Read table
            let mut reader = TableReader::new(&data);
            if let Some(target) = target {
                reader = reader.with_target(target);
            }
            let table = reader.read().context("failed to read prediction CSV")?;

            // 3. Predict
            let (values, classes): (Vec<f64>, Vec<usize>) = ran_tree
                .predict_batch_with_class(table.features())
                .context("prediction failed")?
                .into_iter()
                .unzip();

            let accuracy = table.class_labels().ok().map(|labels| {
                let correct = labels.iter().zip(&classes).filter(|(a, b)| a == b).count();
                correct as f64 / labels.len() as f64
            });

            // 4. Write predictions JSON
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_predictions(&values, &classes, table.target())?;

            // 5. Print summary
            let output = PredictOutput {
                experiment,
                n_rows: table.n_samples(),
                tree_n_nodes: ran_tree.n_nodes(),
                tree_n_classes: ran_tree.n_classes(),
                accuracy,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn parse_criterion(s: &str) -> Result<Criterion> {
    match s {
        "gini" => Ok(Criterion::Gini),
        "variance" => Ok(Criterion::Variance),
        other => anyhow::bail!("unknown criterion: {other} (expected gini or variance)"),
    }
}
