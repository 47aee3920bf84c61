//! surmise CLI: build a surmise relation by questioning an expert.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use surmise::answer_log::AnswerLog;
use surmise::config::SessionConfig;
use surmise::dataset::Dataset;
use surmise::export::{LatticeExport, export_clauses, export_states, implications};
use surmise::generate::{block_len, generate_queries_by_block};
use surmise::item::format_set;
use surmise::lattice::Lattice;
use surmise::oracle::ConsoleOracle;
use surmise::session::Session;
use surmise::space::LearningSpace;
use surmise::states::SearchStrategy;

#[derive(Parser)]
#[command(name = "surmise", version, about = "Surmise relations from expert queries")]
struct Cli {
    /// Session configuration (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (which includes the full learning space after each
    /// answer) and item ids in prompts.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the expert on the console.
    Ask {
        /// Item dataset (JSON).
        #[arg(long)]
        dataset: PathBuf,
        /// Answer log, rewritten after every answer.
        #[arg(long, default_value = "answers.json")]
        log: PathBuf,
        /// Continue from the answers already in the log.
        #[arg(long)]
        resume: bool,
    },

    /// Rebuild the learning space from an answer log and print it.
    Replay {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long)]
        log: PathBuf,
    },

    /// List the feasible knowledge states.
    States {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long)]
        log: PathBuf,
        /// Override the configured search strategy.
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
    },

    /// Preview the candidate pool without asking anything.
    Generate {
        #[arg(long)]
        dataset: PathBuf,
        /// Candidates to print.
        #[arg(long, default_value = "10")]
        sample: usize,
    },

    /// Export results.
    Export {
        #[command(subcommand)]
        action: ExportAction,
    },
}

#[derive(Subcommand)]
enum ExportAction {
    /// Clauses per item as JSON.
    Clauses(Source),
    /// Feasible states as JSON.
    States(Source),
    /// (prerequisite, item) pairs as JSON.
    Implications(Source),
    /// States and covering edges as JSON.
    Lattice(Source),
    /// Hasse diagram as Graphviz DOT.
    Dot(Source),
}

#[derive(clap::Args)]
struct Source {
    #[arg(long)]
    dataset: PathBuf,
    #[arg(long)]
    log: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Breadth,
    Exhaustive,
}

impl From<Strategy> for SearchStrategy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Breadth => SearchStrategy::Breadth,
            Strategy::Exhaustive => SearchStrategy::Exhaustive,
        }
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();

    let fallback = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    match cli.command {
        Commands::Ask {
            dataset,
            log,
            resume,
        } => {
            let dataset = Dataset::load(&dataset)?;
            let session = if resume {
                let saved = AnswerLog::load_or_default(&log);
                Session::resume(dataset.ids(), config, &saved)
            } else {
                Session::new(dataset.ids(), config)
            };
            let mut session = session.with_log_path(&log);
            println!("Number of queries: {}", session.manager().n_active());

            let mut oracle = ConsoleOracle::stdio()
                .show_ids(cli.verbose)
                .clear_screen(!cli.verbose);
            let summary = session.run(&mut oracle, &dataset)?;

            println!("{}", "-".repeat(60));
            println!("Asked:     {}", summary.asked);
            println!("Positive:  {}", summary.positive);
            println!("Negative:  {}", summary.negative);
            println!("Deferred:  {}", summary.deferred);
            println!("Uncertain: {}", summary.uncertain);
            println!(
                "Second stage: {} accepted, {} still pending after {} round(s)",
                summary.second_stage.accepted,
                summary.second_stage.remaining,
                summary.second_stage.rounds
            );
            println!("Answers saved to {}", log.display());
            if cli.verbose {
                println!("\n{}", session.space());
            }
        }

        Commands::Replay { dataset, log } => {
            let space = learned_space(&dataset, &log, &config)?;
            let stats = space.stats();
            println!("{space}");
            println!();
            println!(
                "{} answered by the expert, {} derived, {} recovered by the second stage",
                stats.answered_by_oracle, stats.derived_by_inference, stats.recovered
            );
        }

        Commands::States {
            dataset,
            log,
            strategy,
        } => {
            let space = learned_space(&dataset, &log, &config)?;
            let strategy = strategy.map(Into::into).unwrap_or(config.search);
            let states = space.knowledge_states(strategy);
            println!("Knowledge states ({}):", states.len());
            for state in &states {
                println!("  {}", format_set(state));
            }
        }

        Commands::Generate { dataset, sample } => {
            let dataset = Dataset::load(&dataset)?;
            let items = dataset.ids();
            let caps = config.caps();
            let queries = generate_queries_by_block(
                &items,
                config.max_block_size,
                &caps,
                &mut config.rng(),
            );

            let mut per_block: BTreeMap<usize, usize> = BTreeMap::new();
            for q in &queries {
                *per_block.entry(q.antecedent_size()).or_default() += 1;
            }
            println!("Items: {}", items.len());
            println!("Candidate queries: {}", queries.len());
            for k in 1..=config.max_block_size.min(items.len()) {
                println!(
                    "  block {k}: {} of {}",
                    per_block.get(&k).copied().unwrap_or(0),
                    block_len(items.len(), k)
                );
            }
            if sample > 0 && !queries.is_empty() {
                println!("First {}:", sample.min(queries.len()));
                for q in queries.iter().take(sample) {
                    println!("  {q}");
                }
            }
        }

        Commands::Export { action } => match action {
            ExportAction::Clauses(src) => {
                let space = learned_space(&src.dataset, &src.log, &config)?;
                print_json(&export_clauses(space.surmise()))?;
            }
            ExportAction::States(src) => {
                let space = learned_space(&src.dataset, &src.log, &config)?;
                print_json(&export_states(&space.knowledge_states(config.search)))?;
            }
            ExportAction::Implications(src) => {
                let space = learned_space(&src.dataset, &src.log, &config)?;
                print_json(&implications(space.surmise()))?;
            }
            ExportAction::Lattice(src) => {
                let space = learned_space(&src.dataset, &src.log, &config)?;
                let lattice = Lattice::new(space.knowledge_states(config.search));
                print_json(&LatticeExport::from(&lattice))?;
            }
            ExportAction::Dot(src) => {
                let space = learned_space(&src.dataset, &src.log, &config)?;
                let lattice = Lattice::new(space.knowledge_states(config.search));
                print!("{}", lattice.to_dot());
            }
        },
    }

    Ok(())
}

/// Replay a log over a dataset's items and run the second stage.
fn learned_space(dataset: &Path, log: &Path, config: &SessionConfig) -> Result<LearningSpace> {
    let dataset = Dataset::load(dataset)?;
    let saved = AnswerLog::load(log)?;
    let mut session = Session::resume(dataset.ids(), config.clone(), &saved);
    session.finish();
    Ok(session.into_space())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
