use clap::Parser;
use clap::Subcommand;
use gritbot::abstraction::BucketConfig;
use gritbot::abstraction::Bucketer;
use gritbot::encoder::History;
use gritbot::gameplay::TableState;
use gritbot::mccfr::Trainer;
use gritbot::mccfr::TrainerConfig;
use gritbot::resolve::BlueprintSource;
use gritbot::resolve::LeafEvaluator;
use gritbot::resolve::ResolveConfig;
use gritbot::resolve::ResolveRequest;
use gritbot::resolve::Resolver;
use gritbot::save::Policy;
use gritbot::Error;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gritbot", about = "MCCFR blueprint training and real-time resolving")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// fit the card abstraction and write the bucket file
    Abstract {
        #[arg(long, default_value_t = 20_000)]
        samples: usize,
        #[arg(long, default_value_t = 256)]
        equity_samples: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// cluster counts per street: preflop,flop,turn,river
        #[arg(long, value_delimiter = ',', default_values_t = [24, 80, 80, 64])]
        clusters: Vec<usize>,
        #[arg(long, default_value_t = 2)]
        players: usize,
        #[arg(long, default_value = "buckets.bin")]
        out: PathBuf,
    },
    /// train a blueprint from scratch
    Train {
        #[command(flatten)]
        run: RunArgs,
    },
    /// resume the latest complete checkpoint in the logdir
    Resume {
        #[command(flatten)]
        run: RunArgs,
    },
    /// re-solve one observed decision against a trained policy
    Resolve {
        #[arg(long)]
        buckets: PathBuf,
        #[arg(long)]
        policy: PathBuf,
        /// TableState as JSON
        #[arg(long)]
        table: PathBuf,
        #[arg(long, default_value_t = 80)]
        budget_ms: u64,
        #[arg(long, default_value_t = 50)]
        min_iterations: usize,
        /// serialized abstract betting line, e.g. PREFLOP:C-B50-C
        #[arg(long)]
        history: Option<String>,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    #[arg(long)]
    buckets: PathBuf,
    #[arg(long, default_value_t = 1_000_000)]
    iterations: usize,
    #[arg(long, default_value_t = 256)]
    batch_size: usize,
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long, default_value_t = 100_000)]
    checkpoint_interval: usize,
    #[arg(long, default_value_t = 600)]
    snapshot_secs: u64,
    #[arg(long, default_value = "logdir")]
    logdir: PathBuf,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// use the memory-lean store backend
    #[arg(long)]
    compact: bool,
}

impl RunArgs {
    fn config(&self, players: usize) -> TrainerConfig {
        let mut config = TrainerConfig {
            iterations: self.iterations,
            batch_size: self.batch_size,
            workers: self.workers.unwrap_or_else(num_cpus::get),
            checkpoint_interval: self.checkpoint_interval,
            snapshot_interval_secs: self.snapshot_secs,
            logdir: self.logdir.clone(),
            seed: self.seed,
            compact: self.compact,
            ..TrainerConfig::default()
        };
        config.solver.players = players;
        config
    }
}

fn main() {
    gritbot::init();
    if let Err(e) = run(Cli::parse()) {
        log::error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Abstract {
            samples,
            equity_samples,
            seed,
            clusters,
            players,
            out,
        } => {
            let clusters = <[usize; 4]>::try_from(clusters)
                .map_err(|_| Error::MalformedTable("need 4 cluster counts".to_string()))?;
            let bucketer = Bucketer::fit(BucketConfig {
                clusters,
                players,
                seed,
                samples,
                equity_samples,
            });
            bucketer.save(&out)
        }
        Command::Train { run } => {
            let bucketer = Arc::new(Bucketer::load(&run.buckets)?);
            let config = run.config(bucketer.config().players);
            Trainer::new(bucketer, config).train()
        }
        Command::Resume { run } => {
            let bucketer = Arc::new(Bucketer::load(&run.buckets)?);
            let config = run.config(bucketer.config().players);
            Trainer::resume(bucketer, config)?.train()
        }
        Command::Resolve {
            buckets,
            policy,
            table,
            budget_ms,
            min_iterations,
            history,
        } => {
            let bucketer = Arc::new(Bucketer::load(&buckets)?);
            let policy = Policy::load_any(&policy)?;
            if policy.meta.abstraction_hash != bucketer.hash() {
                return Err(Error::AbstractionMismatch {
                    current: format!("{} [{}]", bucketer.hash(), bucketer.describe()),
                    stored: format!(
                        "{} [{}]",
                        policy.meta.abstraction_hash, policy.meta.abstraction_params,
                    ),
                    detail: "policy was trained under a different abstraction".to_string(),
                });
            }
            let table: TableState = serde_json::from_slice(&std::fs::read(&table)?)?;
            let mut resolver = Resolver::new(
                BlueprintSource::Policy(policy),
                bucketer,
                LeafEvaluator::Blueprint,
                ResolveConfig {
                    time_budget_ms: budget_ms,
                    min_iterations,
                    ..ResolveConfig::default()
                },
            );
            let mut request = ResolveRequest::new(table);
            if let Some(line) = history {
                request.history = History::parse(&line)?;
            }
            let resolution = resolver.resolve(&request)?;
            println!("{}", serde_json::to_string_pretty(&resolution)?);
            Ok(())
        }
    }
}
