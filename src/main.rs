mod bundle;
mod fitness;
mod life;
mod period;
mod population;
mod report;
mod world;

use crate::fitness::{composition, fitness, WeightSetting, Weights};
use crate::life::{Gender, Strategy, StylisedLife};
use crate::population::{run_population, run_worker};
use crate::report::Reporter;
use crate::world::World;
use anyhow::{bail, Context, Result};
use bpaf::Bpaf;
use log::*;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Simulates a population of lives following one savings and drawdown
/// strategy, and scores the strategy with a weighted fitness function
#[derive(Bpaf)]
#[bpaf(options, version)]
struct Options {
    /// Number of lives to simulate
    #[bpaf(short('n'), long("number"), argument("N"), fallback(1000))]
    number: usize,
    /// Gender of everyone in the population (female or male)
    #[bpaf(long("gender"), argument("GENDER"), fallback(Gender::Female))]
    gender: Gender,
    /// Number of parallel workers [default: one per CPU].  With 1, the
    /// population is simulated on the main thread
    #[bpaf(short('j'), long("jobs"), argument("N"), optional)]
    jobs: Option<usize>,
    /// Seed for the random number generator
    #[bpaf(long("seed"), argument("SEED"), fallback(0))]
    seed: u64,
    /// Only output the strategy and fitness function tables
    #[bpaf(long("basic-run"))]
    basic_run: bool,
    /// Align the columns of each table instead of printing CSV
    #[bpaf(long("pretty"))]
    pretty: bool,
    /// Weight of a fitness function component, eg. FractionPersonsRuined=-1000
    #[bpaf(long("weight"), argument("NAME=WEIGHT"), many)]
    weight: Vec<WeightSetting>,
    /// A JSON object of fitness function component weights.  Weights given
    /// with --weight take precedence
    #[bpaf(long("weights"), argument("FILE"), optional)]
    weights_file: Option<PathBuf>,
    #[bpaf(external(life::strategy))]
    strategy: Strategy,
    #[bpaf(external(world::world))]
    world: World,
}

fn main() {
    env_logger::init();
    let result = run(options().run());
    match result {
        Ok(()) => (),
        Err(e) => {
            // Ignore EPIPE
            if is_broken_pipe(&e) {
                return;
            }
            eprintln!("Error: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn is_broken_pipe(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        let io = cause.downcast_ref::<std::io::Error>().or_else(|| {
            match cause.downcast_ref::<csv::Error>().map(|e| e.kind()) {
                Some(csv::ErrorKind::Io(e)) => Some(e),
                _ => None,
            }
        });
        io.map_or(false, |e| e.kind() == std::io::ErrorKind::BrokenPipe)
    })
}

fn weights(opts: &Options) -> Result<Weights> {
    let mut weights = match &opts.weights_file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Couldn't open {}", path.display()))?;
            Weights::from_json(BufReader::new(file))
                .with_context(|| format!("Reading weights from {}", path.display()))?
        }
        None => Weights::default(),
    };
    for WeightSetting(component, weight) in &opts.weight {
        weights.set(*component, *weight);
    }
    Ok(weights)
}

fn run(opts: Options) -> Result<()> {
    let weights = weights(&opts)?;
    let model = StylisedLife::new(opts.strategy, opts.gender, opts.world)?;
    let jobs = opts.jobs.unwrap_or_else(rayon::current_num_threads);

    let accumulators = match jobs {
        0 => bail!("Need at least one job"),
        1 => {
            info!("Simulating {} lives on the main thread", opts.number);
            run_worker(&model, &opts.world, opts.seed, 0, opts.number)?
        }
        _ => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .context("Couldn't start the worker pool")?;
            pool.install(|| run_population(&model, &opts.world, opts.seed, opts.number, jobs))?
        }
    };

    let rows = composition(&accumulators, &weights);
    let fitness = fitness(&rows);
    debug!("Fitness: {}", fitness);

    let stdout = std::io::stdout();
    let mut report = Reporter::new(stdout.lock(), opts.pretty);
    if !opts.basic_run {
        report.summary(opts.gender, opts.number, &opts.world, &accumulators, fitness)?;
        report.gap()?;
    }
    report.strategy(&opts.strategy)?;
    report.gap()?;
    report.composition(&rows)?;
    if !opts.basic_run {
        report.gap()?;
        report.periods(&accumulators)?;
        report.gap()?;
        report.ages(&opts.world, &accumulators)?;
    }
    Ok(())
}
