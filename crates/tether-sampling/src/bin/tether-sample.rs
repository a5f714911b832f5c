//! Tether sampling CLI
//!
//! Runs the sampling routines against an in-process heap and prints the
//! result as JSON. Logging is enabled with `TETHER_LOG` (an `EnvFilter`
//! directive such as `debug` or `tether_sdk=trace`).

use std::rc::Rc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use tether_engine::{Heap, HeapConfig, HeapStats};
use tether_sampling::{
    acceptance_probability, bootstrap_variable, grow, grow_complex, rejection_sampling,
    RejectionParams, RuntimeDeviates,
};
use tether_sdk::{session, Doubles, FromHandle, GrowthStats, IntoHandle, Sexp};

#[derive(Parser)]
#[command(name = "tether-sample")]
#[command(about = "Sampling routines on growable runtime vectors", long_about = None)]
#[command(version)]
struct Cli {
    /// Random generator seed
    #[arg(long, global = true, default_value_t = tether_engine::defaults::DEFAULT_SEED)]
    seed: u64,

    /// Collect garbage before every allocation
    #[arg(long, global = true)]
    gc_torture: bool,

    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample from a truncated normal distribution
    Rejection {
        /// Number of accepted samples
        n_samples: usize,
        /// Mean of the normal distribution
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        mu: f64,
        /// Standard deviation of the normal distribution
        #[arg(long, default_value_t = 1.0)]
        sigma: f64,
        /// Lower truncation bound
        #[arg(long, default_value_t = -2.0, allow_negative_numbers = true)]
        lower: f64,
        /// Upper truncation bound
        #[arg(long, default_value_t = 2.0, allow_negative_numbers = true)]
        upper: f64,
    },

    /// Bootstrap resampling with variable sample sizes
    Bootstrap {
        /// Data values to resample
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        data: Vec<f64>,
        /// Minimum resample size
        #[arg(long, default_value_t = 5)]
        min_size: usize,
        /// Maximum resample size
        #[arg(long, default_value_t = 10)]
        max_size: usize,
        /// Number of resamples
        #[arg(long, default_value_t = 3)]
        n_bootstrap: usize,
    },

    /// Push 0..n one element at a time
    Grow {
        /// Number of elements
        n: usize,
        /// Build complex values instead of reals
        #[arg(long)]
        complex: bool,
    },
}

#[derive(Serialize)]
struct Report<T: Serialize> {
    command: &'static str,
    result: T,
    growth: GrowthReport,
    heap: HeapReport,
}

#[derive(Serialize)]
struct GrowthReport {
    reallocations: usize,
    reserves: usize,
    elements_copied: usize,
    materializations: usize,
}

impl From<GrowthStats> for GrowthReport {
    fn from(s: GrowthStats) -> Self {
        Self {
            reallocations: s.reallocations,
            reserves: s.reserves,
            elements_copied: s.elements_copied,
            materializations: s.materializations,
        }
    }
}

#[derive(Serialize)]
struct HeapReport {
    allocations: usize,
    collections: usize,
    live_objects: usize,
}

impl HeapReport {
    fn new(heap: &Heap) -> Self {
        let HeapStats { allocations, .. } = heap.stats();
        Self {
            allocations,
            collections: heap.gc_stats().collections,
            live_objects: heap.live_objects(),
        }
    }
}

#[derive(Serialize)]
struct RejectionResult {
    params: RejectionParams,
    acceptance: f64,
    samples: Vec<f64>,
}

fn init_tracing() {
    if let Ok(filter) = EnvFilter::try_from_env("TETHER_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }
}

fn print<T: Serialize>(report: &Report<T>, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    println!("{}", out);
    Ok(())
}

/// Hand a vector to the runtime and read it back, as a caller across the
/// boundary would see it
fn round_trip(mut v: Doubles) -> anyhow::Result<(Vec<f64>, GrowthStats)> {
    let h = v.materialize()?;
    let stats = v.stats();
    let values = Vec::<f64>::from_handle(h)?;
    Ok((values, stats))
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = HeapConfig::default().with_seed(cli.seed);
    config.gc_torture = cli.gc_torture;
    let heap = Rc::new(Heap::new(config));
    let _session = session::enter(heap.clone()).context("failed to start runtime session")?;

    match cli.command {
        Commands::Rejection {
            n_samples,
            mu,
            sigma,
            lower,
            upper,
        } => {
            let params = RejectionParams {
                mu,
                sigma,
                lower,
                upper,
            };
            let acceptance = acceptance_probability(&params)?;
            let samples = {
                let mut deviates = RuntimeDeviates::new()?;
                rejection_sampling(n_samples, params, &mut deviates)
                    .context("rejection sampling failed")?
            };
            let (samples, stats) = round_trip(samples)?;
            print(
                &Report {
                    command: "rejection",
                    result: RejectionResult {
                        params,
                        acceptance,
                        samples,
                    },
                    growth: stats.into(),
                    heap: HeapReport::new(&heap),
                },
                cli.pretty,
            )?;
        }

        Commands::Bootstrap {
            data,
            min_size,
            max_size,
            n_bootstrap,
        } => {
            let input = Sexp::new(data.into_handle()?)?;
            let view = Doubles::from_handle(input.handle())?;
            let mut samples = {
                let mut deviates = RuntimeDeviates::new()?;
                bootstrap_variable(&view, min_size, max_size, n_bootstrap, &mut deviates)
                    .context("bootstrap resampling failed")?
            };
            let stats = samples.stats();
            let list = samples.materialize()?;
            let result = Vec::<Sexp>::from_handle(list)?
                .into_iter()
                .map(|s| Vec::<f64>::from_handle(s.handle()))
                .collect::<tether_sdk::Result<Vec<_>>>()?;
            print(
                &Report {
                    command: "bootstrap",
                    result,
                    growth: stats.into(),
                    heap: HeapReport::new(&heap),
                },
                cli.pretty,
            )?;
        }

        Commands::Grow { n, complex } => {
            if complex {
                let mut v = grow_complex(n)?;
                v.materialize()?;
                let values: Vec<[f64; 2]> =
                    v.to_vec()?.into_iter().map(|c| [c.re, c.im]).collect();
                print(
                    &Report {
                        command: "grow",
                        result: values,
                        growth: v.stats().into(),
                        heap: HeapReport::new(&heap),
                    },
                    cli.pretty,
                )?;
            } else {
                let (values, stats) = round_trip(grow(n)?)?;
                print(
                    &Report {
                        command: "grow",
                        result: values,
                        growth: stats.into(),
                        heap: HeapReport::new(&heap),
                    },
                    cli.pretty,
                )?;
            }
        }
    }

    Ok(())
}
