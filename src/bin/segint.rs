#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

use segint::thread_pool::*;
use segint::*;
use serde::Serialize;
use std::{process, sync::Arc};
use structopt::StructOpt;

arg_enum! {
    #[derive(Debug, Clone, Copy)]
    enum PoolKind {
        Shared,
        Naive,
        Rayon,
    }
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = env!("CARGO_PKG_NAME"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS")
)]
struct Opt {
    #[structopt(
        short = "a",
        long = "left",
        default_value = "-25",
        allow_hyphen_values = true
    )]
    left: f64,
    #[structopt(
        short = "b",
        long = "right",
        default_value = "5",
        allow_hyphen_values = true
    )]
    right: f64,
    #[structopt(short = "n", long = "segments", default_value = "4")]
    segments: usize,
    #[structopt(short = "s", long = "steps", default_value = "1000")]
    steps: usize,
    /// Worker threads; defaults to the number of CPUs
    #[structopt(short = "t", long = "threads")]
    threads: Option<u32>,
    #[structopt(
        name = "POOL",
        short = "p",
        long = "pool",
        default_value = "shared",
        possible_values = &PoolKind::variants(),
        case_insensitive = true
    )]
    pool: PoolKind,
    #[structopt(
        long = "remainder",
        default_value = "distribute",
        possible_values = &["distribute", "truncate", "strict"]
    )]
    remainder: RemainderPolicy,
    /// Print the run as JSON instead of text
    #[structopt(long = "json")]
    json: bool,
}

#[derive(Serialize)]
struct JsonOutput {
    run: RunReport,
    segments: Vec<SegmentReport>,
}

fn run_on<P: ThreadPool>(opt: &Opt, integrator: &Integrator) -> Result<RunReport> {
    let pool = match opt.threads {
        Some(threads) => P::new(threads)?,
        None => P::with_default_threads()?,
    };
    info!("  Threads  : {}", pool.thread_count());
    let report = integrator.run_with(&pool);
    pool.shutdown();
    report
}

fn run(opt: Opt) -> Result<()> {
    let config = IntegrationConfig::default()
        .interval(opt.left, opt.right)
        .segments(opt.segments)
        .total_steps(opt.steps)
        .remainder(opt.remainder);

    info!("Segment integration");
    info!("  Version  : {}", env!("CARGO_PKG_VERSION"));
    info!("  Interval : [{}, {}]", config.left, config.right);
    info!("  Segments : {}", config.segments);
    info!("  Steps    : {}", config.total_steps);
    info!("  Pool     : {:?}", opt.pool);

    let collector = Arc::new(CollectingSink::new());
    let sink: Arc<dyn ReportSink> = if opt.json {
        collector.clone()
    } else {
        Arc::new(WriterSink::stdout())
    };
    let integrator = Integrator::new(config, piecewise).with_sink(sink);

    let report = match opt.pool {
        PoolKind::Shared => run_on::<SharedQueueThreadPool>(&opt, &integrator)?,
        PoolKind::Naive => run_on::<NaiveThreadPool>(&opt, &integrator)?,
        PoolKind::Rayon => run_on::<RayonThreadPool>(&opt, &integrator)?,
    };

    if opt.json {
        let output = JsonOutput {
            run: report,
            segments: collector.segments(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let opt: Opt = Opt::from_args();
    if let Err(e) = run(opt) {
        error!("{}", e);
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
