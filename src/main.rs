use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    sync::atomic::Ordering,
    time::Instant,
};

use anyhow::{Context, ensure};
use clap::{CommandFactory, FromArgMatches, Parser};
use log::{info, warn};
use macro_floorplanner::{anneal::Annealer, config::AnnealConfig, parse, report};
use owo_colors::OwoColorize;

/// Fixed-outline floorplanner over hard rectangular macros.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Weight of the area term against wirelength, in [0, 1].
    alpha: f64,
    /// Input block file (outline, macros, terminals).
    block_file: PathBuf,
    /// Input net file.
    net_file: PathBuf,
    /// Output report path.
    output: PathBuf,
    /// Fixed RNG seed. Falls back to FLOORPLAN_SEED, then to entropy.
    #[arg(long)]
    seed: Option<u64>,
    /// TOML file overriding the annealer defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write a per-round trace artifact in the working directory.
    #[arg(long)]
    trace: bool,
}

/// Started bare (no arguments at all), the binary prompts for one
/// argument line on stdin instead of bailing with a usage error.
fn cli_from_stdin() -> anyhow::Result<Cli> {
    println!("No arguments given; enter them as one line, e.g.:");
    println!("  0.5 input.block input.net report.out [--seed N] [--trace]");
    std::io::stdout().flush().context("could not write to stdout")?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line).context("could not read stdin")?;
    let words = shlex::split(line.trim()).context("invalid quoting in the argument line")?;

    let matches = Cli::command()
        .no_binary_name(true)
        .try_get_matches_from(words)
        .context("could not parse the argument line")?;
    Cli::from_arg_matches(&matches).context("could not parse the argument line")
}

fn main() -> anyhow::Result<()> {
    // Both annealer deadlines count from here, before any parsing.
    let start = Instant::now();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    info!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let args =
        if std::env::args_os().len() > 1 { Cli::parse() } else { cli_from_stdin()? };
    ensure!(
        (0.0..=1.0).contains(&args.alpha),
        "alpha must lie in [0, 1], got {}",
        args.alpha
    );

    let cfg = match &args.config {
        Some(path) => AnnealConfig::load(path)?,
        None => AnnealConfig::default(),
    };

    let seed = args
        .seed
        .or_else(|| std::env::var("FLOORPLAN_SEED").ok().and_then(|s| s.parse().ok()))
        .unwrap_or_else(rand::random);
    info!("RNG seed: {seed}");

    let mut plan = parse::parse_floorplan(args.alpha, &args.block_file, &args.net_file)
        .context("failed to parse the input files")?;
    info!(
        target: "parse",
        "{} blocks, {} terminals, {} nets; outline {}",
        plan.blocks().len(),
        plan.terminals().len(),
        plan.nets().len(),
        plan.outline()
    );

    let mut annealer = Annealer::new(&mut plan, cfg, seed, start);
    if args.trace {
        let run_timestamp = chrono::Utc::now().format("%y%m%d_%H%M%S");
        let path = format!("{run_timestamp}_anneal_trace.log");
        info!("Writing anneal trace to {path}");
        annealer = annealer.with_trace(File::create(&path)?);
    }

    let interrupted = annealer.interrupt_handle();
    if let Err(err) = ctrlc::set_handler({
        let mut is_repeat = false;
        move || {
            if is_repeat {
                warn!("Aborting immediately");
                std::process::exit(-1);
            }
            is_repeat = true;
            warn!("Stopping after the current move...");
            interrupted.store(true, Ordering::Relaxed);
        }
    }) {
        warn!("Failed to set interrupt handler! {err}");
    }

    let solution = annealer.run()?;

    let out = File::create(&args.output)
        .with_context(|| format!("could not create {}", args.output.display()))?;
    let mut out = BufWriter::new(out);
    report::write_report(&mut out, &solution, &plan)
        .with_context(|| format!("could not write {}", args.output.display()))?;
    out.flush()?;

    let verdict = if plan.fits(solution.dims) {
        "fits the outline".green().to_string()
    } else {
        "exceeds the outline".red().to_string()
    };
    println!(
        "cost {:.1} | wirelength {} | envelope {} vs outline {} | {}",
        solution.cost,
        solution.hpwl,
        solution.dims,
        plan.outline(),
        verdict
    );

    Ok(())
}
