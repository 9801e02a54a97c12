mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;
use unitsim_game::RulesetProfile;

use common::split_csv;
use logic::{GameplayStrategy, aggregate_records, resolve_seed_inputs, run_batch};

#[derive(Debug, Parser)]
#[command(name = "unitsim-tester", version = "0.1.0")]
#[command(about = "Automated play-testing for Unitsim - runs strategies through complete games")]
struct Args {
    /// Ruleset profile to play (classic, sprint)
    #[arg(long, default_value = "classic")]
    profile: RulesetProfile,

    /// Strategies to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Seeds to run (comma-separated; ranges like 10..20 allowed)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of games per strategy and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Keep per-turn decisions in the JSON report
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let strategies = expand_strategies(&args.strategies)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    info!(
        "running {} strategies x {} seeds x {} iterations on {}",
        strategies.len(),
        seeds.len(),
        args.iterations,
        args.profile
    );

    let records = run_batch(
        args.profile,
        &strategies,
        &seeds,
        args.iterations,
        args.verbose,
    )?;
    let aggregates = aggregate_records(&records);

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(
            &mut output_target,
            args.profile,
            &aggregates,
            &records,
        )?,
        "markdown" => {
            logic::reports::generate_markdown_report(
                &mut output_target,
                args.profile,
                &aggregates,
            )?;
        }
        _ => {
            logic::reports::generate_console_report(
                &mut output_target,
                args.profile,
                &aggregates,
                start_time.elapsed(),
            )?;
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in GameplayStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:12} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    writeln!(output_target.writer(), "Available profiles:")?;
    for profile in RulesetProfile::ALL {
        writeln!(output_target.writer(), "  {}", profile.key())?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎮 Unitsim Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_strategies(raw: &str) -> Result<Vec<GameplayStrategy>> {
    let names = split_csv(raw);
    if names.is_empty() || names.iter().any(|name| name.eq_ignore_ascii_case("all")) {
        return Ok(GameplayStrategy::ALL.to_vec());
    }
    let mut strategies = Vec::with_capacity(names.len());
    for name in names {
        let strategy: GameplayStrategy = name.parse()?;
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    Ok(strategies)
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
