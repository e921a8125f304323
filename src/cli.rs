//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_scrape_adapter::{ScrapePrefixes, TextScrapeAdapter};
use crate::adapters::yaml_event_adapter::YamlEventAdapter;
use crate::domain::aggregate::aggregate_series;
use crate::domain::error::InvestatsError;
use crate::domain::generator::{generate_events, Freq, GeneratorParams};
use crate::domain::scrape::txns_to_events;
use crate::domain::stats::{compute_stats, CheckpointRecord};
use crate::ports::config_port::ConfigPort;
use crate::ports::event_port::EventLogPort;
use crate::ports::series_port::SeriesPort;
use crate::ports::transaction_port::TransactionPort;

/// Path that stands for stdin or stdout.
pub const STDIO: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "investats", about = "Investment statistics calculator")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute checkpoint statistics from an event log
    Stats {
        /// Input event log, "-" for stdin
        #[arg(default_value = STDIO)]
        file_in: String,
        /// Output CSV, "-" for stdout
        #[arg(default_value = STDIO)]
        file_out: String,
        #[arg(long)]
        precision: Option<usize>,
    },
    /// Aggregate multiple statistics series into a single one
    Aggr(SeriesArgs),
    /// Compute statistics for several event logs and aggregate them
    Portfolio(SeriesArgs),
    /// Generate a sample event log
    Gen(GenArgs),
    /// Scrape an event log from raw transaction text
    Scrape(ScrapeArgs),
}

#[derive(Args, Debug)]
pub struct SeriesArgs {
    /// Pairs of asset name and input file: NAME FILE NAME FILE ...
    #[arg(required = true, num_args = 1..)]
    pub pairs: Vec<String>,
    /// Output CSV, "-" for stdout
    #[arg(short, long, default_value = STDIO)]
    pub output: String,
    #[arg(long)]
    pub precision: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct GenArgs {
    /// Output event log, "-" for stdout
    #[arg(short, long, default_value = STDIO)]
    pub output: String,
    /// Date of the first investment (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,
    /// Source amount invested at every step
    #[arg(long)]
    pub contribution: Option<f64>,
    /// Rate of the first investment
    #[arg(long)]
    pub rate: Option<f64>,
    #[arg(long)]
    pub apy: Option<f64>,
    /// daily, weekly, monthly or yearly
    #[arg(long)]
    pub freq: Option<String>,
    #[arg(long)]
    pub count: Option<usize>,
    #[arg(long)]
    pub cgt: Option<f64>,
}

#[derive(Args, Debug, Default)]
pub struct ScrapeArgs {
    /// Raw transaction text, "-" for stdin
    #[arg(default_value = STDIO)]
    pub file_in: String,
    /// Output event log, "-" for stdout
    #[arg(default_value = STDIO)]
    pub file_out: String,
    /// Asset whose transactions are kept
    #[arg(long)]
    pub asset: Option<String>,
    /// Capital-gains-tax rate set on the first checkpoint
    #[arg(long)]
    pub cgt: Option<f64>,
}

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over the
/// verbosity flag.
pub fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Command::Stats {
            file_in,
            file_out,
            precision,
        } => run_stats(&file_in, &file_out, precision, &config),
        Command::Aggr(args) => run_aggr(&args, &config),
        Command::Portfolio(args) => run_portfolio(&args, &config),
        Command::Gen(args) => run_gen(&args, &config),
        Command::Scrape(args) => run_scrape(&args, &config),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, InvestatsError> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            FileConfigAdapter::from_file(path).map_err(|e| InvestatsError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

fn open_input(path: &str) -> Result<Box<dyn Read>, InvestatsError> {
    if path == STDIO {
        Ok(Box::new(io::stdin()))
    } else {
        Ok(Box::new(fs::File::open(path)?))
    }
}

fn write_output(path: &str, content: &[u8]) -> Result<(), InvestatsError> {
    if path == STDIO {
        let mut stdout = io::stdout().lock();
        stdout.write_all(content)?;
        stdout.flush()?;
    } else {
        fs::write(path, content)?;
        tracing::info!(path, bytes = content.len(), "output written");
    }
    Ok(())
}

/// Decimal places for CSV values: the flag, then `[output] precision`.
pub fn output_precision(
    flag: Option<usize>,
    config: &dyn ConfigPort,
) -> Result<Option<usize>, InvestatsError> {
    if flag.is_some() {
        return Ok(flag);
    }
    config
        .get_string("output", "precision")
        .map(|v| {
            v.trim()
                .parse::<usize>()
                .map_err(|_| InvestatsError::ConfigInvalid {
                    section: "output".into(),
                    key: "precision".into(),
                    reason: format!("expected a non-negative integer, got {v:?}"),
                })
        })
        .transpose()
}

/// Splits `NAME FILE NAME FILE ...` into pairs. At least two pairs with
/// distinct names are required.
pub fn pair_items(items: &[String]) -> Result<Vec<(String, String)>, InvestatsError> {
    if items.len() % 2 != 0 {
        return Err(InvestatsError::UnpairedSeriesArgument {
            arg: items.last().cloned().unwrap_or_default(),
        });
    }

    let pairs: Vec<(String, String)> = items
        .chunks_exact(2)
        .map(|c| (c[0].clone(), c[1].clone()))
        .collect();

    if pairs.len() < 2 {
        return Err(InvestatsError::InsufficientSeriesCount { count: pairs.len() });
    }

    let mut seen = HashSet::new();
    for (name, _) in &pairs {
        if !seen.insert(name.as_str()) {
            return Err(InvestatsError::DuplicateSeriesName { name: name.clone() });
        }
    }

    Ok(pairs)
}

pub fn run_stats(
    file_in: &str,
    file_out: &str,
    precision: Option<usize>,
    config: &dyn ConfigPort,
) -> Result<(), InvestatsError> {
    let precision = output_precision(precision, config)?;

    let events = YamlEventAdapter::new().load_events(&mut open_input(file_in)?)?;
    tracing::info!(events = events.len(), "computing statistics");
    let records: Vec<CheckpointRecord> = compute_stats(&events).collect();
    tracing::info!(checkpoints = records.len(), "statistics computed");

    let mut buf = Vec::new();
    CsvAdapter::new(precision).write_records(&records, &mut buf)?;
    write_output(file_out, &buf)
}

fn aggregate_and_write(
    series: &[(String, Vec<CheckpointRecord>)],
    args: &SeriesArgs,
    config: &dyn ConfigPort,
) -> Result<(), InvestatsError> {
    let precision = output_precision(args.precision, config)?;
    let merged = aggregate_series(series)?;
    tracing::info!(
        series = series.len(),
        checkpoints = merged.len(),
        "series aggregated"
    );

    let mut buf = Vec::new();
    CsvAdapter::new(precision).write_aggregated(&merged, &mut buf)?;
    write_output(&args.output, &buf)
}

pub fn run_aggr(args: &SeriesArgs, config: &dyn ConfigPort) -> Result<(), InvestatsError> {
    let pairs = pair_items(&args.pairs)?;
    let reader = CsvAdapter::new(None);

    let mut series = Vec::with_capacity(pairs.len());
    for (name, path) in pairs {
        let records = reader.read_records(&mut open_input(&path)?)?;
        tracing::debug!(asset = %name, checkpoints = records.len(), "series loaded");
        series.push((name, records));
    }

    aggregate_and_write(&series, args, config)
}

pub fn run_portfolio(args: &SeriesArgs, config: &dyn ConfigPort) -> Result<(), InvestatsError> {
    let pairs = pair_items(&args.pairs)?;
    let loader = YamlEventAdapter::new();

    let series = pairs
        .into_par_iter()
        .map(|(name, path)| -> Result<_, InvestatsError> {
            let events = loader.load_events(&mut fs::File::open(&path)?)?;
            let records: Vec<CheckpointRecord> = compute_stats(&events).collect();
            tracing::debug!(asset = %name, checkpoints = records.len(), "statistics computed");
            Ok((name, records))
        })
        .collect::<Result<Vec<_>, _>>()?;

    aggregate_and_write(&series, args, config)
}

/// Resolves generator parameters: flags first, then the `[gen]` section.
pub fn build_generator_params(
    args: &GenArgs,
    config: &dyn ConfigPort,
) -> Result<GeneratorParams, InvestatsError> {
    let missing = |key: &str| InvestatsError::ConfigMissing {
        section: "gen".into(),
        key: key.into(),
    };
    let number = |flag: Option<f64>, key: &str| {
        flag.or_else(|| config.get_optional_double("gen", key))
            .ok_or_else(|| missing(key))
    };

    let start_str = args
        .start
        .clone()
        .or_else(|| config.get_string("gen", "start"))
        .ok_or_else(|| missing("start"))?;
    let start = NaiveDate::parse_from_str(start_str.trim(), "%Y-%m-%d").map_err(|_| {
        InvestatsError::ConfigInvalid {
            section: "gen".into(),
            key: "start".into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        }
    })?;

    let freq: Freq = args
        .freq
        .clone()
        .or_else(|| config.get_string("gen", "freq"))
        .unwrap_or_else(|| Freq::Monthly.to_string())
        .parse()?;

    let count = match args.count {
        Some(c) => c,
        None => {
            let c = config.get_int("gen", "count", -1);
            usize::try_from(c).map_err(|_| missing("count"))?
        }
    };

    Ok(GeneratorParams {
        start,
        contribution: number(args.contribution, "contribution")?,
        init_rate: number(args.rate, "rate")?,
        apy: number(args.apy, "apy")?,
        freq,
        count,
        cgt: args.cgt.or_else(|| config.get_optional_double("gen", "cgt")),
    })
}

pub fn run_gen(args: &GenArgs, config: &dyn ConfigPort) -> Result<(), InvestatsError> {
    let params = build_generator_params(args, config)?;
    let events = generate_events(&params)?;
    tracing::info!(events = events.len(), freq = %params.freq, "event log generated");

    let mut buf = Vec::new();
    YamlEventAdapter::new().save_events(&events, &mut buf)?;
    write_output(&args.output, &buf)
}

/// Line prefixes from the `[scrape]` section, defaulting field by field.
pub fn build_scrape_prefixes(config: &dyn ConfigPort) -> ScrapePrefixes {
    let d = ScrapePrefixes::default();
    let get = |key: &str, default: String| config.get_string("scrape", key).unwrap_or(default);
    ScrapePrefixes {
        reset: get("reset", d.reset),
        datetime: get("datetime", d.datetime),
        asset: get("asset_prefix", d.asset),
        amount_src: get("amount_src", d.amount_src),
        amount_dst: get("amount_dst", d.amount_dst),
        rate: get("rate", d.rate),
    }
}

pub fn run_scrape(args: &ScrapeArgs, config: &dyn ConfigPort) -> Result<(), InvestatsError> {
    let asset = args
        .asset
        .clone()
        .or_else(|| config.get_string("scrape", "asset"))
        .ok_or_else(|| InvestatsError::ConfigMissing {
            section: "scrape".into(),
            key: "asset".into(),
        })?;
    let cgt = args
        .cgt
        .unwrap_or_else(|| config.get_double("scrape", "cgt", 0.0));

    let adapter = TextScrapeAdapter::new(build_scrape_prefixes(config));
    let txns = adapter.load_transactions(&mut open_input(&args.file_in)?)?;
    let events = txns_to_events(&txns, &asset, cgt)?;
    if events.is_empty() {
        tracing::warn!(asset = %asset, "no transactions found for asset");
    }
    tracing::info!(transactions = txns.len(), events = events.len(), "transactions scraped");

    let mut buf = Vec::new();
    YamlEventAdapter::new().save_events(&events, &mut buf)?;
    write_output(&args.file_out, &buf)
}
