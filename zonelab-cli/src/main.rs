//! ZoneLab CLI — run strategy comparisons and inspect the zone table.
//!
//! Commands:
//! - `run` — compare buy-and-hold, weekly DCA and the smart strategy on a price file
//! - `zones` — print the zone table in evaluation order
//! - `classify` — classify a single deviation

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use zonelab_runner::report::render_zone_table;
use zonelab_runner::{
    load_prices, load_synthetic, render_report, run_comparison, save_artifacts, BacktestConfig,
    LoadedData,
};

#[derive(Parser)]
#[command(
    name = "zonelab",
    about = "ZoneLab CLI — zone-based ETF allocation backtester"
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging (every engine decision).
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every enabled strategy on one price series.
    Run {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Price file (.csv, .json or a tab-separated .xls export). Overrides `data.path`.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Symbol label. Overrides `data.symbol`.
        #[arg(long)]
        symbol: Option<String>,

        /// Use a seeded synthetic series instead of a price file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Synthetic start date (YYYY-MM-DD).
        #[arg(long, default_value = "2019-12-20")]
        start: String,

        /// Synthetic end date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the report only; write no artifacts.
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,
    },
    /// Print the zone table in evaluation order.
    Zones {
        /// Config file whose `[[zones]]` override to show.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Classify one deviation percentage.
    Classify {
        /// Deviation from the moving average in percent (e.g. -6.5).
        #[arg(allow_negative_numbers = true)]
        deviation: f64,

        /// Config file whose `[[zones]]` override to use.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    match cli.command {
        Commands::Run {
            config,
            data,
            symbol,
            synthetic,
            start,
            end,
            output_dir,
            no_artifacts,
        } => run_cmd(RunArgs {
            config,
            data,
            symbol,
            synthetic,
            start,
            end,
            output_dir,
            no_artifacts,
        }),
        Commands::Zones { config } => zones_cmd(config.as_deref()),
        Commands::Classify { deviation, config } => classify_cmd(deviation, config.as_deref()),
    }
}

fn init_logging(verbose: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

struct RunArgs {
    config: Option<PathBuf>,
    data: Option<PathBuf>,
    symbol: Option<String>,
    synthetic: bool,
    start: String,
    end: Option<String>,
    output_dir: PathBuf,
    no_artifacts: bool,
}

fn run_cmd(args: RunArgs) -> Result<()> {
    if args.synthetic && args.data.is_some() {
        bail!("--synthetic and --data are mutually exclusive");
    }
    let mut config = load_config(args.config.as_deref())?;
    if let Some(path) = args.data {
        config.data.path = Some(path);
    }
    if let Some(symbol) = args.symbol {
        config.data.symbol = symbol;
    }
    config.validate().context("invalid configuration")?;

    let data = if args.synthetic {
        let start = parse_date(&args.start)?;
        let end = match args.end.as_deref() {
            Some(s) => parse_date(s)?,
            None => chrono::Local::now().date_naive(),
        };
        if end < start {
            bail!("--end {end} is before --start {start}");
        }
        load_synthetic(&config.data.symbol, start, end, config.data.ma_period)?
    } else {
        let Some(path) = config.data.path.clone() else {
            bail!("no price data: pass --data, set data.path in the config, or use --synthetic");
        };
        load_data(&path, &config)?
    };

    let comparison = run_comparison(&config, &data)?;
    println!("{}", render_report(&comparison));

    if !args.no_artifacts {
        let run_dir = save_artifacts(&comparison, &args.output_dir)?;
        info!(dir = %run_dir.display(), "artifacts written");
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn zones_cmd(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    print!("{}", render_zone_table(&config.zone_table()));
    Ok(())
}

fn classify_cmd(deviation: f64, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let zone = config.zone_table().classify(deviation);
    println!("{:+.2}% → {} (factor {:.2})", deviation, zone.kind, zone.factor);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<BacktestConfig> {
    match path {
        Some(path) => BacktestConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(BacktestConfig::default()),
    }
}

fn load_data(path: &Path, config: &BacktestConfig) -> Result<LoadedData> {
    load_prices(path, &config.data.symbol, config.data.ma_period)
        .with_context(|| format!("failed to load prices from {}", path.display()))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}
