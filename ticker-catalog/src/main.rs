//! tickers - build, filter and export a catalog of US-listed common stocks.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use ticker_catalog::{
    DatasetAssembler, ExchangeSelection, ExportFormat, FilterCriteria, TickerCatalog,
    TickerExporter,
};
use ticker_common::config::Config;
use ticker_common::logging::init_from_config;

#[derive(Parser, Debug)]
#[command(name = "tickers")]
#[command(version)]
#[command(about = "Download, clean, filter and export US stock tickers.", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.tickers/config.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Skip downloading NYSE listings
    #[arg(long)]
    no_nyse: bool,

    /// Skip downloading NASDAQ listings
    #[arg(long)]
    no_nasdaq: bool,

    /// Skip downloading AMEX listings
    #[arg(long)]
    no_amex: bool,

    /// Keep only these exchanges (repeatable)
    #[arg(short, long = "exchange", value_name = "EXCHANGE")]
    exchanges: Vec<String>,

    /// Keep only these sectors, e.g. "Health Care" (repeatable)
    #[arg(short, long = "sector", value_name = "SECTOR")]
    sectors: Vec<String>,

    /// Minimum market cap in millions (inclusive)
    #[arg(long, value_name = "MILLIONS")]
    cap_min: Option<f64>,

    /// Maximum market cap in millions (inclusive)
    #[arg(long, value_name = "MILLIONS")]
    cap_max: Option<f64>,

    /// Market cap band as bucket ordinals 1-10 (see --show-scale)
    #[arg(
        long,
        num_args = 2,
        value_names = ["LO", "HI"],
        conflicts_with_all = ["cap_min", "cap_max"]
    )]
    cap_range: Option<Vec<u8>>,

    /// Keep only the N largest by market cap, after filtering
    #[arg(short = 'n', long, value_name = "N", allow_hyphen_values = true)]
    top: Option<i64>,

    /// Write the resulting tickers to the export directory
    #[arg(long)]
    export: bool,

    /// Export format: lines or csv (overrides config)
    #[arg(long, value_name = "FORMAT")]
    format: Option<ExportFormat>,

    /// Export file name (overrides config)
    #[arg(short, long, value_name = "NAME")]
    output: Option<String>,

    /// Print the market cap bucket scale
    #[arg(long)]
    show_scale: bool,
}

impl Cli {
    fn selection(&self, config: &Config) -> ExchangeSelection {
        let mut selection = ExchangeSelection::from(config.screener.exchanges);
        selection.nyse &= !self.no_nyse;
        selection.nasdaq &= !self.no_nasdaq;
        selection.amex &= !self.no_amex;
        selection
    }

    fn has_filters(&self) -> bool {
        !self.exchanges.is_empty()
            || !self.sectors.is_empty()
            || self.cap_min.is_some()
            || self.cap_max.is_some()
            || self.cap_range.is_some()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_and_validate(cli.config.as_deref())?;
    init_from_config(&config.observability);

    tracing::info!("tickers v{}", env!("CARGO_PKG_VERSION"));

    let assembler = DatasetAssembler::from_config(&config.screener);
    let (mut catalog, report) = TickerCatalog::load(&assembler, cli.selection(&config))
        .await
        .context("Failed to build the ticker catalog")?;

    for failure in &report.failures {
        eprintln!(
            "warning: {} listings unavailable: {}",
            failure.exchange.label(),
            failure.error
        );
    }

    let cleaning = catalog.cleaning_report();
    eprintln!(
        "{} listings downloaded, {} kept after cleaning",
        cleaning.input, cleaning.output
    );

    if cli.show_scale {
        println!("Market cap scale (millions, max {:.2}):", catalog.max_market_cap());
        for (ordinal, value) in catalog.bucket_scale().values().iter().enumerate() {
            println!("  {:>2}  {}", ordinal + 1, value);
        }
    }

    if cli.has_filters() {
        let (cap_min, cap_max) = match cli.cap_range.as_deref() {
            Some([lo, hi]) => {
                let (min, max) = catalog.bucket_scale().range(*lo, *hi)?;
                (Some(min), Some(max))
            }
            _ => (cli.cap_min, cli.cap_max),
        };

        let criteria = FilterCriteria {
            exchanges: cli.exchanges.clone().into(),
            sectors: cli.sectors.clone().into(),
            cap_min,
            cap_max,
        };
        catalog.apply_filters(&criteria)?;
    }

    if let Some(top) = cli.top {
        if top <= 0 {
            bail!("--top must be a positive number, got {}", top);
        }
        let n = usize::try_from(top).unwrap_or(usize::MAX);
        catalog.top_by_capitalization(n)?;
    }

    let tickers = catalog.current_tickers();
    for symbol in &tickers {
        println!("{}", symbol);
    }
    eprintln!("{} of {} tickers selected", tickers.len(), catalog.baseline_len());

    if cli.export {
        let mut exporter = TickerExporter::from_config(&config.export)?;
        if let Some(format) = cli.format {
            exporter = exporter.with_format(format);
        }
        if let Some(name) = cli.output {
            exporter = exporter.with_filename(name);
        }

        let path = exporter.export(&tickers)?;
        eprintln!("Exported {} tickers to {}", tickers.len(), path.display());
    }

    Ok(())
}
