//! Maple CLI binary.
//!
//! Terminal dashboard for the Toronto Stock Exchange: market overview,
//! screener, single-stock analysis, comparison and news.

mod config;
mod integration;

use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use config::Config;
use integration::cache_manager;
use integration::pipeline::{
    PipelineError, build_provider, export_to, fetch_prices, load_universe, spinner, today,
};
use integration::resolve::{Resolution, looks_like_ticker, resolve_query};
use maple::Universe;
use maple_data::symbols::TSX_COMPOSITE;
use maple_data::{CacheOperation, CachePolicy, MarketDataProvider, PriceRange, dedup_symbols};
use maple_metrics::Normalization;
use maple_output::compare::MAX_COMPARE_TICKERS;
use maple_output::market::DEFAULT_MOVERS;
use maple_output::screener::{
    DEFAULT_MAX_TICKERS, DEFAULT_SECTOR_COUNT, DEFAULT_VISIBLE_ROWS, MAX_TICKERS_RANGE,
};
use maple_output::{
    ComparisonReport, MarketOverview, NewsDigest, ScreenerEntry, ScreenerTable, SortColumn,
    StockReport,
};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Default number of headlines.
const DEFAULT_NEWS_LIMIT: usize = 40;
/// Default number of search results.
const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Default sampling step of the comparison table, about one month of sessions.
const DEFAULT_COMPARE_STEP: usize = 21;

#[derive(Parser)]
#[command(name = "maple")]
#[command(about = "Maple: TSX market dashboard", long_about = None)]
#[command(version)]
struct Cli {
    /// Disable caching (always fetch fresh data)
    #[arg(long, global = true)]
    no_cache: bool,

    /// Force refresh cached data
    #[arg(long, global = true)]
    refresh: bool,

    /// Cache directory (overrides MAPLE_CACHE_DIR)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Render tables as Markdown where supported
    #[arg(long, global = true)]
    markdown: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Indices, macro gauges, breadth and top movers
    Market {
        /// Number of gainers and losers to show
        #[arg(long, default_value_t = DEFAULT_MOVERS)]
        movers: usize,

        /// Write the overview to a .csv or .json file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Multi-horizon returns over S&P/TSX Composite constituents
    Screener {
        /// Sector to include (repeatable, case-insensitive)
        #[arg(long)]
        sector: Vec<String>,

        /// Keep names or symbols containing this text
        #[arg(long, default_value = "")]
        search: String,

        /// Maximum number of tickers to download
        #[arg(long, default_value_t = DEFAULT_MAX_TICKERS)]
        max_tickers: usize,

        /// Sort column (1Y, YTD, 6M, 3M, 1M, 1W, 1D, Ticker)
        #[arg(long, default_value_t = SortColumn::OneYear)]
        sort: SortColumn,

        /// Sort ascending instead of descending
        #[arg(long)]
        ascending: bool,

        /// Number of rows to display
        #[arg(long, default_value_t = DEFAULT_VISIBLE_ROWS)]
        rows: usize,

        /// List sectors with their constituent count
        #[arg(long)]
        list_sectors: bool,

        /// Write every row to a .csv or .json file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Profile, returns, ratios and statements for one stock
    Stock {
        /// Ticker or company name
        #[arg(required = true)]
        query: Vec<String>,

        /// Write the report to a .csv or .json file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Normalized performance of several tickers
    Compare {
        /// Tickers, space or comma separated
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Period to compare over
        #[arg(long, value_enum, default_value_t = ComparePeriod::Max)]
        period: ComparePeriod,

        /// Rescaling of the price paths
        #[arg(long, value_enum, default_value_t = CompareMode::Base100)]
        mode: CompareMode,

        /// Do not add the S&P/TSX Composite
        #[arg(long)]
        no_benchmark: bool,

        /// Print every n-th session
        #[arg(long, default_value_t = DEFAULT_COMPARE_STEP)]
        step: usize,

        /// Write the aligned series to a .csv or .json file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Latest Canadian market headlines
    News {
        /// Maximum number of headlines
        #[arg(long, default_value_t = DEFAULT_NEWS_LIMIT)]
        limit: usize,

        /// Write the headlines to a .csv or .json file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Search TSX listings by name or symbol
    Search {
        /// Free-text query
        #[arg(required = true)]
        query: Vec<String>,

        /// Maximum number of results
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// Inspect or clean the local cache
    Cache {
        /// Show entry counts and lifetimes
        #[arg(long)]
        stats: bool,

        /// Remove every entry
        #[arg(long)]
        clear: bool,

        /// Remove expired entries
        #[arg(long)]
        purge: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ComparePeriod {
    #[value(name = "ytd")]
    Ytd,
    #[value(name = "1y")]
    OneYear,
    #[value(name = "3y")]
    ThreeYears,
    #[value(name = "5y")]
    FiveYears,
    #[value(name = "10y")]
    TenYears,
    #[value(name = "max")]
    Max,
}

impl ComparePeriod {
    const fn range(self) -> PriceRange {
        match self {
            Self::Ytd => PriceRange::YearToDate,
            Self::OneYear => PriceRange::OneYear,
            Self::ThreeYears => PriceRange::ThreeYears,
            Self::FiveYears => PriceRange::FiveYears,
            Self::TenYears => PriceRange::TenYears,
            Self::Max => PriceRange::Max,
        }
    }

    /// First date kept; only year-to-date trims what the provider returns.
    fn start(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Ytd => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CompareMode {
    /// Every path starts at 100
    Base100,
    /// Cumulative return in percent
    Percent,
}

impl From<CompareMode> for Normalization {
    fn from(mode: CompareMode) -> Self {
        match mode {
            CompareMode::Base100 => Self::Base100,
            CompareMode::Percent => Self::CumulativePercent,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("maple=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("maple=info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    // Only fails if a subscriber is already installed
    let _ = tracing::subscriber::set_global_default(subscriber);
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::from_env()?.with_flags(cli.cache_dir, cli.no_cache, cli.refresh);
    debug!(?config, "configuration loaded");

    if let Commands::Cache {
        stats,
        clear,
        purge,
    } = cli.command
    {
        return manage_cache(&config, stats, clear, purge);
    }

    let provider = build_provider(&config)?;
    match cli.command {
        Commands::Market { movers, export } => {
            market_overview(&provider, movers, export).await?;
        }
        Commands::Screener {
            sector,
            search,
            max_tickers,
            sort,
            ascending,
            rows,
            list_sectors,
            export,
        } => {
            let options = ScreenerOptions {
                sectors: sector,
                search,
                max_tickers: check_max_tickers(max_tickers)?,
                sort,
                ascending,
                rows,
                markdown: cli.markdown,
            };
            if list_sectors {
                print_sectors(&provider).await?;
            } else {
                run_screener(&provider, options, export).await?;
            }
        }
        Commands::Stock { query, export } => {
            analyze_stock(&provider, &query.join(" "), cli.markdown, export).await?;
        }
        Commands::Compare {
            tickers,
            period,
            mode,
            no_benchmark,
            step,
            export,
        } => {
            let symbols = compare_symbols(&tickers, !no_benchmark);
            compare_tickers(&provider, &symbols, period, mode.into(), step, export).await?;
        }
        Commands::News { limit, export } => {
            show_news(&provider, limit, cli.markdown, export).await?;
        }
        Commands::Search { query, limit } => {
            search_listings(&provider, &query.join(" "), limit).await;
        }
        Commands::Cache { .. } => {}
    }

    Ok(())
}

fn print_banner(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", title);
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}

async fn market_overview<P: MarketDataProvider>(
    provider: &P,
    movers: usize,
    export: Option<PathBuf>,
) -> Result<(), PipelineError> {
    print_banner("TSX MARKET OVERVIEW");

    let mut prices =
        fetch_prices(provider, &MarketOverview::instrument_symbols(), PriceRange::OneYear).await;

    // Breadth and movers need the constituents; the cards do not
    let constituents: Vec<String> = match load_universe(provider).await {
        Ok(universe) => universe.symbols(),
        Err(e) => {
            warn!(error = %e, "breadth and movers unavailable");
            Vec::new()
        }
    };
    if !constituents.is_empty() {
        prices.extend(fetch_prices(provider, &constituents, PriceRange::FiveDays).await);
    }

    let overview = MarketOverview::build(&prices, &constituents, today(), movers);
    println!("\n{}", overview.to_ascii_table());

    if let Some(path) = export {
        export_to(&overview, &path)?;
    }
    Ok(())
}

/// Screener settings gathered from the command line.
#[derive(Debug, Clone)]
struct ScreenerOptions {
    sectors: Vec<String>,
    search: String,
    max_tickers: usize,
    sort: SortColumn,
    ascending: bool,
    rows: usize,
    markdown: bool,
}

fn check_max_tickers(max_tickers: usize) -> Result<usize, PipelineError> {
    let (min, max) = MAX_TICKERS_RANGE;
    if (min..=max).contains(&max_tickers) {
        Ok(max_tickers)
    } else {
        Err(PipelineError::Input(format!(
            "--max-tickers must be between {min} and {max}, got {max_tickers}"
        )))
    }
}

/// Map requested sector names onto the listed ones, ignoring case.
///
/// With no request the first [`DEFAULT_SECTOR_COUNT`] listed sectors are used.
fn select_sectors(available: &[String], requested: &[String]) -> Result<Vec<String>, PipelineError> {
    if requested.is_empty() {
        return Ok(available.iter().take(DEFAULT_SECTOR_COUNT).cloned().collect());
    }
    let mut selected: Vec<String> = Vec::with_capacity(requested.len());
    for wanted in requested {
        let matched = available
            .iter()
            .find(|s| s.eq_ignore_ascii_case(wanted.trim()))
            .ok_or_else(|| {
                PipelineError::Input(format!(
                    "unknown sector '{wanted}', available: {}",
                    available.join(", ")
                ))
            })?;
        if !selected.contains(matched) {
            selected.push(matched.clone());
        }
    }
    Ok(selected)
}

async fn print_sectors<P: MarketDataProvider>(provider: &P) -> Result<(), PipelineError> {
    let universe = load_universe(provider).await?;
    println!("\nSectors of the S&P/TSX Composite:");
    println!("{}", "-".repeat(44));
    for (sector, count) in universe.sector_counts() {
        println!("  {:<34} {:>5}", sector, count);
    }
    Ok(())
}

async fn run_screener<P: MarketDataProvider>(
    provider: &P,
    options: ScreenerOptions,
    export: Option<PathBuf>,
) -> Result<(), PipelineError> {
    print_banner("TSX SCREENER");

    let universe = load_universe(provider).await?;
    let sectors = select_sectors(&universe.sectors(), &options.sectors)?;
    println!("Sectors: {}", sectors.join(", "));

    let entries: Vec<ScreenerEntry> = universe
        .filter(&sectors, &options.search)
        .into_iter()
        .take(options.max_tickers)
        .map(|c| ScreenerEntry::new(c.symbol.clone(), c.name.clone(), c.sector.clone()))
        .collect();
    if entries.is_empty() {
        return Err(PipelineError::NoData(
            "no constituent matches the selected sectors and search".to_string(),
        ));
    }

    let symbols: Vec<String> = entries.iter().map(|e| e.symbol.clone()).collect();
    let prices = fetch_prices(provider, &symbols, PriceRange::TwoYears).await;
    if prices.is_empty() {
        return Err(PipelineError::NoData(
            "no prices could be downloaded".to_string(),
        ));
    }

    let mut table = ScreenerTable::build(&entries, &prices, today());
    table.sort_by(options.sort, options.ascending);
    println!(
        "Sorted by {} ({})\n",
        options.sort,
        if options.ascending { "ascending" } else { "descending" }
    );
    if options.markdown {
        println!("{}", table.to_markdown(options.rows));
    } else {
        println!("{}", table.to_ascii_table(options.rows));
    }

    if let Some(path) = export {
        export_to(&table, &path)?;
    }
    Ok(())
}

async fn analyze_stock<P: MarketDataProvider>(
    provider: &P,
    query: &str,
    markdown: bool,
    export: Option<PathBuf>,
) -> Result<(), PipelineError> {
    let hits = if looks_like_ticker(query) {
        Vec::new()
    } else {
        let pb = spinner(format!("Searching TSX listings for '{query}'..."));
        let hits = provider.search(query, DEFAULT_SEARCH_LIMIT).await;
        pb.finish_and_clear();
        hits
    };

    let resolution = resolve_query(query, &hits);
    let Some(symbol) = resolution.symbol().map(str::to_string) else {
        return Err(PipelineError::Input(format!(
            "no TSX listing matches '{query}'"
        )));
    };
    if let Resolution::Search { alternatives, .. } = &resolution {
        if !alternatives.is_empty() {
            println!("Using {symbol}. Other matches:");
            for hit in alternatives {
                println!("  {:<12} {}", hit.symbol, hit.name);
            }
        }
    }

    print_banner(&format!("STOCK ANALYSIS: {symbol}"));

    let mut symbols = vec![symbol.clone()];
    if symbol != TSX_COMPOSITE {
        symbols.push(TSX_COMPOSITE.to_string());
    }
    let prices = fetch_prices(provider, &symbols, PriceRange::TwoYears).await;
    let Some(series) = prices.get(&symbol) else {
        return Err(PipelineError::NoData(format!(
            "no price history for {symbol}"
        )));
    };
    let benchmark = prices.get(TSX_COMPOSITE).filter(|_| symbol != TSX_COMPOSITE);

    let pb = spinner("Loading profile and financial statements...");
    let (profile, statements) =
        tokio::join!(provider.get_profile(&symbol), provider.get_statements(&symbol));
    pb.finish_and_clear();

    let report = StockReport::build(&symbol, series, benchmark, profile, &statements, today());
    if markdown {
        println!("{}", report.to_markdown());
    } else {
        println!("{}", report.to_ascii_table());
    }

    if let Some(path) = export {
        export_to(&report, &path)?;
    }
    Ok(())
}

/// Normalized, de-duplicated comparison symbols, at most
/// [`MAX_COMPARE_TICKERS`] plus the benchmark.
fn compare_symbols(tickers: &[String], with_benchmark: bool) -> Vec<String> {
    let split: Vec<&str> = tickers
        .iter()
        .flat_map(|t| t.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    let mut symbols = dedup_symbols(&split);
    if symbols.len() > MAX_COMPARE_TICKERS {
        warn!(
            dropped = ?&symbols[MAX_COMPARE_TICKERS..],
            "only the first {MAX_COMPARE_TICKERS} tickers are compared"
        );
        symbols.truncate(MAX_COMPARE_TICKERS);
    }
    if with_benchmark && !symbols.iter().any(|s| s == TSX_COMPOSITE) {
        symbols.push(TSX_COMPOSITE.to_string());
    }
    symbols
}

async fn compare_tickers<P: MarketDataProvider>(
    provider: &P,
    symbols: &[String],
    period: ComparePeriod,
    normalization: Normalization,
    step: usize,
    export: Option<PathBuf>,
) -> Result<(), PipelineError> {
    if symbols.is_empty() {
        return Err(PipelineError::Input("no ticker to compare".to_string()));
    }
    print_banner("PERFORMANCE COMPARISON");

    let mut prices = fetch_prices(provider, symbols, period.range()).await;
    let series: Vec<_> = symbols
        .iter()
        .filter_map(|symbol| {
            let found = prices.remove(symbol);
            if found.is_none() {
                warn!(%symbol, "no prices, left out of the comparison");
            }
            found
        })
        .collect();

    let report = ComparisonReport::build(&series, period.start(today()), normalization);
    if report.is_empty() {
        return Err(PipelineError::NoData(
            "no overlapping history for the selected tickers".to_string(),
        ));
    }
    println!("{}", report.to_ascii_table(step));

    if let Some(path) = export {
        export_to(&report, &path)?;
    }
    Ok(())
}

async fn show_news<P: MarketDataProvider>(
    provider: &P,
    limit: usize,
    markdown: bool,
    export: Option<PathBuf>,
) -> Result<(), PipelineError> {
    let pb = spinner("Fetching headlines...");
    let items = provider.news(limit).await;
    pb.finish_and_clear();

    let digest = NewsDigest::new(items, Utc::now());
    if markdown {
        println!("{}", digest.to_markdown());
    } else {
        println!("{}", digest.to_ascii_table());
    }

    if let Some(path) = export {
        export_to(&digest, &path)?;
    }
    Ok(())
}

async fn search_listings<P: MarketDataProvider>(provider: &P, query: &str, limit: usize) {
    let hits = provider.search(query, limit).await;
    if hits.is_empty() {
        println!("No TSX listing matches '{query}'.");
        return;
    }
    println!("{:<14} {:<44} {}", "Symbol", "Name", "Type");
    println!("{}", "-".repeat(68));
    for hit in hits {
        println!("{:<14} {:<44} {}", hit.symbol, hit.name, hit.kind);
    }
}

fn format_ttl(ttl: Duration) -> String {
    let secs = ttl.as_secs();
    if secs >= 3600 && secs % 3600 == 0 {
        format!("{} h", secs / 3600)
    } else if secs >= 60 {
        format!("{} min", secs / 60)
    } else {
        format!("{secs} s")
    }
}

fn manage_cache(
    config: &Config,
    stats: bool,
    clear: bool,
    purge: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = config.cache_path();
    let cache = cache_manager::open_cache(&path)?;

    if clear {
        cache.clear_all()?;
        println!("Cleared cache at {}", path.display());
    } else if purge {
        let removed = cache.purge_expired()?;
        println!("Removed {removed} expired entries");
    }

    if stats || !(clear || purge) {
        let stats = cache.get_stats()?;
        let policy = CachePolicy::default();
        println!("\nCache: {}", path.display());
        println!(
            "  Entries: {} ({} live, {} expired)",
            stats.total_entries,
            stats.live_entries(),
            stats.expired_entries
        );
        println!("\n  {:<12} {:>8} {:>10}", "Operation", "Entries", "TTL");
        for operation in CacheOperation::ALL {
            let count = stats
                .by_operation
                .get(operation.as_str())
                .copied()
                .unwrap_or(0);
            println!(
                "  {:<12} {:>8} {:>10}",
                operation.as_str(),
                count,
                format_ttl(policy.ttl(operation))
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    fn sectors() -> Vec<String> {
        [
            "Communication Services",
            "Consumer Discretionary",
            "Consumer Staples",
            "Energy",
            "Financials",
            "Health Care",
            "Industrials",
            "Materials",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "maple", "screener", "--sector", "energy", "--sort", "ytd", "--no-cache",
        ])
        .unwrap();
        assert!(cli.no_cache);
        match cli.command {
            Commands::Screener { sector, sort, .. } => {
                assert_eq!(sector, vec!["energy"]);
                assert_eq!(sort, SortColumn::Ytd);
            }
            _ => panic!("expected screener"),
        }
    }

    #[test]
    fn test_select_sectors_defaults_to_first_six() {
        let selected = select_sectors(&sectors(), &[]).unwrap();
        assert_eq!(selected.len(), DEFAULT_SECTOR_COUNT);
        assert_eq!(selected[0], "Communication Services");
    }

    #[test]
    fn test_select_sectors_ignores_case() {
        let requested = vec!["energy".to_string(), "FINANCIALS".to_string(), "Energy".to_string()];
        assert_eq!(
            select_sectors(&sectors(), &requested).unwrap(),
            vec!["Energy", "Financials"]
        );
        assert!(select_sectors(&sectors(), &["Utilities".to_string()]).is_err());
    }

    #[rstest]
    #[case(19, false)]
    #[case(20, true)]
    #[case(120, true)]
    #[case(200, true)]
    #[case(201, false)]
    fn test_check_max_tickers(#[case] value: usize, #[case] ok: bool) {
        assert_eq!(check_max_tickers(value).is_ok(), ok);
    }

    #[test]
    fn test_compare_symbols() {
        let tickers = vec!["ry, td".to_string(), "RY.TO".to_string(), "enb".to_string()];
        assert_eq!(
            compare_symbols(&tickers, true),
            vec!["RY.TO", "TD.TO", "ENB.TO", TSX_COMPOSITE]
        );

        let many: Vec<String> = ["a", "b", "c", "d", "e", "f"].map(String::from).to_vec();
        let symbols = compare_symbols(&many, false);
        assert_eq!(symbols.len(), MAX_COMPARE_TICKERS);
        assert!(!symbols.iter().any(|s| s == TSX_COMPOSITE));
    }

    #[test]
    fn test_compare_period_start() {
        let today = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        assert_eq!(
            ComparePeriod::Ytd.start(today),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(ComparePeriod::Max.start(today), None);
        assert_eq!(ComparePeriod::FiveYears.range(), PriceRange::FiveYears);
    }

    #[rstest]
    #[case(Duration::from_secs(6 * 3600), "6 h")]
    #[case(Duration::from_secs(600), "10 min")]
    #[case(Duration::from_secs(30), "30 s")]
    fn test_format_ttl(#[case] ttl: Duration, #[case] expected: &str) {
        assert_eq!(format_ttl(ttl), expected);
    }
}
