use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use configuration::{init_logging, load_config, CliOverrides, Config};
use core_types::{millis_to_date, Metric, ReturnMode, Scale};
use engine::{Dashboard, JsonFileSource, RenderBundle, SlotOutcome};
use events::DataRegion;
use state::{FilterStore, RangePreset};
use std::path::PathBuf;
use std::sync::Arc;

/// The entry point of the commodity price dashboard.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // A missing .env file is fine; the configuration has defaults for everything.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            std::process::exit(2);
        }
    };

    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {e}");
            std::process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Render(args) => handle_render(args, &config).await,
        Commands::Summary(args) => handle_summary(args, &config).await,
        Commands::Link(args) => handle_link(args, &config),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed.");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = load_config(cli.config.as_deref()).context("could not load configuration")?;
    config.apply_overrides(&cli.overrides);
    config.validate()?;
    Ok(config)
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Commodity price dashboard: enriched series, event anchoring and regimes.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./dashboard.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: CliOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the data files and print the series, events and regimes of a view.
    Render(DataArgs),
    /// Print the market and impact summary of a view.
    Summary(DataArgs),
    /// Print the shareable query string for a set of filters.
    Link(LinkArgs),
}

#[derive(Args)]
struct DataArgs {
    /// JSON array of `{date, price}` records.
    #[arg(long)]
    prices: PathBuf,

    /// JSON array of `{date, title, category}` records.
    #[arg(long)]
    events: Option<PathBuf>,

    /// JSON array of change-point records.
    #[arg(long)]
    change_points: Option<PathBuf>,

    /// A shared link query, e.g. "start=2008-01-02&end=2009-06-30&metric=volatility".
    #[arg(long)]
    query: Option<String>,

    /// Number of most recent series rows to print.
    #[arg(long, default_value_t = 10)]
    rows: usize,
}

#[derive(Args)]
struct LinkArgs {
    /// Start of the window (YYYY-MM-DD).
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End of the window (YYYY-MM-DD).
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Select the last N years of data instead of an explicit window.
    #[arg(long, conflicts_with_all = ["start", "end", "all"])]
    years: Option<u32>,

    /// Select the whole dataset.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    all: bool,

    #[arg(long)]
    metric: Option<Metric>,

    #[arg(long)]
    mode: Option<ReturnMode>,

    #[arg(long)]
    scale: Option<Scale>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Builds a dashboard over the data files and loads every region once.
async fn open_dashboard(args: &DataArgs, config: &Config) -> anyhow::Result<RenderBundle> {
    let mut source = JsonFileSource::new(&args.prices);
    if let Some(path) = &args.events {
        source = source.with_events(path);
    }
    if let Some(path) = &args.change_points {
        source = source.with_change_points(path);
    }
    let source = Arc::new(source);

    let mut dashboard = match &args.query {
        Some(query) => Dashboard::from_query(config, source, query)?,
        None => Dashboard::new(config, source)?,
    };

    let report = dashboard.refresh().await;
    if report.prices != SlotOutcome::Applied {
        anyhow::bail!("price data could not be loaded: {:?}", dashboard.load_state(DataRegion::Prices));
    }
    for (region, outcome) in [
        (DataRegion::Events, report.events),
        (DataRegion::ChangePoints, report.change_points),
    ] {
        if outcome == SlotOutcome::Failed {
            println!("warning: {} unavailable: {:?}", region.as_str(), dashboard.load_state(region));
        }
    }

    Ok(dashboard.render())
}

async fn handle_render(args: DataArgs, config: &Config) -> anyhow::Result<()> {
    let bundle = open_dashboard(&args, config).await?;
    let filters = &bundle.filters;
    println!(
        "Window {} to {} | metric {} | mode {} | scale {} | {} points",
        filters.start_date,
        filters.end_date,
        filters.metric,
        filters.return_mode,
        filters.scale,
        bundle.series.len()
    );

    let mut series = Table::new();
    series.load_preset(UTF8_FULL).set_header(vec!["Date", "Price", "Log Return", "Volatility"]);
    let skip = bundle.series.len().saturating_sub(args.rows);
    for point in &bundle.series[skip..] {
        series.add_row(vec![
            Cell::new(point.date),
            Cell::new(format!("{:.2}", point.price)),
            Cell::new(optional(point.log_return, |v| format!("{:.4}%", v * 100.0))),
            Cell::new(optional(point.rolling_volatility, |v| format!("{:.2}%", v * 100.0))),
        ]);
    }
    println!("{series}");

    if !bundle.event_markers.is_empty() {
        let mut events = Table::new();
        events.load_preset(UTF8_FULL).set_header(vec!["Event", "Date", "Plotted At", "Exact"]);
        for marker in &bundle.event_markers {
            events.add_row(vec![
                Cell::new(&marker.event.title),
                Cell::new(marker.event.date),
                Cell::new(date_cell(marker.timestamp)),
                Cell::new(if marker.exact { "yes" } else { "nearest" }),
            ]);
        }
        println!("{events}");
    }

    if !bundle.regimes.is_empty() {
        let mut regimes = Table::new();
        regimes.load_preset(UTF8_FULL).set_header(vec!["Start", "End", "Regime"]);
        for regime in &bundle.regimes {
            regimes.add_row(vec![
                Cell::new(date_cell(regime.start as i64)),
                Cell::new(date_cell(regime.end as i64)),
                Cell::new(regime.kind.label()),
            ]);
        }
        println!("{regimes}");
    }

    Ok(())
}

async fn handle_summary(args: DataArgs, config: &Config) -> anyhow::Result<()> {
    let bundle = open_dashboard(&args, config).await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    match &bundle.summary {
        Some(summary) => {
            table.add_row(vec![Cell::new("As of"), Cell::new(summary.date)]);
            table.add_row(vec![Cell::new("Price shift"), Cell::new(format!("{:+.2}", summary.price_shift))]);
            table.add_row(vec![
                Cell::new("Volatility change"),
                Cell::new(format!("{:+.2}%", summary.volatility_change * 100.0)),
            ]);
            table.add_row(vec![Cell::new("Regimes"), Cell::new(summary.regime_count)]);
            table.add_row(vec![Cell::new("Current regime"), Cell::new(&summary.latest_regime)]);
        }
        None => {
            table.add_row(vec![Cell::new("Market summary"), Cell::new("not enough data")]);
        }
    }
    if let Some(impact) = &bundle.impact_summary {
        table.add_row(vec![Cell::new("Latest change point"), Cell::new(format!("{} ({})", impact.event, impact.date))]);
        table.add_row(vec![Cell::new("Mean shift"), Cell::new(format!("{:+.4}", impact.mean_shift))]);
        table.add_row(vec![Cell::new("Volatility shift"), Cell::new(format!("{:+.4}", impact.volatility_change))]);
    }
    println!("{table}");

    if !bundle.event_impacts.is_empty() {
        let mut impacts = Table::new();
        impacts
            .load_preset(UTF8_FULL)
            .set_header(vec!["Event", "Date", "Horizon", "Price Change", "Volatility Shift"]);
        for impact in &bundle.event_impacts {
            impacts.add_row(vec![
                Cell::new(&impact.title),
                Cell::new(impact.date),
                Cell::new(format!("{}d", impact.horizon_days)),
                Cell::new(format!("{:+.2}%", impact.price_change_pct)),
                Cell::new(optional(impact.volatility_shift, |v| format!("{:+.2}%", v * 100.0))),
            ]);
        }
        println!("{impacts}");
    }

    Ok(())
}

fn handle_link(args: LinkArgs, config: &Config) -> anyhow::Result<()> {
    let store = FilterStore::new(config.filters.clone());
    let defaults = store.snapshot();

    store.batch(|b| {
        if args.all {
            b.apply_preset(RangePreset::All);
        } else if let Some(years) = args.years {
            b.apply_preset(RangePreset::Years(years));
        } else if args.start.is_some() || args.end.is_some() {
            b.set_date_range(
                args.start.unwrap_or(defaults.start_date),
                args.end.unwrap_or(defaults.end_date),
            );
        }
        if let Some(metric) = args.metric {
            b.set_metric(metric);
        }
        if let Some(mode) = args.mode {
            b.set_return_mode(mode);
        }
        if let Some(scale) = args.scale {
            b.set_scale(scale);
        }
    });

    println!("?{}", store.view().encode()?);
    Ok(())
}

fn optional(value: Option<f64>, format: impl Fn(f64) -> String) -> String {
    value.map(format).unwrap_or_else(|| "-".to_string())
}

fn date_cell(millis: i64) -> String {
    millis_to_date(millis).map_or_else(|| millis.to_string(), |date| date.to_string())
}
