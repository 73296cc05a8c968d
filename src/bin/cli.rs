//! trajscope CLI - ingest camera logs and run analyses
//!
//! Usage:
//!   trajscope ingest <log> --camera <name> --store <json>
//!   trajscope analyze --store <json> --date <YYYY-MM-DD> --start <h> --end <h> <analysis>
//!
//! The store is a JSON file of trajectory documents. Analyses print their
//! result as JSON on stdout; logging goes to stderr.

use clap::{Parser, Subcommand, ValueEnum};
use chrono::NaiveDate;
use log::{error, info};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use trajscope::analysis::{
    in_monitored_area, one_category, pass_through, with_limits, with_start_finish,
    with_stop_in_rectangle, with_stopped, Polyline, Rectangle, StopConfig,
};
use trajscope::decoder::decode_reader;
use trajscope::{
    AnalysisOptions, AnalysisResult, MemoryStore, PlotWindow, Result, TimestampFormat,
    TrajectoryEngine, TrajectoryError, TrajectoryQuery,
};

#[derive(Parser)]
#[command(name = "trajscope")]
#[command(about = "Trajectory reconstruction and analysis for camera logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a raw log and append its trajectories to the store
    Ingest {
        /// Raw log: `identifier category timestamp x y` per line
        log: PathBuf,

        /// Camera (background) the log was captured by
        #[arg(short, long)]
        camera: String,

        /// JSON document store (created if missing)
        #[arg(short, long)]
        store: PathBuf,

        /// Timestamp column format
        #[arg(long, value_enum, default_value = "auto")]
        format: FormatArg,
    },

    /// Reconstruct trajectories for a time window and analyse them
    Analyze {
        /// JSON document store
        #[arg(short, long)]
        store: PathBuf,

        /// Only trajectories from this camera
        #[arg(short, long)]
        camera: Option<String>,

        /// Calendar date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Start of the window as a fractional hour
        #[arg(long, default_value = "0")]
        start: f64,

        /// End of the window as a fractional hour (24 = end of day)
        #[arg(long, default_value = "24")]
        end: f64,

        /// Only trajectories of this category
        #[arg(long)]
        category: Option<i64>,

        /// Clip highlighted geometry to `xlim1,xlim2,ylim1,ylim2`
        #[arg(long)]
        plot: Option<String>,

        #[command(subcommand)]
        analysis: Analysis,
    },
}

#[derive(Subcommand)]
enum Analysis {
    /// Every trajectory in the window
    Overview,

    /// Trajectories of one category
    Category {
        /// Category to keep
        value: i64,
    },

    /// Crossings of a reference line
    Limits {
        /// Reference line as WKT, e.g. "LINESTRING (0 0, 100 0)"
        #[arg(long)]
        line: String,
    },

    /// Timing between a departure and an arrival line
    StartFinish {
        /// Departure line as WKT
        #[arg(long)]
        departure: String,

        /// Arrival line as WKT
        #[arg(long)]
        arrival: String,
    },

    /// Stop detection
    Stops {
        /// Maximum mean speed inside a stop
        #[arg(long, default_value = "1.0")]
        stop_threshold: f64,

        /// Minimum stop duration in seconds
        #[arg(long, default_value = "5.0")]
        min_duration: f64,

        /// Maximum distance from the stop centroid
        #[arg(long, default_value = "5.0")]
        noise_tolerance: f64,

        /// Only stops centred in `min_x,max_x,min_y,max_y`
        #[arg(long)]
        rect: Option<String>,
    },

    /// Dwell inside a monitored rectangle
    Area {
        /// Zone as `min_x,max_x,min_y,max_y`
        #[arg(long)]
        rect: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Auto,
    Epoch,
    Datetime,
}

impl From<FormatArg> for TimestampFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Auto => TimestampFormat::Auto,
            FormatArg::Epoch => TimestampFormat::EpochSeconds,
            FormatArg::Datetime => TimestampFormat::DateTime,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let outcome = match cli.command {
        Commands::Ingest {
            log,
            camera,
            store,
            format,
        } => run_ingest(&log, &camera, &store, format.into()),
        Commands::Analyze {
            store,
            camera,
            date,
            start,
            end,
            category,
            plot,
            analysis,
        } => {
            let mut query = TrajectoryQuery::new(date, start, end);
            query.background = camera;
            query.category = category;
            run_analyze(&store, &query, plot.as_deref(), analysis)
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_ingest(log: &Path, camera: &str, store_path: &Path, format: TimestampFormat) -> Result<()> {
    let records = decode_reader(BufReader::new(File::open(log)?), format)?;
    info!("Decoded {} records from {}", records.len(), log.display());

    let engine = TrajectoryEngine::new(MemoryStore::load(store_path)?);
    let report = engine.ingest(records, camera)?;
    engine.store().save(store_path)?;

    println!(
        "Stored {} trajectories ({} points, {} warnings) in {}",
        report.documents,
        report.points,
        report.warnings.len(),
        store_path.display()
    );
    Ok(())
}

fn run_analyze(
    store_path: &Path,
    query: &TrajectoryQuery,
    plot: Option<&str>,
    analysis: Analysis,
) -> Result<()> {
    let engine = TrajectoryEngine::new(MemoryStore::load(store_path)?);
    let reconstruction = engine.query(query)?;
    if !reconstruction.warnings.is_empty() {
        info!("Skipped or repaired {} stored documents", reconstruction.warnings.len());
    }
    let collection = reconstruction.require_non_empty()?.collection;
    info!("Reconstructed {} trajectories", collection.len());

    let options = AnalysisOptions {
        category: None,
        plot_window: plot.map(parse_plot_window).transpose()?,
    };

    let result: AnalysisResult = match analysis {
        Analysis::Overview => pass_through(&collection, &options),
        Analysis::Category { value } => one_category(&collection, value, &options),
        Analysis::Limits { line } => {
            with_limits(&collection, &Polyline::from_wkt("reference line", &line)?, &options)
        }
        Analysis::StartFinish { departure, arrival } => with_start_finish(
            &collection,
            &Polyline::from_wkt("departure line", &departure)?,
            &Polyline::from_wkt("arrival line", &arrival)?,
            &options,
        ),
        Analysis::Stops {
            stop_threshold,
            min_duration,
            noise_tolerance,
            rect,
        } => {
            let config = StopConfig {
                stop_threshold,
                min_duration,
                noise_tolerance,
            };
            match rect {
                Some(rect) => {
                    with_stop_in_rectangle(&collection, &config, &parse_rectangle(&rect)?, &options)?
                }
                None => with_stopped(&collection, &config, &options)?,
            }
        }
        Analysis::Area { rect } => in_monitored_area(&collection, &parse_rectangle(&rect)?, &options),
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Four comma-separated numbers.
fn parse_four(parameter: &str, text: &str) -> Result<[f64; 4]> {
    let values = text
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| TrajectoryError::validation(parameter, e.to_string()))?;
    <[f64; 4]>::try_from(values).map_err(|v| {
        TrajectoryError::validation(parameter, format!("expected 4 numbers, got {}", v.len()))
    })
}

fn parse_rectangle(text: &str) -> Result<Rectangle> {
    let [min_x, max_x, min_y, max_y] = parse_four("rect", text)?;
    Rectangle::new(min_x, max_x, min_y, max_y)
}

fn parse_plot_window(text: &str) -> Result<PlotWindow> {
    let [xlim1, xlim2, ylim1, ylim2] = parse_four("plot", text)?;
    Ok(PlotWindow {
        xlim1,
        xlim2,
        ylim1,
        ylim2,
    })
}
