//! Swath inventory tool.
//!
//! Finds readers for a set of satellite files (given explicitly, or
//! discovered under a base directory) and reports the file types, selected
//! granules and datasets each reader can provide.

mod report;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use swath_reader::{FinderQuery, HandlerRegistry, ReaderFinder, RequestInfo};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use report::InventoryReport;

#[derive(Parser, Debug)]
#[command(name = "swath-inventory")]
#[command(about = "Report readers, granules and datasets for satellite files")]
struct Args {
    /// Directory of reader configuration files
    #[arg(long, env = "SWATH_CONFIG_DIR", default_value = "./etc/readers")]
    config_dir: PathBuf,

    /// Directory searched for files when none are given
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Reader name or configuration path
    #[arg(short, long)]
    reader: Option<String>,

    /// Sensor to find readers for (repeatable)
    #[arg(short, long = "sensor")]
    sensors: Vec<String>,

    /// Start of the time window (ISO-8601)
    #[arg(long, value_parser = parse_time)]
    start: Option<DateTime<Utc>>,

    /// End of the time window (ISO-8601)
    #[arg(long, value_parser = parse_time)]
    end: Option<DateTime<Utc>>,

    /// Filename field fixed while searching, as key=value (repeatable)
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Files to inspect
    files: Vec<String>,
}

fn parse_time(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Ok(t.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|t| t.and_utc())
        .ok_or_else(|| format!("invalid time '{}', expected ISO-8601", value))
}

fn parse_field(value: &str) -> std::result::Result<(String, String), String> {
    value
        .split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("invalid field '{}', expected key=value", value))
}

/// `RUST_LOG` when set, otherwise `--log-level`.
fn log_filter(env: Option<&str>, level: &str) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}

fn init_tracing(args: &Args) -> Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let builder = fmt()
        .with_env_filter(log_filter(env.as_deref(), &args.log_level))
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.json_logs {
        builder.json().try_init().map_err(|e| anyhow!(e))?;
    } else {
        builder.try_init().map_err(|e| anyhow!(e))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    if args.reader.is_none() && args.sensors.is_empty() && args.files.is_empty() {
        return Err(anyhow!("Nothing to look for: give files, --reader or --sensor"));
    }

    let mut request = RequestInfo::new();
    request.start_time = args.start;
    request.end_time = args.end;
    request.fields = args.fields.iter().cloned().collect();

    let mut query = FinderQuery::new();
    if let Some(reader) = &args.reader {
        query = query.reader(reader.as_str());
    }
    if !args.sensors.is_empty() {
        query = query.sensors(args.sensors.iter().cloned());
    }
    if !args.files.is_empty() {
        query = query.filenames(args.files.iter().cloned());
    }

    info!(config_dir = %args.config_dir.display(), query = ?query, "Starting swath inventory");

    let mut finder = ReaderFinder::new(&args.config_dir, HandlerRegistry::new()).request(request);
    if let Some(base_dir) = &args.base_dir {
        finder = finder.base_dir(base_dir);
    }

    let result = finder.find(&query);
    let report = InventoryReport::new(finder.outcomes(), result.as_deref().unwrap_or(&[]));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_text());
    }

    let readers = result.with_context(|| {
        format!("Failed to find readers in {}", args.config_dir.display())
    })?;
    info!(readers = readers.len(), "Inventory complete");
    Ok(())
}
