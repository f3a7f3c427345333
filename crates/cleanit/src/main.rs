//! CLI entry point for the cleaning pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use cleanit::{
    CategoricalStrategy, CleanError, DeduplicatorConfig, EncoderConfig, EncodingMethod,
    ImputerConfig, KeepPolicy, NumericStrategy, Pipeline, PipelineConfig, ScalerConfig,
    ScalingMethod, report_profile,
};
use dotenv::dotenv;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// CLI-compatible keep policy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliKeep {
    /// Keep the first row of each duplicate group
    First,
    /// Keep the last row of each duplicate group
    Last,
}

impl From<CliKeep> for KeepPolicy {
    fn from(cli: CliKeep) -> Self {
        match cli {
            CliKeep::First => KeepPolicy::First,
            CliKeep::Last => KeepPolicy::Last,
        }
    }
}

/// CLI-compatible numeric imputation strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliNumericStrategy {
    /// Use the median of non-null values
    Median,
    /// Use the mean of non-null values
    Mean,
    /// Use a constant fill value (--numeric-constant)
    Constant,
}

impl From<CliNumericStrategy> for NumericStrategy {
    fn from(cli: CliNumericStrategy) -> Self {
        match cli {
            CliNumericStrategy::Median => NumericStrategy::Median,
            CliNumericStrategy::Mean => NumericStrategy::Mean,
            CliNumericStrategy::Constant => NumericStrategy::Constant,
        }
    }
}

/// CLI-compatible categorical imputation strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCategoricalStrategy {
    /// Use the most frequent value (mode)
    Mode,
    /// Use a constant fill value (--categorical-constant)
    Constant,
}

impl From<CliCategoricalStrategy> for CategoricalStrategy {
    fn from(cli: CliCategoricalStrategy) -> Self {
        match cli {
            CliCategoricalStrategy::Mode => CategoricalStrategy::Mode,
            CliCategoricalStrategy::Constant => CategoricalStrategy::Constant,
        }
    }
}

/// CLI-compatible encoding method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEncoding {
    /// One 0/1 indicator column per category
    OneHot,
    /// One integer code per category
    Ordinal,
}

impl From<CliEncoding> for EncodingMethod {
    fn from(cli: CliEncoding) -> Self {
        match cli {
            CliEncoding::OneHot => EncodingMethod::OneHot,
            CliEncoding::Ordinal => EncodingMethod::Ordinal,
        }
    }
}

/// CLI-compatible scaling method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliScaling {
    /// Zero mean, unit variance
    Standard,
    /// Map the fitted range onto [0, 1]
    MinMax,
    /// Median and interquartile range
    Robust,
}

impl From<CliScaling> for ScalingMethod {
    fn from(cli: CliScaling) -> Self {
        match cli {
            CliScaling::Standard => ScalingMethod::Standard,
            CliScaling::MinMax => ScalingMethod::MinMax,
            CliScaling::Robust => ScalingMethod::Robust,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Fit/transform cleaning pipeline for tabular data",
    long_about = "Deduplicate, impute, encode and scale a CSV file.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  RUST_LOG     Filter directive, used when --log-level is not given\n  \
                  LOG_LEVEL    Default log level (trace, debug, info, warn, error)\n\n\
                  EXAMPLES:\n  \
                  # Clean with the default recipe\n  \
                  cleanit -i train.csv -o train_clean.csv\n\n  \
                  # Fit once, save the fitted state\n  \
                  cleanit -i train.csv -o train_clean.csv --save-state pipeline.json\n\n  \
                  # Replay the fitted state on new data\n  \
                  cleanit -i test.csv -o test_clean.csv --load-state pipeline.json\n\n  \
                  # Profile the cleaned data as JSON\n  \
                  cleanit -i train.csv --profile --json"
)]
struct Args {
    /// Path to the CSV file to clean
    #[arg(short, long)]
    input: String,

    /// Path of the cleaned CSV to write
    #[arg(short, long)]
    output: Option<String>,

    /// JSON pipeline recipe
    ///
    /// Replaces the step flags below.
    #[arg(long, conflicts_with_all = ["subset", "keep", "numeric_strategy", "categorical_strategy", "encoding", "scaling"])]
    recipe: Option<String>,

    /// Comma-separated columns forming the duplicate key (default: all)
    #[arg(long, value_delimiter = ',')]
    subset: Option<Vec<String>>,

    /// Which row of a duplicate group to keep
    #[arg(long, value_enum)]
    keep: Option<CliKeep>,

    /// Strategy for imputing missing numeric values
    #[arg(long, value_enum)]
    numeric_strategy: Option<CliNumericStrategy>,

    /// Fill value for the constant numeric strategy
    #[arg(long, default_value = "0.0")]
    numeric_constant: f64,

    /// Strategy for imputing missing categorical values
    #[arg(long, value_enum)]
    categorical_strategy: Option<CliCategoricalStrategy>,

    /// Fill value for the constant categorical strategy
    #[arg(long, default_value = "missing")]
    categorical_constant: String,

    /// How to encode categorical columns
    #[arg(long, value_enum)]
    encoding: Option<CliEncoding>,

    /// How to scale numeric columns
    #[arg(long, value_enum)]
    scaling: Option<CliScaling>,

    /// Write the fitted pipeline state to this file
    #[arg(long, conflicts_with = "load_state")]
    save_state: Option<String>,

    /// Transform with fitted state read from this file instead of fitting
    #[arg(long)]
    load_state: Option<String>,

    /// Print a profile of the cleaned data
    #[arg(long)]
    profile: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logging; only the final JSON document is written.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    ///
    /// Takes precedence over $RUST_LOG and $LOG_LEVEL. Defaults to "info".
    #[arg(short, long)]
    log_level: Option<String>,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Pick the filter directive for the subscriber.
///
/// Precedence: `--quiet`, then `--log-level`, then `RUST_LOG`, then
/// `LOG_LEVEL`, then `info`.
fn log_directive(
    flag: Option<&str>,
    quiet: bool,
    rust_log: Option<String>,
    log_level: Option<String>,
) -> String {
    if quiet {
        return "warn".to_string();
    }
    flag.map(str::to_string)
        .or(rust_log)
        .or(log_level)
        .unwrap_or_else(|| "info".to_string())
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(directive: &str, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_target(false)
        .init();
}

fn main() {
    // Load environment variables from .env file before reading RUST_LOG and LOG_LEVEL
    dotenv().ok();

    let args = Args::parse();
    let directive = log_directive(
        args.log_level.as_deref(),
        args.quiet,
        std::env::var("RUST_LOG").ok(),
        std::env::var("LOG_LEVEL").ok(),
    );
    init_logging(&directive, args.json);

    if let Err(e) = run(&args) {
        if args.json {
            let body = match e.downcast_ref::<CleanError>() {
                Some(clean) => serde_json::json!({ "error": clean }),
                None => serde_json::json!({
                    "error": { "code": "CLI_ERROR", "message": e.to_string() }
                }),
            };
            println!("{}", body);
        } else {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let data = load_csv_with_fallbacks(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let (pipeline, mut cleaned) = match &args.load_state {
        Some(state) => {
            let pipeline = Pipeline::from_snapshot(state)?;
            let cleaned = pipeline.transform(&data)?;
            (pipeline, cleaned)
        }
        None => {
            let mut pipeline = Pipeline::from_config(build_config(args)?)?;
            let cleaned = pipeline.fit_transform(&data)?;
            (pipeline, cleaned)
        }
    };

    if let Some(path) = &args.save_state {
        pipeline.save(path)?;
    }

    if let Some(path) = &args.output {
        write_csv(&mut cleaned, Path::new(path))?;
    }

    let profile = if args.profile {
        Some(report_profile(&cleaned)?)
    } else {
        None
    };

    if args.json {
        let steps: Vec<&str> = pipeline
            .fitted_steps()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        let summary = serde_json::json!({
            "input": args.input,
            "output": args.output,
            "rows_in": data.height(),
            "rows_out": cleaned.height(),
            "columns_out": cleaned.width(),
            "steps": steps,
            "state_saved": args.save_state,
            "profile": profile,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "Cleaned {} rows x {} columns -> {} rows x {} columns",
        data.height(),
        data.width(),
        cleaned.height(),
        cleaned.width()
    );
    if let Some(path) = &args.output {
        println!("  Output: {}", path);
    }
    if let Some(path) = &args.save_state {
        println!("  State:  {}", path);
    }
    if let Some(profile) = profile {
        println!("\n{}", profile);
    }
    Ok(())
}

/// Assemble a recipe from `--recipe` or from the step flags.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    if let Some(path) = &args.recipe {
        info!("Using recipe: {}", path);
        return Ok(PipelineConfig::from_file(path)?);
    }

    let config = PipelineConfig::builder()
        .deduplicate(DeduplicatorConfig {
            subset: args.subset.clone(),
            keep: args.keep.map(Into::into).unwrap_or_default(),
        })
        .impute(ImputerConfig {
            numeric: args.numeric_strategy.map(Into::into).unwrap_or_default(),
            numeric_constant: args.numeric_constant,
            categorical: args.categorical_strategy.map(Into::into).unwrap_or_default(),
            categorical_constant: args.categorical_constant.clone(),
        })
        .encode(EncoderConfig {
            method: args.encoding.map(Into::into).unwrap_or_default(),
            ..Default::default()
        })
        .scale(ScalerConfig {
            method: args.scaling.map(Into::into).unwrap_or_default(),
        })
        .build()?;
    debug!("Recipe: {:?}", config);
    Ok(config)
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)?;
    info!("Cleaned dataset saved: {}", path.display());
    Ok(())
}

/// Load CSV with multiple fallback strategies.
fn load_csv_with_fallbacks(path: &str) -> Result<DataFrame> {
    // Strategy 1: standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    // Strategy 2: full-file schema inference
    match CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Loading with full inference failed: {}", e),
    }

    // Strategy 3: drop blank lines and retry from memory
    let content = std::fs::read_to_string(path)?;
    let cleaned = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .into_reader_with_file_handle(std::io::Cursor::new(cleaned))
        .finish()
        .map_err(|e| anyhow!("Could not parse {}: {}", path, e))
}
