//! Domain Sweep CLI Application
//!
//! A command-line interface that expands base names across a TLD table,
//! checks the candidates against a domain status WebSocket service and keeps
//! a resumable CSV ledger. This CLI is a thin layer over domain-sweep-lib.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgAction, Parser};
use domain_sweep_lib::config::InputsConfig;
use domain_sweep_lib::{
    load_bases, load_category_table, load_env_config, load_price_table, load_tlds,
    parse_duration_string, CategoryTable, ConfigManager, EnvConfig, Enrichment, FailurePolicy,
    FileConfig, SweepConfig, SweepRunner, TimeoutPolicy, WsConnector,
};
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// TLD table used when neither the CLI, the environment nor a config file names one.
const DEFAULT_TLDS_PATH: &str = "domain_extensions.csv";

/// Exit status when the run finished but some bases are left for a later run.
const EXIT_INCOMPLETE: i32 = 2;

/// CLI arguments for domain-sweep
#[derive(Parser, Debug)]
#[command(name = "domain-sweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sweep base names across TLDs against a domain status WebSocket")]
#[command(
    long_about = "Expand base names across a TLD table, query a domain status WebSocket in batches and append results to a resumable CSV ledger.\n\nRe-running with the same inputs only queries bases the ledger does not cover yet."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Text file with one base name per line
    #[arg(long = "bases", value_name = "FILE", help_heading = "Inputs")]
    pub bases: PathBuf,

    /// CSV file with a 'tld' column [default: domain_extensions.csv]
    #[arg(long = "tlds", value_name = "FILE", help_heading = "Inputs")]
    pub tlds: Option<PathBuf>,

    /// Treat each base as a complete domain instead of expanding it
    #[arg(long = "no-tlds", help_heading = "Inputs")]
    pub no_tlds: bool,

    /// Price table with columns tld, regular, renewal
    #[arg(long = "prices", value_name = "FILE", help_heading = "Inputs")]
    pub prices: Option<PathBuf>,

    /// Category table with columns category, tld
    #[arg(long = "categories", value_name = "FILE", help_heading = "Inputs")]
    pub categories: Option<PathBuf>,

    /// Ledger CSV (appended to, never truncated) [default: ws_domain_status.csv]
    #[arg(short = 'o', long = "out", value_name = "FILE", help_heading = "Output")]
    pub out: Option<PathBuf>,

    /// Also write the available domains to this CSV
    #[arg(long = "available-out", value_name = "FILE", help_heading = "Output")]
    pub available_out: Option<PathBuf>,

    /// Also write available domains joined with prices to this CSV (needs --prices)
    #[arg(long = "priced-out", value_name = "FILE", help_heading = "Output")]
    pub priced_out: Option<PathBuf>,

    /// Domains per request [default: 50]
    #[arg(short = 'b', long = "batch-size", value_name = "N", help_heading = "Querying")]
    pub batch_size: Option<usize>,

    /// Seconds without a response before a batch is given up (e.g. 5, 2.5s, 500ms) [default: 5]
    #[arg(long = "idle-timeout", value_name = "SECS", help_heading = "Querying")]
    pub idle_timeout: Option<String>,

    /// On connection errors: fail-fast or skip [default: fail-fast]
    #[arg(long = "on-failure", value_name = "POLICY", help_heading = "Querying")]
    pub on_failure: Option<FailurePolicy>,

    /// Partial results of timed-out bases: discard or sidecar [default: discard]
    #[arg(long = "on-timeout", value_name = "POLICY", help_heading = "Querying")]
    pub on_timeout: Option<TimeoutPolicy>,

    /// WebSocket URL of the status service
    #[arg(long = "url", value_name = "URL", help_heading = "Querying")]
    pub url: Option<String>,

    /// Use a specific config file instead of discovered ones
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,

    /// Show the resume plan without connecting
    #[arg(long = "dry-run", help_heading = "Configuration")]
    pub dry_run: bool,

    /// Do not print per-base progress
    #[arg(long = "no-progress", help_heading = "Configuration")]
    pub no_progress: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, help_heading = "Configuration")]
    pub verbose: u8,

    /// Debug log output
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,
}

/// Input file locations after applying config file, environment and CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InputPaths {
    bases: PathBuf,
    tlds: PathBuf,
    prices: Option<PathBuf>,
    categories: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_logging(&args);

    match run_sweep(args).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.batch_size == Some(0) {
        return Err("Batch size must be at least 1".to_string());
    }

    if let Some(timeout) = &args.idle_timeout {
        if parse_duration_string(timeout).is_none() {
            return Err(format!(
                "Invalid idle timeout '{}'. Use a positive value like 5, 2.5s or 500ms",
                timeout
            ));
        }
    }

    if let Some(url) = &args.url {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(format!("Service URL '{}' must start with ws:// or wss://", url));
        }
    }

    Ok(())
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level comes from -v/--debug.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(args.verbose, args.debug)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn default_log_filter(verbose: u8, debug: bool) -> String {
    let level = if debug || verbose >= 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };
    format!("warn,domain_sweep={level},domain_sweep_lib={level}")
}

/// Run the sweep and return the process exit code.
async fn run_sweep(args: Args) -> Result<i32, Box<dyn std::error::Error>> {
    let (config, inputs) = build_config(&args)?;
    debug!(?config, ?inputs, "resolved configuration");

    if config.output.priced.is_some() && inputs.prices.is_none() {
        return Err("--priced-out requires --prices".into());
    }

    let bases = load_bases(&inputs.bases)?;
    let tlds = if config.no_tlds {
        Vec::new()
    } else {
        let tlds = load_tlds(&inputs.tlds)?;
        if tlds.is_empty() {
            return Err(format!(
                "No TLDs found in '{}'. Add a 'tld' column with values or use --no-tlds",
                inputs.tlds.display()
            )
            .into());
        }
        tlds
    };
    info!(bases = bases.len(), tlds = tlds.len(), "inputs loaded");

    let connector = WsConnector::new(config.service.clone());
    let mut runner = SweepRunner::new(config.clone(), Box::new(connector));

    if args.dry_run {
        let plan = runner.plan(&bases, &tlds)?;
        ui::print_plan(&plan);
        return Ok(0);
    }

    if let Some(prices_path) = &inputs.prices {
        let prices = load_price_table(prices_path)?;
        let categories = match &inputs.categories {
            Some(path) => load_category_table(path)?,
            None => CategoryTable::new(),
        };
        runner = runner.with_enrichment(Enrichment { prices, categories });
    } else if inputs.categories.is_some() {
        warn!("category table ignored without a price table");
    }

    if !args.no_progress {
        runner = runner.with_progress(Box::new(ui::ConsoleProgress::new()));
    }

    let started = Instant::now();
    let summary = runner.run(&bases, &tlds).await?;
    ui::print_summary(&summary, started.elapsed());

    Ok(if summary.all_complete() { 0 } else { EXIT_INCOMPLETE })
}

/// Build the sweep configuration with proper precedence.
///
/// Precedence (highest first):
/// 1. CLI arguments
/// 2. Environment variables (DS_*)
/// 3. Explicit config file (--config or DS_CONFIG), otherwise discovered files
/// 4. Built-in defaults
fn build_config(
    args: &Args,
) -> Result<(SweepConfig, InputPaths), Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    let config_manager = ConfigManager::new(args.verbose > 0);

    let explicit_path = args.config.as_ref().or(env_config.config.as_ref());
    let file_config = match explicit_path {
        Some(path) => {
            info!(path = %path.display(), "using explicit config file");
            config_manager.load_file(path).map_err(|e| {
                format!("Failed to load config file '{}': {}", path.display(), e)
            })?
        }
        None => config_manager.discover_and_load().unwrap_or_else(|e| {
            warn!(error = %e, "config discovery failed, using defaults");
            FileConfig::default()
        }),
    };

    let config = file_config.apply_to(SweepConfig::default());
    let config = env_config.apply_to(config);
    let config = apply_cli_args_to_config(config, args)?;

    let inputs = resolve_inputs(file_config.inputs.as_ref(), &env_config, args);

    Ok((config, inputs))
}

/// Apply CLI arguments to config (highest precedence).
///
/// Options the user did not pass leave environment and file values alone.
fn apply_cli_args_to_config(
    mut config: SweepConfig,
    args: &Args,
) -> Result<SweepConfig, Box<dyn std::error::Error>> {
    if let Some(batch_size) = args.batch_size {
        config = config.with_batch_size(batch_size);
    }
    if let Some(timeout) = &args.idle_timeout {
        let timeout = parse_duration_string(timeout)
            .ok_or_else(|| format!("Invalid idle timeout '{}'", timeout))?;
        config = config.with_idle_timeout(timeout);
    }
    // the flag can only switch no-tlds mode on
    if args.no_tlds {
        config = config.with_no_tlds(true);
    }
    if let Some(policy) = args.on_failure {
        config = config.with_failure_policy(policy);
    }
    if let Some(policy) = args.on_timeout {
        config = config.with_timeout_policy(policy);
    }
    if let Some(url) = &args.url {
        config = config.with_service_url(url.clone());
    }
    if let Some(out) = &args.out {
        config = config.with_ledger(out.clone());
    }
    if let Some(path) = &args.available_out {
        config = config.with_available_out(path.clone());
    }
    if let Some(path) = &args.priced_out {
        config = config.with_priced_out(path.clone());
    }

    Ok(config)
}

fn resolve_inputs(file: Option<&InputsConfig>, env: &EnvConfig, args: &Args) -> InputPaths {
    let from_file = |pick: fn(&InputsConfig) -> Option<&PathBuf>| file.and_then(pick).cloned();

    InputPaths {
        bases: args.bases.clone(),
        tlds: args
            .tlds
            .clone()
            .or_else(|| env.tlds.clone())
            .or_else(|| from_file(|f| f.tlds.as_ref()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TLDS_PATH)),
        prices: args
            .prices
            .clone()
            .or_else(|| env.prices.clone())
            .or_else(|| from_file(|f| f.prices.as_ref())),
        categories: args
            .categories
            .clone()
            .or_else(|| env.categories.clone())
            .or_else(|| from_file(|f| f.categories.as_ref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_sweep_lib::DEFAULT_LEDGER_PATH;
    use std::time::Duration;

    fn create_test_args() -> Args {
        Args {
            bases: PathBuf::from("bases.txt"),
            tlds: None,
            no_tlds: false,
            prices: None,
            categories: None,
            out: None,
            available_out: None,
            priced_out: None,
            batch_size: None,
            idle_timeout: None,
            on_failure: None,
            on_timeout: None,
            url: None,
            config: None,
            dry_run: false,
            no_progress: false,
            verbose: 0,
            debug: false,
        }
    }

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "domain-sweep",
            "--bases",
            "names.txt",
            "--tlds",
            "tlds.csv",
            "--batch-size",
            "25",
            "--idle-timeout",
            "2.5",
            "--on-failure",
            "skip",
            "--on-timeout",
            "sidecar",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.bases, PathBuf::from("names.txt"));
        assert_eq!(args.batch_size, Some(25));
        assert_eq!(args.on_failure, Some(FailurePolicy::SkipAndContinue));
        assert_eq!(args.on_timeout, Some(TimeoutPolicy::Sidecar));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_bases_is_required() {
        assert!(Args::try_parse_from(["domain-sweep"]).is_err());
    }

    #[test]
    fn test_unknown_policy_is_rejected_by_parser() {
        let result = Args::try_parse_from([
            "domain-sweep",
            "--bases",
            "b.txt",
            "--on-failure",
            "retry",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_args_defaults_ok() {
        assert!(validate_args(&create_test_args()).is_ok());
    }

    #[test]
    fn test_validate_args_zero_batch_size() {
        let mut args = create_test_args();
        args.batch_size = Some(0);

        let result = validate_args(&args);
        assert!(result.unwrap_err().contains("Batch size"));
    }

    #[test]
    fn test_validate_args_bad_timeout() {
        let mut args = create_test_args();
        args.idle_timeout = Some("soon".to_string());
        assert!(validate_args(&args).is_err());

        args.idle_timeout = Some("0".to_string());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_bad_url() {
        let mut args = create_test_args();
        args.url = Some("https://example.com/ws".to_string());
        assert!(validate_args(&args).unwrap_err().contains("ws://"));
    }

    #[test]
    fn test_cli_args_override_config() {
        let mut args = create_test_args();
        args.batch_size = Some(10);
        args.idle_timeout = Some("750ms".to_string());
        args.out = Some(PathBuf::from("run.csv"));
        args.priced_out = Some(PathBuf::from("priced.csv"));

        let config = SweepConfig::default()
            .with_batch_size(40)
            .with_failure_policy(FailurePolicy::SkipAndContinue);
        let config = apply_cli_args_to_config(config, &args).unwrap();

        assert_eq!(config.batch_size, 10);
        assert_eq!(config.idle_timeout, Duration::from_millis(750));
        assert_eq!(config.output.ledger, PathBuf::from("run.csv"));
        assert_eq!(config.output.priced, Some(PathBuf::from("priced.csv")));
        // not passed on the command line, so kept
        assert_eq!(config.failure_policy, FailurePolicy::SkipAndContinue);
    }

    #[test]
    fn test_no_tlds_flag_only_enables() {
        let args = create_test_args();
        let config = SweepConfig::default().with_no_tlds(true);

        let result = apply_cli_args_to_config(config, &args).unwrap();
        assert!(result.no_tlds, "config no_tlds=true should survive when --no-tlds is absent");
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = apply_cli_args_to_config(SweepConfig::default(), &create_test_args()).unwrap();
        assert_eq!(config.output.ledger, PathBuf::from(DEFAULT_LEDGER_PATH));
        assert_eq!(config.batch_size, 50);
    }

    #[test]
    fn test_resolve_inputs_precedence() {
        let file = InputsConfig {
            tlds: Some(PathBuf::from("file-tlds.csv")),
            prices: Some(PathBuf::from("file-prices.csv")),
            categories: Some(PathBuf::from("file-categories.csv")),
        };
        let env = EnvConfig {
            prices: Some(PathBuf::from("env-prices.csv")),
            ..Default::default()
        };
        let mut args = create_test_args();
        args.categories = Some(PathBuf::from("cli-categories.csv"));

        let inputs = resolve_inputs(Some(&file), &env, &args);

        assert_eq!(inputs.tlds, PathBuf::from("file-tlds.csv"));
        assert_eq!(inputs.prices, Some(PathBuf::from("env-prices.csv")));
        assert_eq!(inputs.categories, Some(PathBuf::from("cli-categories.csv")));
    }

    #[test]
    fn test_resolve_inputs_default_tld_table() {
        let inputs = resolve_inputs(None, &EnvConfig::default(), &create_test_args());
        assert_eq!(inputs.tlds, PathBuf::from(DEFAULT_TLDS_PATH));
        assert_eq!(inputs.prices, None);
    }

    #[test]
    fn test_default_log_filter() {
        assert!(default_log_filter(0, false).contains("domain_sweep_lib=warn"));
        assert!(default_log_filter(1, false).contains("domain_sweep_lib=info"));
        assert!(default_log_filter(2, false).contains("domain_sweep_lib=debug"));
        assert!(default_log_filter(0, true).contains("domain_sweep=debug"));
    }
}
