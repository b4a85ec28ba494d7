use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use source_relocator::{
    relocate, scan, summarize, AppConfig, DiscoveryReport, ExclusionSet, RelocationPlan,
    RelocationReport,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    let mut command = build_cli();
    let matches = command.clone().get_matches();

    let Some(source) = matches.get_one::<PathBuf>("source") else {
        command.print_long_help()?;
        println!();
        return Ok(ExitCode::SUCCESS);
    };
    let destination = matches.get_one::<PathBuf>("destination").map(PathBuf::as_path);

    // Load .env before reading configuration from the environment
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let config = create_app_config(&matches);

    initialize_logging(&config.log_level)?;

    if !dotenv_loaded {
        info!("No .env file found, using system environment variables");
    }

    // Failures after logging is up are reported through the logger only
    if let Err(e) = run_application(&config, source, destination) {
        error!("{:#}", e);
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

fn build_cli() -> Command {
    Command::new("source-relocator")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Collect source files from a directory tree into a flat or mirrored copy")
        .arg(
            Arg::new("source")
                .value_name("SOURCE_DIR")
                .help("Directory tree to scan")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("destination")
                .value_name("DEST_DIR")
                .help("Mirror into this directory; without it files are flattened into <SOURCE_DIR>-files")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("extension")
                .long("extension")
                .value_name("EXT")
                .help("File name suffix to match (default .kt)"),
        )
        .arg(
            Arg::new("exclude")
                .long("exclude")
                .value_name("NAME")
                .help("Directory name to skip; repeat to build the set, replacing the defaults")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("flatten-suffix")
                .long("flatten-suffix")
                .value_name("SUFFIX")
                .help("Suffix of the flatten destination directory (default -files)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Set the log level (trace, debug, info, warn, error)")
                .default_value("info"),
        )
        .arg(
            Arg::new("scan-only")
                .long("scan-only")
                .help("Print statistics without copying")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print reports as JSON on stdout")
                .action(ArgAction::SetTrue),
        )
}

/// Environment first, then command line flags on top
fn create_app_config(matches: &ArgMatches) -> AppConfig {
    let mut config = AppConfig::from_env();

    if let Some(extension) = matches.get_one::<String>("extension") {
        config.scan.extension = extension.clone();
    }
    if let Some(excludes) = matches.get_many::<String>("exclude") {
        config.scan.exclusions = ExclusionSet::new(excludes.cloned());
    }
    if let Some(suffix) = matches.get_one::<String>("flatten-suffix") {
        config.scan.flatten_suffix = suffix.clone();
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.log_level = level.clone();
    }
    config.scan_only = matches.get_flag("scan-only");
    config.json = matches.get_flag("json");

    config
}

/// Initialize structured logging with tracing
fn initialize_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

fn run_application(
    config: &AppConfig,
    source: &Path,
    destination: Option<&Path>,
) -> Result<()> {
    info!("Configuration: {:?}", config.scan);

    let plan = RelocationPlan::for_source(source, destination, &config.scan)?;

    let entries = scan(source, &config.scan)?;
    let discovery_report = summarize(&entries);

    if config.scan_only {
        if config.json {
            print_json(&discovery_report, None)?;
        } else {
            print_discovery_report(&discovery_report);
        }
        return Ok(());
    }

    let relocation_report = relocate(&entries, &plan)?;

    if config.json {
        print_json(&discovery_report, Some(&relocation_report))?;
    } else {
        print_discovery_report(&discovery_report);
        print_relocation_report(&relocation_report);
    }

    if !relocation_report.errors.is_empty() {
        warn!(
            "{} files could not be copied",
            relocation_report.errors.len()
        );
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    discovery: &'a DiscoveryReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    relocation: Option<&'a RelocationReport>,
}

fn print_json(discovery: &DiscoveryReport, relocation: Option<&RelocationReport>) -> Result<()> {
    let output = JsonOutput {
        discovery,
        relocation,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_discovery_report(report: &DiscoveryReport) {
    info!("=== SCAN REPORT ===");
    for (package, count) in &report.packages {
        info!("  {}: {} files", package, count);
    }
    info!("Files matched: {}", report.files_discovered);
    info!("Total lines: {}", report.total_lines);
    if report.processing_errors > 0 {
        warn!("Unreadable files: {}", report.processing_errors);
    }
}

fn print_relocation_report(report: &RelocationReport) {
    info!("=== COPY REPORT ===");
    info!("Destination: {}", report.destination.display());
    info!("Successfully copied: {}", report.copied);
    info!("Copy errors: {}", report.errors.len());
    info!("Success rate: {:.2}%", report.success_rate() * 100.0);

    if !report.errors.is_empty() {
        error!("Copy errors encountered:");
        for error in &report.errors {
            error!("  {}: {}", error.source.display(), error.error);
        }
    }
}
