// src/main.rs

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use std::path::Path;
use wikiq::config::{CommandLineInput, QueryMode, RunConfig};
use wikiq::{ApiResult, Request, Site};

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_file_path = std::env::temp_dir().join("wikiq.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    log4rs::init_config(logging_config(verbose, &log_file_path)?)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Console at warn (debug when verbose); the file always gets debug.
fn logging_config(verbose: bool, log_file_path: &Path) -> anyhow::Result<Config> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    // Results go to stdout, so diagnostics stay on stderr.
    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(log_file_path)?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(log_level)))
                .build("stderr", Box::new(stderr_appender)),
        )
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(LevelFilter::Debug),
        )?;

    Ok(config)
}

fn connect(config: &RunConfig) -> anyhow::Result<Site> {
    let site = if config.load_siteinfo {
        Site::open(config.site.clone())
    } else {
        Site::new(config.site.clone())
    }
    .with_context(|| format!("Could not set up site {}", config.site.api_url))?;

    log::info!("Connected to {} ({} features)", site, site.features().len());
    Ok(site)
}

fn print_result(result: &ApiResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&result.to_value())?);
    Ok(())
}

/// Runs one API call in the requested continuation mode and prints the JSON.
fn execute(config: &RunConfig, site: &Site) -> anyhow::Result<()> {
    let params = config.params.clone();
    let mut request = if config.write {
        Request::write(site, params)
    } else {
        Request::new(site, params)
    };

    match config.mode {
        QueryMode::Send => print_result(&request.send()?),
        QueryMode::All => print_result(&request.query_all()?),
        QueryMode::Pages => {
            let mut count = 0usize;
            for page in request.query_pages()? {
                print_result(&page?)?;
                count += 1;
            }
            log::info!("Fetched {} page(s)", count);
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = RunConfig::resolve(cli)?;
    let site = connect(&config)?;

    execute(&config, &site)?;

    Ok(())
}
