//! Command-line entry point that checks local image files against the upload constraints

use anyhow::Context;
use clap::Parser;
use image_core::{check_path, ImageConfig, ImageValidator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Check image files against the upload size and content constraints
#[derive(Parser, Debug)]
#[command(name = "image-check", version)]
struct Args {
    /// Print one JSON object per file instead of a plain line
    #[arg(long)]
    json: bool,

    /// Files to check
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("image-check: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = ImageConfig::load().context("Failed to load configuration")?;

    info!("Configuration loaded successfully");
    info!(
        max_image_size = config.max_image_size,
        check_magic_bytes = config.check_magic_bytes,
        "Allowed content types: {:?}",
        config.allowed_content_types
    );

    let validator = ImageValidator::new(config);
    let mut rejected = false;
    let mut failed = false;

    for path in &args.paths {
        let report = match check_path(&validator, path)
            .with_context(|| format!("Failed to check {}", path.display()))
        {
            Ok(report) => report,
            Err(e) => {
                error!("{:#}", e);
                eprintln!("image-check: {:#}", e);
                failed = true;
                continue;
            }
        };

        rejected |= !report.outcome.is_accepted();

        if args.json {
            println!("{}", report.to_json()?);
        } else {
            println!("{}", report);
        }
    }

    info!("Checked {} file(s)", args.paths.len());

    Ok(if failed {
        ExitCode::from(2)
    } else if rejected {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let default_level = if cfg!(debug_assertions) {
                "debug"
            } else {
                "warn"
            };

            format!(
                "{}={},image_core={}",
                env!("CARGO_CRATE_NAME").replace('-', "_"),
                default_level,
                default_level
            ).into()
        });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }
}
