use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, warn};

use area_stats::catalogue::Catalogue;
use area_stats::cli::Args;
use area_stats::ingestion::{IngestionOptions, TracingObserver};
use area_stats::loader::Loader;

fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    if let Err(error) = run(&args) {
        eprintln!("Error: {error:#}");
        process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let catalogue = match &args.catalogue {
        Some(path) => Catalogue::from_json_path(path)
            .with_context(|| format!("failed to load catalogue {}", path.display()))?,
        None => Catalogue::builtin(),
    };

    let options = IngestionOptions {
        filters: args.filters(),
        observer: Some(Arc::new(TracingObserver)),
        ..Default::default()
    };
    debug!(?options, dir = %args.dir.display(), "starting load");

    let loader = Loader::new(&catalogue, &args.dir, options);
    let (areas, report) = loader
        .load(args.dataset_codes().as_slice())
        .context("failed to load area statistics")?;

    let failed: Vec<&str> = report.failed().map(|d| d.code.as_str()).collect();
    if !failed.is_empty() {
        warn!(datasets = %failed.join(","), "some datasets were not loaded");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        writeln!(out, "{}", areas.to_json()?)?;
    } else {
        write!(out, "{areas}")?;
    }
    out.flush()?;
    Ok(())
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("area_stats={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(io::stderr)
                .compact(),
        )
        .init();
}
