mod cli;

use std::io;
use std::process;

use anyhow::Context;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use upinfo::{AdvisoryFilter, Catalog, Correlator, PackageSpec, Reporter, RpmOrder, Scope};

use cli::{Cli, Command};

fn main() {
    let args = Cli::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(args.verbosity.tracing_level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(args: &Cli) -> anyhow::Result<()> {
    let catalog = Catalog::load(&args.snapshot, Box::new(RpmOrder))
        .with_context(|| format!("failed to load snapshot {}", args.snapshot.display()))?;

    let order = RpmOrder;
    let mut correlator = Correlator::new(&catalog, &catalog, &order);
    if let Some(glob) = &args.package {
        correlator = correlator.restrict_packages(PackageSpec::new(glob)?);
    }

    let patterns = match &args.command {
        None => &[][..],
        Some(Command::Summary { patterns })
        | Some(Command::List { patterns })
        | Some(Command::Info { patterns }) => patterns,
    };
    let filter = AdvisoryFilter::new(patterns)?;

    let scope = Scope::from(args.scope);
    // Correlation finishes before the first report byte is written, so a
    // failing run emits no partial report.
    let correlation = match scope {
        Scope::Available => correlator.updating(&filter)?,
        Scope::Installed => correlator.installed(&filter)?,
        Scope::All => correlator.all(&filter)?,
    };

    let verbose = args.verbosity.tracing_level_filter() >= LevelFilter::DEBUG;
    let reporter = Reporter::new(verbose);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match &args.command {
        None | Some(Command::Summary { .. }) => reporter.summary(&mut out, &correlation, scope)?,
        Some(Command::List { .. }) => reporter.list(&mut out, &correlation, "")?,
        Some(Command::Info { .. }) => reporter.info(&mut out, &correlation, "")?,
    }
    Ok(())
}
