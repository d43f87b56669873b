//! Unbalanced Tree Search: count the nodes of a deterministic pseudo-random
//! tree in parallel using a hierarchical work-stealing scheduler.
//!
//! This is the entry point for the `uts` CLI.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use uts_stealstack::cli::Cli;
use uts_stealstack::error::UtsError;
use uts_stealstack::runtime::RuntimeBuilder;
use uts_stealstack::uts::{driver, FleetOptions};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.verbosity());

    let params = match cli.to_params() {
        Ok(params) => params,
        Err(e) => return fail(&e),
    };

    if cli.verbosity() >= 2 {
        eprintln!("{params:#?}");
    }

    let os_threads = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let runtime = match RuntimeBuilder::for_worker_count(os_threads).build() {
        Ok(rt) => rt,
        Err(e) => return fail(&UtsError::from(e)),
    };

    let options = FleetOptions {
        num_hosts: cli.num_hosts,
        workers_override: cli.workers,
    };

    let report = runtime.block_on(driver::run(Arc::new(params), options));

    match report {
        Ok(report) => {
            if cli.is_csv() {
                println!("{}", report.to_csv());
            } else {
                println!("{}", report.to_human());
            }
            std::process::ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn fail(err: &UtsError) -> std::process::ExitCode {
    eprintln!("uts: {err}");
    std::process::ExitCode::from(err.exit_code() as u8)
}

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(verbosity >= 3))
        .with(env_filter)
        .init();
}
