//! docmover - move finished scans and merge dual-sided passes.

mod cli;
mod logging;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::process;

use crate::cli::{Cli, Command, GroupArgs, MergeArgs, MoveArgs};
use docmover::DocMoverError;
use docmover::merge::{ConsecutiveGrouper, PdfMerger};
use docmover::mover::{DocumentMover, RunLock};
use docmover::output::{
    OutputFormatter, display_group_report, display_merge_report, display_move_report,
};

/// Exit code when the run completed but some files failed.
const EXIT_PARTIAL_FAILURE: i32 = 2;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start runtime: {err}");
            process::exit(1);
        }
    };

    let code = match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(err) => match err.downcast_ref::<DocMoverError>() {
            Some(DocMoverError::LockHeld { path }) => {
                tracing::info!(lock = %path.display(), "another run is in progress");
                0
            }
            Some(docmover_err) => {
                eprintln!("Error: {err:#}");
                docmover_err.exit_code()
            }
            None => {
                eprintln!("Error: {err:#}");
                1
            }
        },
    };

    process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let formatter = OutputFormatter::new(cli.quiet, cli.verbose);

    match &cli.command {
        Command::Move(args) => run_move(args, &formatter, cli.json).await,
        Command::Merge(args) => run_merge(args, &formatter, cli.json).await,
        Command::Group(args) => run_group(args, &formatter, cli.json).await,
    }
}

async fn run_move(args: &MoveArgs, formatter: &OutputFormatter, json: bool) -> anyhow::Result<i32> {
    let config = args.to_config()?;
    warn_if_unprivileged(config.user_id.is_some() || config.group_id.is_some());

    let _lock = RunLock::acquire(&args.lock_file)?;
    let report = DocumentMover::new(config).run().await?;

    if json {
        print_json(&report)?;
    } else {
        display_move_report(formatter, &report);
    }

    Ok(if report.failed() > 0 {
        EXIT_PARTIAL_FAILURE
    } else {
        0
    })
}

async fn run_merge(args: &MergeArgs, formatter: &OutputFormatter, json: bool) -> anyhow::Result<i32> {
    let report = PdfMerger::new()
        .merge(&args.primary, &args.secondary, &args.output, args.options())
        .await?;

    if json {
        print_json(&report)?;
    } else {
        display_merge_report(formatter, &report);
    }
    Ok(0)
}

async fn run_group(args: &GroupArgs, formatter: &OutputFormatter, json: bool) -> anyhow::Result<i32> {
    let report = ConsecutiveGrouper::new()
        .run(&args.folder, &args.options())
        .await?;

    if json {
        print_json(&report)?;
    } else {
        display_group_report(formatter, &report);
    }

    Ok(if report.failed() > 0 {
        EXIT_PARTIAL_FAILURE
    } else {
        0
    })
}

fn print_json<T: Serialize>(report: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}

#[cfg(unix)]
fn warn_if_unprivileged(changes_owner: bool) {
    if changes_owner && !rustix::process::geteuid().is_root() {
        tracing::warn!("not running as root, ownership changes will likely fail");
    }
}

#[cfg(not(unix))]
fn warn_if_unprivileged(_changes_owner: bool) {}
