//! `basketflow` — basket lifecycle batch runner.
//!
//! Runs are scoped to one company and default to dry-run. Concurrent runs
//! against the same company are unsafe (there is no per-record locking);
//! the external scheduler must serialize them.

use anyhow::Context;
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use std::process::ExitCode;
use tracing::{error, warn};

use basketflow_core::CompanyId;
use basketflow_engine::{BatchOrchestrator, BootstrapInitializer, RunMode, RunOptions};
use basketflow_infra::PostgresStore;

#[derive(Debug, Parser)]
#[command(
    name = "basketflow",
    version,
    about = "Customer basket lifecycle & redistribution batch."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Move customers whose dwell time in an expiring basket has run out.
    Transfer(RunArgs),
    /// Assign an initial basket to customers without a usable basket key.
    Bootstrap(RunArgs),
}

#[derive(Debug, Parser)]
struct RunArgs {
    /// Company to process.
    #[arg(long, default_value_t = 1)]
    company: i64,

    /// Compute and report without touching storage. Pass `--dry-run false`
    /// to execute.
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    dry_run: bool,

    /// Global cap on processed records for this run.
    #[arg(long)]
    limit: Option<usize>,
}

impl RunArgs {
    fn options(&self) -> RunOptions {
        RunOptions {
            company: CompanyId::new(self.company),
            mode: if self.dry_run {
                RunMode::DryRun
            } else {
                RunMode::Live
            },
            limit: self.limit,
            now: Utc::now(),
        }
    }
}

fn main() -> ExitCode {
    basketflow_observability::init();

    if let Err(e) = real_main() {
        error!("{e:?}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        warn!("DATABASE_URL not set; using local dev default");
        "postgres://localhost/basketflow".to_string()
    });
    let store = PostgresStore::connect(&database_url).context("connecting to storage")?;

    match cli.cmd {
        Command::Transfer(args) => {
            let report = BatchOrchestrator::new(&store)
                .run(&args.options())
                .context("transfer run failed")?;
            print!("{report}");
        }
        Command::Bootstrap(args) => {
            let report = BootstrapInitializer::new(&store)
                .run(&args.options())
                .context("bootstrap run failed")?;
            print!("{report}");
        }
    }

    Ok(())
}
