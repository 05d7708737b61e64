use std::io::{self, Write};

use clap::{ArgAction, Parser, Subcommand};

use crate::catalog::{CatalogArgs, run_catalog};
use crate::compare::{CompareArgs, run_compare};
use crate::error::Result;
use crate::logging;
use crate::seed::{SeedDemoArgs, run_seed_demo};
use crate::view::{DiffArgs, ViewArgs, run_diff, run_view};

#[derive(Debug, Parser)]
#[command(
    name = "tscope",
    about = "Browse, view, and triage captured tensors",
    version
)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Raise the log level when TSCOPE_LOG is unset (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the namespace tree of a store.
    Catalog(CatalogArgs),

    /// Draw one slice of a tensor as a character heatmap.
    View(ViewArgs),

    /// Compare every tensor of one record with its counterpart in another.
    Compare(CompareArgs),

    /// Draw |left - right| for two tensors of the same shape.
    Diff(DiffArgs),

    /// Write a small two-record demo store.
    #[command(name = "seed-demo")]
    SeedDemo(SeedDemoArgs),
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json, cli.verbose)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)?;
    out.flush()?;
    Ok(())
}

pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    match cli.command {
        Commands::Catalog(args) => run_catalog(args, out),
        Commands::View(args) => run_view(args, out),
        Commands::Compare(args) => run_compare(args, out),
        Commands::Diff(args) => run_diff(args, out),
        Commands::SeedDemo(args) => run_seed_demo(args, out),
    }
}
