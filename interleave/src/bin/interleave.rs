use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use interleave::{check_thread_count, demo, Error, SimulationConfig, Simulator, UsageError};
use tracing_subscriber::EnvFilter;

/// Run every interleaving of some threads and tally what they return.
///
/// Each thread file holds one instruction per line. Every order-preserving
/// merge of the threads runs between the prelude and the epilogue, and the
/// values the epilogue returns are counted.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Source of each thread, one instruction per line.
    #[arg(value_name = "THREAD_FILE", required_unless_present = "demo")]
    threads: Vec<PathBuf>,
    /// Code run before the interleaved instructions.
    #[arg(long, value_name = "FILE")]
    prelude: Option<PathBuf>,
    /// Code run after the interleaved instructions. Its return value is the
    /// outcome.
    #[arg(long, value_name = "FILE")]
    epilogue: Option<PathBuf>,
    /// Refuse to run when there are more interleavings than this.
    #[arg(long, value_name = "N", env = "INTERLEAVE_MAX_INTERLEAVINGS")]
    max_interleavings: Option<u64>,
    /// Evaluation steps each interleaving may take before it fails.
    #[arg(long, value_name = "N", env = "INTERLEAVE_MAX_STEPS")]
    max_steps: Option<u64>,
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
    /// Run the built-in sample instead of reading files.
    #[arg(long, conflicts_with_all = ["threads", "prelude", "epilogue"])]
    demo: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if let Err(err) = try_main(&args) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn try_main(args: &Args) -> Result<(), Error> {
    let (prelude, threads, epilogue) = if args.demo {
        (
            demo::PRELUDE.to_owned(),
            demo::THREADS.map(str::to_owned).to_vec(),
            demo::EPILOGUE.to_owned(),
        )
    } else {
        check_thread_count(args.threads.len())?;
        let threads = args
            .threads
            .iter()
            .map(|path| read(path))
            .collect::<Result<Vec<_>, _>>()?;
        (
            read_optional(args.prelude.as_deref())?,
            threads,
            read_optional(args.epilogue.as_deref())?,
        )
    };

    let config = SimulationConfig {
        max_interleavings: args.max_interleavings.map(u128::from),
        max_steps: args.max_steps,
    };
    let tally = Simulator::new(config).run(&prelude, &threads, &epilogue)?;
    let report = tally.report();

    let mut stdout = io::stdout().lock();
    let written = if args.json {
        serde_json::to_writer_pretty(&mut stdout, &report)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(stdout))
    } else {
        write!(stdout, "{report}")
    };
    written
        .and_then(|()| stdout.flush())
        .map_err(|err| UsageError::Output(err.to_string()))?;
    Ok(())
}

fn read(path: &Path) -> Result<String, UsageError> {
    fs::read_to_string(path).map_err(|err| UsageError::from_io(&err, path))
}

fn read_optional(path: Option<&Path>) -> Result<String, UsageError> {
    path.map_or_else(|| Ok(String::new()), read)
}
