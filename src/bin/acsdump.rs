//! L8: the CLI front end. Argument parsing, logger initialization, and the
//! process exit-code convention (§4.8) live here and nowhere else in the
//! crate -- every other layer is a pure library over borrowed bytes.

use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use acsdump::diagnostics::Diagnostics;
use acsdump::error::{Error, Result};
use acsdump::ObjectFile;

/// Inspect and disassemble an Action Code Script (ACS) object file.
#[derive(Parser)]
#[command(name = "acsdump", version, about)]
struct Args {
    /// View a single named chunk (ACSE/ACSe only); case-insensitive 4-character name.
    #[arg(short = 'c', value_name = "CHUNK", conflicts_with = "list")]
    chunk: Option<String>,

    /// List chunks (ACSE/ACSe only).
    #[arg(short = 'l', conflicts_with = "chunk")]
    list: bool,

    /// Increase log verbosity (repeatable).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// The object file to inspect.
    file: PathBuf,
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn run(args: &Args) -> Result<()> {
    let bytes = std::fs::read(&args.file)?;
    let object = ObjectFile::open(&bytes)?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut diagnostics = Diagnostics::new();

    if let Some(name) = &args.chunk {
        object.view_chunk(&mut out, &mut diagnostics, name)?;
    } else if args.list {
        object.list_chunks(&mut out)?;
    } else {
        object.show_object(&mut out, &mut diagnostics)?;
    }
    out.flush()?;
    Ok(())
}

/// I/O failure gets its own exit code so scripts can distinguish "couldn't
/// read the file" from "read it, and it's bad" (§4.8, §9).
fn exit_code_for(err: &Error) -> u8 {
    match err {
        Error::Io(_) => 2,
        _ => 1,
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            #[cfg(feature = "log")]
            log::error!("{err}");
            eprintln!("acsdump: {err}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}
