//! Command-line driver for the uC compiler.
//!
//! Reads a source file, runs the front-end pipeline, and prints the IR
//! list on success or the diagnostic line on failure. The core crates
//! never touch the filesystem; all file handling lives here.

use std::fs::File;
use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

/// The uC compiler front-end
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Args {
    /// Input file to compile
    #[clap(value_parser)]
    input: String,

    /// Write the IR to a file instead of stdout
    #[clap(short, long, value_parser)]
    output: Option<String>,

    /// Show verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let source = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input))?;

    if args.verbose {
        println!("Compiling {}...", args.input);
    }

    let instrs = match ucc_codegen::compile(&source) {
        Ok(instrs) => instrs,
        Err(diagnostic) => anyhow::bail!("{diagnostic}"),
    };
    debug!("emitting {} instructions", instrs.len());

    if let Some(output) = &args.output {
        let mut file = File::create(output)
            .with_context(|| format!("failed to create {output}"))?;

        for instr in &instrs {
            writeln!(file, "{instr}")?;
        }

        if args.verbose {
            println!("IR written to {output}");
        }
    } else {
        for instr in &instrs {
            println!("{instr}");
        }
    }

    Ok(())
}
