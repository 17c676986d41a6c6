// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! mid schema compiler command-line interface.
//!
//! This is the main entry point for the `mid` command.

use clap::{ArgAction, Parser, Subcommand};
use miette::Result;

mod commands;
mod diagnostic;

/// mid: compile schema files to an IR for code generators
#[derive(Debug, Parser)]
#[command(name = "mid")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile schema files and write the IR as JSON
    Build {
        /// Project directory or schema file
        #[arg(default_value = ".")]
        path: String,

        /// Output file (default: `output` from mid.toml, else mid.ir.json)
        #[arg(long, short)]
        out: Option<String>,

        /// Treat unresolved identifiers as errors
        #[arg(long)]
        strict: bool,
    },

    /// Check schema files for errors without writing output
    Check {
        /// Project directory or schema file
        #[arg(default_value = ".")]
        path: String,

        /// Treat unresolved identifiers as errors
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Build { path, out, strict } => {
            commands::build::build(&path, out.as_deref(), strict)
        }
        Command::Check { path, strict } => commands::build::check(&path, strict),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr. `RUST_LOG` overrides the `-v` level.
fn init_logging(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default = match verbose {
        0 => "warn",
        1 => "mid=debug,mid_core=debug",
        _ => "mid=trace,mid_core=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
