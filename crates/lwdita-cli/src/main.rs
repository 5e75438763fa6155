//! lwdita CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use lwdita_xml::Indentation;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "lwdita")]
#[command(version)]
#[command(about = "Check, format and inspect XDITA documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate documents
    Check {
        /// Input files ('-' for stdin)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Report problems instead of stopping at the first one
        #[arg(long)]
        lenient: bool,

        /// Also validate attribute values
        #[arg(long)]
        attributes: bool,
    },

    /// Re-serialize a document
    Format {
        /// Input file ('-' for stdin)
        input: PathBuf,

        /// Keep going past unknown elements and content-model violations
        #[arg(long)]
        lenient: bool,

        /// Indentation: none, tab, or a number of spaces
        #[arg(long, default_value = "none", value_parser = commands::parse_indent)]
        indent: Indentation,

        /// Indentation unit repeated per level (size taken from --indent, default 4)
        #[arg(long)]
        indent_string: Option<String>,

        /// Write output to FILE instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Print the JSON projection of a document
    Json {
        /// Input file ('-' for stdin)
        input: PathBuf,

        /// Keep going past unknown elements and content-model violations
        #[arg(long)]
        lenient: bool,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,

        /// Write output to FILE instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lwdita=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            inputs,
            lenient,
            attributes,
        } => {
            let clean = commands::check(&inputs, commands::options(lenient), attributes)?;
            Ok(if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Format {
            input,
            lenient,
            indent,
            indent_string,
            output,
        } => {
            let indentation = commands::resolve_indentation(indent, indent_string.as_deref());
            commands::format(
                &input,
                commands::options(lenient),
                indentation,
                output.as_deref(),
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Json {
            input,
            lenient,
            pretty,
            output,
        } => {
            commands::json(&input, commands::options(lenient), pretty, output.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
