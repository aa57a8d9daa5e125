//! Loads a process supervisor configuration file, validates every app
//! in it, and prints the resulting process descriptors.

#![forbid(unsafe_code, future_incompatible)]
#![deny(
    missing_debug_implementations,
    nonstandard_style,
    missing_docs,
    unreachable_pub,
    missing_copy_implementations,
    unused_qualifications,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

use std::{error::Error, io, path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{self, WrapErr};
use console::{pad_str, style, Alignment, Term};
use flightplan::ProcessDescriptor;

#[derive(Parser)]
#[clap(about, long_about = None)]
struct Cli {
    /// Check the configuration file for errors, but do not print the
    /// process descriptors.
    #[clap(long)]
    check: bool,

    /// How to print the process descriptors.
    #[clap(long, value_enum, default_value_t = Output::Table)]
    output: Output,

    config_file: PathBuf,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Output {
    /// Human-readable summary, one app per line.
    Table,

    /// Full descriptors as JSON, for handing to a supervisor.
    Json,
}

fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;

    // Set the RUST_LOG, if it hasn't been explicitly defined
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info")
    }

    // Logs go to stderr so that `--output json` stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Load the whole file; nothing is printed unless every app is valid.
    let descriptors = match flightplan::load_file(&cli.config_file) {
        Ok(descriptors) => descriptors,
        Err(err) => {
            tracing::error!(
                kind = %err.kind(),
                config_file = %cli.config_file.display(),
                "{}",
                error_chain(&err)
            );
            return Ok(ExitCode::FAILURE);
        }
    };

    // We're done if this was only a config file check.
    if cli.check {
        tracing::info!(apps = descriptors.len(), "Configuration file is valid");
        return Ok(ExitCode::SUCCESS);
    }

    match cli.output {
        Output::Json => {
            let json = serde_json::to_string_pretty(&descriptors)
                .wrap_err("Unable to serialize process descriptors")?;
            println!("{json}");
        }
        Output::Table => {
            print_table(&Term::stdout(), &descriptors).wrap_err("Unable to write to stdout")?
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// The error message followed by those of its sources, `: `-separated.
fn error_chain(err: &flightplan::Error) -> String {
    std::iter::successors(Some(err as &dyn Error), |&err: &&dyn Error| err.source())
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join(": ")
}

fn print_table(term: &Term, descriptors: &[ProcessDescriptor]) -> io::Result<()> {
    const HEADERS: [&str; 5] = ["NAME", "MODE", "INSTANCES", "RESTART", "COMMAND"];

    let rows: Vec<[String; 5]> = descriptors
        .iter()
        .map(|descriptor| {
            [
                descriptor.name.clone(),
                descriptor.execution_mode.to_string(),
                descriptor.instance_count.to_string(),
                restart_summary(descriptor),
                descriptor.command_line(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(console::measure_text_width(cell));
        }
    }

    let header = HEADERS
        .iter()
        .zip(widths)
        .map(|(text, width)| {
            style(pad_str(text, width, Alignment::Left, None))
                .bold()
                .to_string()
        })
        .collect::<Vec<String>>();
    term.write_line(header.join("  ").trim_end())?;

    for row in &rows {
        let line = row
            .iter()
            .zip(widths)
            .map(|(text, width)| pad_str(text, width, Alignment::Left, None).into_owned())
            .collect::<Vec<String>>();
        term.write_line(line.join("  ").trim_end())?;
    }

    Ok(())
}

fn restart_summary(descriptor: &ProcessDescriptor) -> String {
    if !descriptor.auto_restart {
        return String::from("never");
    }

    let limit = match descriptor.restart_limit() {
        Some(limit) => format!("max {limit}"),
        None => String::from("unlimited"),
    };

    if descriptor.min_uptime.is_zero() {
        limit
    } else {
        format!("{limit}, stable after {}s", descriptor.min_uptime_seconds())
    }
}
