// SPDX-License-Identifier: PMPL-1.0-or-later
//! rollsink command-line tool
//!
//! Appends records to a log stream and inspects its policy and files.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rollsink::{FileLogSink, LogRecord, LogSink, PolicySource};

#[derive(Parser, Debug)]
#[command(name = "rollsink", version, about = "Append-only JSON-lines log sink")]
struct Cli {
    /// Emit diagnostics as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append one record to the stream.
    Write {
        /// Path of the active log file (`<dir>/<base>`).
        log_file: PathBuf,

        /// Message payload.
        #[arg(short, long)]
        message: String,

        /// Severity or category label.
        #[arg(short, long, default_value = "Info")]
        level: String,

        /// Originating function label.
        #[arg(short, long, default_value = "")]
        function: String,

        /// Auxiliary context.
        #[arg(short, long, default_value = "")]
        context: String,

        /// Stack trace text.
        #[arg(long, default_value = "")]
        stack_trace: String,
    },

    /// Print the effective policy for a stream.
    Policy {
        /// Path of the active log file.
        log_file: PathBuf,
    },

    /// List the stream's files, oldest first.
    List {
        /// Path of the active log file.
        log_file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Diagnostics go to stderr so stdout stays machine-readable.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    match cli.command {
        Command::Write {
            log_file,
            message,
            level,
            function,
            context,
            stack_trace,
        } => {
            let mut sink = FileLogSink::open(&log_file)?;
            let record = LogRecord::new(level, message)
                .with_function_name(function)
                .with_context(context)
                .with_stack_trace(stack_trace);
            let report = sink.write(&record)?;

            if let Some(archive) = &report.rolled_over_to {
                println!("rolled over to {}", archive.display());
            }
            for removed in &report.removed {
                println!("removed {}", removed.display());
            }
            if report.is_degraded() {
                tracing::warn!(
                    failures = report.cleanup_failures.len(),
                    "Record written, retention cleanup incomplete"
                );
            }
        }
        Command::Policy { log_file } => {
            let sink = FileLogSink::open(&log_file)?;
            let source = match sink.policy_source() {
                PolicySource::Defaults { .. } => "defaults".to_string(),
                PolicySource::File { path } => path.display().to_string(),
                PolicySource::Degraded { error } => format!("defaults ({error})"),
                PolicySource::Explicit => "explicit".to_string(),
            };
            println!("{}", serde_json::to_string_pretty(sink.policy())?);
            println!("source: {source}");
        }
        Command::List { log_file } => {
            let sink = FileLogSink::open(&log_file)?;
            for sibling in sink.paths().list_siblings()? {
                let modified = chrono::DateTime::<chrono::Utc>::from(sibling.modified);
                println!(
                    "{}\t{}\t{}",
                    modified.format("%Y-%m-%d %H:%M:%S"),
                    sibling.len,
                    sibling.path.display()
                );
            }
        }
    }

    Ok(())
}
