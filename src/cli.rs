//! Command-line interface definition using clap.
//!
//! - [`Args`] - top-level arguments
//! - [`Command`] - `serve`, `analyze` and `parse` subcommands
//!
//! Settings not given on the command line come from the environment (see
//! [`Settings::from_env`](crate::config::Settings::from_env)).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{ClassifierKind, Settings};
use crate::core::FilterConfig;
use crate::error::Result;
use crate::format::OutputFormat;

/// Analyze exported chat transcripts.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatlens")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    chatlens serve --port 8080
    chatlens analyze chat.txt --classifier keywords
    chatlens analyze chat.txt --sessions --after 2024-01-01 -o report.json
    chatlens parse chat.txt -o messages.jsonl -f jsonl")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Port to bind (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind (overrides HOST)
        #[arg(long)]
        host: Option<String>,
    },

    /// Analyze a transcript and print the JSON report
    Analyze {
        /// Path to the exported transcript
        input: PathBuf,

        /// Classify whole sessions instead of single messages
        #[arg(long)]
        sessions: bool,

        /// Classifier to use (overrides CLASSIFIER)
        #[arg(short, long, value_enum)]
        classifier: Option<ClassifierKind>,

        /// Only messages on or after this date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        after: Option<String>,

        /// Only messages on or before this date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        before: Option<String>,

        /// Only messages from this sender
        #[arg(long, value_name = "USER")]
        from: Option<String>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a transcript and export the messages
    Parse {
        /// Path to the exported transcript
        input: PathBuf,

        /// Path to output file
        #[arg(short, long, default_value = "messages.csv")]
        output: PathBuf,

        /// Output format (inferred from the output extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
}

impl Command {
    /// Applies command-line overrides to environment-derived settings.
    pub fn apply_to(&self, settings: &mut Settings) {
        match self {
            Command::Serve { port, host } => {
                if let Some(port) = port {
                    settings.server.port = *port;
                }
                if let Some(host) = host {
                    settings.server.host.clone_from(host);
                }
            }
            Command::Analyze {
                sessions,
                classifier,
                ..
            } => {
                if *sessions {
                    settings.analysis.group_sessions = true;
                }
                if let Some(kind) = classifier {
                    settings.classifier.kind = *kind;
                }
            }
            Command::Parse { .. } => {}
        }
    }
}

/// Builds a filter from the `--after`, `--before` and `--from` flags.
pub fn build_filter(
    after: Option<&str>,
    before: Option<&str>,
    from: Option<&str>,
) -> Result<FilterConfig> {
    let mut filter = FilterConfig::new();
    if let Some(date) = after {
        filter = filter.with_date_from(date)?;
    }
    if let Some(date) = before {
        filter = filter.with_date_to(date)?;
    }
    if let Some(sender) = from {
        filter = filter.with_sender(sender);
    }
    Ok(filter)
}
