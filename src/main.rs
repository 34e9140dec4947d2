//! # chatlens CLI
//!
//! Command-line interface for the chatlens library.

use std::process;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser as ClapParser;
use tracing::info;

use chatlens::classifier::build_classifier;
use chatlens::cli::{Args, Command, build_filter};
use chatlens::config::Settings;
use chatlens::core::{Aggregator, apply_filters};
use chatlens::format::{OutputFormat, write_to_format};
use chatlens::parser::TranscriptParser;
use chatlens::{AnalyzerError, server};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: failed to load .env: {e}");
        }
    }

    // Logs go to stderr so `analyze` can print its report on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), AnalyzerError> {
    let args = <Args as ClapParser>::parse();
    let mut settings = Settings::from_env()?;
    args.command.apply_to(&mut settings);

    match args.command {
        Command::Serve { .. } => server::serve(settings).await,
        Command::Analyze {
            input,
            after,
            before,
            from,
            output,
            ..
        } => {
            let start = Instant::now();
            let filter = build_filter(after.as_deref(), before.as_deref(), from.as_deref())?;

            let lexicon = Arc::new(settings.load_lexicon()?);
            let classifier = build_classifier(&settings.classifier, lexicon.clone())?;

            let parser = TranscriptParser::with_config(settings.parser.clone());
            let messages = parser.parse_file_async(&input).await?;
            let parsed = messages.len();
            let messages = apply_filters(messages, &filter);
            info!(parsed, kept = messages.len(), "transcript loaded");

            let report = Aggregator::with_config(lexicon, settings.analysis.clone())
                .aggregate(&messages, classifier)
                .await;
            let json = serde_json::to_string_pretty(&report)?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, json).await?;
                    info!(path = %path.display(), "report written");
                }
                None => println!("{json}"),
            }

            info!(
                elapsed_ms = start.elapsed().as_millis() as u64,
                units_failed = report.classification.units_failed,
                "analysis finished"
            );
            Ok(())
        }
        Command::Parse {
            input,
            output,
            format,
        } => {
            let format = match format {
                Some(format) => format,
                None => OutputFormat::from_path(&output)?,
            };

            let parser = TranscriptParser::with_config(settings.parser);
            let messages = parser.parse_file(&input)?;
            write_to_format(&messages, &output, format)?;

            info!(
                messages = messages.len(),
                %format,
                path = %output.display(),
                "messages exported"
            );
            Ok(())
        }
    }
}
