use std::fs;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use eval_comment::cli::{Cli, CliCommand};
use eval_comment::comment::{RunPhase, compose};
use eval_comment::config::Config;
use eval_comment::error::Result;
use eval_comment::history::{extract_current_run, parse_history};
use eval_comment::params::{RawParams, RunParams};

fn init_logging() {
    // stdout carries the rendered comment
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        CliCommand::History { file } => {
            let body = fs::read_to_string(file)?;
            let runs = parse_history(&body);
            info!(count = runs.len(), "history parsed");
            println!("{}", serde_json::to_string_pretty(&runs)?);
        }
        CliCommand::Current { file } => {
            let body = fs::read_to_string(file)?;
            let current = extract_current_run(&body);
            println!("{}", serde_json::to_string_pretty(&current)?);
        }
        CliCommand::Render {
            params,
            existing,
            completed,
            results,
            steps,
            output,
        } => {
            let config = Config::load(cli)?;
            info!(?config, "config loaded");

            let raw = match params {
                Some(path) => RawParams::from_json(&fs::read_to_string(path)?)?,
                None => RawParams::from_env(),
            };
            let params = RunParams::from_raw(raw)?;

            let existing = existing.as_deref().map(fs::read_to_string).transpose()?;
            let phase = if *completed {
                let results = results
                    .as_deref()
                    .map(fs::read_to_string)
                    .transpose()?
                    .unwrap_or_default();
                RunPhase::Completed { results }
            } else {
                RunPhase::InProgress {
                    steps: steps.clone(),
                }
            };

            let body = compose(&config, &params, &phase, existing.as_deref())?;
            match output {
                Some(path) => {
                    fs::write(path, &body)?;
                    info!(path = %path, bytes = body.len(), "comment body written");
                }
                None => print!("{body}"),
            }
        }
    }
    Ok(())
}
