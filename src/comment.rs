use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::history::{RunRecord, build_comment_within, extract_current_run, parse_history};
use crate::params::RunParams;
use crate::render::{BodyExtras, ProgressStep, build_body, build_rerun_footer};

pub const COMPLETED_ICON: &str = "✅";
pub const AUTO_COMPLETED_TITLE: &str = "Results of HolmesGPT evals";
pub const MANUAL_COMPLETED_TITLE: &str = "Manual Eval Results";

/// Status of the run the comment is being rendered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    InProgress { steps: Vec<ProgressStep> },
    Completed { results: String },
}

impl RunPhase {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunPhase::Completed { .. })
    }
}

/// Runs to keep from an existing comment, newest first.
///
/// A completed current run is promoted ahead of the collapsed history; an in-progress one
/// is dropped, since its results are about to be replaced.
pub fn collect_history(existing: &str) -> Vec<RunRecord> {
    let mut runs = Vec::new();
    if let Some(current) = extract_current_run(existing) {
        info!(summary = %current.summary, "promoting previous run to history");
        runs.push(current);
    }
    runs.extend(parse_history(existing));
    runs
}

/// Render the full comment body for `params` in `phase`.
///
/// Automatic runs carry the comment identifier and fold the runs recovered from
/// `existing` into collapsed history. Manual runs get their own comment without history.
pub fn compose(
    config: &Config,
    params: &RunParams,
    phase: &RunPhase,
    existing: Option<&str>,
) -> Result<String> {
    let target = config.workflow_target()?;

    let current = match phase {
        RunPhase::InProgress { steps } => {
            let extras = BodyExtras {
                test_preview: Some(params.test_preview.as_str()),
                target: Some(&target),
                ..Default::default()
            };
            let progress = (!steps.is_empty()).then_some(steps.as_slice());
            build_body(params, progress, &extras)?
        }
        RunPhase::Completed { results } => {
            let extras = BodyExtras {
                icon: Some(COMPLETED_ICON),
                title: Some(if params.is_manual {
                    MANUAL_COMPLETED_TITLE
                } else {
                    AUTO_COMPLETED_TITLE
                }),
                target: Some(&target),
                ..Default::default()
            };
            let mut body = build_body(params, None, &extras)?;
            let results = results.trim();
            if !results.is_empty() {
                body.push('\n');
                body.push_str(results);
                body.push('\n');
            }
            body
        }
    };

    let footer = build_rerun_footer(params, &target, phase.is_completed())?;

    if params.is_manual {
        return Ok(format!("{current}{footer}"));
    }

    let history = existing.map(collect_history).unwrap_or_default();
    let body = build_comment_within(&current, &history, &footer, config.budget());
    info!(
        history = history.len(),
        bytes = body.len(),
        completed = phase.is_completed(),
        "rendered eval comment"
    );
    Ok(body)
}
