use serde::Deserialize;

use crate::error::{Error, Result};

/// Prefix of the environment variables carrying raw step outputs, e.g. `EVAL_RUN_URL`.
pub const ENV_PREFIX: &str = "EVAL_";

/// Step outputs as handed over by the workflow. Every field is optional and untyped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawParams {
    pub is_manual: Option<String>,
    pub trigger_source: Option<String>,
    pub model: Option<String>,
    pub markers: Option<String>,
    pub filter: Option<String>,
    pub iterations: Option<String>,
    pub branch: Option<String>,
    pub display_branch: Option<String>,
    pub run_url: Option<String>,
    pub pr_number: Option<String>,
    pub comment_id: Option<String>,
    pub test_count: Option<String>,
    pub test_preview: Option<String>,
    pub duration: Option<String>,
    pub valid_markers: Option<String>,
    pub triggered_by: Option<String>,
}

impl RawParams {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read each field from `EVAL_<FIELD>` in the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(format!("{ENV_PREFIX}{}", key.to_uppercase())).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            is_manual: lookup("is_manual"),
            trigger_source: lookup("trigger_source"),
            model: lookup("model"),
            markers: lookup("markers"),
            filter: lookup("filter"),
            iterations: lookup("iterations"),
            branch: lookup("branch"),
            display_branch: lookup("display_branch"),
            run_url: lookup("run_url"),
            pr_number: lookup("pr_number"),
            comment_id: lookup("comment_id"),
            test_count: lookup("test_count"),
            test_preview: lookup("test_preview"),
            duration: lookup("duration"),
            valid_markers: lookup("valid_markers"),
            triggered_by: lookup("triggered_by"),
        }
    }
}

/// Normalized run parameters. Defaults are applied once, in [`RunParams::from_raw`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunParams {
    pub is_manual: bool,
    pub trigger: String,
    pub model: String,
    pub markers: String,
    pub filter: String,
    pub iterations: String,
    pub branch: String,
    pub display_branch: String,
    pub run_url: String,
    pub pr_number: Option<u64>,
    pub comment_id: Option<u64>,
    pub test_count: String,
    pub test_preview: String,
    pub duration: String,
    pub valid_markers: String,
    pub triggered_by: String,
}

impl RunParams {
    pub fn from_raw(raw: RawParams) -> Result<Self> {
        Ok(Self {
            is_manual: raw.is_manual.as_deref() == Some("true"),
            trigger: raw.trigger_source.unwrap_or_default(),
            model: non_empty_or(raw.model, "default"),
            markers: raw.markers.unwrap_or_default(),
            filter: raw.filter.unwrap_or_default(),
            iterations: raw.iterations.unwrap_or_default(),
            branch: raw.branch.unwrap_or_default(),
            display_branch: raw.display_branch.unwrap_or_default(),
            run_url: raw.run_url.unwrap_or_default(),
            pr_number: parse_id("pr_number", raw.pr_number)?,
            comment_id: parse_id("comment_id", raw.comment_id)?,
            test_count: non_empty_or(raw.test_count, "0"),
            test_preview: raw.test_preview.unwrap_or_default(),
            duration: non_empty_or(raw.duration, "N/A"),
            valid_markers: raw.valid_markers.unwrap_or_default(),
            triggered_by: raw.triggered_by.unwrap_or_default(),
        })
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_id(field: &str, value: Option<String>) -> Result<Option<u64>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|e| Error::Params(format!("{field} must be a number, got {v:?}: {e}"))),
    }
}
