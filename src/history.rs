use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Hidden HTML comment identifying the bot-managed eval comment on a PR.
pub const COMMENT_IDENTIFIER: &str = "<!-- holmes-auto-eval-results -->";

/// Closes every collapsed history entry. Run content may carry its own `<details>`
/// sections, so entries are delimited by this token instead of by tag balancing.
pub const HISTORY_RUN_END_MARKER: &str = "<!-- END_HISTORY_RUN -->";

pub const PREVIOUS_RUNS_HEADER: &str = "## 📂 Previous Runs";

/// Closes the history section, before the current run.
const HISTORY_SEPARATOR: &str = "---\n\n";

/// Present in the heading of a completed run only.
pub const COMPLETED_KEYWORD: &str = "Results";

pub const DEFAULT_MAX_HISTORY: usize = 5;

/// Default byte budget, kept below [`GITHUB_COMMENT_LIMIT`].
pub const DEFAULT_MAX_COMMENT_SIZE: usize = 60_000;

/// Hard ceiling GitHub enforces on a comment body.
pub const GITHUB_COMMENT_LIMIT: usize = 65_536;

pub const LEGEND_MARKER: &str = "<details>\n<summary>📖 <b>Legend</b>";
pub const RERUN_MARKER: &str = "<details>\n<summary>🔄 <b>Re-run evals manually</b>";
pub const VALID_MARKERS_MARKER: &str = "<details>\n<summary>\u{1F3F7}\u{FE0F} <b>Valid markers</b>";
pub const COMMANDS_MARKER: &str = "\n---\n**Commands:**";

/// Openers of the footer sections. Everything from the earliest of these onwards is
/// footer and never becomes part of a run record.
pub const FOOTER_MARKERS: &[&str] = &[
    LEGEND_MARKER,
    RERUN_MARKER,
    VALID_MARKERS_MARKER,
    COMMANDS_MARKER,
];

static HISTORY_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"<details>\s*<summary>📜\s*(.+?)</summary>\s*([\s\S]*?)<!-- END_HISTORY_RUN -->\s*</details>",
    )
    .expect("history entry pattern is valid")
});
static TRIGGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Automatically triggered by ([^\n]+)").expect("trigger pattern is valid")
});
static RUN_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[View workflow logs\]\(([^)]+)\)").expect("run url pattern is valid")
});
static COMMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"commit ([a-f0-9]+)").expect("commit pattern is valid"));
static RUN_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"runs/([0-9]+)").expect("run id pattern is valid"));

/// Longest trigger prefix used as a summary when no commit hash is found.
const TRIGGER_SUMMARY_CHARS: usize = 50;

/// One completed eval run as preserved in the comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub summary: String,
    pub content: String,
}

impl RunRecord {
    pub fn new(summary: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            content: content.into(),
        }
    }
}

/// Limits applied while assembling a comment body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryBudget {
    /// Maximum number of collapsed history entries.
    pub max_history: usize,
    /// Byte budget for the whole body. Only history entries are sacrificed to meet it.
    pub max_bytes: usize,
}

impl Default for HistoryBudget {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            max_bytes: DEFAULT_MAX_COMMENT_SIZE,
        }
    }
}

/// Parse the collapsed history entries of an existing comment, in document order.
///
/// Malformed or foreign comments, including any comment without the identifier, yield
/// an empty list.
pub fn parse_history(body: &str) -> Vec<RunRecord> {
    if !body.contains(COMMENT_IDENTIFIER) {
        debug!("comment has no identifier, ignoring history");
        return Vec::new();
    }
    let runs: Vec<RunRecord> = HISTORY_ENTRY_RE
        .captures_iter(body)
        .map(|caps| RunRecord::new(caps[1].trim(), caps[2].trim()))
        .collect();
    debug!(count = runs.len(), "parsed run history");
    runs
}

/// Extract the current run of an existing comment, if it is a completed run.
///
/// Returns `None` when the current section has no heading or its heading belongs to an
/// in-progress run, so a transient "running" status is never saved into history.
pub fn extract_current_run(body: &str) -> Option<RunRecord> {
    let mut clean = body.replacen(COMMENT_IDENTIFIER, "", 1).trim().to_string();

    if clean.starts_with(PREVIOUS_RUNS_HEADER)
        && let Some(separator) = clean.find("\n---\n")
    {
        clean = clean[separator + "\n---\n".len()..].trim().to_string();
    }

    let heading = clean.split('\n').next().unwrap_or_default();
    if !heading.starts_with("## ") || heading.len() <= "## ".len() {
        debug!("no heading found in current run section");
        return None;
    }
    if !heading.contains(COMPLETED_KEYWORD) {
        debug!(heading, "current run is not completed, skipping");
        return None;
    }

    let end = find_content_end(&clean, FOOTER_MARKERS);
    let section = &clean[..end];

    Some(RunRecord {
        summary: summarize_run(section),
        content: section.trim().to_string(),
    })
}

/// Byte offset of the earliest footer marker in `text`, or its length when none occurs.
pub fn find_content_end(text: &str, markers: &[&str]) -> usize {
    markers
        .iter()
        .filter_map(|marker| text.find(marker))
        .min()
        .unwrap_or(text.len())
}

/// Derive a history label such as `Run @ abc1234 (#42)` from a run section.
fn summarize_run(section: &str) -> String {
    let trigger = TRIGGER_RE
        .captures(section)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();
    let run_url = RUN_URL_RE
        .captures(section)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();

    let mut summary = if trigger.is_empty() {
        "Previous Run".to_string()
    } else if let Some(caps) = COMMIT_RE.captures(&trigger) {
        format!("Run @ {}", &caps[1])
    } else {
        let short: String = trigger.chars().take(TRIGGER_SUMMARY_CHARS).collect();
        format!("Run: {short}")
    };

    if let Some(caps) = RUN_ID_RE.captures(&run_url) {
        summary.push_str(&format!(" (#{})", &caps[1]));
    }
    summary
}

/// Assemble a comment body from the current run, previous runs (newest first) and a
/// footer, using the default byte budget.
pub fn build_comment_with_history(
    current_content: &str,
    previous_runs: &[RunRecord],
    footer: &str,
    max_history: usize,
) -> String {
    build_comment_within(
        current_content,
        previous_runs,
        footer,
        HistoryBudget {
            max_history,
            ..HistoryBudget::default()
        },
    )
}

/// Assemble a comment body under an explicit budget.
///
/// History entries are included greedily in the order given. An entry is kept only if the
/// body still fits `budget.max_bytes` with the separator and the notice for the entries
/// after it. The first entry that does not fit is replaced, together with every entry
/// after it, by a single truncation notice. When not even the notice fits, the history
/// section is left out. Current content and footer are always kept whole, so the result
/// exceeds the budget only when they alone do.
pub fn build_comment_within(
    current_content: &str,
    previous_runs: &[RunRecord],
    footer: &str,
    budget: HistoryBudget,
) -> String {
    let mut body = format!("{COMMENT_IDENTIFIER}\n");
    let fixed = body.len() + current_content.len() + footer.len() + HISTORY_SEPARATOR.len();

    let window = &previous_runs[..previous_runs.len().min(budget.max_history)];

    if !window.is_empty() {
        let mut history = format!("{PREVIOUS_RUNS_HEADER}\n\n");
        let mut omitted = 0;

        for (added, run) in window.iter().enumerate() {
            let entry = wrap_history_entry(run);
            let remaining = window.len() - added - 1;
            let reserve = if remaining > 0 {
                truncation_notice(remaining).len()
            } else {
                0
            };
            let projected = fixed + history.len() + entry.len() + reserve;
            if projected > budget.max_bytes {
                omitted = window.len() - added;
                debug!(
                    omitted,
                    projected,
                    max_bytes = budget.max_bytes,
                    "truncating history"
                );
                break;
            }
            history.push_str(&entry);
        }

        if omitted > 0 {
            history.push_str(&truncation_notice(omitted));
        }

        if omitted == window.len() && fixed + history.len() > budget.max_bytes {
            warn!(
                omitted,
                max_bytes = budget.max_bytes,
                "no room for history, dropping the section"
            );
        } else {
            history.push_str(HISTORY_SEPARATOR);
            body.push_str(&history);
        }
    }

    body.push_str(current_content);
    body.push_str(footer);
    body
}

fn wrap_history_entry(run: &RunRecord) -> String {
    format!(
        "<details>\n<summary>📜 {}</summary>\n\n{}\n\n{HISTORY_RUN_END_MARKER}\n</details>\n\n",
        run.summary, run.content
    )
}

fn truncation_notice(omitted: usize) -> String {
    let plural = if omitted > 1 { "s" } else { "" };
    format!(
        "<details>\n<summary>⚠️ {omitted} older run{plural} truncated</summary>\n\n\
         _Older runs were omitted to stay under GitHub's 64KB comment size limit._\n\
         </details>\n\n"
    )
}
