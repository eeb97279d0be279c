use std::str::FromStr;

use serde::Serialize;
use url::Url;

use crate::error::Result;
use crate::history::{COMMANDS_MARKER, LEGEND_MARKER, RERUN_MARKER, VALID_MARKERS_MARKER};
use crate::params::RunParams;

const RERUN_TEMPLATE: &str = include_str!("default_templates/rerun-footer.md");

const LEGEND_TABLE: &str = "\
| Icon | Meaning |
|------|--------|
| ✅ | The test was successful |
| ➖ | The test was skipped |
| ⚠️ | The test failed but is known to be flaky or known to fail |
| 🚧 | The test had a setup failure (not a code regression) |
| 🔧 | The test failed due to mock data issues (not a code regression) |
| 🚫 | The test was throttled by API rate limits/overload |
| ❌ | The test failed and should be fixed before merging the PR |
";

pub const MANUAL_RUNNING_TITLE: &str = "Manual Eval Running...";
pub const AUTO_RUNNING_TITLE: &str = "HolmesGPT evals running...";

/// One line of the progress checklist shown while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStep {
    pub done: bool,
    pub text: String,
}

impl ProgressStep {
    pub fn done(text: impl Into<String>) -> Self {
        Self {
            done: true,
            text: text.into(),
        }
    }

    pub fn pending(text: impl Into<String>) -> Self {
        Self {
            done: false,
            text: text.into(),
        }
    }
}

/// Parses `done:<text>` or `todo:<text>`.
impl FromStr for ProgressStep {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("done", text)) => Ok(Self::done(text.trim())),
            Some(("todo", text)) => Ok(Self::pending(text.trim())),
            _ => Err(format!("expected done:<text> or todo:<text>, got {s:?}")),
        }
    }
}

/// Repository and workflow the rerun links point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowTarget {
    /// `owner/name`
    pub repository: String,
    pub workflow_file: String,
}

impl WorkflowTarget {
    pub fn base_url(&self) -> String {
        format!(
            "https://github.com/{}/actions/workflows/{}",
            self.repository, self.workflow_file
        )
    }

    /// Workflow page URL, preselecting `branch` when one is given.
    pub fn url_for_branch(&self, branch: &str) -> Result<String> {
        if branch.is_empty() {
            return Ok(self.base_url());
        }
        let mut url = Url::parse(&self.base_url())?;
        url.query_pairs_mut().append_pair("ref", branch);
        Ok(url.to_string())
    }

    fn gh_command(&self, branch: &str) -> String {
        let ref_arg = if branch.is_empty() {
            String::new()
        } else {
            format!(" --ref {branch}")
        };
        format!(
            "gh workflow run {} --repo {}{ref_arg} -f markers=regression -f filter=",
            self.workflow_file, self.repository
        )
    }
}

/// Optional overrides for [`build_body`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyExtras<'a> {
    pub icon: Option<&'a str>,
    pub title: Option<&'a str>,
    pub test_preview: Option<&'a str>,
    pub target: Option<&'a WorkflowTarget>,
}

pub fn render_progress(steps: &[ProgressStep]) -> String {
    steps
        .iter()
        .map(|step| {
            if step.done {
                format!("- [x] {}", step.text)
            } else {
                format!("- [ ] {}", step.text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parameter table shown on manual runs.
pub fn render_params_table(p: &RunParams, target: Option<&WorkflowTarget>) -> Result<String> {
    let mut workflow_links = format!("[View logs]({})", p.run_url);
    if let Some(target) = target {
        let rerun_url = target.url_for_branch(&p.display_branch)?;
        workflow_links.push_str(&format!(" \\| [Rerun]({rerun_url})"));
    }

    let mut table = String::from("| Parameter | Value |\n|-----------|-------|\n");
    table.push_str(&format!("| **Triggered via** | {} |\n", p.trigger));
    if !p.display_branch.is_empty() {
        table.push_str(&format!("| **Branch** | `{}` |\n", p.display_branch));
    }
    table.push_str(&format!("| **Model** | `{}` |\n", p.model));
    let markers = if p.markers.is_empty() {
        "all LLM tests"
    } else {
        p.markers.as_str()
    };
    table.push_str(&format!("| **Markers** | `{markers}` |\n"));
    if !p.filter.is_empty() {
        table.push_str(&format!("| **Filter (-k)** | `{}` |\n", p.filter));
    }
    table.push_str(&format!("| **Iterations** | {} |\n", p.iterations));
    if !p.duration.is_empty() {
        table.push_str(&format!("| **Duration** | {} |\n", p.duration));
    }
    table.push_str(&format!("| **Workflow** | {workflow_links} |\n"));
    Ok(table)
}

/// Heading and run details of the current run section.
///
/// `progress` of `None` hides the checklist, which is how completed runs are rendered.
pub fn build_body(
    p: &RunParams,
    progress: Option<&[ProgressStep]>,
    extras: &BodyExtras<'_>,
) -> Result<String> {
    let mut body = if p.is_manual {
        format!(
            "## {} {}\n\n{}",
            extras.icon.unwrap_or("🚀"),
            extras.title.unwrap_or(MANUAL_RUNNING_TITLE),
            render_params_table(p, extras.target)?
        )
    } else {
        format!(
            "## {} {}\n\nAutomatically triggered by {}\n\n[View workflow logs]({})\n",
            extras.icon.unwrap_or("⏳"),
            extras.title.unwrap_or(AUTO_RUNNING_TITLE),
            p.trigger,
            p.run_url
        )
    };

    if let Some(steps) = progress {
        body.push_str(&format!("\n**Progress:**\n{}\n", render_progress(steps)));
    }

    if let Some(preview) = extras.test_preview.filter(|s| !s.is_empty()) {
        body.push_str(&format!(
            "\n<details>\n<summary>📋 Evals to run</summary>\n\n```\n{preview}\n```\n</details>\n"
        ));
    }

    Ok(body)
}

/// `a, b` -> `` `a`, `b` ``. Empty input renders a loading placeholder.
pub fn format_as_codes(items: &str) -> String {
    if items.is_empty() {
        return "_(loading...)_".to_string();
    }
    items
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| format!("`{item}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Serialize)]
struct RerunContext<'a> {
    workflow_url: &'a str,
    gh_command: &'a str,
}

/// Footer with re-run instructions, valid markers and the command list.
///
/// Each section opens with one of the footer markers the history codec scans for, so the
/// footer is never captured into a run record.
pub fn build_rerun_footer(
    p: &RunParams,
    target: &WorkflowTarget,
    include_legend: bool,
) -> Result<String> {
    let workflow_url = target.url_for_branch(&p.display_branch)?;
    let gh_command = target.gh_command(&p.display_branch);

    let mut footer = String::new();

    if include_legend {
        footer.push('\n');
        footer.push_str(LEGEND_MARKER);
        footer.push_str("</summary>\n\n");
        footer.push_str(LEGEND_TABLE);
        footer.push_str("</details>\n");
    }

    footer.push('\n');
    footer.push_str(RERUN_MARKER);
    footer.push_str("</summary>\n\n");
    footer.push_str(&render_rerun_instructions(&workflow_url, &gh_command)?);

    footer.push('\n');
    footer.push_str(VALID_MARKERS_MARKER);
    footer.push_str("</summary>\n\n");
    footer.push_str(&format_as_codes(&p.valid_markers));
    footer.push_str("\n</details>\n");

    footer.push_str(COMMANDS_MARKER);
    footer.push_str(" `/eval` · `/rerun` · `/list`\n\n");
    footer.push_str(&format!("**CLI:** `{gh_command}`\n"));

    Ok(footer)
}

fn render_rerun_instructions(workflow_url: &str, gh_command: &str) -> Result<String> {
    let engine = upon::Engine::new();
    let template = engine.compile(RERUN_TEMPLATE)?;
    Ok(template
        .render(
            &engine,
            RerunContext {
                workflow_url,
                gh_command,
            },
        )
        .to_string()?)
}
