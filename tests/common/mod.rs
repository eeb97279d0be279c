#![allow(dead_code)]

use eval_comment::history::RunRecord;

/// A completed run section as the workflow renders it, for commit `commit` and run `run_id`.
pub fn completed_section(commit: &str, run_id: u64) -> String {
    format!(
        "## ✅ Results of HolmesGPT evals\n\n\
         Automatically triggered by commit {commit} on branch `feat`\n\n\
         [View workflow logs](https://github.com/acme/evals/actions/runs/{run_id})\n\n\
         | Test | Status |\n|------|--------|\n| 01_how_many_pods | ✅ |"
    )
}

/// A `RunRecord` matching what `extract_current_run` recovers from [`completed_section`].
pub fn make_run(commit: &str, run_id: u64) -> RunRecord {
    RunRecord::new(
        format!("Run @ {commit} (#{run_id})"),
        completed_section(commit, run_id),
    )
}

/// Raw step outputs as JSON, the way the workflow hands them to the binary.
pub fn raw_params_json(commit: &str, run_id: u64) -> String {
    serde_json::json!({
        "is_manual": "false",
        "trigger_source": format!("commit {commit} on branch `feat`"),
        "run_url": format!("https://github.com/acme/evals/actions/runs/{run_id}"),
        "valid_markers": "regression,easy",
    })
    .to_string()
}
