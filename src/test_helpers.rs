use crate::params::RunParams;

/// A completed run section as the workflow renders it, for commit `commit` and run `run_id`.
pub fn completed_section(commit: &str, run_id: u64) -> String {
    format!(
        "## ✅ Results of HolmesGPT evals\n\n\
         Automatically triggered by commit {commit} on branch `feat`\n\n\
         [View workflow logs](https://github.com/acme/evals/actions/runs/{run_id})\n\n\
         | Test | Status |\n|------|--------|\n| 01_how_many_pods | ✅ |"
    )
}

/// Automatic-run parameters with sensible defaults for tests.
pub fn auto_params(commit: &str, run_id: u64) -> RunParams {
    RunParams {
        is_manual: false,
        trigger: format!("commit {commit} on branch `feat`"),
        model: "default".to_string(),
        markers: "regression".to_string(),
        filter: String::new(),
        iterations: "1".to_string(),
        branch: "feat".to_string(),
        display_branch: String::new(),
        run_url: format!("https://github.com/acme/evals/actions/runs/{run_id}"),
        pr_number: Some(1),
        comment_id: None,
        test_count: "1".to_string(),
        test_preview: String::new(),
        duration: "N/A".to_string(),
        valid_markers: "regression,easy".to_string(),
        triggered_by: String::new(),
    }
}
