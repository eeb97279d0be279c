use std::path::Path;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::history::{
    DEFAULT_MAX_COMMENT_SIZE, DEFAULT_MAX_HISTORY, GITHUB_COMMENT_LIMIT, HistoryBudget,
};
use crate::render::WorkflowTarget;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = ".eval-comment.toml";

pub const DEFAULT_WORKFLOW_FILE: &str = "eval-regression.yaml";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub max_history: Option<usize>,
    pub max_comment_size: Option<usize>,
    pub repository: Option<String>,
    pub workflow_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub max_history: usize,
    pub max_comment_size: usize,
    pub repository: Option<String>,
    pub workflow_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            max_comment_size: DEFAULT_MAX_COMMENT_SIZE,
            repository: None,
            workflow_file: DEFAULT_WORKFLOW_FILE.to_string(),
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = match cli.config.as_deref() {
            Some(path) => {
                let config_path = Path::new(path);
                if !config_path.exists() {
                    return Err(Error::ConfigNotFound(config_path.to_path_buf()));
                }
                parse_config(&std::fs::read_to_string(config_path)?)?
            }
            None => {
                let config_path = Path::new(DEFAULT_CONFIG_PATH);
                if config_path.exists() {
                    parse_config(&std::fs::read_to_string(config_path)?)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        let config = merge(file_config, cli);
        validate_limits(Some(config.max_history), Some(config.max_comment_size))?;
        if let Some(ref repository) = config.repository {
            validate_repository(repository)?;
        }
        Ok(config)
    }

    pub fn budget(&self) -> HistoryBudget {
        HistoryBudget {
            max_history: self.max_history,
            max_bytes: self.max_comment_size,
        }
    }

    /// Workflow links target, required to render the footer.
    pub fn workflow_target(&self) -> Result<WorkflowTarget> {
        let repository = self.repository.clone().ok_or_else(|| {
            Error::ConfigValidation(
                "repository is not set (use --repo, GITHUB_REPOSITORY or `repository` in the config file)"
                    .to_string(),
            )
        })?;
        Ok(WorkflowTarget {
            repository,
            workflow_file: self.workflow_file.clone(),
        })
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConfigFile) -> Result<()> {
    validate_limits(config.max_history, config.max_comment_size)?;
    if let Some(ref repository) = config.repository {
        validate_repository(repository)?;
    }
    if let Some(ref workflow_file) = config.workflow_file
        && workflow_file.trim().is_empty()
    {
        return Err(Error::ConfigValidation(
            "workflow_file must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_limits(max_history: Option<usize>, max_comment_size: Option<usize>) -> Result<()> {
    if max_history == Some(0) {
        return Err(Error::ConfigValidation(
            "max_history must be > 0".to_string(),
        ));
    }
    if let Some(size) = max_comment_size
        && (size == 0 || size > GITHUB_COMMENT_LIMIT)
    {
        return Err(Error::ConfigValidation(format!(
            "max_comment_size must be between 1 and {GITHUB_COMMENT_LIMIT}, got {size}"
        )));
    }
    Ok(())
}

fn validate_repository(repository: &str) -> Result<()> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => Err(Error::ConfigValidation(format!(
            "repository must be owner/name, got {repository:?}"
        ))),
    }
}

pub fn merge(file: ConfigFile, cli: &Cli) -> Config {
    Config {
        max_history: cli
            .max_history
            .or(file.max_history)
            .unwrap_or(DEFAULT_MAX_HISTORY),
        max_comment_size: cli
            .max_comment_size
            .or(file.max_comment_size)
            .unwrap_or(DEFAULT_MAX_COMMENT_SIZE),
        repository: cli.repo.clone().or(file.repository),
        workflow_file: cli
            .workflow_file
            .clone()
            .or(file.workflow_file)
            .unwrap_or_else(|| DEFAULT_WORKFLOW_FILE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
max_history = 3
max_comment_size = 50000
repository = "acme/evals"
workflow_file = "nightly.yaml"
"#;
        let config = parse_config(toml).unwrap();
        assert_eq!(config.max_history, Some(3));
        assert_eq!(config.max_comment_size, Some(50_000));
        assert_eq!(config.repository.as_deref(), Some("acme/evals"));
        assert_eq!(config.workflow_file.as_deref(), Some("nightly.yaml"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_parse_zero_max_history() {
        let err = parse_config("max_history = 0").unwrap_err();
        assert!(err.to_string().contains("max_history must be > 0"));
    }

    #[test]
    fn test_parse_comment_size_above_platform_limit() {
        let err = parse_config("max_comment_size = 70000").unwrap_err();
        assert!(err.to_string().contains("max_comment_size must be between"));
    }

    #[test]
    fn test_parse_comment_size_at_platform_limit() {
        let config = parse_config("max_comment_size = 65536").unwrap();
        assert_eq!(config.max_comment_size, Some(GITHUB_COMMENT_LIMIT));
    }

    #[test]
    fn test_parse_invalid_repository() {
        for repo in ["acme", "acme/", "/evals", "acme/evals/extra"] {
            let err = parse_config(&format!("repository = \"{repo}\"")).unwrap_err();
            assert!(err.to_string().contains("owner/name"), "{repo}");
        }
    }

    #[test]
    fn test_parse_empty_workflow_file() {
        let err = parse_config(r#"workflow_file = " ""#).unwrap_err();
        assert!(err.to_string().contains("workflow_file must not be empty"));
    }

    #[test]
    fn test_parse_unknown_field() {
        let toml = r#"bogus = "value""#;
        let err = parse_config(toml).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn test_cli_overrides_config() {
        let file = ConfigFile {
            max_history: Some(3),
            max_comment_size: Some(40_000),
            repository: Some("file/repo".to_string()),
            ..Default::default()
        };
        let cli = Cli::parse_from([
            "eval-comment",
            "--max-history",
            "7",
            "--repo",
            "cli/repo",
            "history",
            "comment.md",
        ]);
        let config = merge(file, &cli);
        assert_eq!(config.max_history, 7); // CLI wins
        assert_eq!(config.repository.as_deref(), Some("cli/repo")); // CLI wins
        assert_eq!(config.max_comment_size, 40_000); // file value kept
        assert_eq!(config.workflow_file, DEFAULT_WORKFLOW_FILE);
    }

    #[test]
    fn test_defaults_applied() {
        let cli = Cli::parse_from(["eval-comment", "history", "comment.md"]);
        let config = merge(ConfigFile::default(), &cli);
        assert_eq!(config.max_history, 5);
        assert_eq!(config.max_comment_size, 60_000);
        assert_eq!(config.workflow_file, "eval-regression.yaml");
        assert_eq!(config.budget(), HistoryBudget::default());
    }

    #[test]
    fn test_workflow_target_requires_repository() {
        let config = Config::default();
        let err = config.workflow_target().unwrap_err();
        assert!(err.to_string().contains("repository is not set"));

        let config = Config {
            repository: Some("acme/evals".to_string()),
            ..Config::default()
        };
        let target = config.workflow_target().unwrap();
        assert_eq!(target.repository, "acme/evals");
        assert_eq!(target.workflow_file, DEFAULT_WORKFLOW_FILE);
    }

    #[test]
    fn test_load_missing_explicit_config() {
        let cli = Cli::parse_from([
            "eval-comment",
            "--config",
            "/nonexistent/eval-comment.toml",
            "history",
            "comment.md",
        ]);
        let err = Config::load(&cli).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn test_load_rejects_cli_zero_history() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_history = 2\n").unwrap();
        let cli = Cli::parse_from([
            "eval-comment",
            "--config",
            path.to_str().unwrap(),
            "--max-history",
            "0",
            "history",
            "comment.md",
        ]);
        let err = Config::load(&cli).unwrap_err();
        assert!(err.to_string().contains("max_history must be > 0"));
    }
}
