use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use super::types::LakedeckConfig;

pub const DEFAULT_CONFIG_FILE: &str = "lakedeck.yaml";

/// Load the YAML config file.
///
/// - If `path` is given it must exist.
/// - Otherwise `lakedeck.yaml` in the current directory is used when present,
///   and built-in defaults when it is not.
pub fn load_config(path: Option<&str>) -> Result<LakedeckConfig> {
    match path {
        Some(p) => {
            let file = Path::new(p);
            if !file.is_file() {
                bail!("Config not found: '{}'", p);
            }
            read_file(file)
        }
        None => {
            let file = Path::new(DEFAULT_CONFIG_FILE);
            if file.is_file() {
                read_file(file)
            } else {
                tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                Ok(LakedeckConfig::default())
            }
        }
    }
}

fn read_file(file: &Path) -> Result<LakedeckConfig> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read config file: {}", file.display()))?;
    parse_config(&content).with_context(|| format!("Failed to parse YAML in: {}", file.display()))
}

/// Parse YAML content into a LakedeckConfig.
pub fn parse_config(content: &str) -> Result<LakedeckConfig> {
    if content.trim().is_empty() {
        return Ok(LakedeckConfig::default());
    }
    let config: LakedeckConfig =
        serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config_fills_defaults() {
        let yaml = r#"
workspace:
  host: "https://adb-123.azuredatabricks.net/"
leaderboard:
  table: quiz_scores
readiness:
  timeout_secs: 60
"#;
        let cfg = parse_config(yaml).unwrap();
        assert_eq!(
            cfg.workspace.host.as_deref(),
            Some("https://adb-123.azuredatabricks.net/")
        );
        assert_eq!(cfg.workspace.request_timeout_secs, 30);
        assert_eq!(cfg.leaderboard.catalog, "main");
        assert_eq!(cfg.leaderboard.schema, "default");
        assert_eq!(cfg.leaderboard.table, "quiz_scores");
        assert_eq!(cfg.provisioning.pacing_ms, 1000);
        assert_eq!(cfg.readiness.poll_interval_secs, 10);
        assert_eq!(cfg.readiness.timeout_secs, 60);
    }

    #[test]
    fn test_empty_config_is_default() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.leaderboard.table, "workshop_leaderboard");
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        assert!(parse_config("workspace: [unclosed").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        assert!(load_config(Some("/definitely/not/here.yaml")).is_err());
    }
}
