use std::time::Duration;

use super::types::{
    LakedeckConfig, LeaderboardSection, ReadinessSection, WorkspaceCredentials, DEFAULT_CATALOG,
    DEFAULT_SCHEMA, DEFAULT_TABLE,
};

pub const ENV_HOST: &str = "DATABRICKS_HOST";
pub const ENV_TOKEN: &str = "DATABRICKS_TOKEN";
pub const ENV_AUTH_TYPE: &str = "DATABRICKS_AUTH_TYPE";

/// Values given on the command line; these win over env and file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub token: Option<String>,
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
}

/// Fully merged runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: WorkspaceCredentials,
    pub auth_type: Option<String>,
    pub request_timeout: Duration,
    pub leaderboard: LeaderboardSection,
    pub pacing: Duration,
    pub readiness: ReadinessSection,
}

/// Merge file config, environment and CLI overrides, in increasing priority.
/// Blank leaderboard names fall back to `main` / `default` / `workshop_leaderboard`.
pub fn resolve(
    config: LakedeckConfig,
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let pick = |cli: &Option<String>, var: &str, file: Option<String>| -> String {
        non_blank(cli.clone())
            .or_else(|| non_blank(env(var)))
            .or_else(|| non_blank(file))
            .unwrap_or_default()
    };

    let host = pick(&overrides.host, ENV_HOST, config.workspace.host.clone());
    let token = pick(&overrides.token, ENV_TOKEN, config.workspace.token.clone());
    let auth_type = non_blank(env(ENV_AUTH_TYPE)).or_else(|| non_blank(config.workspace.auth_type));

    let leaderboard = LeaderboardSection {
        catalog: or_default(&overrides.catalog, config.leaderboard.catalog, DEFAULT_CATALOG),
        schema: or_default(&overrides.schema, config.leaderboard.schema, DEFAULT_SCHEMA),
        table: or_default(&overrides.table, config.leaderboard.table, DEFAULT_TABLE),
    };

    Settings {
        credentials: WorkspaceCredentials::new(&host, &token),
        auth_type,
        request_timeout: Duration::from_secs(config.workspace.request_timeout_secs.max(1)),
        leaderboard,
        pacing: Duration::from_millis(config.provisioning.pacing_ms),
        readiness: config.readiness,
    }
}

/// Resolve against the real process environment.
pub fn resolve_from_env(config: LakedeckConfig, overrides: &Overrides) -> Settings {
    resolve(config, overrides, |var| std::env::var(var).ok())
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn or_default(cli: &Option<String>, file: String, fallback: &str) -> String {
    non_blank(cli.clone())
        .or_else(|| non_blank(Some(file)))
        .unwrap_or_else(|| fallback.to_string())
}
