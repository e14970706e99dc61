//! Startup configuration
//!
//! Resolved once, later layers winning:
//! 1. built-in defaults ([`AnalysisConfig::default`])
//! 2. the TOML file named by `QUIETCC_CONFIG`
//! 3. individual `QUIETCC_*` environment variables
//!
//! A malformed value aborts startup rather than silently falling back.

use anyhow::{Context, Result};
use cc_diagnostics::{AnalysisConfig, ChainDedup, DialectChoice};
use std::path::PathBuf;
use std::str::FromStr;

/// Path of an optional TOML config file
pub const CONFIG_FILE_ENV: &str = "QUIETCC_CONFIG";
/// `tracing` filter directives
pub const LOG_ENV: &str = "QUIETCC_LOG";

pub const SNIPPET_RADIUS_ENV: &str = "QUIETCC_SNIPPET_RADIUS";
pub const PRE_CONTEXT_ENV: &str = "QUIETCC_PRE_CONTEXT_LINES";
pub const POST_CONTEXT_ENV: &str = "QUIETCC_POST_CONTEXT_LINES";
pub const REPORT_DIR_ENV: &str = "QUIETCC_REPORT_DIR";
pub const DEFAULT_COMPILER_ENV: &str = "QUIETCC_DEFAULT_COMPILER";
pub const ESCALATE_ENV: &str = "QUIETCC_ESCALATE_WARNINGS";
pub const CHAIN_DEDUP_ENV: &str = "QUIETCC_CHAIN_DEDUP";
pub const DIALECT_ENV: &str = "QUIETCC_DIALECT";

/// Resolve configuration from the process environment
pub fn load() -> Result<AnalysisConfig> {
    load_from(|key| std::env::var(key).ok())
}

/// Resolve configuration from an arbitrary variable lookup
pub fn load_from(env: impl Fn(&str) -> Option<String>) -> Result<AnalysisConfig> {
    let mut config = match env(CONFIG_FILE_ENV).filter(|p| !p.is_empty()) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read {CONFIG_FILE_ENV}={path}"))?;
            toml::from_str::<AnalysisConfig>(&text)
                .with_context(|| format!("invalid config file {path}"))?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(v) = env(SNIPPET_RADIUS_ENV) {
        config.snippet_radius = parse_var(SNIPPET_RADIUS_ENV, &v)?;
    }
    if let Some(v) = env(PRE_CONTEXT_ENV) {
        config.pre_context_lines = parse_var(PRE_CONTEXT_ENV, &v)?;
    }
    if let Some(v) = env(POST_CONTEXT_ENV) {
        config.post_context_lines = parse_var(POST_CONTEXT_ENV, &v)?;
    }
    if let Some(v) = env(REPORT_DIR_ENV).filter(|v| !v.is_empty()) {
        config.report_dir = PathBuf::from(v);
    }
    if let Some(v) = env(DEFAULT_COMPILER_ENV).filter(|v| !v.is_empty()) {
        config.default_compiler = v;
    }
    if let Some(v) = env(ESCALATE_ENV) {
        config.escalate_warnings = parse_flag(ESCALATE_ENV, &v)?;
    }
    if let Some(v) = env(CHAIN_DEDUP_ENV) {
        config.chain_dedup = parse_var::<ChainDedup>(CHAIN_DEDUP_ENV, &v)?;
    }
    if let Some(v) = env(DIALECT_ENV) {
        config.dialect = parse_var::<DialectChoice>(DIALECT_ENV, &v)?;
    }

    tracing::debug!(
        report_dir = %config.report_dir.display(),
        snippet_radius = config.snippet_radius,
        dialect = ?config.dialect,
        chain_dedup = ?config.chain_dedup,
        "Configuration resolved"
    );
    Ok(config)
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("invalid {key}={value}: {e}"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => anyhow::bail!("invalid {key}={value}: expected true or false"),
    }
}
