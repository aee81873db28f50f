//! Generator configuration stored in `rtgraph.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "rtgraph.toml";

static GOAL_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^G\d+(?:\.\d+)*$").unwrap());

/// Generator configuration (TOML).
///
/// Missing fields fall back to [`GeneratorConfig::default`], so an empty file
/// is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory receiving one graph file per actor.
    pub output_dir: PathBuf,

    /// Pretty-print emitted JSON.
    pub pretty: bool,

    pub selection: SelectionConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SelectionConfig {
    /// Goal identifiers whose means-end plans are generated. Empty selects
    /// every goal.
    pub goals: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("out"),
            pretty: true,
            selection: SelectionConfig::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(anyhow!("output_dir must not be empty"));
        }
        validate_goal_ids(&self.selection.goals)
    }
}

/// Reject selection entries that cannot name a goal.
pub fn validate_goal_ids(goals: &[String]) -> Result<()> {
    for goal in goals {
        if !GOAL_ID_RE.is_match(goal) {
            return Err(anyhow!(
                "selection.goals entry '{}' is not a goal identifier (expected G#[.#...])",
                goal
            ));
        }
    }
    Ok(())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `GeneratorConfig::default()`.
pub fn load_config(path: &Path) -> Result<GeneratorConfig> {
    if !path.exists() {
        let cfg = GeneratorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GeneratorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &GeneratorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, GeneratorConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("rtgraph.toml");
        let cfg = GeneratorConfig {
            output_dir: PathBuf::from("graphs"),
            pretty: false,
            selection: SelectionConfig {
                goals: vec!["G1".to_string(), "G2.1".to_string()],
            },
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("rtgraph.toml");
        fs::write(&path, "[selection]\ngoals = [\"G3\"]\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
        assert_eq!(cfg.selection.goals, vec!["G3".to_string()]);
    }

    #[test]
    fn rejects_task_id_in_selection() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("rtgraph.toml");
        fs::write(&path, "[selection]\ngoals = [\"T1\"]\n").expect("write");
        let err = load_config(&path).expect_err("must fail");
        assert!(format!("{:#}", err).contains("not a goal identifier"));
    }
}
