//! Project scaffolding for `rtgraph init`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::config::{DEFAULT_CONFIG_FILE, GeneratorConfig, write_config};
use super::model_store::MODEL_SCHEMA;

/// Example model covering every annotation operator.
pub const SAMPLE_MODEL: &str = include_str!("../../models/sample.json");

/// Canonical file locations within a project root.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub schema_path: PathBuf,
    pub model_path: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_path: root.join(DEFAULT_CONFIG_FILE),
            schema_path: root.join("schemas").join("model.v1.schema.json"),
            model_path: root.join("model.json"),
            root,
        }
    }
}

/// Options for `init_project`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing files.
    pub force: bool,
}

/// Write a default config, the model schema and a sample model into `root`.
///
/// Fails if the config already exists unless `options.force` is set. The
/// sample model is only written when absent so user models survive `--force`.
pub fn init_project(root: &Path, options: &InitOptions) -> Result<ProjectPaths> {
    let paths = ProjectPaths::new(root);
    if paths.config_path.exists() && !options.force {
        return Err(anyhow!(
            "rtgraph init: {} already exists (use --force to overwrite)",
            paths.config_path.display()
        ));
    }

    write_config(&paths.config_path, &GeneratorConfig::default())?;
    write_file(&paths.schema_path, MODEL_SCHEMA)?;
    if !paths.model_path.exists() {
        write_file(&paths.model_path, SAMPLE_MODEL)?;
    }
    Ok(paths)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write file {}", path.display()))
}
