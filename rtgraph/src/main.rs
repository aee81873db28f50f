//! Runtime goal model to container graph generator.
//!
//! Reads a JSON goal model, builds and validates the container graph of every
//! actor, and writes one graph snapshot per actor.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use rtgraph::exit_codes;
use rtgraph::generate::{ActorSummary, generate, is_model_error, validate_model};
use rtgraph::io::config::{DEFAULT_CONFIG_FILE, GeneratorConfig, load_config, validate_goal_ids};
use rtgraph::io::emitter::JsonEmitter;
use rtgraph::io::init::{InitOptions, init_project};
use rtgraph::io::model_store::load_model;
use rtgraph::logging;

#[derive(Parser)]
#[command(
    name = "rtgraph",
    version,
    about = "Translate runtime goal models into time-indexed container graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write `rtgraph.toml`, the model schema and a sample model.
    Init {
        /// Overwrite existing config and schema.
        #[arg(short, long)]
        force: bool,
    },
    /// Build every actor of MODEL and report violations without writing output.
    Validate {
        model: PathBuf,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Build every actor of MODEL and write one graph file per actor.
    Generate {
        model: PathBuf,
        #[command(flatten)]
        scope: ScopeArgs,
        /// Output directory (overrides `output_dir` from the config).
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct ScopeArgs {
    /// Config file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Restrict means-end expansion to these goal ids (repeatable; overrides the config).
    #[arg(long = "goal", value_name = "ID")]
    goals: Vec<String>,
}

impl ScopeArgs {
    fn resolve(&self) -> Result<(GeneratorConfig, BTreeSet<String>)> {
        let cfg = load_config(&self.config)?;
        let goals = if self.goals.is_empty() {
            cfg.selection.goals.clone()
        } else {
            validate_goal_ids(&self.goals)?;
            self.goals.clone()
        };
        Ok((cfg, goals.into_iter().collect()))
    }
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            if is_model_error(&err) {
                exit_codes::MODEL_REJECTED
            } else {
                exit_codes::FAILURE
            }
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(force),
        Command::Validate { model, scope } => cmd_validate(&model, &scope),
        Command::Generate { model, scope, out } => cmd_generate(&model, &scope, out),
    }
}

fn cmd_init(force: bool) -> Result<()> {
    let paths = init_project(Path::new("."), &InitOptions { force })?;
    println!("wrote {}", paths.config_path.display());
    println!("wrote {}", paths.schema_path.display());
    println!("model {}", paths.model_path.display());
    Ok(())
}

fn cmd_validate(model_path: &Path, scope: &ScopeArgs) -> Result<()> {
    let (_, selection) = scope.resolve()?;
    let model = load_model(model_path)?;
    for summary in validate_model(&model, &selection)? {
        println!("{}", summary_line(&summary));
    }
    Ok(())
}

fn cmd_generate(model_path: &Path, scope: &ScopeArgs, out: Option<PathBuf>) -> Result<()> {
    let (cfg, selection) = scope.resolve()?;
    let model = load_model(model_path)?;
    let mut emitter = JsonEmitter::new(out.unwrap_or(cfg.output_dir), cfg.pretty);
    let summaries = generate(&model, &selection, &mut emitter)?;
    for (summary, path) in summaries.iter().zip(emitter.written()) {
        println!("{} -> {}", summary_line(summary), path.display());
    }
    Ok(())
}

fn summary_line(summary: &ActorSummary) -> String {
    format!(
        "{}: {} goals, {} plans",
        summary.actor, summary.goals, summary.plans
    )
}
