//! vkprofiles-merge CLI
//!
//! Entry point for the `vkprofiles-merge` command-line tool.

use clap::Parser;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;
use vkprofiles_merge::{EffectiveConfig, MergeReport, Pipeline, PipelineError};

#[derive(Parser)]
#[command(name = "vkprofiles-merge")]
#[command(about = "Combine Vulkan profiles by union or intersection", version)]
struct Cli {
    /// Registry snapshot (JSON) describing structs, members and limit types
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Merge mode: union or intersection (default: union)
    #[arg(long)]
    mode: Option<String>,

    /// Input profiles file; repeat and pair with --profile in order
    #[arg(long = "profile-path", conflicts_with = "profile_dir")]
    profile_paths: Vec<PathBuf>,

    /// Profile to merge; repeat for each input
    #[arg(long = "profile")]
    profiles: Vec<String>,

    /// Directory whose profile files are searched for each --profile
    #[arg(long = "profile-dir")]
    profile_dir: Option<PathBuf>,

    /// Output file (default: <output profile>.json)
    #[arg(long = "output-path")]
    output_path: Option<PathBuf>,

    /// Name of the generated profile (default: VP_LUNARG_merged_<timestamp>)
    #[arg(long = "output-profile")]
    output_profile: Option<String>,

    /// Config file (default: .vkprofiles/merge.toml when present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Log merge decisions
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    /// The CLI layer of the configuration; only flags actually given are set.
    fn overrides(&self) -> Value {
        let mut root = Map::new();
        if let Some(registry) = &self.registry {
            root.insert("registry".into(), json!(registry));
        }
        if let Some(mode) = &self.mode {
            root.insert("mode".into(), json!(mode));
        }

        let mut inputs = Map::new();
        if !self.profile_paths.is_empty() {
            inputs.insert("profile_paths".into(), json!(self.profile_paths));
        }
        if !self.profiles.is_empty() {
            inputs.insert("profiles".into(), json!(self.profiles));
        }
        if let Some(dir) = &self.profile_dir {
            inputs.insert("profile_dir".into(), json!(dir));
        }
        if !inputs.is_empty() {
            root.insert("inputs".into(), Value::Object(inputs));
        }

        let mut output = Map::new();
        if let Some(path) = &self.output_path {
            output.insert("path".into(), json!(path));
        }
        if let Some(profile) = &self.output_profile {
            output.insert("profile".into(), json!(profile));
        }
        if !output.is_empty() {
            root.insert("output".into(), Value::Object(output));
        }

        Value::Object(root)
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(report) => print_report(&report),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<MergeReport, PipelineError> {
    let config_file = EffectiveConfig::discover(cli.config.as_deref(), Path::new("."));
    let config = EffectiveConfig::build(config_file.as_deref(), Some(cli.overrides()))?;
    if let Ok(json) = config.to_json() {
        tracing::debug!("effective configuration:\n{json}");
    }
    let settings = config.settings()?;
    Pipeline::new(settings).run()
}

fn print_report(report: &MergeReport) {
    println!(
        "Merged {} profiles ({}) into {} at {}",
        report.inputs.len(),
        report.mode,
        report.profile_name,
        report.output_path.display()
    );
    if !report.diagnostics.is_empty() {
        println!("{} merge diagnostics:", report.diagnostics.len());
        for diagnostic in &report.diagnostics {
            println!("  {}", diagnostic.to_code());
        }
    }
}
