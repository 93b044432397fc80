use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::{debug, info};
use vigil_compose::{receive_args, reconcile_receive, reconcile_store_endpoint, ComposerConfig};
use vigil_core::{Installation, Peers, ResourceDescriptor};
use vigil_manifest::{diff_against, plan, to_yaml_stream, Action};

#[derive(Parser, Debug)]
#[command(name = "vigilctl", version, about = "Vigil CLI: compose desired state offline")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Yaml)]
    output: Output,

    /// Composer configuration file (YAML)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Yaml, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render every descriptor for the input snapshot
    Render {
        /// Input snapshot: installation plus peers
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
    /// Compare a fresh rendering against a previously rendered manifest stream
    Diff {
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
        /// Previously rendered YAML stream
        #[arg(long = "against")]
        against: PathBuf,
    },
    /// Print the receive argument list
    Args {
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
}

/// One observed snapshot: the installation being reconciled and its peers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderInput {
    installation: Installation,
    #[serde(default)]
    peers: Peers,
}

fn init_tracing() {
    let env = std::env::var("VIGIL_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn load_config(path: Option<&Path>) -> Result<ComposerConfig> {
    let raw = match path {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("reading config {}", p.display()))?,
        None => String::new(),
    };
    let cfg = ComposerConfig::from_yaml(&raw).context("parsing composer config")?;
    Ok(cfg.with_overrides(|k| std::env::var(k).ok()))
}

fn load_input(path: &Path) -> Result<RenderInput> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading input {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("parsing input {}", path.display()))
}

/// Receive descriptors first, then one group per store endpoint.
fn compose(input: &RenderInput, cfg: &ComposerConfig) -> Result<Vec<ResourceDescriptor>> {
    let mut out = reconcile_receive(&input.installation, &input.peers, cfg)
        .with_context(|| format!("composing {}/{}", input.installation.namespace, input.installation.name))?;
    for ep in &input.peers.store_endpoints {
        let descriptors = reconcile_store_endpoint(ep, cfg)
            .with_context(|| format!("composing store endpoint {}/{}", ep.namespace, ep.name))?;
        out.extend(descriptors);
    }
    Ok(out)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;
    debug!(cluster_domain = %cfg.cluster_domain, operator = %cfg.operator_name, "config loaded");

    match cli.command {
        Commands::Render { file } => {
            info!(file = %file.display(), "render invoked");
            let input = load_input(&file)?;
            let rendered = plan(&compose(&input, &cfg)?)?;
            match cli.output {
                Output::Yaml => print!("{}", to_yaml_stream(&rendered)?),
                Output::Json => println!("{}", serde_json::to_string_pretty(&rendered)?),
            }
        }
        Commands::Diff { file, against } => {
            info!(file = %file.display(), against = %against.display(), "diff invoked");
            let input = load_input(&file)?;
            let previous = std::fs::read_to_string(&against)
                .with_context(|| format!("reading previous manifest {}", against.display()))?;
            let diffs = diff_against(&compose(&input, &cfg)?, &previous)?;
            match cli.output {
                Output::Yaml => {
                    println!("ACTION     OBJECT                                   +ADD ~UPD -REM");
                    for d in &diffs {
                        if d.action == Action::Noop { continue; }
                        let action = serde_json::to_value(d.action)?;
                        println!(
                            "{:<10} {:<40} {:>4} {:>4} {:>4}",
                            action.as_str().unwrap_or("-"),
                            d.object.to_string(),
                            d.summary.adds,
                            d.summary.updates,
                            d.summary.removes
                        );
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&diffs)?),
            }
        }
        Commands::Args { file } => {
            info!(file = %file.display(), "args invoked");
            let input = load_input(&file)?;
            let args = receive_args(&input.installation, &input.peers, &cfg)
                .with_context(|| format!("composing {}/{}", input.installation.namespace, input.installation.name))?;
            let Some(args) = args else {
                eprintln!("installation {}/{} has no receive block", input.installation.namespace, input.installation.name);
                return Ok(());
            };
            match cli.output {
                Output::Yaml => {
                    for a in args.to_vec() {
                        println!("{}", a);
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&args.into_vec())?),
            }
        }
    }

    Ok(())
}
