use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::TranspileError;
use crate::executor::json::val_to_display_json;
use crate::executor::Val;
use crate::orchestrator::{Orchestrator, OutcomeHandler, TranspileRequest};
use crate::sandbox::ScopeMapping;
use crate::transform::passes::{create_pass, PLUGINS, PRESETS};
use crate::transform::transform;

#[derive(Parser)]
#[command(name = "transpile")]
#[command(about = "Transpile - Transform and run modern script source in a sandbox", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Preset to apply (repeatable; replaces the configured list)
    #[arg(long = "preset", global = true)]
    pub presets: Vec<String>,

    /// Plugin to apply (repeatable; replaces the configured list)
    #[arg(long = "plugin", global = true)]
    pub plugins: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the target code for a source file
    Compile {
        /// Source file
        file: PathBuf,
    },

    /// Transform and run a source file once, printing the result as JSON
    Run {
        /// Source file
        file: PathBuf,

        /// JSON object mapping import specifiers to values
        #[arg(short = 's', long = "scope")]
        scope: Option<PathBuf>,
    },

    /// Re-run a source file every time it changes
    Watch {
        /// Source file
        file: PathBuf,

        /// JSON object mapping import specifiers to values
        #[arg(short = 's', long = "scope")]
        scope: Option<PathBuf>,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "500")]
        interval_ms: u64,

        /// Stop after this many polls
        #[arg(long)]
        max_cycles: Option<u64>,
    },

    /// List available presets and plugins
    Presets,

    /// Print the effective configuration as TOML
    Config,
}

/// Run the CLI by parsing process arguments
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

/// Run the CLI with provided arguments
pub fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli)
}

/// Internal function that handles CLI commands
fn run_cli_with_args(cli: Cli) -> Result<()> {
    // Load config before any command so config errors show first
    let config = Config::builder()
        .config_path(cli.config)
        .presets(cli.presets)
        .plugins(cli.plugins)
        .build()?;

    init_logging(&config.log.filter);
    debug!(?config, "Loaded configuration");

    match cli.command {
        Commands::Compile { file } => {
            let source = read_source(&file)?;
            match transform(&source, &config.transform) {
                Ok(target) => println!("{}", target),
                Err(err) => {
                    eprintln!("{}", err);
                    std::process::exit(1);
                }
            }
        }

        Commands::Run { file, scope } => {
            let source = read_source(&file)?;
            let scope = load_scope(scope.as_deref())?;
            let evaluator = config.sandbox.evaluator();

            let mut orchestrator = Orchestrator::new();
            let succeeded = orchestrator
                .process(
                    TranspileRequest::new(&source, &config.transform, &scope, &evaluator),
                    &mut Printer,
                )
                .unwrap_or(false);

            if !succeeded {
                std::process::exit(1);
            }
        }

        Commands::Watch {
            file,
            scope,
            interval_ms,
            max_cycles,
        } => {
            let scope = load_scope(scope.as_deref())?;
            let evaluator = config.sandbox.evaluator();
            let interval = Duration::from_millis(interval_ms);

            let mut orchestrator = Orchestrator::new();
            let mut polls = 0u64;
            loop {
                match read_source(&file) {
                    Ok(source) => {
                        orchestrator.process(
                            TranspileRequest::new(&source, &config.transform, &scope, &evaluator),
                            &mut Printer,
                        );
                    }
                    // The file may be mid-save; try again next poll
                    Err(err) => warn!("{:#}", err),
                }

                polls += 1;
                if max_cycles.is_some_and(|max| polls >= max) {
                    break;
                }
                std::thread::sleep(interval);
            }

            let stats = orchestrator.stats();
            debug!(
                polls,
                transforms = stats.transforms,
                executions = stats.executions,
                skipped = stats.skipped,
                "Watch finished"
            );
        }

        Commands::Presets => {
            println!("Presets:");
            for preset in PRESETS {
                println!("  {:<12} {}", preset.name, preset.description);
                println!("  {:<12} plugins: {}", "", preset.plugins.join(", "));
            }

            println!("\nPlugins:");
            for name in PLUGINS {
                let description = create_pass(name)
                    .map(|pass| pass.description())
                    .unwrap_or_default();
                println!("  {:<34} {}", name, description);
            }
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// Install the stderr subscriber; `RUST_LOG` overrides the configured filter
fn init_logging(filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    // A subscriber may already be installed when called from an embedding host
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read source file: {:?}", path))
}

fn load_scope(path: Option<&Path>) -> Result<ScopeMapping> {
    let Some(path) = path else {
        return Ok(ScopeMapping::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scope file: {:?}", path))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse scope file: {:?}", path))?;
    ScopeMapping::from_json(&json)
}

/// Prints outcomes; results to stdout as JSON, errors to stderr
struct Printer;

impl OutcomeHandler for Printer {
    /// Whether the outcome was a success
    type Output = bool;

    fn on_error(&mut self, error: &TranspileError) -> bool {
        eprintln!("{}", error);
        if let TranspileError::Runtime(err) = error {
            for location in err.trace.iter().skip(1) {
                eprintln!("    at {}", location);
            }
        }
        false
    }

    fn on_result(&mut self, value: &Val) -> bool {
        match val_to_display_json(value) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                warn!("{:#}", err);
                println!("{:?}", value);
            }
        }
        true
    }

    fn on_pending(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::parse_from([
            "transpile",
            "--preset",
            "es2015",
            "--preset",
            "react",
            "run",
            "app.js",
            "--scope",
            "scope.json",
        ]);

        assert_eq!(cli.presets, vec!["es2015", "react"]);
        assert!(cli.plugins.is_empty());
        let Commands::Run { file, scope } = cli.command else {
            unreachable!("Expected run command");
        };
        assert_eq!(file, PathBuf::from("app.js"));
        assert_eq!(scope, Some(PathBuf::from("scope.json")));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "transpile",
            "watch",
            "app.js",
            "--plugin",
            "transform-react-inline-elements",
            "--max-cycles",
            "3",
        ]);

        assert_eq!(cli.plugins, vec!["transform-react-inline-elements"]);
        let Commands::Watch {
            interval_ms,
            max_cycles,
            ..
        } = cli.command
        else {
            unreachable!("Expected watch command");
        };
        assert_eq!(interval_ms, 500);
        assert_eq!(max_cycles, Some(3));
    }

    #[test]
    fn test_load_scope_defaults_to_empty() {
        assert!(load_scope(None).unwrap().is_empty());
    }

    #[test]
    fn test_printer_reports_success() {
        assert!(Printer.on_result(&Val::Num(1.0)));
        assert!(!Printer.on_pending());
    }
}
