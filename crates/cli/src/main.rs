mod render;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use cuvee_core::ExecutionSnapshot;
use cuvee_score::{calculate_compliance, overdue_steps, step_statuses, ScoringConfig};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Cuvee protocol compliance toolchain.
#[derive(Parser)]
#[command(name = "cuvee", version, about = "Cuvee protocol compliance scoring tool")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score an execution snapshot against its protocol
    Score {
        /// Path to the execution snapshot JSON file
        snapshot: PathBuf,
        /// Path to a ScoringConfig override JSON file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a snapshot file's structural integrity
    Validate {
        /// Path to the execution snapshot JSON file
        snapshot: PathBuf,
    },

    /// Explain a scored snapshot step by step in human-readable form
    Explain {
        /// Path to the execution snapshot JSON file
        snapshot: PathBuf,
        /// Path to a ScoringConfig override JSON file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List steps past their deadline with nothing on record
    Overdue {
        /// Path to the execution snapshot JSON file
        snapshot: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Score { snapshot, config } => {
            cmd_score(&snapshot, config.as_deref(), cli.output, cli.quiet);
        }
        Commands::Validate { snapshot } => {
            cmd_validate(&snapshot, cli.output, cli.quiet);
        }
        Commands::Explain { snapshot, config } => {
            cmd_explain(&snapshot, config.as_deref(), cli.quiet);
        }
        Commands::Overdue { snapshot } => {
            cmd_overdue(&snapshot, cli.output, cli.quiet);
        }
    }
}

fn cmd_score(path: &Path, config_path: Option<&Path>, output: OutputFormat, quiet: bool) {
    let snapshot = load_snapshot_or_exit(path, output, quiet);
    let config = load_config_or_exit(config_path, output, quiet);

    match calculate_compliance(&snapshot, &config) {
        Ok(result) => match output {
            OutputFormat::Json => {
                let pretty = serde_json::to_string_pretty(&result)
                    .unwrap_or_else(|e| format!("serialization error: {}", e));
                println!("{}", pretty);
            }
            OutputFormat::Text => render::print_score_summary(&snapshot, &result, quiet),
        },
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_validate(path: &Path, output: OutputFormat, quiet: bool) {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            report_error(
                &format!("error reading file '{}': {}", path.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    };

    match ExecutionSnapshot::from_json_str(&raw) {
        Ok(snapshot) => {
            if !quiet {
                println!(
                    "snapshot ok: protocol '{}', {} steps, {} completion records",
                    snapshot.protocol.id,
                    snapshot.steps.len(),
                    snapshot.completions.len()
                );
            }
        }
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(2);
        }
    }
}

fn cmd_explain(path: &Path, config_path: Option<&Path>, quiet: bool) {
    // Explain is a human-facing rendering; it always writes text.
    let snapshot = load_snapshot_or_exit(path, OutputFormat::Text, quiet);
    let config = load_config_or_exit(config_path, OutputFormat::Text, quiet);

    let result = match calculate_compliance(&snapshot, &config) {
        Ok(result) => result,
        Err(e) => {
            report_error(&e.to_string(), OutputFormat::Text, quiet);
            process::exit(1);
        }
    };
    let statuses = match step_statuses(&snapshot, &config) {
        Ok(statuses) => statuses,
        Err(e) => {
            report_error(&e.to_string(), OutputFormat::Text, quiet);
            process::exit(1);
        }
    };

    render::print_explanation(&snapshot, &config, &result, &statuses);
}

fn cmd_overdue(path: &Path, output: OutputFormat, quiet: bool) {
    let snapshot = load_snapshot_or_exit(path, output, quiet);

    match overdue_steps(&snapshot) {
        Ok(overdue) => {
            match output {
                OutputFormat::Json => {
                    let pretty = serde_json::to_string_pretty(&overdue)
                        .unwrap_or_else(|e| format!("serialization error: {}", e));
                    println!("{}", pretty);
                }
                OutputFormat::Text => render::print_overdue(&overdue, quiet),
            }
            if !overdue.is_empty() {
                process::exit(2);
            }
        }
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}

fn load_snapshot_or_exit(path: &Path, output: OutputFormat, quiet: bool) -> ExecutionSnapshot {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            report_error(
                &format!("error reading file '{}': {}", path.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    };
    match ExecutionSnapshot::from_json_str(&raw) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            report_error(
                &format!("invalid snapshot '{}': {}", path.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    }
}

fn load_config_or_exit(path: Option<&Path>, output: OutputFormat, quiet: bool) -> ScoringConfig {
    let Some(path) = path else {
        return ScoringConfig::default();
    };
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            report_error(
                &format!("error reading file '{}': {}", path.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    };
    match serde_json::from_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            report_error(
                &format!("invalid config '{}': {}", path.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    }
}

fn report_error(message: &str, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::json!({ "error": message });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&err_json)
                    .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", message))
            );
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("error: {}", message);
            }
        }
    }
}
