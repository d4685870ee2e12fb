pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::analyze::AnalyzeStage;

#[derive(Debug, Parser)]
#[command(
    name = "sarpipe",
    about = "SAR pipeline operator CLI",
    long_about = "Run risk classification and SAR narrative generation for a case, inspect configuration, and summarise the audit trail.",
    after_help = "Examples:\n  sarpipe analyze --case case.json\n  sarpipe analyze --case case.json --stage risk\n  sarpipe batch --case a.json --case b.json\n  sarpipe config\n  sarpipe audit --path audit/sarpipe-audit.jsonl"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Analyze one case file and print the validated result as JSON")]
    Analyze {
        #[arg(long, help = "Path to a case JSON file")]
        case: PathBuf,
        #[arg(long, value_enum, default_value_t = AnalyzeStage::Full, help = "Stop after risk analysis or run the full SAR workflow")]
        stage: AnalyzeStage,
    },
    #[command(about = "Run the full SAR workflow over several case files concurrently")]
    Batch {
        #[arg(long = "case", required = true, help = "Path to a case JSON file (repeatable)")]
        cases: Vec<PathBuf>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Summarise an audit JSON-lines file")]
    Audit {
        #[arg(long, help = "Audit file path (defaults to the configured audit.path)")]
        path: Option<PathBuf>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Analyze { case, stage } => commands::analyze::run(&case, stage),
        Command::Batch { cases } => commands::batch::run(&cases),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Audit { path } => commands::audit::run(path.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
