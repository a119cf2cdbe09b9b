//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod config_cmd;
mod process;
mod tools;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ocrmerge::Config;

#[derive(Parser)]
#[command(name = "ocrmerge")]
#[command(about = "Merge document text layers with OCR, page by page")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "OCRMERGE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a document, OCR thin pages, and print the merged result
    Process(process::ProcessArgs),

    /// Check that the external tools are installed
    Tools,

    /// Show the effective configuration
    Config,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Process(args) => process::cmd_process(config, args).await,
        Commands::Tools => tools::cmd_tools(),
        Commands::Config => config_cmd::cmd_config_show(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_process_flags() {
        let cli = Cli::try_parse_from([
            "ocrmerge",
            "-v",
            "process",
            "scan.pdf",
            "--threshold",
            "80",
            "--lang",
            "eng",
            "--lang",
            "deu",
            "--workers",
            "2",
            "--json",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Commands::Process(args) = cli.command else {
            panic!("expected process command");
        };
        assert_eq!(args.file, PathBuf::from("scan.pdf"));
        assert_eq!(args.threshold, Some(80));
        assert_eq!(args.lang, vec!["eng".to_string(), "deu".to_string()]);
        assert_eq!(args.workers, Some(2));
        assert!(args.json);
    }

    #[test]
    fn test_process_requires_file() {
        assert!(Cli::try_parse_from(["ocrmerge", "process"]).is_err());
    }
}
