use std::path::PathBuf;

use caselaw_mcp::Result;
use caselaw_mcp::commands::{build_index, run_search, serve_mcp, show_status};
use caselaw_mcp::config::{run_interactive_config, show_config};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "caselaw-mcp")]
#[command(about = "Semantic search over legal case documents with an MCP server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding server and search settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Build the vector index from a directory of JSON case files
    Build {
        /// Directory containing the case dataset
        dataset_dir: PathBuf,
    },
    /// Run a single search query against the built index
    Search {
        /// Free-text legal query
        query: String,
        /// Number of neighbors to return
        #[arg(long)]
        k: Option<usize>,
    },
    /// Start MCP server on stdio
    Serve,
    /// Show index and embedding-server status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Build { dataset_dir } => {
            build_index(&dataset_dir)?;
        }
        Commands::Search { query, k } => {
            run_search(&query, k)?;
        }
        Commands::Serve => {
            serve_mcp().await?;
        }
        Commands::Status => {
            show_status()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["caselaw-mcp", "status"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Status);
        }
    }

    #[test]
    fn build_command_takes_a_dataset_dir() {
        let cli = Cli::try_parse_from(["caselaw-mcp", "build", "/tmp/cases"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Build { dataset_dir } = parsed.command {
                assert_eq!(dataset_dir, PathBuf::from("/tmp/cases"));
            }
        }
    }

    #[test]
    fn search_command_with_k() {
        let cli = Cli::try_parse_from(["caselaw-mcp", "search", "treaty dispute", "--k", "5"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Search { query, k } = parsed.command {
                assert_eq!(query, "treaty dispute");
                assert_eq!(k, Some(5));
            }
        }
    }

    #[test]
    fn search_command_defaults_k_to_none() {
        let cli = Cli::try_parse_from(["caselaw-mcp", "search", "treaty dispute"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Search { k, .. } = parsed.command {
                assert_eq!(k, None);
            }
        }
    }

    #[test]
    fn serve_command() {
        let cli = Cli::try_parse_from(["caselaw-mcp", "serve"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Serve);
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["caselaw-mcp", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["caselaw-mcp", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }
}
