use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, get_config_dir};
use crate::embeddings::ollama::OllamaClient;

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("Caselaw MCP Configuration Setup").bold().cyan());
    eprintln!();

    let config_dir = get_config_dir().context("Failed to resolve config directory")?;
    let mut config = match Config::load(&config_dir) {
        Ok(config) => {
            eprintln!("{}", style("Found existing configuration.").green());
            config
        }
        Err(_) => {
            eprintln!(
                "{}",
                style("Existing configuration is unreadable. Using defaults.").yellow()
            );
            Config {
                embedding: super::EmbeddingConfig::default(),
                search: super::SearchConfig::default(),
                base_dir: config_dir.clone(),
            }
        }
    };

    eprintln!("{}", style("Embedding Server").bold().yellow());
    eprintln!("Configure the Ollama instance used for embedding generation.");
    eprintln!();

    configure_embedding(&mut config)?;
    configure_search(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());
    match OllamaClient::new(&config.embedding).map(|client| client.ping()) {
        Ok(Ok(())) => eprintln!("{}", style("Embedding server reachable!").green()),
        _ => {
            eprintln!(
                "{}",
                style("Warning: could not reach the embedding server").yellow()
            );
            eprintln!("You can continue, but make sure it is running before building the index.");
        }
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("Configuration saved.").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir().context("Failed to resolve config directory")?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Embedding Settings:").bold().yellow());
    eprintln!("  Host: {}", style(&config.embedding.host).cyan());
    eprintln!("  Port: {}", style(config.embedding.port).cyan());
    eprintln!("  Model: {}", style(&config.embedding.model).cyan());
    eprintln!("  Batch Size: {}", style(config.embedding.batch_size).cyan());
    eprintln!(
        "  Pacing Delay: {} ms",
        style(config.embedding.pacing_delay_ms).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Search Settings:").bold().yellow());
    eprintln!("  Default k: {}", style(config.search.default_k).cyan());

    eprintln!();
    eprintln!(
        "Index file: {}",
        style(config.index_file_path().display()).dim()
    );
    eprintln!(
        "Metadata file: {}",
        style(config.metadata_file_path().display()).dim()
    );
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn configure_embedding(config: &mut Config) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == config.embedding.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;
    config.embedding.protocol = protocols[protocol_index].to_string();

    config.embedding.host = Input::new()
        .with_prompt("Host")
        .default(config.embedding.host.clone())
        .interact_text()?;

    config.embedding.port = Input::new()
        .with_prompt("Port")
        .default(config.embedding.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.embedding.model = Input::new()
        .with_prompt("Embedding model")
        .default(config.embedding.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.embedding.batch_size = Input::new()
        .with_prompt("Batch size")
        .default(config.embedding.batch_size)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input == 0 || *input > 1000 {
                Err("Batch size must be between 1 and 1000")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    Ok(())
}

fn configure_search(config: &mut Config) -> Result<()> {
    config.search.default_k = Input::new()
        .with_prompt("Default number of results (k)")
        .default(config.search.default_k)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input == 0 || *input > 100 {
                Err("k must be between 1 and 100")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    Ok(())
}
