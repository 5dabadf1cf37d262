// Configuration management: TOML settings plus the interactive setup flow.

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{Config, ConfigError, EmbeddingConfig, SearchConfig};

/// Platform configuration directory for this application.
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("caselaw-mcp"))
        .ok_or(ConfigError::DirectoryError)
}
