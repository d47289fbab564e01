//! CLI command implementations

use anyhow::Result;
use clap::Subcommand;

pub mod extract;
pub mod generate_config;
pub mod realign;
pub mod validate;

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract text, tokens and Web Annotations from directories of layout pages
    Extract(extract::ExtractArgs),

    /// Re-align external annotations with their scans
    Realign(realign::RealignArgs),

    /// Validate a configuration or rule file
    Validate(validate::ValidateArgs),

    /// Write a configuration or rule file template
    GenerateConfig(generate_config::GenerateConfigArgs),
}

impl Commands {
    /// Run the selected command
    pub fn execute(&self) -> Result<()> {
        match self {
            Commands::Extract(args) => args.execute(),
            Commands::Realign(args) => args.execute(),
            Commands::Validate(args) => args.execute(),
            Commands::GenerateConfig(args) => args.execute(),
        }
    }
}
