//! Generate config command implementation

use crate::config::CliConfig;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Kinds of file a template can be generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TemplateKind {
    /// CLI configuration with processing, output and performance sections
    Config,
    /// Tokenizer rules, starting from the embedded Dutch rules
    Tokenizer,
    /// Named entity dictionary, starting from the embedded labels
    Entities,
}

/// Arguments for the generate-config command
#[derive(Debug, Args)]
pub struct GenerateConfigArgs {
    /// Kind of file to generate
    #[arg(short, long, value_enum, default_value = "config")]
    pub kind: TemplateKind,

    /// Output file path
    #[arg(short, long, value_name = "FILE", required = true)]
    pub output: PathBuf,
}

impl GenerateConfigArgs {
    /// Execute the generate-config command
    pub fn execute(&self) -> Result<()> {
        println!("Generating {:?} template...", self.kind);
        println!("  Output file: {}", self.output.display());

        let template = self.generate_template()?;
        std::fs::write(&self.output, template)
            .with_context(|| format!("Failed to write to {}", self.output.display()))?;

        let flag = match self.kind {
            TemplateKind::Config => "--config",
            TemplateKind::Tokenizer => "--tokenizer-rules",
            TemplateKind::Entities => "--entities",
        };
        println!("✓ Template generated successfully!");
        println!();
        println!("Next steps:");
        println!("1. Edit the file");
        println!("2. Validate it:");
        println!("   pagealign validate {} {}", flag, self.output.display());

        Ok(())
    }

    /// Generate template content
    fn generate_template(&self) -> Result<String> {
        Ok(match self.kind {
            TemplateKind::Config => format!(
                "# pagealign configuration\n\
                 # worker_threads = 0 uses every available core\n\
                 # [tokenizer] accepts `rules` and `entities` paths replacing the embedded files\n\n{}",
                CliConfig::template()?
            ),
            TemplateKind::Tokenizer => pagealign_core::tokenizer::DEFAULT_RULES.to_string(),
            TemplateKind::Entities => pagealign_core::realign::DEFAULT_ENTITIES.to_string(),
        })
    }
}
