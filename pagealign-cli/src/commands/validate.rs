//! Validate command implementation

use crate::config::CliConfig;
use anyhow::Result;
use clap::{ArgGroup, Args};
use pagealign_core::{EntityDictionary, RuleTokenizer, TokenizerRules};
use std::path::{Path, PathBuf};

/// Arguments for the validate command
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).multiple(true)))]
pub struct ValidateArgs {
    /// CLI configuration file to validate
    #[arg(short, long, value_name = "FILE", group = "target")]
    pub config: Option<PathBuf>,

    /// Tokenizer rules file to validate
    #[arg(short, long, value_name = "FILE", group = "target")]
    pub tokenizer_rules: Option<PathBuf>,

    /// Entity dictionary file to validate
    #[arg(short, long, value_name = "FILE", group = "target")]
    pub entities: Option<PathBuf>,
}

fn check_config(path: &Path) -> Result<()> {
    let config = CliConfig::load(path)?;
    let core = config.core_config(None)?;
    config.tokenizer(None)?;
    config.entities(None)?;
    println!("  Namespace: {}", core.namespace());
    println!("  Text repository: {}", core.text_repo_base_url());
    Ok(())
}

fn check_tokenizer_rules(path: &Path) -> Result<()> {
    let rules = TokenizerRules::from_file(path)?;
    RuleTokenizer::new(&rules)?;
    println!("  Language code: {}", rules.metadata.code);
    println!("  Language name: {}", rules.metadata.name);
    println!("  Abbreviations: {}", rules.abbreviation_count());
    Ok(())
}

fn check_entities(path: &Path) -> Result<()> {
    let dictionary = EntityDictionary::from_file(path)?;
    println!("  Entity labels: {}", dictionary.len());
    Ok(())
}

fn report(kind: &str, path: &Path, check: fn(&Path) -> Result<()>) -> Result<()> {
    println!("Validating {kind}: {}", path.display());

    match check(path) {
        Ok(()) => {
            println!("✓ {kind} is valid!");
            Ok(())
        }
        Err(e) => {
            println!("✗ {kind} is invalid!");
            println!("  Error: {e:#}");
            Err(anyhow::anyhow!("Validation failed: {:#}", e))
        }
    }
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self) -> Result<()> {
        let checks: [(&str, &Option<PathBuf>, fn(&Path) -> Result<()>); 3] = [
            ("Configuration", &self.config, check_config),
            ("Tokenizer rules", &self.tokenizer_rules, check_tokenizer_rules),
            ("Entity dictionary", &self.entities, check_entities),
        ];

        let mut first_error = None;
        for (kind, path, check) in checks {
            if let Some(path) = path {
                if let Err(e) = report(kind, path, check) {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
