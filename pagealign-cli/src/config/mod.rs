//! Configuration module

use crate::input::FileReader;
use crate::output::SummaryFormat;
use anyhow::{Context, Result};
use pagealign_core::config::defaults;
use pagealign_core::webanno::Generator;
use pagealign_core::{Config, EntityDictionary, RuleTokenizer, TokenizerRules};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration structure
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct CliConfig {
    /// Annotation naming and link targets
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Performance configuration
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Rule files replacing the embedded ones
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

/// Processing-related configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Namespace of generated URNs
    pub namespace: String,

    /// Base url of the text repository, without trailing '/'
    pub text_repo_base_url: String,

    /// Base of event classification uris
    pub event_wiki_base: String,

    /// Credit the recognition software as generator of layout annotations
    pub credit_generator: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            namespace: defaults::ID_NAMESPACE.to_string(),
            text_repo_base_url: defaults::TEXT_REPO_BASE_URL.to_string(),
            event_wiki_base: defaults::EVENT_WIKI_BASE.to_string(),
            credit_generator: true,
        }
    }
}

/// Output-related configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for extracted units when `--output-dir` is not given
    pub directory: PathBuf,

    /// Format of the run summary printed on stdout
    pub summary_format: SummaryFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("out"),
            summary_format: SummaryFormat::Text,
        }
    }
}

/// Performance-related configuration
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Number of worker threads (0 = auto)
    pub worker_threads: usize,
}

/// Rule file locations
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Tokenizer rules TOML
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<PathBuf>,

    /// Entity dictionary TOML
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<PathBuf>,
}

impl CliConfig {
    /// Read a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = FileReader::read_text(path)?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }

    /// Read the given file, or fall back to the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                log::info!("loading configuration from {}", path.display());
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Library configuration; `threads` overrides `[performance]`
    pub fn core_config(&self, threads: Option<usize>) -> Result<Config> {
        let threads = threads.or(match self.performance.worker_threads {
            0 => None,
            n => Some(n),
        });
        let generator = self
            .processing
            .credit_generator
            .then(|| Generator::software(defaults::GENERATOR_ID, defaults::GENERATOR_NAME));

        Config::builder()
            .namespace(&self.processing.namespace)
            .text_repo_base_url(&self.processing.text_repo_base_url)
            .event_wiki_base(&self.processing.event_wiki_base)
            .generator(generator)
            .threads(threads)
            .build()
            .context("Invalid processing configuration")
    }

    /// Tokenizer from the given rules file, the configured one, or the embedded rules
    pub fn tokenizer(&self, rules: Option<&Path>) -> Result<RuleTokenizer> {
        let rules = match rules.or(self.tokenizer.rules.as_deref()) {
            Some(path) => TokenizerRules::from_file(path)
                .with_context(|| format!("Invalid tokenizer rules: {}", path.display()))?,
            None => TokenizerRules::embedded()?,
        };
        Ok(RuleTokenizer::new(&rules)?)
    }

    /// Entity dictionary from the given file, the configured one, or the embedded dictionary
    pub fn entities(&self, path: Option<&Path>) -> Result<EntityDictionary> {
        match path.or(self.tokenizer.entities.as_deref()) {
            Some(path) => EntityDictionary::from_file(path)
                .with_context(|| format!("Invalid entity dictionary: {}", path.display())),
            None => Ok(EntityDictionary::embedded()?),
        }
    }

    /// The default configuration as TOML
    pub fn template() -> Result<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }
}
