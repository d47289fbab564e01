//! Run configuration

use crate::annotation::IdScheme;
use crate::error::{Error, Result};
use crate::webanno::Generator;

/// Default configuration constants
pub mod defaults {
    /// Namespace of every generated URN
    pub const ID_NAMESPACE: &str = "globalise";

    /// Base url of the text repository holding the exported versions
    pub const TEXT_REPO_BASE_URL: &str = "https://globalise.tt.di.huc.knaw.nl/textrepo";

    /// Base of the event and argument classification uris
    pub const EVENT_WIKI_BASE: &str =
        "https://github.com/globalise-huygens/nlp-event-detection/wiki#";

    /// Software credited as generator of layout annotations
    pub const GENERATOR_ID: &str = "https://github.com/rvankoert/loghi-htr";
    pub const GENERATOR_NAME: &str = "Loghi";
}

/// Settings shared by every unit of a run
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) namespace: String,
    pub(crate) text_repo_base_url: String,
    pub(crate) event_wiki_base: String,
    pub(crate) generator: Option<Generator>,
    pub(crate) threads: Option<usize>, // None = all available threads
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: defaults::ID_NAMESPACE.to_string(),
            text_repo_base_url: defaults::TEXT_REPO_BASE_URL.to_string(),
            event_wiki_base: defaults::EVENT_WIKI_BASE.to_string(),
            generator: Some(Generator::software(
                defaults::GENERATOR_ID,
                defaults::GENERATOR_NAME,
            )),
            threads: None,
        }
    }
}

impl Config {
    /// Create a configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn id_scheme(&self) -> IdScheme {
        IdScheme::new(&self.namespace)
    }

    pub fn text_repo_base_url(&self) -> &str {
        &self.text_repo_base_url
    }

    pub fn event_wiki_base(&self) -> &str {
        &self.event_wiki_base
    }

    pub fn generator(&self) -> Option<&Generator> {
        self.generator.as_ref()
    }

    pub fn threads(&self) -> Option<usize> {
        self.threads
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() || self.namespace.contains(char::is_whitespace) {
            return Err(Error::Configuration(format!(
                "namespace '{}' must be a non-empty word",
                self.namespace
            )));
        }

        if !self.text_repo_base_url.starts_with("http") || self.text_repo_base_url.ends_with('/') {
            return Err(Error::Configuration(format!(
                "text_repo_base_url '{}' must be an http(s) url without trailing '/'",
                self.text_repo_base_url
            )));
        }

        if self.event_wiki_base.is_empty() {
            return Err(Error::Configuration(
                "event_wiki_base must not be empty".into(),
            ));
        }

        if let Some(threads) = self.threads {
            if threads == 0 {
                return Err(Error::Configuration(
                    "threads must be greater than 0".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Fluent builder for configuration
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    namespace: Option<String>,
    text_repo_base_url: Option<String>,
    event_wiki_base: Option<String>,
    generator: Option<Option<Generator>>,
    threads: Option<usize>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the URN namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn text_repo_base_url(mut self, url: impl Into<String>) -> Self {
        self.text_repo_base_url = Some(url.into());
        self
    }

    pub fn event_wiki_base(mut self, base: impl Into<String>) -> Self {
        self.event_wiki_base = Some(base.into());
        self
    }

    /// Set or clear the generator credited on layout annotations
    pub fn generator(mut self, generator: Option<Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the number of threads (None = all available)
    pub fn threads(mut self, count: Option<usize>) -> Self {
        self.threads = count;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        let mut config = Config::default();

        if let Some(namespace) = self.namespace {
            config.namespace = namespace;
        }
        if let Some(url) = self.text_repo_base_url {
            config.text_repo_base_url = url;
        }
        if let Some(base) = self.event_wiki_base {
            config.event_wiki_base = base;
        }
        if let Some(generator) = self.generator {
            config.generator = generator;
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }

        config.validate()?;
        Ok(config)
    }
}
