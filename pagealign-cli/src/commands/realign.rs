//! Realign command implementation

use crate::config::CliConfig;
use crate::error::CliError;
use crate::input::resolve_patterns;
use crate::output::SummaryFormat;
use crate::progress::ProgressReporter;
use anyhow::{Context, Result};
use clap::Args;
use pagealign_core::export::write_realigned;
use pagealign_core::{realign_document, DocumentDataStore, ExternalDocument, RunContext};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Arguments for the realign command
#[derive(Debug, Args)]
pub struct RealignArgs {
    /// External annotation documents (supports glob)
    #[arg(value_name = "FILE/PATTERN", required = true)]
    pub documents: Vec<String>,

    /// Document data with checksums and provenance intervals
    #[arg(short, long, value_name = "FILE", default_value = "data/document_data.json")]
    pub document_data: PathBuf,

    /// The directory to write the output files in
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Entity dictionary replacing the embedded one
    #[arg(short, long, value_name = "FILE")]
    pub entities: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE", env = "PAGEALIGN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of worker threads (default: from configuration, else all cores)
    #[arg(short, long, value_name = "N")]
    pub threads: Option<usize>,

    /// Summary format (default: from configuration)
    #[arg(short, long, value_enum)]
    pub format: Option<SummaryFormat>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Output base name of a document: its file stem, spaces replaced by `_`
pub fn document_base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace(' ', "_"))
        .unwrap_or_default()
}

impl RealignArgs {
    /// Execute the realign command
    pub fn execute(&self) -> Result<()> {
        crate::init_logging(self.verbose, self.quiet);
        log::debug!("Arguments: {:?}", self);

        let cli_config = CliConfig::load_or_default(self.config.as_deref())?;
        let config = cli_config.core_config(self.threads)?;
        let threads = config.threads().unwrap_or_else(num_cpus::get);
        let context =
            RunContext::new(config)?.with_entities(cli_config.entities(self.entities.as_deref())?);
        let store = DocumentDataStore::load(&self.document_data).with_context(|| {
            format!(
                "Failed to load document data: {}",
                self.document_data.display()
            )
        })?;

        let paths = resolve_patterns(&self.documents)?;
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                self.output_dir.display()
            )
        })?;

        let mut progress = ProgressReporter::new(self.quiet);
        progress.init(paths.len() as u64, "documents");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pagealign-realign-{i}"))
            .build()
            .context("Failed to start worker pool")?;
        let results: Vec<(String, Result<Vec<PathBuf>>)> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    let base_name = document_base_name(path);
                    let result = self.realign_one(&context, &store, path, &base_name);
                    progress.completed(&base_name);
                    (base_name, result)
                })
                .collect()
        });
        progress.finish();

        let format = self.format.unwrap_or(cli_config.output.summary_format);
        let mut formatter = format.formatter(std::io::stdout());
        let mut failed = 0;
        for (base_name, result) in results {
            match result {
                Ok(files) => formatter.written(&base_name, &files)?,
                Err(e) => {
                    log::error!("{}: {:#}, skipping document", base_name, e);
                    formatter.failed(&base_name, &format!("{e:#}"))?;
                    failed += 1;
                }
            }
        }
        formatter.finish()?;

        if failed == 0 {
            Ok(())
        } else {
            Err(CliError::ProcessingError(format!(
                "{} of {} documents failed",
                failed,
                paths.len()
            ))
            .into())
        }
    }

    fn realign_one(
        &self,
        context: &RunContext,
        store: &DocumentDataStore,
        path: &Path,
        base_name: &str,
    ) -> Result<Vec<PathBuf>> {
        let document = ExternalDocument::load(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| base_name.to_string());
        let realigned = realign_document(context, store, document, &name)?;
        Ok(write_realigned(&realigned, &self.output_dir, base_name)?)
    }
}
