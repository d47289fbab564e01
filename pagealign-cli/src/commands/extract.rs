//! Extract command implementation

use crate::config::CliConfig;
use crate::error::CliError;
use crate::input::{resolve_directories, FileReader};
use crate::output::SummaryFormat;
use crate::progress::ProgressReporter;
use anyhow::{Context, Result};
use clap::Args;
use pagealign_core::{
    process_units, IiifIndex, MetadataTable, ProcessingUnit, RunContext, UnitProcessor,
    VersionTable,
};
use std::path::{Path, PathBuf};

/// Arguments for the extract command
#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Directories of layout page files (supports glob)
    #[arg(value_name = "DIRECTORY", required = true)]
    pub directory: Vec<String>,

    /// CSV mapping page ids to IIIF base urls
    #[arg(short = 'i', long, value_name = "CSV", required = true)]
    pub iiif_mapping_file: PathBuf,

    /// Merge consecutive directories of the same section into one unit
    #[arg(short, long)]
    pub merge_sections: bool,

    /// Inventory metadata CSV
    #[arg(long, value_name = "CSV")]
    pub metadata: Option<PathBuf>,

    /// Text repository versions CSV
    #[arg(long, value_name = "CSV")]
    pub versions: Option<PathBuf>,

    /// Output directory (default: from configuration, else "out")
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Tokenizer rules file
    #[arg(long, value_name = "FILE")]
    pub tokenizer_rules: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE", env = "PAGEALIGN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of worker threads
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

/// Section a directory belongs to: its name up to the first `_`
fn section_of(dir: &Path) -> String {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.split('_').next().unwrap_or_default().to_string()
}

/// Group directories into units
///
/// Without merging every directory is its own unit. With merging, runs of
/// consecutive directories of the same section form one unit.
pub fn section_groups(dirs: Vec<PathBuf>, merge: bool) -> Vec<Vec<PathBuf>> {
    if !merge {
        return dirs.into_iter().map(|d| vec![d]).collect();
    }

    let mut groups: Vec<(String, Vec<PathBuf>)> = Vec::new();
    for dir in dirs {
        let section = section_of(&dir);
        match groups.last_mut() {
            Some((current, group)) if *current == section => group.push(dir),
            _ => groups.push((section, vec![dir])),
        }
    }
    groups.into_iter().map(|(_, group)| group).collect()
}

impl ExtractArgs {
    /// Execute the extract command
    pub fn execute(&self) -> Result<()> {
        crate::init_logging(self.verbose, self.quiet);
        log::debug!("Arguments: {:?}", self);

        let cli_config = CliConfig::load_or_default(self.config.as_deref())?;
        let context = self.run_context(&cli_config)?;
        let tokenizer = cli_config.tokenizer(self.tokenizer_rules.as_deref())?;

        let units = self.units()?;
        let output_dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| cli_config.output.directory.clone());
        std::fs::create_dir_all(&output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;
        log::info!(
            "extracting {} units into {}",
            units.len(),
            output_dir.display()
        );

        let mut progress = ProgressReporter::new(self.quiet);
        progress.init(units.len() as u64, "units");

        let processor = UnitProcessor::new(&context, &tokenizer);
        let summary = process_units(&processor, &units, &output_dir, |report| {
            progress.completed(&report.base_name)
        })
        .context("Extraction stopped")?;
        progress.finish();

        let format = self.format.unwrap_or(cli_config.output.summary_format);
        let mut formatter = format.formatter(std::io::stdout());
        for (name, files) in &summary.written {
            formatter.written(name, files)?;
        }
        for (name, error) in &summary.failed {
            formatter.failed(name, &error.to_string())?;
        }
        formatter.finish()?;

        if summary.is_success() {
            Ok(())
        } else {
            Err(CliError::ProcessingError(format!(
                "{} of {} units failed",
                summary.failed.len(),
                units.len()
            ))
            .into())
        }
    }

    fn run_context(&self, cli_config: &CliConfig) -> Result<RunContext> {
        let config = cli_config.core_config(self.threads)?;
        let iiif = IiifIndex::load(&self.iiif_mapping_file).with_context(|| {
            format!(
                "Failed to load IIIF mapping: {}",
                self.iiif_mapping_file.display()
            )
        })?;

        let mut context = RunContext::new(config)?.with_iiif(iiif);
        if let Some(path) = &self.metadata {
            let metadata = MetadataTable::load(path)
                .with_context(|| format!("Failed to load metadata: {}", path.display()))?;
            context = context.with_metadata(metadata);
        }
        if let Some(path) = &self.versions {
            let versions = VersionTable::load(path)
                .with_context(|| format!("Failed to load text versions: {}", path.display()))?;
            context = context.with_versions(versions);
        }
        Ok(context)
    }

    fn units(&self) -> Result<Vec<ProcessingUnit>> {
        let dirs = resolve_directories(&self.directory)?;

        let mut units = Vec::new();
        for group in section_groups(dirs, self.merge_sections) {
            let mut files = Vec::new();
            for dir in &group {
                files.extend(FileReader::layout_files(dir)?);
            }
            match ProcessingUnit::from_paths(files) {
                Some(unit) => units.push(unit),
                None => log::warn!("no layout files in {:?}, skipping", group),
            }
        }

        if units.is_empty() {
            return Err(
                CliError::FileNotFound("no layout files in the given directories".into()).into(),
            );
        }
        Ok(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from(format!("data/{n}"))).collect()
    }

    #[test]
    fn test_no_merge_keeps_directories_apart() {
        let groups = section_groups(paths(&["1092_a", "1092_b"]), false);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_merge_groups_consecutive_sections() {
        let groups = section_groups(paths(&["1092_a", "1092_b", "1093_a", "1092_c"]), true);
        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 1, 1]);
        assert_eq!(section_of(&groups[1][0]), "1093");
    }

    #[test]
    fn test_section_of_name_without_underscore() {
        assert_eq!(section_of(Path::new("data/1092")), "1092");
        assert_eq!(section_of(Path::new("data/1092/")), "1092");
    }
}
