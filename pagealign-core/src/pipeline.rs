//! Per-unit processing with failure isolation
//!
//! A unit is an ordered group of page documents sharing one offset space.
//! Units are independent: a failing unit is reported and skipped, unless its
//! error must stop the whole run.

use crate::accumulator::accumulate;
use crate::annotation::Annotation;
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::export::UnitOutput;
use crate::layout::{page_id_from_path, LayoutDocument};
use crate::ordering::sort_annotations;
use crate::segmenter::{resolve_anchors, token_annotations, Segmenter};
use crate::tokenizer::Tokenizer;
use crate::webanno::to_web_annotation;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Name of a unit: the page prefix followed by the first and last page numbers
///
/// `NL-HaNA_1.04.02_1092_0017` .. `NL-HaNA_1.04.02_1092_0018` gives
/// `NL-HaNA_1.04.02_1092_0017_0018`. A page id without `_` is used whole.
pub fn create_base_name(first_page: &str, last_page: &str) -> String {
    let Some(split) = first_page.rfind('_') else {
        return first_page.to_string();
    };
    let (prefix, first_number) = (&first_page[..split], &first_page[split + 1..]);
    let last_number = last_page
        .rfind('_')
        .map_or(last_page, |i| &last_page[i + 1..]);
    format!("{prefix}_{first_number}_{last_number}")
}

/// Ordered page documents processed together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingUnit {
    pub base_name: String,
    pub documents: Vec<PathBuf>,
}

impl ProcessingUnit {
    /// Unit over the given files, in file name order
    pub fn from_paths(mut documents: Vec<PathBuf>) -> Option<Self> {
        documents.sort();
        let first = page_id_from_path(documents.first()?);
        let last = page_id_from_path(documents.last()?);
        Some(Self {
            base_name: create_base_name(&first, &last),
            documents,
        })
    }
}

/// Runs the full extraction for one unit
pub struct UnitProcessor<'a> {
    context: &'a RunContext,
    tokenizer: &'a dyn Tokenizer,
}

impl<'a> UnitProcessor<'a> {
    pub fn new(context: &'a RunContext, tokenizer: &'a dyn Tokenizer) -> Self {
        Self { context, tokenizer }
    }

    /// Load the unit's documents and process them
    pub fn process(&self, unit: &ProcessingUnit) -> Result<UnitOutput> {
        let documents = unit
            .documents
            .iter()
            .map(|path| LayoutDocument::load(path))
            .collect::<Result<Vec<_>>>()?;
        self.process_documents(&unit.base_name, &documents)
    }

    /// Index, segment, anchor, order and convert already loaded documents
    pub fn process_documents(
        &self,
        base_name: &str,
        documents: &[LayoutDocument],
    ) -> Result<UnitOutput> {
        let ctx = self.context;
        let unit = accumulate(&ctx.ids, documents)?;
        let segmentation = Segmenter::new(self.tokenizer).segment(&unit.paragraphs())?;

        let mut annotations: Vec<Annotation> = unit.annotations;
        annotations.extend(token_annotations(
            &ctx.ids,
            base_name,
            &segmentation,
            &unit.page_ranges,
        ));

        match ctx.versions.get(base_name) {
            Some(versions) => annotations
                .iter_mut()
                .for_each(|a| a.attach_versions(versions)),
            None => log::debug!("no text repository versions for {}", base_name),
        }

        sort_annotations(&mut annotations);
        resolve_anchors(&mut annotations, &segmentation.tokens);

        let metadata = match documents.first() {
            Some(first) => ctx.metadata.lookup(first.page_id())?.cloned(),
            None => None,
        };

        let web_annotations = annotations
            .iter()
            .map(|a| to_web_annotation(ctx, a))
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "{}: {} pages, {} chars, {} tokens, {} annotations",
            base_name,
            documents.len(),
            unit.char_len,
            segmentation.tokens.len(),
            annotations.len()
        );

        Ok(UnitOutput {
            base_name: base_name.to_string(),
            text: unit.text,
            tokens: segmentation.tokens,
            annotations,
            metadata,
            web_annotations,
        })
    }

    /// Process a unit and write its files into `output_dir`
    pub fn process_and_write(&self, unit: &ProcessingUnit, output_dir: &Path) -> Result<Vec<PathBuf>> {
        self.process(unit)?.write(output_dir)
    }
}

/// Outcome of one unit
#[derive(Debug)]
pub struct UnitReport {
    pub base_name: String,
    pub result: Result<Vec<PathBuf>>,
}

/// Outcome of a run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: Vec<(String, Vec<PathBuf>)>,
    pub failed: Vec<(String, Error)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, report: UnitReport) -> Result<()> {
        match report.result {
            Ok(files) => self.written.push((report.base_name, files)),
            Err(e) if e.aborts_run() => {
                log::error!("{}: {}, stopping the run", report.base_name, e);
                return Err(e);
            }
            Err(e) => {
                log::error!("{}: {}, skipping unit", report.base_name, e);
                self.failed.push((report.base_name, e));
            }
        }
        Ok(())
    }
}

/// Process and write every unit, isolating unit failures
///
/// The metadata of every unit is looked up before any unit runs, so an
/// ambiguous record stops the run before anything is written. Once a unit
/// fails with an error that aborts the run, no further unit is started and
/// that error is returned. Other failures are collected in the summary.
/// `on_unit` is called once per finished unit, from the worker that ran it.
pub fn process_units<F>(
    processor: &UnitProcessor<'_>,
    units: &[ProcessingUnit],
    output_dir: &Path,
    on_unit: F,
) -> Result<RunSummary>
where
    F: Fn(&UnitReport) + Sync,
{
    for unit in units {
        if let Some(first) = unit.documents.first() {
            processor.context.metadata.lookup(&page_id_from_path(first))?;
        }
    }

    let stop = AtomicBool::new(false);
    let run_one = |unit: &ProcessingUnit| {
        if stop.load(Ordering::Acquire) {
            return None;
        }
        let report = UnitReport {
            base_name: unit.base_name.clone(),
            result: processor.process_and_write(unit, output_dir),
        };
        if matches!(&report.result, Err(e) if e.aborts_run()) {
            stop.store(true, Ordering::Release);
        }
        on_unit(&report);
        Some(report)
    };

    let mut summary = RunSummary::default();

    #[cfg(feature = "parallel")]
    {
        let threads = processor.context.config.threads();
        if units.len() > 1 && threads != Some(1) {
            use rayon::prelude::*;

            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads.unwrap_or_else(num_cpus::get))
                .thread_name(|i| format!("pagealign-worker-{i}"))
                .build()
                .map_err(|e| Error::Configuration(format!("cannot start worker pool: {e}")))?;
            let reports: Vec<Option<UnitReport>> =
                pool.install(|| units.par_iter().map(&run_one).collect());
            for report in reports.into_iter().flatten() {
                summary.record(report)?;
            }
            return Ok(summary);
        }
    }

    for unit in units {
        if let Some(report) = run_one(unit) {
            summary.record(report)?;
        }
    }
    Ok(summary)
}
