//! End-to-end tests from layout pages to exported files

use pagealign_core::layout::{LayoutLine, LayoutPage, LayoutRegion, LayoutWord, Polygon};
use pagealign_core::provenance::{text_checksum, DocumentRecord, PLACEHOLDER_SOURCE};
use pagealign_core::webanno::{Selector, TargetKind};
use pagealign_core::{
    accumulate, process_units, realign_document, segment_range, AnnotationKind, Config,
    DocumentDataStore, Error, ExternalDocument, IdScheme, IiifIndex, LayoutDocument,
    MetadataTable, ProcessingUnit, RuleTokenizer, RunContext, Segmenter, UnitProcessor,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

fn rectangle() -> Polygon {
    Polygon::from_pairs(&[(0, 0), (10, 0), (10, 5), (0, 5)])
}

/// A page with one region and one line per entry of `lines`
fn page(id: &str, lines: &[&[&str]]) -> LayoutPage {
    let mut counter = 0;
    LayoutPage {
        id: id.to_string(),
        regions: vec![LayoutRegion {
            id: "r1".to_string(),
            coords: rectangle(),
            lines: lines
                .iter()
                .enumerate()
                .map(|(l, words)| LayoutLine {
                    id: format!("l{}", l + 1),
                    coords: rectangle(),
                    words: words
                        .iter()
                        .map(|text| {
                            counter += 1;
                            LayoutWord {
                                id: format!("w{counter}"),
                                text: text.to_string(),
                                coords: rectangle(),
                            }
                        })
                        .collect(),
                })
                .collect(),
        }],
    }
}

fn write_page(dir: &Path, page: &LayoutPage) -> PathBuf {
    let path = dir.join(format!("{}.json", page.id));
    std::fs::write(&path, serde_json::to_string(page).unwrap()).unwrap();
    path
}

fn context_for(pages: &[&str]) -> RunContext {
    let mut iiif = IiifIndex::new();
    for page in pages {
        iiif.insert(*page, format!("https://iiif.example.org/{page}"));
    }
    RunContext::new(Config::default()).unwrap().with_iiif(iiif)
}

#[test]
fn test_two_pages_share_one_offset_space() {
    let ids = IdScheme::default();
    let a = LayoutDocument::new("A.json", page("A", &[&["ab\n"]]));
    let b = LayoutDocument::new("B.json", page("B", &[&["cde\n"]]));
    let unit = accumulate(&ids, &[a, b]).unwrap();

    assert_eq!(unit.text, "ab\ncde\n");
    assert_eq!(unit.char_len, 7);
    let b_offsets: Vec<usize> = unit
        .annotations
        .iter()
        .filter(|a| a.page_id == "B")
        .map(|a| a.offset)
        .collect();
    assert!(b_offsets.iter().all(|&o| o == 3));
}

#[test]
fn test_go_home_anchors() {
    let tokenizer = RuleTokenizer::with_default_rules().unwrap();
    let segmentation = Segmenter::new(&tokenizer).segment(&["Go home.\n"]).unwrap();

    let texts: Vec<&str> = segmentation
        .tokens
        .iter()
        .filter(|t| !t.is_paragraph_break())
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(texts, vec!["Go", "home", "."]);
    assert!(segmentation.tokens[3].is_paragraph_break());
    assert_eq!(segment_range(&segmentation.tokens, 0, 8), (0, 2));
}

#[test]
fn test_unit_output_for_multibyte_pages() {
    let pages = ["NL_1_0001", "NL_1_0002"];
    let ctx = context_for(&pages);
    let tokenizer = RuleTokenizer::with_default_rules().unwrap();
    let documents = vec![
        LayoutDocument::new(
            "NL_1_0001.json",
            page("NL_1_0001", &[&["Één ", "café."], &["Twee"]]),
        ),
        LayoutDocument::new("NL_1_0002.json", page("NL_1_0002", &[&["Drie ", "vier."]])),
    ];

    let output = UnitProcessor::new(&ctx, &tokenizer)
        .process_documents("NL_1_0001_0002", &documents)
        .unwrap();

    assert_eq!(output.text, "Één café.Twee\nDrie vier.\n");

    // every word range reproduces its stripped text
    let chars: Vec<char> = output.text.chars().collect();
    for word in output.annotations.iter().filter(|a| a.kind == AnnotationKind::Word) {
        let covered: String = chars[word.offset..word.end()].iter().collect();
        assert_eq!(Some(covered.trim()), word.metadata.text.as_deref());
    }

    // annotations are in export order and anchored
    for pair in output.annotations.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!((&a.page_id, a.offset) <= (&b.page_id, b.offset));
    }
    for a in &output.annotations {
        assert!(a.begin_anchor <= a.end_anchor, "{a:?}");
    }

    let second_page = output
        .annotations
        .iter()
        .find(|a| a.kind == AnnotationKind::Page && a.page_id == "NL_1_0002")
        .unwrap();
    assert_eq!((second_page.offset, second_page.length), (14, 11));

    let tokens_on_second: Vec<&str> = output
        .annotations
        .iter()
        .filter(|a| a.kind == AnnotationKind::Token && a.page_id == "NL_1_0002")
        .filter_map(|a| a.metadata.text.as_deref())
        .collect();
    assert_eq!(tokens_on_second, vec!["Drie", "vier", "."]);
}

#[test]
fn test_rectangle_targets() {
    let ctx = context_for(&["p1"]);
    let tokenizer = RuleTokenizer::with_default_rules().unwrap();
    let output = UnitProcessor::new(&ctx, &tokenizer)
        .process_documents("p1", &[LayoutDocument::new("p1.json", page("p1", &[&["Go"]]))])
        .unwrap();

    let word_index = output
        .annotations
        .iter()
        .position(|a| a.kind == AnnotationKind::Word)
        .unwrap();
    let targets = &output.web_annotations[word_index].target;

    assert_eq!(
        targets[0].source,
        "https://iiif.example.org/p1/0,0,10,5/max/0/default.jpg"
    );
    let svg = targets
        .iter()
        .flat_map(|t| t.selectors())
        .find_map(|s| match s {
            Selector::SvgSelector { value } => Some(value.clone()),
            _ => None,
        })
        .unwrap();
    let path = svg.split("d=\"").nth(1).unwrap().split('"').next().unwrap();
    assert!(path.starts_with("M0 0"));
    assert!(path.ends_with('Z'));
}

#[test]
fn test_realign_without_document_data() {
    let ctx = RunContext::new(Config::default()).unwrap();
    let mut store = DocumentDataStore::default();
    store.insert(
        "other",
        DocumentRecord {
            plain_text_source: "https://textrepo.example.org/other".to_string(),
            plain_text_md5: text_checksum("other text"),
            text_intervals: Vec::new(),
        },
    );
    let document: ExternalDocument = serde_json::from_str(
        r#"{"text": "Het schip Amsterdam", "annotations": [
            {"type": "named_entity", "id": "1", "begin": 10, "end": 19, "value": "SHIP"}
        ]}"#,
    )
    .unwrap();

    let result = realign_document(&ctx, &store, document, "doc.json").unwrap();
    assert_eq!(result.plain_text_source, PLACEHOLDER_SOURCE);
    assert_eq!(result.web_annotations.len(), 1);
    let targets = &result.web_annotations[0].target;
    assert!(targets
        .iter()
        .all(|t| !matches!(t.kind, Some(TargetKind::Image) | Some(TargetKind::Canvas))));
}

#[test]
fn test_failed_unit_does_not_stop_others() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::create_dir_all(&output).unwrap();

    let good = write_page(&input, &page("NL_1_0001", &[&["Go ", "home."]]));
    let mut broken_page = page("NL_2_0001", &[&["x", "y"]]);
    broken_page.regions[0].lines[0].words[1].id = "w1".to_string();
    let broken = write_page(&input, &broken_page);

    let ctx = context_for(&["NL_1_0001", "NL_2_0001"]);
    let tokenizer = RuleTokenizer::with_default_rules().unwrap();
    let processor = UnitProcessor::new(&ctx, &tokenizer);
    let units: Vec<ProcessingUnit> = [good, broken]
        .into_iter()
        .filter_map(|p| ProcessingUnit::from_paths(vec![p]))
        .collect();

    let seen = AtomicUsize::new(0);
    let summary = process_units(&processor, &units, &output, |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(summary.written.len(), 1);
    assert_eq!(summary.written[0].0, "NL_1_0001_0001");
    assert_eq!(summary.failed.len(), 1);
    assert!(matches!(summary.failed[0].1, Error::MalformedLayout { .. }));
    assert!(output.join("NL_1_0001_0001-web-annotations.json").exists());
    assert!(!output.join("NL_2_0001_0001.txt").exists());
}

#[test]
fn test_ambiguous_metadata_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_page(dir.path(), &page("NL-HaNA_1.04.02_1092_0017", &[&["Go"]]));

    let metadata = MetadataTable::from_reader(
        "Indexnr,Scan-begin,Scan-Eind\n1092,1,20\n1092,10,30\n".as_bytes(),
    )
    .unwrap();
    let ctx = context_for(&["NL-HaNA_1.04.02_1092_0017"]).with_metadata(metadata);
    let tokenizer = RuleTokenizer::with_default_rules().unwrap();
    let processor = UnitProcessor::new(&ctx, &tokenizer);
    let units = vec![ProcessingUnit::from_paths(vec![path]).unwrap()];

    let result = process_units(&processor, &units, dir.path(), |_| {});
    assert!(matches!(result, Err(Error::AmbiguousMetadata { count: 2, .. })));
}

#[test]
fn test_ambiguous_metadata_stops_parallel_units() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let ambiguous = write_page(dir.path(), &page("NL-HaNA_1.04.02_1092_0017", &[&["Go"]]));
    let fine = write_page(dir.path(), &page("NL-HaNA_1.04.02_2000_0001", &[&["home"]]));

    let metadata = MetadataTable::from_reader(
        "Indexnr,Scan-begin,Scan-Eind\n1092,1,20\n1092,10,30\n2000,1,5\n".as_bytes(),
    )
    .unwrap();
    let mut iiif = IiifIndex::new();
    iiif.insert("NL-HaNA_1.04.02_1092_0017", "https://iiif.example.org/0017");
    iiif.insert("NL-HaNA_1.04.02_2000_0001", "https://iiif.example.org/0001");
    let config = Config::builder().threads(Some(2)).build().unwrap();
    let ctx = RunContext::new(config)
        .unwrap()
        .with_iiif(iiif)
        .with_metadata(metadata);
    let tokenizer = RuleTokenizer::with_default_rules().unwrap();
    let processor = UnitProcessor::new(&ctx, &tokenizer);
    let units = vec![
        ProcessingUnit::from_paths(vec![ambiguous]).unwrap(),
        ProcessingUnit::from_paths(vec![fine]).unwrap(),
    ];

    let finished = AtomicUsize::new(0);
    let result = process_units(&processor, &units, out.path(), |_| {
        finished.fetch_add(1, Ordering::SeqCst);
    });

    assert!(matches!(result, Err(Error::AmbiguousMetadata { count: 2, .. })));
    assert_eq!(finished.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}
