//! Export shapes and file writers

use crate::annotation::Annotation;
use crate::context::MetadataRecord;
use crate::error::{Error, Result};
use crate::realign::RealignedDocument;
use crate::segmenter::Token;
use crate::webanno::WebAnnotation;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Token segments for lossless reassembly of the text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentedText<'a> {
    #[serde(rename = "_ordered_segments")]
    pub ordered_segments: Vec<&'a str>,
}

impl<'a> SegmentedText<'a> {
    /// `text_with_ws` per token, a newline for every paragraph sentinel
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            ordered_segments: tokens
                .iter()
                .map(|t| {
                    if t.text_with_ws.is_empty() {
                        "\n"
                    } else {
                        t.text_with_ws.as_str()
                    }
                })
                .collect(),
        }
    }
}

/// CoNLL 2002 lines: `token<TAB>O`, an empty line per paragraph sentinel
pub fn conll(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        if token.text.is_empty() || token.text == "\n" {
            out.push('\n');
        } else {
            out.push_str(&token.text);
            out.push_str("\tO\n");
        }
    }
    out
}

/// Everything produced for one processing unit
#[derive(Debug, Clone)]
pub struct UnitOutput {
    pub base_name: String,
    pub text: String,
    pub tokens: Vec<Token>,
    pub annotations: Vec<Annotation>,
    pub metadata: Option<MetadataRecord>,
    pub web_annotations: Vec<WebAnnotation>,
}

impl UnitOutput {
    /// Metadata record columns plus the unit's annotations
    pub fn metadata_json(&self) -> Result<Value> {
        let mut object: Map<String, Value> = self
            .metadata
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        object.insert(
            "annotations".to_string(),
            serde_json::to_value(&self.annotations)?,
        );
        Ok(Value::Object(object))
    }

    /// Write every export file of the unit into `dir`
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let base = &self.base_name;
        let written = vec![
            write_text(&dir.join(format!("{base}.txt")), &self.text)?,
            write_json(&dir.join(format!("{base}-tokens.json")), &self.tokens)?,
            write_json(
                &dir.join(format!("{base}-segmented-text.json")),
                &SegmentedText::new(&self.tokens),
            )?,
            write_text(&dir.join(format!("{base}.conll")), &conll(&self.tokens))?,
            write_json(
                &dir.join(format!("{base}-metadata.json")),
                &self.metadata_json()?,
            )?,
            write_json(
                &dir.join(format!("{base}-web-annotations.json")),
                &self.web_annotations,
            )?,
        ];
        Ok(written)
    }
}

/// Write the plain text and the Web Annotations of a re-aligned document
pub fn write_realigned(
    document: &RealignedDocument,
    dir: &Path,
    base_name: &str,
) -> Result<Vec<PathBuf>> {
    Ok(vec![
        write_text(
            &dir.join(format!("{base_name}_plain-text.txt")),
            &document.text,
        )?,
        write_json(
            &dir.join(format!("{base_name}_web-annotations.json")),
            &document.web_annotations,
        )?,
    ])
}

fn write_text(path: &Path, content: &str) -> Result<PathBuf> {
    std::fs::write(path, content).map_err(|e| Error::io(path, e))?;
    log::info!("=> {}", path.display());
    Ok(path.to_path_buf())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| Error::io(path, e))?;
    log::info!("=> {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationKind;

    fn tokens() -> Vec<Token> {
        vec![
            Token::new("Go", "Go ", 0),
            Token::new("home", "home", 3),
            Token::new(".", ".", 7),
            Token::paragraph_break(),
        ]
    }

    #[test]
    fn test_conll() {
        assert_eq!(conll(&tokens()), "Go\tO\nhome\tO\n.\tO\n\n");
    }

    #[test]
    fn test_segmented_text() {
        let value = serde_json::to_value(SegmentedText::new(&tokens())).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"_ordered_segments": ["Go ", "home", ".", "\n"]})
        );
    }

    #[test]
    fn test_token_json_keeps_sentinel_offset() {
        let value = serde_json::to_value(&tokens()[3]).unwrap();
        assert_eq!(value, serde_json::json!({"text": "", "text_with_ws": "", "offset": -1}));
    }

    fn output() -> UnitOutput {
        let mut record = MetadataRecord::new();
        record.insert("Indexnr".to_string(), "1092".to_string());
        UnitOutput {
            base_name: "NL-HaNA_1.04.02_1092_0017_0018".to_string(),
            text: "Go home.\n".to_string(),
            tokens: tokens(),
            annotations: vec![Annotation::new(AnnotationKind::Page, "urn:x:p", "p", 0, 9)],
            metadata: Some(record),
            web_annotations: Vec::new(),
        }
    }

    #[test]
    fn test_metadata_json() {
        let value = output().metadata_json().unwrap();
        assert_eq!(value["Indexnr"], "1092");
        assert_eq!(value["annotations"][0]["type"], "px:Page");
    }

    #[test]
    fn test_write_unit_files() {
        let dir = tempfile::tempdir().unwrap();
        let written = output().write(dir.path()).unwrap();
        assert_eq!(written.len(), 6);

        let text = std::fs::read_to_string(dir.path().join("NL-HaNA_1.04.02_1092_0017_0018.txt"))
            .unwrap();
        assert_eq!(text, "Go home.\n");
        let conll = std::fs::read_to_string(dir.path().join("NL-HaNA_1.04.02_1092_0017_0018.conll"))
            .unwrap();
        assert!(conll.starts_with("Go\tO\n"));
    }

    #[test]
    fn test_write_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(output().write(&missing), Err(Error::Io { .. })));
    }
}
