//! Integration tests for the pagealign CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get the path to a test fixture
fn fixture_path(name: &str) -> String {
    format!("tests/fixtures/{}", name)
}

fn pagealign() -> Command {
    let mut cmd = Command::cargo_bin("pagealign").unwrap();
    cmd.env_remove("PAGEALIGN_CONFIG");
    cmd
}

fn extract(output: &TempDir) -> Command {
    let mut cmd = pagealign();
    cmd.arg("extract")
        .arg("-i")
        .arg(fixture_path("iiif.csv"))
        .arg("-o")
        .arg(output.path())
        .arg("-q");
    cmd
}

#[test]
fn test_extract_one_unit_per_directory() {
    let out = TempDir::new().unwrap();
    extract(&out)
        .arg(fixture_path("pages/1092_part1"))
        .arg(fixture_path("pages/1092_part2"))
        .assert()
        .success()
        .stdout(predicate::str::contains("NL-HaNA_1.04.02_1092_0017_0017"))
        .stdout(predicate::str::contains("NL-HaNA_1.04.02_1092_0018_0018"))
        .stdout(predicate::str::contains("2 written, 0 failed"));

    for suffix in [
        ".txt",
        "-tokens.json",
        "-segmented-text.json",
        ".conll",
        "-metadata.json",
        "-web-annotations.json",
    ] {
        let path = out
            .path()
            .join(format!("NL-HaNA_1.04.02_1092_0017_0017{suffix}"));
        assert!(path.exists(), "missing {}", path.display());
    }
}

#[test]
fn test_extract_merged_sections() {
    let out = TempDir::new().unwrap();
    extract(&out)
        .arg("--merge-sections")
        .arg("--metadata")
        .arg(fixture_path("metadata.csv"))
        .arg("--versions")
        .arg(fixture_path("versions.csv"))
        .arg(fixture_path("pages/1092_*"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 written, 0 failed"));

    let base = "NL-HaNA_1.04.02_1092_0017_0018";
    let text = fs::read_to_string(out.path().join(format!("{base}.txt"))).unwrap();
    assert_eq!(
        text,
        "Het schip Amsterdam vertrok uit Batavia.\nNaar Ambon met peper.\n"
    );

    let metadata: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(out.path().join(format!("{base}-metadata.json"))).unwrap(),
    )
    .unwrap();
    assert_eq!(metadata["Titel"], "Overgekomen brieven 1684");
    assert!(metadata["annotations"].as_array().unwrap().len() > 10);

    let web_annotations =
        fs::read_to_string(out.path().join(format!("{base}-web-annotations.json"))).unwrap();
    assert!(web_annotations.contains("seg-0017-0018"));
    assert!(web_annotations.contains("char="));
    assert!(web_annotations.contains(
        "https://iiif.example.org/iiif/NL-HaNA_1.04.02_1092_0018.jpg/full/max/0/default.jpg"
    ));

    let conll = fs::read_to_string(out.path().join(format!("{base}.conll"))).unwrap();
    assert!(conll.starts_with("Het\tO\n"));
}

#[test]
fn test_extract_json_summary() {
    let out = TempDir::new().unwrap();
    let assert = extract(&out)
        .arg("-f")
        .arg("json")
        .arg(fixture_path("pages/1092_part1"))
        .assert()
        .success();

    let summary: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(summary["written"][0]["name"], "NL-HaNA_1.04.02_1092_0017_0017");
    assert_eq!(summary["written"][0]["files"].as_array().unwrap().len(), 6);
    assert!(summary["failed"].as_array().unwrap().is_empty());
}

#[test]
fn test_extract_unknown_page_fails_unit() {
    let dir = TempDir::new().unwrap();
    let iiif = dir.path().join("iiif.csv");
    fs::write(
        &iiif,
        "pagexml_id,iiif_base_url\nNL-HaNA_1.04.02_1092_0017,https://iiif.example.org/0017\n",
    )
    .unwrap();
    let out = TempDir::new().unwrap();

    pagealign()
        .arg("extract")
        .arg("-q")
        .arg("-i")
        .arg(&iiif)
        .arg("-o")
        .arg(out.path())
        .arg(fixture_path("pages/1092_part1"))
        .arg(fixture_path("pages/1092_part2"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 written, 1 failed"))
        .stdout(predicate::str::contains("NL-HaNA_1.04.02_1092_0018"))
        .stderr(predicate::str::contains("1 of 2 units failed"));

    assert!(out
        .path()
        .join("NL-HaNA_1.04.02_1092_0017_0017.txt")
        .exists());
}

#[test]
fn test_extract_missing_directory() {
    let out = TempDir::new().unwrap();
    extract(&out)
        .arg("nonexistent_directory")
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_extract_requires_iiif_mapping() {
    pagealign()
        .arg("extract")
        .arg(fixture_path("pages/1092_part1"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--iiif-mapping-file"));
}

#[test]
fn test_realign_documents() {
    let out = TempDir::new().unwrap();
    pagealign()
        .arg("realign")
        .arg("-q")
        .arg("-d")
        .arg(fixture_path("document_data.json"))
        .arg("-o")
        .arg(out.path())
        .arg(fixture_path("external/*.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("brief_1684"))
        .stdout(predicate::str::contains("2 written, 0 failed"));

    let text = fs::read_to_string(out.path().join("brief_1684_plain-text.txt")).unwrap();
    assert_eq!(text, "Het schip Amsterdam vertrok uit Batavia\n");

    let annotations: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(out.path().join("brief_1684_web-annotations.json")).unwrap(),
    )
    .unwrap();
    let annotations = annotations.as_array().unwrap();
    assert_eq!(annotations.len(), 4);
    assert_eq!(annotations[0]["id"], "urn:globalise:annotation:3");

    let rendered = serde_json::to_string(annotations).unwrap();
    assert!(rendered.contains("https://textrepo.example.org/rest/versions/brief-1684/contents"));
    assert!(rendered.contains("https://iiif.example.org/canvas/0017"));
    assert!(rendered.contains("TransportPlus"));

    // text without document data falls back to the placeholder source
    let unknown = fs::read_to_string(out.path().join("unknown_web-annotations.json")).unwrap();
    assert_eq!(unknown.trim(), "[]");
}

#[test]
fn test_realign_missing_document_data() {
    let out = TempDir::new().unwrap();
    pagealign()
        .arg("realign")
        .arg("-d")
        .arg("/nonexistent/document_data.json")
        .arg("-o")
        .arg(out.path())
        .arg(fixture_path("external/*.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load document data"));
}

#[test]
fn test_generate_then_validate_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("pagealign.toml");

    pagealign()
        .arg("generate-config")
        .arg("-o")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Template generated successfully"));

    pagealign()
        .arg("validate")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Namespace: globalise"));
}

#[test]
fn test_validate_broken_tokenizer_rules() {
    let dir = TempDir::new().unwrap();
    let rules = dir.path().join("rules.toml");
    fs::write(
        &rules,
        "[metadata]\ncode = \"nl\"\nname = \"Dutch\"\n\n[terminators]\nchars = [\".\"]\n\n[punctuation]\nchars = [\".\"]\n\n[protected]\npatterns = [\"(unclosed\"]\n",
    )
    .unwrap();

    pagealign()
        .arg("validate")
        .arg("--tokenizer-rules")
        .arg(&rules)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Tokenizer rules is invalid"));
}

#[test]
fn test_validate_needs_a_file() {
    pagealign().arg("validate").assert().failure();
}

#[test]
fn test_config_file_sets_namespace() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("pagealign.toml");
    fs::write(&config, "[processing]\nnamespace = \"republic\"\n").unwrap();
    let out = TempDir::new().unwrap();

    extract(&out)
        .arg("-c")
        .arg(&config)
        .arg(fixture_path("pages/1092_part2"))
        .assert()
        .success();

    let web_annotations = fs::read_to_string(
        out.path()
            .join("NL-HaNA_1.04.02_1092_0018_0018-web-annotations.json"),
    )
    .unwrap();
    assert!(web_annotations.contains("urn:republic:"));
    assert!(!web_annotations.contains("urn:globalise:"));
}
