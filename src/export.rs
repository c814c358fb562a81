use crate::outline::Outline;
use crate::workflow::DraftOutcome;
use anyhow::{Context, Result};
use log::info;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Flatten the outline and draft registry into one plain-text document:
/// title, optional subtitle, a rule, then every available chapter body each
/// followed by a rule. Chapters with no entry yet are skipped silently.
pub fn compile_manuscript(outline: &Outline, drafts: &BTreeMap<usize, DraftOutcome>) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(outline.title.to_uppercase());
    if let Some(subtitle) = &outline.subtitle {
        lines.push(subtitle.clone());
    }
    lines.push(format!("\n{}\n", "=".repeat(60)));

    for i in 0..outline.chapters.len() {
        if let Some(outcome) = drafts.get(&i) {
            lines.push(outcome.text());
            lines.push(format!("\n{}\n", "-".repeat(40)));
        }
    }
    lines.join("\n")
}

/// `The Quiet Hive: A Memoir` → `the-quiet-hive-a-memoir.txt`
pub fn manuscript_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    let slug = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    if slug.is_empty() {
        "manuscript.txt".to_string()
    } else {
        format!("{}.txt", slug)
    }
}

pub fn write_manuscript(
    outline: &Outline,
    drafts: &BTreeMap<usize, DraftOutcome>,
    output_folder: impl AsRef<Path>,
) -> Result<PathBuf> {
    let document = compile_manuscript(outline, drafts);
    let path = output_folder.as_ref().join(manuscript_filename(&outline.title));
    fs::write(&path, document)
        .with_context(|| format!("Failed to write manuscript: {}", path.display()))?;
    info!("Manuscript written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::parse_outline;

    fn three_chapter_outline() -> Outline {
        parse_outline(
            r#"{
                "title": "The Quiet Hive",
                "subtitle": "A Year of Bees",
                "chapters": [
                    { "number": 1, "title": "One", "summary": "s1" },
                    { "number": 2, "title": "Two", "summary": "s2" },
                    { "number": 3, "title": "Three", "summary": "s3" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_missing_chapters_are_skipped() {
        let outline = three_chapter_outline();
        let mut drafts = BTreeMap::new();
        drafts.insert(0, DraftOutcome::Drafted("Body of chapter one.".to_string()));
        drafts.insert(2, DraftOutcome::Drafted("Body of chapter three.".to_string()));

        let document = compile_manuscript(&outline, &drafts);
        assert!(document.starts_with("THE QUIET HIVE\nA Year of Bees"));
        assert!(document.contains("=".repeat(60).as_str()));

        let one = document.find("Body of chapter one.").unwrap();
        let three = document.find("Body of chapter three.").unwrap();
        assert!(one < three);
        assert!(!document.contains("chapter two"));
        // One rule per included chapter.
        assert_eq!(document.matches(&"-".repeat(40)).count(), 2);
    }

    #[test]
    fn test_failed_chapter_exports_its_sentinel() {
        let outline = three_chapter_outline();
        let mut drafts = BTreeMap::new();
        drafts.insert(0, DraftOutcome::Drafted("Good chapter.".to_string()));
        drafts.insert(1, DraftOutcome::Failed { chapter_number: 2 });

        let document = compile_manuscript(&outline, &drafts);
        assert!(document.contains("[Error generating chapter 2]"));
    }

    #[test]
    fn test_no_subtitle_line_when_absent() {
        let outline = parse_outline(
            r#"{ "title": "Solo", "chapters": [ { "number": 1, "title": "A", "summary": "s" } ] }"#,
        )
        .unwrap();
        let document = compile_manuscript(&outline, &BTreeMap::new());
        assert!(document.starts_with("SOLO\n\n="));
    }

    #[test]
    fn test_manuscript_filename_slug() {
        assert_eq!(manuscript_filename("The Quiet Hive: A Memoir"), "the-quiet-hive-a-memoir.txt");
        assert_eq!(manuscript_filename("  Spaced   Out  "), "spaced-out.txt");
        assert_eq!(manuscript_filename("!!!"), "manuscript.txt");
    }

    #[test]
    fn test_write_manuscript_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let outline = three_chapter_outline();
        let mut drafts = BTreeMap::new();
        drafts.insert(0, DraftOutcome::Drafted("Text.".to_string()));

        let path = write_manuscript(&outline, &drafts, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "the-quiet-hive.txt");
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("Text."));
    }
}
