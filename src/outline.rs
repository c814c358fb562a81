use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHAPTER_WORDS: u32 = 3500;
const DEFAULT_VOICE_NOTES: &str = "Write in a natural, engaging style.";
const DEFAULT_SOURCE_MATERIAL: &str = "Use relevant material from the interview.";

/// Book outline as returned by the outline generation call. Field names match
/// the backend's JSON. Immutable once installed; regeneration replaces it
/// wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outline {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub target_words: Option<u32>,
    #[serde(default)]
    pub audience_description: Option<String>,
    #[serde(default)]
    pub voice_notes: Option<String>,
    pub chapters: Vec<OutlineChapter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineChapter {
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub estimated_words: Option<u32>,
    #[serde(default)]
    pub source_material: Option<String>,
}

impl Outline {
    pub fn voice_notes(&self) -> &str {
        self.voice_notes.as_deref().unwrap_or(DEFAULT_VOICE_NOTES)
    }

    /// One line per chapter, for cross-chapter context in draft prompts.
    pub fn digest(&self) -> String {
        self.chapters
            .iter()
            .map(|ch| format!("Ch {}: {} - {}", ch.number, ch.title, ch.summary))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutlineChapter {
    pub fn words_target(&self) -> u32 {
        self.estimated_words.unwrap_or(DEFAULT_CHAPTER_WORDS)
    }

    pub fn source_material(&self) -> &str {
        self.source_material.as_deref().unwrap_or(DEFAULT_SOURCE_MATERIAL)
    }
}

/// Parse the raw outline response. The model is told not to use markdown but
/// often fences the JSON anyway, so fences are stripped first. No partial
/// outline is ever produced: either the whole document parses or this errors.
pub fn parse_outline(response: &str) -> Result<Outline> {
    let clean = strip_code_blocks(response);
    let outline: Outline = serde_json::from_str(&clean)
        .with_context(|| format!("Failed to parse outline JSON: {}", clean))?;
    if outline.chapters.is_empty() {
        return Err(anyhow!("Outline contained no chapters"));
    }
    Ok(outline)
}

pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json").trim_end_matches("```").trim().to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```").trim_end_matches("```").trim().to_string()
    } else {
        s.to_string()
    }
}
