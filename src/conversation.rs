use serde::{Deserialize, Serialize};

/// Who spoke: the human author being interviewed, or the editor persona
/// played by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Author,
    Editor,
}

impl Role {
    pub fn speaker_label(&self) -> &'static str {
        match self {
            Role::Author => "AUTHOR",
            Role::Editor => "EDITOR",
        }
    }
}

/// One turn of dialogue. Immutable once appended to the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub role: Role,
    pub content: String,
}

impl Exchange {
    pub fn author(content: impl Into<String>) -> Self {
        Self { role: Role::Author, content: content.into() }
    }

    pub fn editor(content: impl Into<String>) -> Self {
        Self { role: Role::Editor, content: content.into() }
    }
}

/// Append-only ordered history of the interview. Order is the single source
/// of truth for prompt reconstruction; nothing is ever deleted or reordered.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    exchanges: Vec<Exchange>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, exchange: Exchange) {
        self.exchanges.push(exchange);
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn author_count(&self) -> usize {
        self.exchanges.iter().filter(|e| e.role == Role::Author).count()
    }

    /// Lazily formatted transcript lines, one per exchange.
    pub fn transcript(&self) -> impl Iterator<Item = String> + '_ {
        self.exchanges
            .iter()
            .map(|e| format!("{}: {}", e.role.speaker_label(), e.content))
    }

    /// Full transcript as a single string, exchanges separated by blank lines.
    pub fn transcript_text(&self) -> String {
        self.transcript().collect::<Vec<_>>().join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_ordering_and_labels() {
        let mut log = ConversationLog::new();
        log.append(Exchange::author("I want to write about beekeeping."));
        log.append(Exchange::editor("Wonderful. What drew you to bees?"));
        log.append(Exchange::author("My grandfather kept hives."));

        let lines: Vec<String> = log.transcript().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "AUTHOR: I want to write about beekeeping.");
        assert_eq!(lines[1], "EDITOR: Wonderful. What drew you to bees?");
        assert_eq!(lines[2], "AUTHOR: My grandfather kept hives.");

        let text = log.transcript_text();
        assert!(text.contains("beekeeping.\n\nEDITOR:"));
    }

    #[test]
    fn test_transcript_is_restartable() {
        let mut log = ConversationLog::new();
        log.append(Exchange::author("Hello"));

        assert_eq!(log.transcript().count(), 1);
        // A second pass over the same log yields the same lines.
        assert_eq!(log.transcript().count(), 1);
    }

    #[test]
    fn test_author_count_ignores_editor_turns() {
        let mut log = ConversationLog::new();
        for _ in 0..3 {
            log.append(Exchange::author("answer"));
            log.append(Exchange::editor("question"));
        }
        assert_eq!(log.author_count(), 3);
        assert_eq!(log.len(), 6);
    }
}
