use crate::config::Config;
use crate::conversation::{ConversationLog, Exchange};
use crate::llm::{LlmClient, Message};
use crate::outline::{parse_outline, Outline};
use crate::prompts;
use anyhow::{anyhow, Result};
use log::{error, info};
use std::collections::BTreeMap;

/// Workflow stages, in order. Transitions are one-directional; no phase is
/// ever revisited with different semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Welcome,
    Interview,
    Outline,
    Drafting,
}

/// Result of one chapter unit. A failed chapter still occupies its slot so
/// the registry is positionally complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftOutcome {
    Drafted(String),
    Failed { chapter_number: u32 },
}

impl DraftOutcome {
    pub fn text(&self) -> String {
        match self {
            DraftOutcome::Drafted(text) => text.clone(),
            DraftOutcome::Failed { chapter_number } => {
                format!("[Error generating chapter {}]", chapter_number)
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DraftOutcome::Failed { .. })
    }
}

/// All mutable state of one ghostwriting session. Owned by the
/// WorkflowManager; nothing lives in globals.
#[derive(Debug, Default)]
pub struct Session {
    pub phase: Phase,
    pub log: ConversationLog,
    pub outline: Option<Outline>,
    pub drafts: BTreeMap<usize, DraftOutcome>,
    pub current_chapter: usize,
    pub ready_for_outline: bool,
    stream_buffer: String,
}

impl Session {
    /// Text of the in-flight call so far. Transient: overwritten on every
    /// delta and cleared when the call settles, never stored as final.
    pub fn streaming_text(&self) -> &str {
        &self.stream_buffer
    }

    pub fn drafting_complete(&self) -> bool {
        match &self.outline {
            Some(outline) => self.drafts.len() == outline.chapters.len(),
            None => false,
        }
    }
}

pub struct WorkflowManager {
    config: Config,
    llm: Box<dyn LlmClient>,
    session: Session,
}

impl WorkflowManager {
    pub fn new(config: Config, llm: Box<dyn LlmClient>) -> Self {
        Self { config, llm, session: Session::default() }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Welcome → Interview. Seeds the log with the fixed opening message and
    /// asks the editor for its first question.
    pub async fn start_interview(&mut self, on_delta: impl FnMut(&str)) -> Result<()> {
        self.session.phase = Phase::Interview;

        let opening = Exchange::author(prompts::OPENING_MESSAGE);
        let messages = vec![Message::from(&opening)];
        let reply = self.stream_call(prompts::INTERVIEW_SYSTEM, messages, on_delta).await?;

        self.session.log.append(opening);
        self.session.log.append(Exchange::editor(reply));
        Ok(())
    }

    /// One interview turn: the author's answer plus the editor's streamed
    /// follow-up. Neither side of the turn is committed to the log until the
    /// call completes, so a transport failure leaves the log untouched and
    /// the author can simply resend.
    pub async fn send_author_message(
        &mut self,
        content: &str,
        on_delta: impl FnMut(&str),
    ) -> Result<()> {
        if self.session.phase != Phase::Interview {
            return Err(anyhow!("Not in the interview phase"));
        }

        let author = Exchange::author(content.trim());
        let mut messages: Vec<Message> =
            self.session.log.exchanges().iter().map(Message::from).collect();
        messages.push(Message::from(&author));

        let reply = self.stream_call(prompts::INTERVIEW_SYSTEM, messages, on_delta).await?;

        self.session.log.append(author);
        self.session.log.append(Exchange::editor(reply));

        // Latches on; further exchanges never clear it.
        if self.session.log.author_count() >= self.config.interview.ready_threshold {
            self.session.ready_for_outline = true;
        }
        Ok(())
    }

    /// Interview → Outline. One non-streaming call over the full transcript;
    /// the response must parse as the outline document after fence stripping.
    /// On any failure no outline is installed and the error is returned for
    /// the caller to decide on retry. Calling again replaces the outline
    /// wholesale.
    pub async fn generate_outline(&mut self) -> Result<&Outline> {
        self.session.phase = Phase::Outline;

        let transcript = self.session.log.transcript_text();
        let messages = vec![Message::user(prompts::outline_request(&transcript))];
        let response = self.llm.chat(prompts::OUTLINE_SYSTEM, &messages).await?;
        let outline = parse_outline(&response)?;

        info!("Outline generated: {} chapters", outline.chapters.len());
        Ok(&*self.session.outline.insert(outline))
    }

    /// Outline → Drafting. Drafts every chapter in order, one streaming call
    /// per chapter, each isolated: a failed chapter stores a sentinel entry
    /// and the loop moves on. A no-op unless an approved outline with
    /// chapters is present.
    pub async fn start_drafting(&mut self, mut on_delta: impl FnMut(usize, &str)) -> Result<()> {
        let outline = match &self.session.outline {
            Some(outline) if !outline.chapters.is_empty() => outline.clone(),
            _ => return Ok(()),
        };
        self.session.phase = Phase::Drafting;

        let transcript = self.session.log.transcript_text();

        for (i, chapter) in outline.chapters.iter().enumerate() {
            // Published before the call so observers can show progress
            // before any text arrives.
            self.session.current_chapter = i;

            let system = prompts::draft_system(outline.voice_notes(), chapter.words_target());
            let prompt = prompts::chapter_prompt(chapter, &outline, &transcript);
            let messages = vec![Message::user(prompt)];

            info!("Drafting chapter {}/{}: {}", i + 1, outline.chapters.len(), chapter.title);
            let outcome = match self
                .stream_call(&system, messages, |text| on_delta(i, text))
                .await
            {
                Ok(text) => DraftOutcome::Drafted(text),
                Err(e) => {
                    error!("Error drafting chapter {}: {:#}", chapter.number, e);
                    DraftOutcome::Failed { chapter_number: chapter.number }
                }
            };
            self.session.drafts.insert(i, outcome);
        }
        Ok(())
    }

    /// Runs one streaming call, mirroring every cumulative snapshot into the
    /// session's transient buffer and to the observer. The buffer is cleared
    /// exactly once, when the call settles, so stale text never leaks into
    /// the next call's first render.
    async fn stream_call(
        &mut self,
        system: &str,
        messages: Vec<Message>,
        mut on_delta: impl FnMut(&str),
    ) -> Result<String> {
        let mut stream = self.llm.chat_stream(system, &messages).await?;
        loop {
            match stream.next_snapshot().await {
                Ok(Some(snapshot)) => {
                    self.session.stream_buffer = snapshot;
                    on_delta(&self.session.stream_buffer);
                }
                Ok(None) => break,
                Err(e) => {
                    self.session.stream_buffer.clear();
                    return Err(e);
                }
            }
        }
        self.session.stream_buffer.clear();
        Ok(stream.into_text())
    }
}
