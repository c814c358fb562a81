use anyhow::Result;
use firstdraft::config::Config;
use firstdraft::workflow::WorkflowManager;
use firstdraft::{export, llm};
use indicatif::ProgressBar;
use inquire::{Confirm, Select, Text};
use std::io::Write;
use std::time::Duration;

const KEEP_TALKING: &str = "Keep talking";
const GENERATE_OUTLINE: &str = "Generate the outline";
const APPROVE: &str = "Approve and start drafting";
const REGENERATE: &str = "Regenerate the outline";

/// Renders cumulative snapshots incrementally: each update prints only the
/// suffix that was not printed yet.
struct StreamPrinter {
    printed: usize,
}

impl StreamPrinter {
    fn new() -> Self {
        Self { printed: 0 }
    }

    fn update(&mut self, text: &str) {
        if text.len() > self.printed {
            print!("{}", &text[self.printed..]);
            let _ = std::io::stdout().flush();
            self.printed = text.len();
        }
    }

    fn finish(&mut self) {
        println!();
        println!();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with valid LLM settings.");
            return Err(e);
        }
    };
    config.ensure_directories()?;

    let llm = llm::create_llm(&config)?;
    let output_folder = config.output_folder.clone();
    let ready_threshold = config.interview.ready_threshold;
    let mut manager = WorkflowManager::new(config, llm);

    println!();
    println!("  FIRST DRAFT");
    println!("  From conversation to manuscript");
    println!();
    println!("  Tell your story through a guided conversation with a");
    println!("  professional editor. By the end, you'll have a detailed");
    println!("  outline and a full first draft, written in your voice.");
    println!();

    if !Confirm::new("Begin your book?").with_default(true).prompt()? {
        return Ok(());
    }

    // Interview
    print!("\nEDITOR: ");
    let _ = std::io::stdout().flush();
    let mut printer = StreamPrinter::new();
    manager.start_interview(|text| printer.update(text)).await?;
    printer.finish();

    loop {
        let answer = Text::new("You:").prompt()?;
        if answer.trim().is_empty() {
            continue;
        }

        print!("\nEDITOR: ");
        let _ = std::io::stdout().flush();
        let mut printer = StreamPrinter::new();
        match manager.send_author_message(&answer, |text| printer.update(text)).await {
            Ok(()) => printer.finish(),
            Err(e) => {
                printer.finish();
                log::error!("Interview call failed: {:#}", e);
                println!("The editor didn't receive that. Send your answer again.");
                continue;
            }
        }

        if manager.session().ready_for_outline {
            let prompt = format!(
                "You've given {} responses. There may be enough material for an outline.",
                ready_threshold
            );
            let choice = Select::new(&prompt, vec![KEEP_TALKING, GENERATE_OUTLINE]).prompt()?;
            if choice == GENERATE_OUTLINE {
                break;
            }
        }
    }

    // Outline
    loop {
        let spinner = ProgressBar::new_spinner();
        spinner.set_message("Reading the interview and structuring your book...");
        spinner.enable_steady_tick(Duration::from_millis(120));
        let result = manager.generate_outline().await.map(|_| ());
        spinner.finish_and_clear();

        match result {
            Ok(()) => {
                if let Some(outline) = &manager.session().outline {
                    print_outline(outline);
                }
                let choice = Select::new("What next?", vec![APPROVE, REGENERATE]).prompt()?;
                if choice == APPROVE {
                    break;
                }
            }
            Err(e) => {
                log::error!("Outline generation failed: {:#}", e);
                if !Confirm::new("Outline generation failed. Try again?")
                    .with_default(true)
                    .prompt()?
                {
                    return Err(e);
                }
            }
        }
    }

    // Drafting
    let chapter_titles: Vec<String> = manager
        .session()
        .outline
        .as_ref()
        .map(|o| o.chapters.iter().map(|ch| ch.title.clone()).collect())
        .unwrap_or_default();

    let mut active = usize::MAX;
    let mut printer = StreamPrinter::new();
    manager
        .start_drafting(|i, text| {
            if i != active {
                active = i;
                printer = StreamPrinter::new();
                let title = chapter_titles.get(i).map(String::as_str).unwrap_or("");
                println!("\n\n── Chapter {}: {} ──\n", i + 1, title);
            }
            printer.update(text);
        })
        .await?;
    println!();

    let session = manager.session();
    let failed: Vec<String> = session
        .drafts
        .values()
        .filter(|outcome| outcome.is_failed())
        .map(|outcome| outcome.text())
        .collect();
    if !failed.is_empty() {
        println!("Some chapters could not be drafted:");
        for entry in &failed {
            println!("  {}", entry);
        }
    }

    if let Some(outline) = &session.outline {
        let path = export::write_manuscript(outline, &session.drafts, &output_folder)?;
        println!("\nYour first draft is complete: {}", path.display());
    }
    Ok(())
}

fn print_outline(outline: &firstdraft::outline::Outline) {
    println!("\n  {}", outline.title.to_uppercase());
    if let Some(subtitle) = &outline.subtitle {
        println!("  {}", subtitle);
    }
    if let Some(audience) = &outline.audience_description {
        println!("  For: {}", audience);
    }
    if let Some(target) = outline.target_words {
        println!("  Target length: ~{} words", target);
    }
    println!();
    for chapter in &outline.chapters {
        println!("  {}. {} (~{} words)", chapter.number, chapter.title, chapter.words_target());
        if !chapter.summary.is_empty() {
            println!("     {}", chapter.summary);
        }
    }
    println!();
}
