use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use gita_core::chapters::{self, is_supported_language};
use gita_core::{Config, Explanation, ExplanationClient, CHAPTERS, DEFAULT_LANGUAGE, FETCH_ERROR_MESSAGE, LANGUAGES};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "gita", version)]
#[command(about = "Bhagavad Gita verses explained for modern life")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log progress to stderr (subcommands only)
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Explain one verse and print the result
    Explain {
        /// Chapter number (1-18)
        #[arg(short, long)]
        chapter: u8,
        /// Verse number within the chapter
        #[arg(short, long)]
        verse: u16,
        /// Language of the explanation
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,
        /// Print the raw JSON explanation
        #[arg(long)]
        json: bool,
    },
    /// List the chapters and their verse counts
    Chapters,
    /// List the supported explanation languages
    Languages,
    /// List models for the configured provider
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        if let Err(e) = logging::init_file_logging() {
            eprintln!("warning: file logging disabled: {}", e);
        }
        return run_tui().await;
    };

    logging::init_stderr_logging(cli.verbose);
    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });

    match command {
        Commands::Explain {
            chapter,
            verse,
            language,
            json,
        } => explain_verse(&config, chapter, verse, &language, json).await,
        Commands::Chapters => {
            list_chapters();
            Ok(())
        }
        Commands::Languages => {
            list_languages();
            Ok(())
        }
        Commands::Models => list_models(&config).await,
    }
}

async fn run_tui() -> Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });
    let config_path = Config::config_path().ok();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(config, config_path, &mut rand::thread_rng());

    let result = run_loop(&mut terminal, &mut app, &mut events).await;
    app.quit();
    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event);
        app.poll_tasks();
    }
    Ok(())
}

async fn explain_verse(config: &Config, chapter: u8, verse: u16, language: &str, json: bool) -> Result<()> {
    let info = chapters::chapter(chapter)
        .ok_or_else(|| anyhow!("chapter must be between 1 and {}", CHAPTERS.len()))?;
    if verse == 0 || verse > info.verse_count {
        bail!("chapter {} has verses 1 to {}", chapter, info.verse_count);
    }
    if !is_supported_language(language) {
        warn!(language, "language is not in the supported list, sending it anyway");
    }

    let client = ExplanationClient::from_config(config);
    let explanation = client
        .fetch_explanation(chapter, verse, language)
        .await
        .map_err(|_| anyhow!(FETCH_ERROR_MESSAGE))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&explanation)?);
    } else {
        print_explanation(chapter, verse, language, &explanation);
    }
    Ok(())
}

fn print_explanation(chapter: u8, verse: u16, language: &str, explanation: &Explanation) {
    println!("Bhagavad Gita Chapter {}, Verse {} ({})", chapter, verse, language);
    println!();
    println!("Key Takeaway: \"{}\"", explanation.key_takeaway);
    println!();
    println!("{}", explanation.sanskrit);
    println!("{}", explanation.transliteration);
    println!();
    println!("{}", explanation.translation);
    println!();
    println!("Modern Context");
    println!("{}", explanation.modern_context);
    println!();
    println!("Practical Application");
    println!("{}", explanation.practical_application);
}

fn list_chapters() {
    for info in CHAPTERS.iter() {
        println!(
            "{:>2}. {:<28} {:>3} verses  {}",
            info.number, info.name, info.verse_count, info.translation
        );
    }
}

fn list_languages() {
    for language in LANGUAGES {
        println!("{}", language);
    }
}

async fn list_models(config: &Config) -> Result<()> {
    let client = ExplanationClient::from_config(config);
    let backend = client.backend().ok_or_else(|| {
        anyhow!(
            "no API key configured for {}; set it in the TUI (P) or via the environment",
            client.provider().display_name()
        )
    })?;

    for model in backend.list_models().await? {
        let marker = if model == client.model() { "*" } else { " " };
        println!("{} {}", marker, model);
    }
    Ok(())
}
