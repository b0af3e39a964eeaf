use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, AlwaysConfirm, Clipboard, Confirmation, GenerationForm, Studio, SubmitOutcome,
};
use shared::domain::{DraftId, StyleId};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "studio", about = "Analyze writing styles and generate posts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Saved writing styles.
    Styles {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Saved drafts.
    Drafts {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Analyze sample posts and save the result as a new style.
    Analyze {
        /// Read posts from a file instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Generate candidate posts in a saved style.
    Generate {
        /// Style to write in; defaults to the first listed style.
        #[arg(long)]
        style: Option<String>,
        #[arg(long)]
        topic: String,
        #[arg(long)]
        key_points: String,
        #[arg(long, default_value = "")]
        cta: String,
        /// One subject or angle per line.
        #[arg(long, default_value = "")]
        subjects: String,
        /// Save the candidate at this index as a draft.
        #[arg(long)]
        save: Vec<usize>,
        /// Copy the candidate at this index to the clipboard.
        #[arg(long)]
        copy: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
enum ListAction {
    List,
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

struct StdinConfirmation;

#[async_trait]
impl Confirmation for StdinConfirmation {
    async fn confirm(&self, prompt: &str) -> bool {
        eprint!("{prompt} [y/N] ");
        let mut answer = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        if let Err(err) = stdin.read_line(&mut answer).await {
            warn!(error = %err, "could not read confirmation");
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }
}

struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("open system clipboard")?;
        clipboard
            .set_text(text.to_string())
            .context("write to system clipboard")?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = load_settings()?;

    let skip_prompt = matches!(
        &cli.command,
        Command::Styles {
            action: ListAction::Delete { yes: true, .. }
        } | Command::Drafts {
            action: ListAction::Delete { yes: true, .. }
        }
    );
    let confirmation: Arc<dyn Confirmation> = if skip_prompt {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(StdinConfirmation)
    };
    let studio = Studio::from_settings(&settings, confirmation, Arc::new(SystemClipboard))?;

    match cli.command {
        Command::Styles { action } => run_styles(&studio, action).await,
        Command::Drafts { action } => run_drafts(&studio, action).await,
        Command::Analyze { file } => run_analyze(&studio, file).await,
        Command::Generate {
            style,
            topic,
            key_points,
            cta,
            subjects,
            save,
            copy,
        } => {
            let form = GenerationForm {
                topic,
                key_points,
                cta,
                subjects,
            };
            run_generate(&studio, style.map(StyleId::new), form, save, copy).await
        }
    }
}

async fn run_styles(studio: &Studio, action: ListAction) -> Result<()> {
    studio.styles().load().await?;
    match action {
        ListAction::List => {
            let styles = studio.styles().items().await;
            if styles.is_empty() {
                println!("No styles saved yet.");
            }
            for style in styles {
                println!("{}  {}", style.id, style.name);
                for (label, value) in style.analysis.display_items() {
                    println!("    {label}: {value}");
                }
            }
        }
        ListAction::Delete { id, .. } => {
            let outcome = studio.styles().delete(&StyleId::new(id.clone())).await?;
            println!("{id}: {outcome:?}");
        }
    }
    Ok(())
}

async fn run_drafts(studio: &Studio, action: ListAction) -> Result<()> {
    studio.drafts().load().await?;
    match action {
        ListAction::List => {
            let drafts = studio.drafts().items().await;
            if drafts.is_empty() {
                println!("No drafts saved yet.");
            }
            for draft in drafts {
                println!(
                    "{}  {}  {}",
                    draft.id,
                    draft.created_at.format("%Y-%m-%d %H:%M"),
                    draft.topic.as_deref().unwrap_or("(no topic)")
                );
                println!("    {}", draft.text.replace('\n', "\n    "));
            }
        }
        ListAction::Delete { id, .. } => {
            let outcome = studio.drafts().delete(&DraftId::new(id.clone())).await?;
            println!("{id}: {outcome:?}");
        }
    }
    Ok(())
}

async fn run_analyze(studio: &Studio, file: Option<PathBuf>) -> Result<()> {
    let posts_text = match file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("read {}", path.display()))?,
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            text
        }
    };

    let response = studio.analyzer().analyze(&posts_text).await?;
    let snapshot = studio.analyzer().snapshot().await;
    if let Some(message) = snapshot.message {
        println!("{message}");
    }
    if let Some(style_id) = response.style_id {
        println!(
            "saved style {style_id} ({})",
            response.style_name.as_deref().unwrap_or("unnamed")
        );
    }
    for (label, value) in response.analysis.display_items() {
        println!("{label}: {value}");
    }
    Ok(())
}

async fn run_generate(
    studio: &Studio,
    style: Option<StyleId>,
    form: GenerationForm,
    save: Vec<usize>,
    copy: Option<usize>,
) -> Result<()> {
    studio.styles().load().await?;
    if let Some(style) = style {
        studio.styles().select(&style).await?;
    }

    match studio.session().submit(&form).await {
        SubmitOutcome::Generated(_) => {}
        SubmitOutcome::Empty => {
            if let Some(notice) = studio.session().snapshot().await.notice {
                println!("{notice}");
            }
            return Ok(());
        }
        SubmitOutcome::Invalid(err) | SubmitOutcome::Failed(err) => return Err(err.into()),
        SubmitOutcome::Busy | SubmitOutcome::Superseded => bail!("generation was interrupted"),
    }

    let snapshot = studio.session().snapshot().await;
    for (index, candidate) in snapshot.candidates.iter().enumerate() {
        println!("--- [{index}] ---\n{candidate}\n");
    }

    let tracker = studio.session().tracker();
    for index in save {
        match tracker.save(index).await {
            Ok(draft_id) => println!("saved candidate {index} as draft {draft_id}"),
            Err(err) => eprintln!("could not save candidate {index}: {err}"),
        }
    }
    if let Some(index) = copy {
        if tracker.copy(index).await {
            println!("copied candidate {index} to the clipboard");
        } else {
            eprintln!("could not copy candidate {index}");
        }
    }
    Ok(())
}
