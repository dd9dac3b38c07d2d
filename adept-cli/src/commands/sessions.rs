//! Saved session management.

use adept_core::{FileSessionStore, SessionId, SessionStore};
use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub command: SessionsCommands,
}

#[derive(Subcommand, Debug)]
pub enum SessionsCommands {
    /// List saved sessions, most recent first
    List,
    /// Show a saved session and its final report
    Show {
        /// Session ID to show
        session_id: String,
    },
    /// Delete a saved session with its evaluations and profile
    Delete {
        /// Session ID to delete
        session_id: String,
    },
}

pub async fn run(args: SessionsArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let store = FileSessionStore::new(config.storage.sessions_dir);

    match args.command {
        SessionsCommands::List => list_sessions(&store).await,
        SessionsCommands::Show { session_id } => {
            show_session(&store, &SessionId::from(session_id.as_str())).await
        }
        SessionsCommands::Delete { session_id } => {
            delete_session(&store, &SessionId::from(session_id.as_str())).await
        }
    }
}

async fn list_sessions(store: &FileSessionStore) -> Result<()> {
    let sessions = store.list_sessions().await?;
    if sessions.is_empty() {
        println!("No saved sessions in {}", store.dir().display());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Session").fg(Color::Cyan),
        Cell::new("Candidate").fg(Color::Cyan),
        Cell::new("Topic").fg(Color::Cyan),
        Cell::new("State").fg(Color::Cyan),
        Cell::new("Answered").fg(Color::Cyan),
        Cell::new("Average").fg(Color::Cyan),
        Cell::new("Updated").fg(Color::Cyan),
    ]);

    for session in sessions {
        table.add_row(vec![
            Cell::new(session.session_id.as_str()),
            Cell::new(session.candidate_name.as_deref().unwrap_or("-")),
            Cell::new(&session.topic),
            Cell::new(session.state.as_str()),
            Cell::new(session.progress.questions_answered),
            Cell::new(format!("{:.1}", session.progress.average_score)),
            Cell::new(session.updated_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    println!("{table}");
    Ok(())
}

async fn show_session(store: &FileSessionStore, id: &SessionId) -> Result<()> {
    let state = store.load_session(id).await?;
    let session = &state.session;

    println!("Session:    {}", session.id);
    if let Some(name) = &session.candidate_name {
        println!("Candidate:  {}", name);
    }
    println!("Topic:      {}", session.topic);
    println!("Difficulty: {}", session.difficulty);
    println!("State:      {}", state.current_state);
    println!(
        "Progress:   {}/{} answered, {} evaluated",
        state.progress.questions_answered,
        session.total_questions,
        state.progress.questions_evaluated
    );
    println!("LLM calls:  {}", state.metadata.llm_calls);

    if let Some(report) = &state.final_report {
        println!();
        println!("{}", report);
        return Ok(());
    }

    let evaluations = store.load_evaluations(id).await?;
    if !evaluations.is_empty() {
        println!();
        for evaluation in evaluations {
            println!(
                "  {} [{} / {}] {}/100",
                evaluation.question_id,
                evaluation.category,
                evaluation.difficulty,
                evaluation.score()
            );
        }
    }
    Ok(())
}

async fn delete_session(store: &FileSessionStore, id: &SessionId) -> Result<()> {
    if store.delete_session(id).await? {
        println!("Session '{}' deleted.", id);
    } else {
        println!("No saved session '{}'.", id);
    }
    Ok(())
}
