//! Performance profile display for saved sessions.

use std::sync::Arc;

use adept_core::{FileSessionStore, InterviewMachine, QuestionBank, SessionId, SessionStore};
use anyhow::Result;
use clap::Args;

use crate::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Session ID whose profile to show
    pub session_id: String,

    /// Print the full insights as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ProfileArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let store: Arc<dyn SessionStore> =
        Arc::new(FileSessionStore::new(config.storage.sessions_dir.clone()));

    // Insights are computed by the machine; no questions are needed to read them.
    let mut engine = config.interview_config();
    engine.require_generator = false;
    let machine = InterviewMachine::builder(Arc::new(QuestionBank::default()))
        .store(store)
        .config(engine)
        .build()?;

    let id = SessionId::from(args.session_id.as_str());
    machine.load_profile(&id).await?;
    let insights = machine.session_insights(&id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }

    let summary = &insights.summary;
    println!("Session:            {}", summary.session_id);
    println!("Questions answered: {}", summary.total_questions);
    println!(
        "Correct answers:    {} ({}%)",
        summary.correct_answers, summary.accuracy
    );
    println!("Average score:      {}/100", summary.average_score);
    println!("Current difficulty: {}", summary.current_difficulty);
    println!("Trend:              {}", summary.trend);
    println!("Adaptation:         {}", summary.adaptation_level);

    print_tally("Strengths", &summary.strengths);
    print_tally("Weaknesses", &summary.weaknesses);

    if !insights.difficulty_progression.is_empty() {
        println!();
        println!("Difficulty progression:");
        for step in &insights.difficulty_progression {
            println!("  {:<13} {}/100", step.difficulty.as_str(), step.score);
        }
    }

    if !insights.recommendations.is_empty() {
        println!();
        println!("Recommendations:");
        for rec in &insights.recommendations {
            println!("  [{:?}] {}", rec.priority, rec.message);
        }
    }
    Ok(())
}

fn print_tally(label: &str, entries: &[adept_core::profile::TallyEntry]) {
    if entries.is_empty() {
        return;
    }
    println!();
    println!("{}:", label);
    for entry in entries {
        let aspects: Vec<&str> = entry.aspects.iter().map(|a| a.as_str()).collect();
        println!("  {} ({})", entry.category, aspects.join(", "));
    }
}
