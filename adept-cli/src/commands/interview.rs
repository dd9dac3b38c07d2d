//! Interactive interview driver.
//!
//! Runs the state machine to completion in the terminal, reading answers
//! from stdin. With a session store configured the state is saved after
//! every step, so `--resume` can pick an interrupted interview back up.

use std::path::PathBuf;
use std::sync::Arc;

use adept_core::{
    Difficulty, FileSessionStore, InterviewError, InterviewMachine, InterviewState,
    QuestionBank, SessionConfig, SessionId, StateTag, StepAction,
};
use adept_models::auth::CredentialStore;
use adept_models::providers::OpenAiProvider;
use adept_models::{ChatGenerator, TextGenerator};
use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use tracing::{debug, info, warn};

use super::auth::KEYRING_SERVICE;
use crate::config::{AdeptConfig, ConfigLoader};

/// Typed in place of an answer to stop and keep the session for later.
const QUIT_COMMAND: &str = "/quit";

#[derive(Args, Debug)]
pub struct InterviewArgs {
    /// Interview topic
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Number of questions to ask
    #[arg(short = 'n', long)]
    pub questions: Option<u32>,

    /// Starting difficulty (beginner, intermediate, advanced)
    #[arg(short, long)]
    pub difficulty: Option<Difficulty>,

    /// Candidate name used in the welcome and the report
    #[arg(long)]
    pub name: Option<String>,

    /// Question bank JSON file
    #[arg(short, long)]
    pub bank: Option<PathBuf>,

    /// Run without a text generator (fallback scoring and feedback)
    #[arg(long)]
    pub offline: bool,

    /// Do not persist the session
    #[arg(long, conflicts_with = "resume")]
    pub no_save: bool,

    /// Continue a saved session
    #[arg(long, value_name = "SESSION_ID")]
    pub resume: Option<String>,
}

pub async fn run(args: InterviewArgs) -> Result<()> {
    let config = ConfigLoader::load()?;

    let bank_path = args
        .bank
        .clone()
        .or_else(|| config.interview.bank.clone())
        .ok_or_else(|| {
            anyhow!("No question bank configured. Pass --bank <file> or set interview.bank")
        })?;
    let bank = QuestionBank::load(&bank_path)
        .with_context(|| format!("Failed to load question bank {}", bank_path.display()))?;

    let generator = if args.offline {
        None
    } else {
        build_generator(&config)
    };

    let mut engine = config.interview_config();
    if generator.is_none() {
        engine.require_generator = false;
        println!("No text generator configured; answers are scored with the fallback heuristic.");
        println!("Run `adept auth` to configure an API key.");
        println!();
    }

    let mut builder = InterviewMachine::builder(Arc::new(bank)).config(engine);
    if let Some(generator) = generator {
        builder = builder.generator(generator);
    }
    if !args.no_save {
        builder = builder.store(Arc::new(FileSessionStore::new(
            config.storage.sessions_dir.clone(),
        )));
    }
    let machine = builder.build()?;

    let state = match &args.resume {
        Some(id) => resume(&machine, &SessionId::from(id.as_str())).await?,
        None => {
            let mut session = SessionConfig::new()
                .topic(args.topic.unwrap_or(config.interview.topic))
                .difficulty(args.difficulty.unwrap_or(config.interview.difficulty))
                .total_questions(args.questions.unwrap_or(config.interview.total_questions));
            if let Some(name) = args.name {
                session = session.candidate_name(name);
            }
            let state = machine.start(session)?;
            info!(session_id = %state.session.id, "Starting interview");
            machine.step(&state, None).await?
        }
    };

    drive(&machine, state).await
}

/// Build the chat generator from the configured provider and stored key.
///
/// A custom `base_url` works without a key, since local servers usually
/// don't check one.
fn build_generator(config: &AdeptConfig) -> Option<Arc<dyn TextGenerator>> {
    let store = CredentialStore::new(KEYRING_SERVICE).with_env_fallback();
    let key = store
        .resolve(&config.generator.provider)
        .map(|(key, source)| {
            debug!(provider = %config.generator.provider, ?source, "Resolved API key");
            key
        });

    let provider = match (&config.generator.base_url, key) {
        (Some(url), key) => OpenAiProvider::with_base_url(url, key),
        (None, Some(key)) => OpenAiProvider::new(key),
        (None, None) => return None,
    };

    Some(Arc::new(ChatGenerator::new(
        Arc::new(provider),
        config.generator_config(),
    )))
}

async fn resume(machine: &InterviewMachine, id: &SessionId) -> Result<InterviewState> {
    let store = machine
        .session_store()
        .ok_or_else(|| anyhow!("Resuming needs a session store"))?;
    let state = store.load_session(id).await?;

    if state.is_completed() {
        bail!("Session {} is already completed", id);
    }

    match machine.load_profile(id).await {
        Ok(summary) => debug!(session_id = %id, answered = summary.total_questions, "Profile restored"),
        Err(InterviewError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    println!("Resuming session {} ({}).", id, state.current_state);
    println!();

    if state.current_state == StateTag::AskingQuestions && state.ui.is_waiting_for_answer {
        return Ok(state);
    }
    Ok(machine.step(&state, None).await?)
}

/// Advance the machine until the interview completes or the user quits.
async fn drive(machine: &InterviewMachine, mut state: InterviewState) -> Result<()> {
    let theme = ColorfulTheme::default();
    println!("{}", state.ui.current_message);
    println!();

    loop {
        let action = match state.current_state {
            StateTag::Completed => break,
            StateTag::Intro => Some(StepAction::goto(StateTag::AskingQuestions)),
            StateTag::AskingQuestions if state.ui.is_waiting_for_answer => {
                let Some(question_id) = state.current_question().map(|q| q.id.clone()) else {
                    bail!("No question is waiting for an answer");
                };

                let text: String = Input::with_theme(&theme)
                    .with_prompt("Answer")
                    .interact_text()?;

                if text.trim() == QUIT_COMMAND {
                    save(machine, &state).await;
                    println!("Interview paused. Resume with: adept interview --resume {}", state.session.id);
                    return Ok(());
                }

                state = machine.add_answer(&state, &question_id, &text)?;
                Some(StepAction::goto(StateTag::CollectingAnswers))
            }
            StateTag::CollectingAnswers => Some(StepAction::goto(StateTag::Evaluating)),
            StateTag::Error => {
                let retry = Confirm::with_theme(&theme)
                    .with_prompt("Retry from the current question?")
                    .default(true)
                    .interact()?;
                if !retry {
                    save(machine, &state).await;
                    bail!(
                        "Interview stopped: {}",
                        state.ui.error_message.as_deref().unwrap_or("unknown error")
                    );
                }
                Some(StepAction::goto(StateTag::Intro))
            }
            _ => None,
        };

        let previous = state.ui.current_message.clone();
        state = machine.step(&state, action).await?;
        save(machine, &state).await;

        if state.ui.current_message != previous {
            println!();
            println!("{}", state.ui.current_message);
            println!();
        }
    }

    if machine.session_store().is_some() {
        println!("Session saved as {}", state.session.id);
    }
    Ok(())
}

async fn save(machine: &InterviewMachine, state: &InterviewState) {
    if let Some(store) = machine.session_store()
        && let Err(e) = store.save_session(state).await
    {
        warn!(session_id = %state.session.id, error = %e, "Failed to save session");
    }
}
