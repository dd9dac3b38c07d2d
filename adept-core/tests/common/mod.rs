//! Shared test utilities for adept-core integration tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adept_core::{
    InterviewConfig, InterviewMachine, InterviewState, QuestionBank, StateTag, StepAction,
};
use adept_models::{Error as ModelError, Generation, Result as ModelResult, TextGenerator};
use async_trait::async_trait;

/// Two categories, two questions per category and difficulty.
pub const BANK: &str = r#"{
    "categories": {
        "formulas": {"name": "Formulas", "description": "Functions and formulas"},
        "charts": {"name": "Charts", "description": "Visualizing data"}
    },
    "questions": [
        {"id": "f-b1", "question": "What does SUM do?", "difficulty": "beginner", "category": "formulas"},
        {"id": "f-b2", "question": "What does AVERAGE do?", "difficulty": "beginner", "category": "formulas"},
        {"id": "f-i1", "question": "Explain VLOOKUP", "difficulty": "intermediate", "category": "formulas",
         "expectedAnswer": "Looks up a value in the first column", "keyPoints": ["exact match", "column index"]},
        {"id": "f-i2", "question": "Explain SUMIFS", "difficulty": "intermediate", "category": "formulas"},
        {"id": "f-a1", "question": "Explain LAMBDA", "difficulty": "advanced", "category": "formulas"},
        {"id": "f-a2", "question": "Explain LET", "difficulty": "advanced", "category": "formulas"},
        {"id": "c-b1", "question": "How do you insert a chart?", "difficulty": "beginner", "category": "charts"},
        {"id": "c-b2", "question": "What is a pie chart for?", "difficulty": "beginner", "category": "charts"},
        {"id": "c-i1", "question": "When would you use a combo chart?", "difficulty": "intermediate", "category": "charts"},
        {"id": "c-i2", "question": "Explain secondary axes", "difficulty": "intermediate", "category": "charts"},
        {"id": "c-a1", "question": "Build a dynamic chart range", "difficulty": "advanced", "category": "charts"},
        {"id": "c-a2", "question": "Explain waterfall charts", "difficulty": "advanced", "category": "charts"}
    ]
}"#;

#[allow(dead_code)]
pub fn bank() -> Arc<QuestionBank> {
    Arc::new(QuestionBank::from_json(BANK).unwrap())
}

/// A rubric response with the same score everywhere.
#[allow(dead_code)]
pub fn scored(score: u8) -> String {
    format!(
        r#"{{
            "correctness": {{"score": {score}, "feedback": "c"}},
            "depth": {{"score": {score}, "feedback": "d"}},
            "clarity": {{"score": {score}, "feedback": "l"}},
            "overall": {{"score": {score}, "feedback": "overall",
                "strengths": ["Clear"], "improvements": ["Examples"]}}
        }}"#
    )
}

/// Answers evaluation prompts from a queue and everything else with a
/// fixed sentence. Records every prompt.
#[allow(dead_code)]
#[derive(Default)]
pub struct RoutingGenerator {
    evaluations: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RoutingGenerator {
    pub fn new(evaluations: impl IntoIterator<Item = String>) -> Self {
        Self {
            evaluations: Mutex::new(evaluations.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for RoutingGenerator {
    fn name(&self) -> &str {
        "routing"
    }

    async fn generate(&self, prompt: &str) -> ModelResult<Generation> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.starts_with("You are an expert") {
            return match self.evaluations.lock().unwrap().pop_front() {
                Some(reply) => Ok(Generation::text(reply)),
                None => Err(ModelError::Request("no evaluation scripted".to_string())),
            };
        }
        Ok(Generation::text("Generated by the model."))
    }
}

/// Fails every request.
#[allow(dead_code)]
#[derive(Default)]
pub struct FailingGenerator {
    pub calls: Mutex<usize>,
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> ModelResult<Generation> {
        *self.calls.lock().unwrap() += 1;
        Err(ModelError::ProviderApi("service unavailable".to_string()))
    }
}

/// Never answers within the generation timeout.
#[allow(dead_code)]
pub struct StalledGenerator;

#[async_trait]
impl TextGenerator for StalledGenerator {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn generate(&self, _prompt: &str) -> ModelResult<Generation> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Generation::text("too late"))
    }
}

#[allow(dead_code)]
pub fn offline_machine() -> InterviewMachine {
    InterviewMachine::builder(bank())
        .config(InterviewConfig {
            require_generator: false,
            ..Default::default()
        })
        .build()
        .unwrap()
}

#[allow(dead_code)]
pub fn machine_with(generator: Arc<dyn TextGenerator>) -> InterviewMachine {
    InterviewMachine::builder(bank())
        .generator(generator)
        .build()
        .unwrap()
}

/// Run intro and show the first question.
#[allow(dead_code)]
pub async fn begin(machine: &InterviewMachine, state: InterviewState) -> InterviewState {
    let state = machine.step(&state, None).await.unwrap();
    assert_eq!(state.current_state, StateTag::Intro);
    let state = machine
        .step(&state, Some(StepAction::goto(StateTag::AskingQuestions)))
        .await
        .unwrap();
    assert!(state.ui.is_waiting_for_answer);
    state
}

/// Answer the question on screen and run evaluation.
#[allow(dead_code)]
pub async fn answer(machine: &InterviewMachine, state: &InterviewState, text: &str) -> InterviewState {
    let question_id = state.current_question().unwrap().id.clone();
    let state = machine.add_answer(state, &question_id, text).unwrap();
    let state = machine
        .step(&state, Some(StepAction::goto(StateTag::CollectingAnswers)))
        .await
        .unwrap();
    machine
        .step(&state, Some(StepAction::goto(StateTag::Evaluating)))
        .await
        .unwrap()
}

/// Answer every remaining question and finish the interview.
#[allow(dead_code)]
pub async fn run_to_completion(
    machine: &InterviewMachine,
    mut state: InterviewState,
    text: &str,
) -> InterviewState {
    while state.current_state == StateTag::AskingQuestions {
        state = answer(machine, &state, text).await;
        state = machine.step(&state, None).await.unwrap();
    }
    assert_eq!(state.current_state, StateTag::Completed);
    state
}
