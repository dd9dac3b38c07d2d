use std::fmt::{self, Write};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    Assessment, CORRECT_THRESHOLD, Evaluation, EvaluationSource, Rubric, evaluation_prompt,
    parse_heuristic, parse_strict,
};
use crate::Result;
use crate::error::InterviewError;
use crate::generation::BoundedGenerator;
use crate::types::{Answer, Question};

/// Scores answers against a [`Rubric`].
///
/// Only input validation can fail. Generation failures, timeouts, and
/// unparsable output all degrade to heuristic scoring.
#[derive(Debug, Clone)]
pub struct AnswerEvaluator {
    generator: BoundedGenerator,
    rubric: Rubric,
}

impl AnswerEvaluator {
    pub fn new(generator: BoundedGenerator, rubric: Rubric) -> Self {
        Self { generator, rubric }
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Whether evaluations can come from the model rather than defaults.
    pub fn is_model_backed(&self) -> bool {
        self.generator.is_available()
    }

    /// Evaluate one answer.
    pub async fn evaluate(&self, question: &Question, answer: &Answer) -> Result<Evaluation> {
        if question.prompt.trim().is_empty() {
            return Err(InterviewError::validation("question text is empty"));
        }
        if answer.content.trim().is_empty() {
            return Err(InterviewError::validation("answer text is empty"));
        }

        let prompt = evaluation_prompt(question, &answer.content, &self.rubric);
        let (assessment, source) = match self.generator.try_generate("evaluation", &prompt).await {
            Some(text) => match parse_strict(&text) {
                Ok(assessment) => (assessment, EvaluationSource::Model),
                Err(e) => {
                    let err = InterviewError::MalformedResponse(e.to_string());
                    warn!(question_id = %question.id, error = %err, "Falling back to heuristic scoring");
                    (parse_heuristic(&text), EvaluationSource::Heuristic)
                }
            },
            None => (parse_heuristic(""), EvaluationSource::Heuristic),
        };

        let weighted_score = self.rubric.weighted_score(&assessment);
        let detailed_feedback = detailed_feedback(&assessment, question);
        let evaluation = Evaluation {
            question_id: question.id.clone(),
            category: question.category.clone(),
            difficulty: question.difficulty,
            is_correct: assessment.overall.score >= CORRECT_THRESHOLD,
            assessment,
            weighted_score,
            detailed_feedback,
            source,
            evaluated_at: Utc::now(),
        };

        debug!(
            question_id = %evaluation.question_id,
            score = evaluation.score(),
            weighted_score,
            ?source,
            "Answer evaluated"
        );
        Ok(evaluation)
    }

    /// Evaluate pairs one after another. A failed pair is recorded and the
    /// rest still run.
    pub async fn evaluate_batch(&self, pairs: &[(Question, Answer)]) -> BatchEvaluation {
        let mut items = Vec::with_capacity(pairs.len());
        for (question, answer) in pairs {
            let outcome = self.evaluate(question, answer).await.map_err(|e| e.to_string());
            items.push(BatchItem {
                question_id: question.id.clone(),
                outcome,
            });
        }

        let summary = BatchSummary::from_items(&items);
        info!(
            total = summary.total_questions,
            valid = summary.valid_evaluations,
            average = summary.average_score,
            "Batch evaluation complete"
        );
        BatchEvaluation { items, summary }
    }
}

/// Markdown breakdown of an assessment.
fn detailed_feedback(assessment: &Assessment, question: &Question) -> String {
    let mut out = String::from("## Detailed Evaluation\n\n");

    for (title, c) in [
        ("Correctness", &assessment.correctness),
        ("Depth", &assessment.depth),
        ("Clarity", &assessment.clarity),
    ] {
        let _ = write!(
            out,
            "### {title} ({}/100 - {})\n{}\n\n",
            c.score,
            c.level.as_str().to_uppercase(),
            c.feedback
        );
    }

    let overall = &assessment.overall;
    let _ = write!(
        out,
        "### Overall Assessment ({}/100)\n{}\n\n",
        overall.score, overall.feedback
    );

    if !overall.strengths.is_empty() {
        out.push_str("### Strengths\n");
        for s in &overall.strengths {
            let _ = writeln!(out, "- {s}");
        }
        out.push('\n');
    }

    if !overall.improvements.is_empty() {
        out.push_str("### Areas for Improvement\n");
        for s in &overall.improvements {
            let _ = writeln!(out, "- {s}");
        }
        out.push('\n');
    }

    if let Some(example) = &question.example {
        let _ = write!(out, "### Example\n{example}\n\n");
    }

    out
}

/// Result of evaluating one pair in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub question_id: String,
    pub outcome: std::result::Result<Evaluation, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEvaluation {
    pub items: Vec<BatchItem>,
    pub summary: BatchSummary,
}

/// Banded label for a batch average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Satisfactory,
    NeedsImprovement,
    NoValidEvaluations,
}

impl PerformanceLevel {
    fn from_average(average: u8) -> Self {
        match average {
            90.. => Self::Excellent,
            80..=89 => Self::Good,
            70..=79 => Self::Satisfactory,
            _ => Self::NeedsImprovement,
        }
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Satisfactory => "Satisfactory",
            Self::NeedsImprovement => "Needs Improvement",
            Self::NoValidEvaluations => "No valid evaluations",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_questions: usize,
    pub valid_evaluations: usize,
    pub average_score: u8,
    pub highest_score: u8,
    pub lowest_score: u8,
    pub performance_level: PerformanceLevel,
}

impl BatchSummary {
    fn from_items(items: &[BatchItem]) -> Self {
        let scores: Vec<u8> = items
            .iter()
            .filter_map(|i| i.outcome.as_ref().ok())
            .map(Evaluation::score)
            .collect();

        let (Some(highest), Some(lowest)) = (scores.iter().max(), scores.iter().min()) else {
            return Self {
                total_questions: items.len(),
                valid_evaluations: 0,
                average_score: 0,
                highest_score: 0,
                lowest_score: 0,
                performance_level: PerformanceLevel::NoValidEvaluations,
            };
        };

        let sum: u32 = scores.iter().map(|s| u32::from(*s)).sum();
        let average = (f64::from(sum) / scores.len() as f64).round() as u8;
        Self {
            total_questions: items.len(),
            valid_evaluations: scores.len(),
            average_score: average,
            highest_score: *highest,
            lowest_score: *lowest,
            performance_level: PerformanceLevel::from_average(average),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::evaluation::ScoreLevel;
    use crate::generation::testing::ScriptedGenerator;
    use crate::types::Difficulty;

    const MODEL_REPLY: &str = r#"{
        "correctness": {"score": 90, "level": "excellent", "feedback": "Spot on."},
        "depth": {"score": 80, "level": "good", "feedback": "Good detail."},
        "clarity": {"score": 70, "level": "satisfactory", "feedback": "A bit rambling."},
        "overall": {"score": 82, "feedback": "Solid.", "strengths": ["Accurate"], "improvements": ["Structure"]}
    }"#;

    fn question() -> Question {
        Question::new("q_1", "What does VLOOKUP do?", Difficulty::Beginner, "formulas")
            .with_example("=VLOOKUP(A2, B:C, 2, FALSE)")
    }

    fn evaluator(replies: impl IntoIterator<Item = &'static str>) -> AnswerEvaluator {
        let generator = BoundedGenerator::new(
            Some(Arc::new(ScriptedGenerator::new(replies))),
            Duration::from_secs(5),
        );
        AnswerEvaluator::new(generator, Rubric::default())
    }

    #[tokio::test]
    async fn model_reply_is_parsed_and_weighted() {
        let evaluation = evaluator([MODEL_REPLY])
            .evaluate(&question(), &Answer::new("q_1", "Looks up values"))
            .await
            .unwrap();

        assert_eq!(evaluation.source, EvaluationSource::Model);
        assert_eq!(evaluation.score(), 82);
        // 90*0.5 + 80*0.3 + 70*0.2 = 83
        assert_eq!(evaluation.weighted_score, 83);
        assert!(evaluation.is_correct);
        assert_eq!(evaluation.category, "formulas");
        assert!(evaluation.detailed_feedback.contains("### Correctness (90/100 - EXCELLENT)"));
        assert!(evaluation.detailed_feedback.contains("### Strengths\n- Accurate"));
        assert!(evaluation.detailed_feedback.contains("### Example\n=VLOOKUP"));
    }

    #[tokio::test]
    async fn unparsable_reply_falls_back_to_heuristic() {
        let evaluation = evaluator(["Good job, scores 88 77 91"])
            .evaluate(&question(), &Answer::new("q_1", "Looks up values"))
            .await
            .unwrap();

        assert_eq!(evaluation.source, EvaluationSource::Heuristic);
        assert_eq!(evaluation.criterion(crate::types::Aspect::Correctness).score, 88);
        assert_eq!(evaluation.score(), 85);
        assert_eq!(evaluation.assessment.depth.level, ScoreLevel::Satisfactory);
    }

    #[tokio::test]
    async fn missing_generator_uses_default_scores() {
        let evaluator = AnswerEvaluator::new(BoundedGenerator::disabled(), Rubric::default());
        assert!(!evaluator.is_model_backed());

        let evaluation = evaluator
            .evaluate(&question(), &Answer::new("q_1", "Looks up values"))
            .await
            .unwrap();
        assert_eq!(evaluation.score(), 70);
        assert_eq!(evaluation.weighted_score, 70);
        assert!(evaluation.is_correct);
        assert_eq!(evaluation.source, EvaluationSource::Heuristic);
    }

    #[tokio::test]
    async fn generator_error_uses_default_scores() {
        let scripted = Arc::new(ScriptedGenerator::default());
        scripted.push_error(adept_models::Error::ProviderApi("500".into()));
        let evaluator = AnswerEvaluator::new(
            BoundedGenerator::new(Some(scripted.clone()), Duration::from_secs(5)),
            Rubric::default(),
        );

        let evaluation = evaluator
            .evaluate(&question(), &Answer::new("q_1", "Looks up values"))
            .await
            .unwrap();
        assert_eq!(evaluation.score(), 70);
        assert_eq!(scripted.prompt_count(), 1);
    }

    #[tokio::test]
    async fn empty_answer_is_rejected() {
        let result = evaluator([MODEL_REPLY])
            .evaluate(&question(), &Answer::new("q_1", "   "))
            .await;
        assert!(matches!(result, Err(InterviewError::Validation(_))));
    }

    #[tokio::test]
    async fn batch_continues_past_failures() {
        let q2 = Question::new("q_2", "What is a pivot table?", Difficulty::Beginner, "pivot_tables");
        let pairs = vec![
            (question(), Answer::new("q_1", "Looks up values")),
            (q2.clone(), Answer::new("q_2", "")),
            (q2, Answer::new("q_2", "Summarizes data")),
        ];

        let batch = evaluator([MODEL_REPLY, "60 60 60"]).evaluate_batch(&pairs).await;

        assert_eq!(batch.items.len(), 3);
        assert!(batch.items[1].outcome.is_err());
        assert_eq!(batch.summary.total_questions, 3);
        assert_eq!(batch.summary.valid_evaluations, 2);
        assert_eq!(batch.summary.highest_score, 82);
        assert_eq!(batch.summary.lowest_score, 60);
        assert_eq!(batch.summary.average_score, 71);
        assert_eq!(batch.summary.performance_level, PerformanceLevel::Satisfactory);
    }

    #[tokio::test]
    async fn batch_with_no_valid_evaluations() {
        let pairs = vec![(question(), Answer::new("q_1", ""))];
        let evaluator = AnswerEvaluator::new(BoundedGenerator::disabled(), Rubric::default());
        let batch = evaluator.evaluate_batch(&pairs).await;

        assert_eq!(batch.summary.valid_evaluations, 0);
        assert_eq!(
            batch.summary.performance_level,
            PerformanceLevel::NoValidEvaluations
        );
        assert_eq!(batch.summary.performance_level.to_string(), "No valid evaluations");
    }
}
