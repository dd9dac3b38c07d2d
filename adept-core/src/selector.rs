//! Adaptive question selection.
//!
//! The profile decides *what* to look for ([`SelectionPlan`]); the selector
//! finds a matching corpus question and explains the choice. Explanations
//! and per-answer feedback come from the text generator when one is
//! available and from fixed templates otherwise.

use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::corpus::QuestionCorpus;
use crate::evaluation::Evaluation;
use crate::generation::BoundedGenerator;
use crate::profile::{ProfileSummary, SelectionPlan, Trend};
use crate::types::{Difficulty, Question};
use crate::{InterviewError, Result};

/// A corpus question chosen for the next turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// The corpus entry, not yet adopted into a session.
    pub question: Question,
    pub rationale: String,
    pub plan: SelectionPlan,
}

#[derive(Clone)]
pub struct AdaptiveSelector {
    generator: BoundedGenerator,
    corpus: Arc<dyn QuestionCorpus>,
}

impl AdaptiveSelector {
    pub fn new(generator: BoundedGenerator, corpus: Arc<dyn QuestionCorpus>) -> Self {
        Self { generator, corpus }
    }

    pub fn corpus(&self) -> &Arc<dyn QuestionCorpus> {
        &self.corpus
    }

    /// False when rationales and feedback come only from templates.
    pub fn is_model_backed(&self) -> bool {
        self.generator.is_available()
    }

    /// Pick the next question for `plan` and explain why.
    ///
    /// `exclude` holds corpus IDs already asked in the session; they are
    /// only reused once every tier has run out of fresh questions.
    pub async fn select(
        &self,
        summary: &ProfileSummary,
        plan: &SelectionPlan,
        last: Option<&Evaluation>,
        exclude: &[String],
    ) -> Result<Selection> {
        let question = self.pick(plan, exclude)?;
        let rationale = self.rationale(summary, plan, last).await;

        debug!(
            question = %question.id,
            difficulty = %question.difficulty,
            category = %question.category,
            "Selected next question"
        );

        Ok(Selection {
            question,
            rationale,
            plan: plan.clone(),
        })
    }

    /// Tiers: (category, difficulty), then (any, difficulty), then
    /// (any, intermediate).
    fn pick(&self, plan: &SelectionPlan, exclude: &[String]) -> Result<Question> {
        let mut tiers: Vec<(Option<&str>, Difficulty)> = Vec::with_capacity(3);
        if let Some(category) = plan.category.as_deref() {
            tiers.push((Some(category), plan.difficulty));
        }
        tiers.push((None, plan.difficulty));
        if plan.difficulty != Difficulty::Intermediate {
            tiers.push((None, Difficulty::Intermediate));
        }

        let mut rng = rand::thread_rng();
        for (category, difficulty) in &tiers {
            let fresh: Vec<Question> = self
                .corpus
                .query(*category, Some(*difficulty))
                .into_iter()
                .filter(|q| !exclude.contains(&q.id))
                .collect();
            if let Some(q) = fresh.choose(&mut rng) {
                return Ok(q.clone());
            }
        }

        for (category, difficulty) in &tiers {
            if let Some(q) = self
                .corpus
                .random_sample(1, *category, Some(*difficulty))
                .into_iter()
                .next()
            {
                warn!(question = %q.id, "No unasked questions left, repeating one");
                return Ok(q);
            }
        }

        Err(InterviewError::NoQuestionsAvailable {
            difficulty: plan.difficulty,
            category: plan.category.clone(),
        })
    }

    async fn rationale(
        &self,
        summary: &ProfileSummary,
        plan: &SelectionPlan,
        last: Option<&Evaluation>,
    ) -> String {
        if let Some(evaluation) = last {
            let prompt = rationale_prompt(summary, plan, evaluation);
            if let Some(text) = self.generator.try_generate("selection rationale", &prompt).await {
                return text.trim().to_string();
            }
        }
        fallback_rationale(summary, plan, last.map(Evaluation::score))
    }

    /// Personalized feedback on the latest evaluation.
    pub async fn feedback(
        &self,
        evaluation: &Evaluation,
        summary: &ProfileSummary,
        rationale: Option<&str>,
    ) -> String {
        let prompt = feedback_prompt(evaluation, summary, rationale);
        match self.generator.try_generate("adaptive feedback", &prompt).await {
            Some(text) => text.trim().to_string(),
            None => fallback_feedback(evaluation, summary),
        }
    }
}

fn rationale_prompt(summary: &ProfileSummary, plan: &SelectionPlan, last: &Evaluation) -> String {
    format!(
        "You are an adaptive interviewer. Explain the choice of the next question.\n\n\
         CANDIDATE PROFILE:\n\
         - Total Questions: {total}\n\
         - Correct Answers: {correct}\n\
         - Accuracy: {accuracy}%\n\
         - Average Score: {average}\n\
         - Current Difficulty: {current}\n\
         - Performance Trend: {trend}\n\
         - Strengths: {strengths}\n\
         - Weaknesses: {weaknesses}\n\n\
         LATEST EVALUATION:\n\
         - Score: {score}/100\n\
         - Correctness: {c}/100\n\
         - Depth: {d}/100\n\
         - Clarity: {l}/100\n\n\
         NEXT QUESTION STRATEGY:\n\
         - Recommended Difficulty: {next}\n\
         - Recommended Category: {category}\n\n\
         In 2-3 sentences addressed to the candidate, explain why this difficulty and category come next.",
        total = summary.total_questions,
        correct = summary.correct_answers,
        accuracy = summary.accuracy,
        average = summary.average_score,
        current = summary.current_difficulty,
        trend = summary.trend,
        strengths = join_or_none(&summary.strength_categories()),
        weaknesses = join_or_none(&summary.weakness_categories()),
        score = last.score(),
        c = last.assessment.correctness.score,
        d = last.assessment.depth.score,
        l = last.assessment.clarity.score,
        next = plan.difficulty,
        category = plan.category.as_deref().unwrap_or("Any"),
    )
}

fn fallback_rationale(summary: &ProfileSummary, plan: &SelectionPlan, score: Option<u8>) -> String {
    let difficulty = plan.difficulty;
    let mut text = match score {
        None => format!("Starting with a {difficulty} question to establish a baseline."),
        Some(score) if score >= 85 => format!(
            "Based on your performance ({score}/100), you're excelling! \
             I'm increasing the difficulty to {difficulty} to challenge you further."
        ),
        Some(score) if score >= 70 => format!(
            "Based on your performance ({score}/100), you're doing well. \
             I'm maintaining the {difficulty} difficulty level."
        ),
        Some(score) => format!(
            "Based on your performance ({score}/100), \
             I'm adjusting to {difficulty} difficulty to better match your current level."
        ),
    };

    if let Some(category) = &plan.category {
        if summary.weaknesses.iter().any(|w| &w.category == category) {
            text.push_str(&format!(
                " I'm focusing on {category} to help strengthen your weak areas."
            ));
        } else {
            text.push_str(&format!(" I'm continuing with {category}."));
        }
    }
    text
}

fn feedback_prompt(evaluation: &Evaluation, summary: &ProfileSummary, rationale: Option<&str>) -> String {
    let overall = &evaluation.assessment.overall;
    format!(
        "Write personalized feedback for an interview candidate.\n\n\
         EVALUATION:\n\
         - Overall Score: {score}/100\n\
         - Correctness: {c}/100\n\
         - Depth: {d}/100\n\
         - Clarity: {l}/100\n\
         - Strengths: {strengths}\n\
         - Improvements: {improvements}\n\n\
         CANDIDATE PROFILE:\n\
         - Total Questions: {total}\n\
         - Accuracy: {accuracy}%\n\
         - Average Score: {average}\n\
         - Performance Trend: {trend}\n\
         - Current Difficulty: {current}\n\n\
         REASONING FOR NEXT QUESTION:\n{rationale}\n\n\
         Acknowledge their strengths, give constructive guidance on what to improve, \
         and keep them motivated. Two short paragraphs at most.",
        score = overall.score,
        c = evaluation.assessment.correctness.score,
        d = evaluation.assessment.depth.score,
        l = evaluation.assessment.clarity.score,
        strengths = join_or_none(&overall.strengths.iter().map(String::as_str).collect::<Vec<_>>()),
        improvements =
            join_or_none(&overall.improvements.iter().map(String::as_str).collect::<Vec<_>>()),
        total = summary.total_questions,
        accuracy = summary.accuracy,
        average = summary.average_score,
        trend = summary.trend,
        current = summary.current_difficulty,
        rationale = rationale.unwrap_or("Not available"),
    )
}

fn fallback_feedback(evaluation: &Evaluation, summary: &ProfileSummary) -> String {
    let score = evaluation.score();
    let mut text = format!("You scored {score}/100. ");
    text.push_str(match score {
        85.. => "Excellent work, you show a strong grasp of the material. ",
        70..=84 => "You're doing well with a solid understanding of the material. ",
        _ => "There's room for improvement, but you're on the right track. ",
    });
    text.push_str(&format!(
        "Your overall accuracy is {}% across {} question{}. ",
        summary.accuracy,
        summary.total_questions,
        if summary.total_questions == 1 { "" } else { "s" }
    ));
    match summary.trend {
        Trend::Improving => text.push_str("You're getting better with each question! "),
        Trend::Declining => {
            text.push_str("Let's focus on the fundamentals to build your confidence. ")
        }
        Trend::Stable => {}
    }
    text.push_str("Keep going!");
    text
}

fn join_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        "None yet".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::corpus::QuestionBank;
    use crate::generation::testing::ScriptedGenerator;
    use crate::profile::testing::evaluation;
    use crate::profile::{AdaptationLevel, PerformanceProfile};
    use crate::types::SessionId;

    fn bank() -> Arc<dyn QuestionCorpus> {
        Arc::new(QuestionBank::new(vec![
            Question::new("f1", "SUM?", Difficulty::Beginner, "formulas"),
            Question::new("f2", "INDEX/MATCH?", Difficulty::Intermediate, "formulas"),
            Question::new("c1", "Chart types?", Difficulty::Intermediate, "charts"),
            Question::new("p3", "Calculated fields?", Difficulty::Advanced, "pivot_tables"),
        ]))
    }

    fn offline(corpus: Arc<dyn QuestionCorpus>) -> AdaptiveSelector {
        AdaptiveSelector::new(BoundedGenerator::disabled(), corpus)
    }

    fn plan(difficulty: Difficulty, category: Option<&str>) -> SelectionPlan {
        SelectionPlan {
            difficulty,
            category: category.map(str::to_string),
            adaptation_level: AdaptationLevel::Hold,
        }
    }

    fn empty_summary() -> ProfileSummary {
        PerformanceProfile::new(SessionId::from("s"), Difficulty::Intermediate).summary()
    }

    #[test]
    fn pick_prefers_category_and_difficulty() {
        let selector = offline(bank());
        let q = selector
            .pick(&plan(Difficulty::Intermediate, Some("charts")), &[])
            .unwrap();
        assert_eq!(q.id, "c1");
    }

    #[test]
    fn pick_falls_back_to_any_category() {
        let selector = offline(bank());
        let q = selector
            .pick(&plan(Difficulty::Beginner, Some("charts")), &[])
            .unwrap();
        assert_eq!(q.id, "f1");
    }

    #[test]
    fn pick_falls_back_to_intermediate() {
        let corpus: Arc<dyn QuestionCorpus> = Arc::new(QuestionBank::new(vec![Question::new(
            "f2",
            "INDEX/MATCH?",
            Difficulty::Intermediate,
            "formulas",
        )]));
        let q = offline(corpus)
            .pick(&plan(Difficulty::Advanced, None), &[])
            .unwrap();
        assert_eq!(q.id, "f2");
    }

    #[test]
    fn pick_skips_asked_questions_until_exhausted() {
        let selector = offline(bank());
        let q = selector
            .pick(&plan(Difficulty::Intermediate, Some("formulas")), &["f2".to_string()])
            .unwrap();
        assert_eq!(q.id, "c1");

        let all_intermediate = vec!["f2".to_string(), "c1".to_string()];
        let q = selector
            .pick(&plan(Difficulty::Intermediate, Some("formulas")), &all_intermediate)
            .unwrap();
        assert_eq!(q.id, "f2");
    }

    #[test]
    fn empty_corpus_has_no_questions() {
        let selector = offline(Arc::new(QuestionBank::new(Vec::new())));
        let err = selector
            .pick(&plan(Difficulty::Beginner, Some("charts")), &[])
            .unwrap_err();
        assert!(matches!(
            err,
            InterviewError::NoQuestionsAvailable {
                difficulty: Difficulty::Beginner,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn first_question_gets_baseline_rationale() {
        let selection = offline(bank())
            .select(&empty_summary(), &plan(Difficulty::Intermediate, None), None, &[])
            .await
            .unwrap();
        assert!(selection.rationale.contains("establish a baseline"));
    }

    #[test]
    fn fallback_rationale_bands() {
        let summary = empty_summary();
        let p = plan(Difficulty::Advanced, None);
        assert!(fallback_rationale(&summary, &p, Some(92)).contains("increasing the difficulty to advanced"));
        assert!(fallback_rationale(&summary, &p, Some(75)).contains("maintaining the advanced"));
        assert!(fallback_rationale(&summary, &p, Some(40)).contains("adjusting to advanced"));
    }

    #[test]
    fn fallback_rationale_mentions_weak_category() {
        let mut profile = PerformanceProfile::new(SessionId::from("s"), Difficulty::Intermediate);
        profile.record(&evaluation("q_1", "charts", 40));
        let summary = profile.summary();

        let text = fallback_rationale(&summary, &profile.plan(), Some(40));
        assert!(text.starts_with("Based on your performance (40/100)"));
        assert!(text.contains("focusing on charts"));
    }

    #[tokio::test]
    async fn model_rationale_is_used_when_available() {
        let scripted = Arc::new(ScriptedGenerator::new(["  Stepping up to advanced.  "]));
        let selector = AdaptiveSelector::new(
            BoundedGenerator::new(Some(scripted.clone()), Duration::from_secs(5)),
            bank(),
        );
        let last = evaluation("q_1", "formulas", 92);

        let selection = selector
            .select(&empty_summary(), &plan(Difficulty::Advanced, None), Some(&last), &[])
            .await
            .unwrap();

        assert_eq!(selection.rationale, "Stepping up to advanced.");
        assert_eq!(selection.question.id, "p3");
        assert!(scripted.prompts.lock().unwrap()[0].contains("Score: 92/100"));
    }

    #[tokio::test]
    async fn feedback_falls_back_without_generator() {
        let mut profile = PerformanceProfile::new(SessionId::from("s"), Difficulty::Intermediate);
        let last = evaluation("q_1", "formulas", 88);
        profile.record(&last);

        let text = offline(bank()).feedback(&last, &profile.summary(), None).await;
        assert!(text.starts_with("You scored 88/100."));
        assert!(text.contains("accuracy is 100% across 1 question."));
    }
}
