//! Final interview report.

use std::fmt::Write as _;

use tracing::debug;

use crate::evaluation::Evaluation;
use crate::generation::BoundedGenerator;
use crate::profile::ProfileInsights;
use crate::types::Session;

/// Letter grade for an average score.
pub fn grade(average: f64) -> &'static str {
    match average {
        a if a >= 90.0 => "A (Excellent)",
        a if a >= 80.0 => "B (Good)",
        a if a >= 70.0 => "C (Satisfactory)",
        a if a >= 60.0 => "D (Needs Improvement)",
        _ => "F (Unsatisfactory)",
    }
}

/// Writes the Markdown report shown when an interview completes.
#[derive(Clone)]
pub struct SummaryWriter {
    generator: BoundedGenerator,
}

impl SummaryWriter {
    pub fn new(generator: BoundedGenerator) -> Self {
        Self { generator }
    }

    pub async fn write(
        &self,
        session: &Session,
        evaluations: &[Evaluation],
        insights: &ProfileInsights,
    ) -> String {
        let average = mean_score(evaluations);
        let analysis = match self
            .generator
            .try_generate("interview summary", &analysis_prompt(session, evaluations, insights))
            .await
        {
            Some(text) => text.trim().to_string(),
            None => fallback_analysis(insights),
        };
        debug!(session_id = %session.id, average, "Writing interview summary");

        let mut report = String::new();
        let _ = writeln!(report, "# Interview Summary\n");
        let _ = writeln!(
            report,
            "**Candidate:** {}",
            session.candidate_name.as_deref().unwrap_or("Anonymous")
        );
        let _ = writeln!(report, "**Topic:** {}", session.topic);
        let _ = writeln!(report, "**Difficulty:** {}", session.difficulty);
        let _ = writeln!(
            report,
            "**Date:** {}\n",
            session.created_at.format("%Y-%m-%d")
        );

        let _ = writeln!(report, "## Performance Overview\n");
        let _ = writeln!(
            report,
            "- **Questions Answered:** {} of {}",
            evaluations.len(),
            session.total_questions
        );
        let _ = writeln!(report, "- **Average Score:** {}/100", average.round() as u32);
        let _ = writeln!(report, "- **Accuracy:** {}%", insights.summary.accuracy);
        let _ = writeln!(report, "- **Overall Grade:** {}", grade(average));
        let _ = writeln!(report, "- **Trend:** {}", insights.summary.trend);
        let _ = writeln!(
            report,
            "- **Final Difficulty:** {}\n",
            insights.summary.current_difficulty
        );

        if !evaluations.is_empty() {
            let _ = writeln!(report, "## Question Breakdown\n");
            for (i, e) in evaluations.iter().enumerate() {
                let _ = writeln!(
                    report,
                    "{}. {} ({}): {}/100",
                    i + 1,
                    e.category,
                    e.difficulty,
                    e.score()
                );
            }
            report.push('\n');
        }

        let _ = writeln!(report, "## Detailed Analysis\n\n{analysis}\n");

        let _ = writeln!(report, "## Recommendations\n");
        if insights.recommendations.is_empty() {
            let _ = writeln!(report, "- Keep practicing to maintain your current level");
        } else {
            for r in &insights.recommendations {
                let _ = writeln!(report, "- {}", r.message);
            }
        }

        report
    }
}

fn mean_score(evaluations: &[Evaluation]) -> f64 {
    if evaluations.is_empty() {
        return 0.0;
    }
    let total: u32 = evaluations.iter().map(|e| u32::from(e.score())).sum();
    f64::from(total) / evaluations.len() as f64
}

fn analysis_prompt(session: &Session, evaluations: &[Evaluation], insights: &ProfileInsights) -> String {
    let mut answers = String::new();
    for (i, e) in evaluations.iter().enumerate() {
        let _ = writeln!(
            answers,
            "{}. {} / {}: overall {}, correctness {}, depth {}, clarity {}",
            i + 1,
            e.category,
            e.difficulty,
            e.score(),
            e.assessment.correctness.score,
            e.assessment.depth.score,
            e.assessment.clarity.score,
        );
    }
    let summary = &insights.summary;
    format!(
        "Write a concise analysis of a {topic} interview for the candidate.\n\n\
         RESULTS:\n{answers}\n\
         PROFILE:\n\
         - Accuracy: {accuracy}%\n\
         - Average Score: {average}\n\
         - Trend: {trend}\n\
         - Strengths: {strengths}\n\
         - Weaknesses: {weaknesses}\n\n\
         Cover what went well, the main gaps, and what to study next. \
         Three short paragraphs, no headings.",
        topic = session.topic,
        accuracy = summary.accuracy,
        average = summary.average_score,
        trend = summary.trend,
        strengths = summary.strength_categories().join(", "),
        weaknesses = summary.weakness_categories().join(", "),
    )
}

fn fallback_analysis(insights: &ProfileInsights) -> String {
    let summary = &insights.summary;
    if summary.total_questions == 0 {
        return "No answers were evaluated in this interview.".to_string();
    }

    let describe = |entries: &[crate::profile::TallyEntry]| {
        entries
            .iter()
            .map(|e| {
                let aspects: Vec<&str> = e.aspects.iter().map(|a| a.as_str()).collect();
                format!("{} ({})", e.category, aspects.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ")
    };

    let mut text = String::new();
    if summary.strengths.is_empty() && summary.weaknesses.is_empty() {
        text.push_str("No category stood out as a clear strength or weakness. ");
    }
    if !summary.strengths.is_empty() {
        let _ = write!(text, "Strong areas: {}. ", describe(&summary.strengths));
    }
    if !summary.weaknesses.is_empty() {
        let _ = write!(text, "Areas to develop: {}. ", describe(&summary.weaknesses));
    }
    let _ = write!(
        text,
        "Performance was {} across {} question{}, finishing at {} difficulty.",
        summary.trend,
        summary.total_questions,
        if summary.total_questions == 1 { "" } else { "s" },
        summary.current_difficulty
    );
    text
}
