//! Turning model output into an [`Assessment`].
//!
//! [`parse_strict`] expects the JSON object the evaluation prompt asks for.
//! [`parse_heuristic`] never fails: it scrapes the first three integers out
//! of whatever text it gets and defaults the rest to 70.

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use super::{Assessment, CriterionScore, OverallAssessment, ScoreLevel};

/// Score used for any aspect the heuristic parser cannot find a number for.
pub const DEFAULT_HEURISTIC_SCORE: u8 = 70;

const HEURISTIC_FEEDBACK: &str = "Evaluation based on automated analysis";
const FEEDBACK_EXCERPT_CHARS: usize = 200;

const NUMBER_PATTERN: &str = r"\d+";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response contains no JSON object")]
    NoJsonObject,

    #[error("response JSON does not match the rubric shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("score for {field} is not a number: {value}")]
    InvalidScore { field: &'static str, value: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScore {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawCriterion {
    score: RawScore,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOverall {
    #[serde(default)]
    score: Option<RawScore>,
    #[serde(default)]
    feedback: Option<String>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawAssessment {
    correctness: RawCriterion,
    depth: RawCriterion,
    clarity: RawCriterion,
    overall: RawOverall,
}

/// Parse the structured rubric response.
///
/// Tolerates prose or code fences around the object. All four keys
/// (`correctness`, `depth`, `clarity`, `overall`) are required. Scores are
/// rounded and clamped to 0–100; an unknown or missing level is derived
/// from the score; a missing overall score is the rounded mean.
pub fn parse_strict(text: &str) -> Result<Assessment, ParseError> {
    let start = text.find('{').ok_or(ParseError::NoJsonObject)?;
    let end = text.rfind('}').ok_or(ParseError::NoJsonObject)?;
    if end < start {
        return Err(ParseError::NoJsonObject);
    }

    let raw: RawAssessment = serde_json::from_str(&text[start..=end])?;

    let correctness = criterion(raw.correctness, "correctness")?;
    let depth = criterion(raw.depth, "depth")?;
    let clarity = criterion(raw.clarity, "clarity")?;
    let overall_score = match raw.overall.score {
        Some(s) => score_value(s, "overall")?,
        None => mean(&[correctness.score, depth.score, clarity.score]),
    };

    Ok(Assessment {
        correctness,
        depth,
        clarity,
        overall: OverallAssessment {
            score: overall_score,
            feedback: raw.overall.feedback.unwrap_or_default(),
            strengths: raw.overall.strengths,
            improvements: raw.overall.improvements,
        },
    })
}

/// Up to three integers from `text`, in order, clamped to 100.
fn leading_numbers(text: &str) -> Vec<u8> {
    match Regex::new(NUMBER_PATTERN) {
        Ok(re) => re
            .find_iter(text)
            .take(3)
            .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX).min(100) as u8)
            .collect(),
        Err(e) => {
            warn!(pattern = NUMBER_PATTERN, error = %e, "Invalid number pattern");
            Vec::new()
        }
    }
}

/// Best-effort scores from free text. Never fails.
pub fn parse_heuristic(text: &str) -> Assessment {
    let mut numbers = leading_numbers(text);
    numbers.resize(3, DEFAULT_HEURISTIC_SCORE);

    let overall_feedback = if text.trim().is_empty() {
        "The evaluation service was unavailable, so default scores were assigned.".to_string()
    } else {
        let excerpt: String = text.chars().take(FEEDBACK_EXCERPT_CHARS).collect();
        format!("{excerpt}...")
    };

    Assessment {
        correctness: CriterionScore::new(numbers[0], HEURISTIC_FEEDBACK),
        depth: CriterionScore::new(numbers[1], HEURISTIC_FEEDBACK),
        clarity: CriterionScore::new(numbers[2], HEURISTIC_FEEDBACK),
        overall: OverallAssessment {
            score: mean(&numbers),
            feedback: overall_feedback,
            strengths: vec!["Answer provided".to_string()],
            improvements: vec!["Could be more detailed".to_string()],
        },
    }
}

fn criterion(raw: RawCriterion, field: &'static str) -> Result<CriterionScore, ParseError> {
    let score = score_value(raw.score, field)?;
    let level = raw
        .level
        .as_deref()
        .and_then(ScoreLevel::parse)
        .unwrap_or_else(|| ScoreLevel::from_score(score));
    Ok(CriterionScore {
        score,
        level,
        feedback: raw.feedback.unwrap_or_default(),
    })
}

fn score_value(raw: RawScore, field: &'static str) -> Result<u8, ParseError> {
    let value = match raw {
        RawScore::Number(n) => n,
        RawScore::Text(s) => s.trim().parse::<f64>().map_err(|_| ParseError::InvalidScore {
            field,
            value: s.clone(),
        })?,
    };
    if !value.is_finite() {
        return Err(ParseError::InvalidScore {
            field,
            value: value.to_string(),
        });
    }
    Ok(value.round().clamp(0.0, 100.0) as u8)
}

fn mean(scores: &[u8]) -> u8 {
    if scores.is_empty() {
        return 0;
    }
    let sum: u32 = scores.iter().map(|s| u32::from(*s)).sum();
    (f64::from(sum) / scores.len() as f64).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{
        "correctness": {"score": 85, "level": "good", "feedback": "Accurate."},
        "depth": {"score": 75, "level": "satisfactory", "feedback": "Some detail."},
        "clarity": {"score": 90, "level": "excellent", "feedback": "Clear."},
        "overall": {"score": 83, "feedback": "Strong answer.",
            "strengths": ["Clear explanation"], "improvements": ["More examples"]}
    }"#;

    #[test]
    fn strict_parses_well_formed_response() {
        let a = parse_strict(WELL_FORMED).unwrap();
        assert_eq!(a.correctness.score, 85);
        assert_eq!(a.depth.level, ScoreLevel::Satisfactory);
        assert_eq!(a.clarity.feedback, "Clear.");
        assert_eq!(a.overall.score, 83);
        assert_eq!(a.overall.strengths, vec!["Clear explanation"]);
    }

    #[test]
    fn strict_tolerates_code_fences() {
        let wrapped = format!("Here is my evaluation:\n```json\n{WELL_FORMED}\n```");
        assert_eq!(parse_strict(&wrapped).unwrap().overall.score, 83);
    }

    #[test]
    fn strict_requires_all_four_keys() {
        let missing = r#"{"correctness": {"score": 80}, "depth": {"score": 80}, "clarity": {"score": 80}}"#;
        assert!(matches!(parse_strict(missing), Err(ParseError::Shape(_))));
    }

    #[test]
    fn strict_rejects_plain_text() {
        assert!(matches!(
            parse_strict("Good job, scores 88 77 91"),
            Err(ParseError::NoJsonObject)
        ));
    }

    #[test]
    fn strict_clamps_and_derives_levels() {
        let json = r#"{
            "correctness": {"score": 140, "level": "stellar"},
            "depth": {"score": -5},
            "clarity": {"score": "72.6"},
            "overall": {}
        }"#;
        let a = parse_strict(json).unwrap();
        assert_eq!(a.correctness.score, 100);
        assert_eq!(a.correctness.level, ScoreLevel::Excellent);
        assert_eq!(a.depth.score, 0);
        assert_eq!(a.depth.level, ScoreLevel::Incorrect);
        assert_eq!(a.clarity.score, 73);
        // mean(100, 0, 73) = 57.67
        assert_eq!(a.overall.score, 58);
    }

    #[test]
    fn strict_rejects_non_numeric_score() {
        let json = r#"{
            "correctness": {"score": "high"},
            "depth": {"score": 1}, "clarity": {"score": 1}, "overall": {"score": 1}
        }"#;
        assert!(matches!(
            parse_strict(json),
            Err(ParseError::InvalidScore { field: "correctness", .. })
        ));
    }

    #[test]
    fn heuristic_takes_first_three_numbers() {
        let a = parse_heuristic("Good job, scores 88 77 91");
        assert_eq!(a.correctness.score, 88);
        assert_eq!(a.depth.score, 77);
        assert_eq!(a.clarity.score, 91);
        assert_eq!(a.correctness.level, ScoreLevel::Good);
        assert_eq!(a.depth.level, ScoreLevel::Satisfactory);
        assert_eq!(a.clarity.level, ScoreLevel::Excellent);
        assert_eq!(a.overall.score, 85);
    }

    #[test]
    fn heuristic_defaults_missing_numbers() {
        let a = parse_heuristic("I would give this a 50");
        assert_eq!(a.correctness.score, 50);
        assert_eq!(a.depth.score, DEFAULT_HEURISTIC_SCORE);
        assert_eq!(a.clarity.score, DEFAULT_HEURISTIC_SCORE);
        assert_eq!(a.overall.score, 63);
    }

    #[test]
    fn heuristic_on_empty_text_is_all_defaults() {
        let a = parse_heuristic("");
        assert_eq!(a.overall.score, 70);
        assert_eq!(a.correctness.level, ScoreLevel::Satisfactory);
        assert!(a.overall.feedback.contains("unavailable"));
    }

    #[test]
    fn heuristic_clamps_large_numbers() {
        let a = parse_heuristic("Scores: 250, 99999999999999999999999, 3");
        assert_eq!(a.correctness.score, 100);
        assert_eq!(a.depth.score, 100);
        assert_eq!(a.clarity.score, 3);
    }

    #[test]
    fn heuristic_excerpt_is_truncated() {
        let long = "x".repeat(500);
        let a = parse_heuristic(&long);
        assert_eq!(a.overall.feedback.chars().count(), FEEDBACK_EXCERPT_CHARS + 3);
    }
}
