//! Scoring rubric: per-aspect weights and level descriptions.

use serde::{Deserialize, Serialize};

use super::Assessment;
use crate::types::Aspect;
use crate::{InterviewError, Result};

/// Descriptions of what each score level means for one aspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptions {
    pub excellent: String,
    pub good: String,
    pub satisfactory: String,
    pub needs_improvement: String,
    pub incorrect: String,
}

/// One weighted rubric dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub weight: f64,
    pub description: String,
    pub levels: LevelDescriptions,
}

/// The full rubric. Question banks may ship their own under
/// `evaluationCriteria`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub correctness: Criterion,
    pub depth: Criterion,
    pub clarity: Criterion,
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            correctness: Criterion {
                weight: 0.5,
                description: "Technical accuracy of the answer".to_string(),
                levels: LevelDescriptions {
                    excellent: "Completely accurate with no errors".to_string(),
                    good: "Mostly accurate with minor errors".to_string(),
                    satisfactory: "Generally accurate with some errors".to_string(),
                    needs_improvement: "Several significant errors".to_string(),
                    incorrect: "Fundamentally wrong or missing".to_string(),
                },
            },
            depth: Criterion {
                weight: 0.3,
                description: "Thoroughness and level of detail".to_string(),
                levels: LevelDescriptions {
                    excellent: "Comprehensive, covers edge cases and alternatives".to_string(),
                    good: "Covers the key points with useful detail".to_string(),
                    satisfactory: "Covers the basics without much detail".to_string(),
                    needs_improvement: "Superficial, misses key points".to_string(),
                    incorrect: "No meaningful detail".to_string(),
                },
            },
            clarity: Criterion {
                weight: 0.2,
                description: "How clearly the answer is communicated".to_string(),
                levels: LevelDescriptions {
                    excellent: "Well structured and easy to follow".to_string(),
                    good: "Clear with minor structural issues".to_string(),
                    satisfactory: "Understandable but disorganized in places".to_string(),
                    needs_improvement: "Hard to follow".to_string(),
                    incorrect: "Incoherent".to_string(),
                },
            },
        }
    }
}

impl Rubric {
    pub fn criterion(&self, aspect: Aspect) -> &Criterion {
        match aspect {
            Aspect::Correctness => &self.correctness,
            Aspect::Depth => &self.depth,
            Aspect::Clarity => &self.clarity,
        }
    }

    /// `round(c×wC + d×wD + l×wL)`, clamped to 0–100.
    pub fn weighted_score(&self, assessment: &Assessment) -> u8 {
        let total: f64 = Aspect::ALL
            .iter()
            .map(|a| f64::from(assessment.criterion(*a).score) * self.criterion(*a).weight)
            .sum();
        total.round().clamp(0.0, 100.0) as u8
    }

    /// Weights must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for aspect in Aspect::ALL {
            let weight = self.criterion(aspect).weight;
            if !weight.is_finite() || weight < 0.0 {
                return Err(InterviewError::Validation(format!(
                    "rubric weight for {aspect} must be a non-negative number, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::parse_heuristic;

    #[test]
    fn default_weights_sum_to_one() {
        let rubric = Rubric::default();
        let sum: f64 = Aspect::ALL.iter().map(|a| rubric.criterion(*a).weight).sum();
        assert!((sum - 1.0).abs() < f64::EPSILON);
        assert!(rubric.validate().is_ok());
    }

    #[test]
    fn weighted_score_rounds() {
        // 88*0.5 + 77*0.3 + 91*0.2 = 44 + 23.1 + 18.2 = 85.3
        let assessment = parse_heuristic("88 77 91");
        assert_eq!(Rubric::default().weighted_score(&assessment), 85);
    }

    #[test]
    fn negative_weight_is_rejected() {
        let mut rubric = Rubric::default();
        rubric.depth.weight = -0.1;
        assert!(matches!(
            rubric.validate(),
            Err(InterviewError::Validation(_))
        ));
    }

    #[test]
    fn rubric_deserializes_from_question_bank_shape() {
        let json = r#"{
            "correctness": {"weight": 0.6, "description": "Accuracy",
                "levels": {"excellent": "a", "good": "b", "satisfactory": "c", "needs_improvement": "d", "incorrect": "e"}},
            "depth": {"weight": 0.2, "description": "Detail",
                "levels": {"excellent": "a", "good": "b", "satisfactory": "c", "needs_improvement": "d", "incorrect": "e"}},
            "clarity": {"weight": 0.2, "description": "Clarity",
                "levels": {"excellent": "a", "good": "b", "satisfactory": "c", "needs_improvement": "d", "incorrect": "e"}}
        }"#;
        let rubric: Rubric = serde_json::from_str(json).unwrap();
        assert_eq!(rubric.correctness.weight, 0.6);
        assert_eq!(rubric.depth.levels.needs_improvement, "d");
    }
}
