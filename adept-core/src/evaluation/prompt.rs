use std::fmt::Write;

use super::Rubric;
use crate::types::{Aspect, Question};

/// Build the rubric prompt for one answer.
pub fn evaluation_prompt(question: &Question, answer: &str, rubric: &Rubric) -> String {
    let expected = question.expected_answer.as_deref().unwrap_or("Not provided");
    let example = question.example.as_deref().unwrap_or("Not provided");
    let key_points = if question.key_points.is_empty() {
        "Not provided".to_string()
    } else {
        question.key_points.join(", ")
    };

    let mut prompt = format!(
        "You are an expert {category} interviewer evaluating a candidate's answer. \
         Evaluate the response against the criteria below.\n\n\
         QUESTION ({difficulty}): {prompt}\n\n\
         EXPECTED ANSWER (for reference): {expected}\n\
         KEY POINTS TO COVER: {key_points}\n\
         EXAMPLE: {example}\n\n\
         CANDIDATE'S ANSWER: {answer}\n\n\
         EVALUATION CRITERIA:\n",
        category = question.category,
        difficulty = question.difficulty,
        prompt = question.prompt,
    );

    for (i, aspect) in Aspect::ALL.iter().enumerate() {
        let criterion = rubric.criterion(*aspect);
        let levels = &criterion.levels;
        let _ = write!(
            prompt,
            "{n}. {name} (Weight: {weight:.0}%): {description}\n\
             \x20  - Excellent: {excellent}\n\
             \x20  - Good: {good}\n\
             \x20  - Satisfactory: {satisfactory}\n\
             \x20  - Needs Improvement: {needs_improvement}\n\
             \x20  - Incorrect: {incorrect}\n\n",
            n = i + 1,
            name = aspect.as_str().to_uppercase(),
            weight = criterion.weight * 100.0,
            description = criterion.description,
            excellent = levels.excellent,
            good = levels.good,
            satisfactory = levels.satisfactory,
            needs_improvement = levels.needs_improvement,
            incorrect = levels.incorrect,
        );
    }

    prompt.push_str(RESPONSE_FORMAT);
    prompt
}

const RESPONSE_FORMAT: &str = r#"Respond with only a JSON object in this format:
{
  "correctness": {"score": 85, "level": "good", "feedback": "..."},
  "depth": {"score": 75, "level": "satisfactory", "feedback": "..."},
  "clarity": {"score": 90, "level": "excellent", "feedback": "..."},
  "overall": {
    "score": 83,
    "feedback": "...",
    "strengths": ["..."],
    "improvements": ["..."]
  }
}

Scores are integers from 0 to 100. Levels are one of excellent, good, satisfactory, needs_improvement, incorrect.
Be thorough but fair, and take the question's difficulty into account."#;
