//! Question corpus: the pool questions are drawn from.

use std::collections::BTreeMap;
use std::path::Path;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::evaluation::Rubric;
use crate::types::{Difficulty, Question};
use crate::{InterviewError, Result};

/// Read access to a pool of questions.
pub trait QuestionCorpus: Send + Sync {
    /// All questions matching the filters. `None` matches anything.
    fn query(&self, category: Option<&str>, difficulty: Option<Difficulty>) -> Vec<Question>;

    /// Up to `n` matching questions in random order.
    fn random_sample(
        &self,
        n: usize,
        category: Option<&str>,
        difficulty: Option<Difficulty>,
    ) -> Vec<Question> {
        let mut matches = self.query(category, difficulty);
        matches.shuffle(&mut rand::thread_rng());
        matches.truncate(n);
        matches
    }

    fn categories(&self) -> Vec<CategoryInfo> {
        Vec::new()
    }

    /// A rubric that should replace the configured one.
    fn rubric(&self) -> Option<Rubric> {
        None
    }

    /// Map a session topic to a category ID, matching ID or display name.
    fn category_for_topic(&self, topic: &str) -> Option<String> {
        let wanted = normalize(topic);
        self.categories()
            .into_iter()
            .find(|c| normalize(&c.id) == wanted || normalize(&c.name) == wanted)
            .map(|c| c.id)
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace(['_', '-'], " ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CategoryEntry {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct BankFile {
    #[serde(default)]
    categories: BTreeMap<String, CategoryEntry>,
    questions: Vec<Question>,
    #[serde(default, alias = "evaluationCriteria")]
    evaluation_criteria: Option<Rubric>,
}

/// Question counts by category and difficulty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_questions: usize,
    pub categories: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_difficulty: BTreeMap<Difficulty, usize>,
}

/// A corpus loaded from a question bank file.
///
/// ```json
/// {
///   "categories": {"formulas": {"name": "Formulas", "description": "..."}},
///   "questions": [{"id": "f1", "question": "...", "difficulty": "beginner", "category": "formulas"}],
///   "evaluationCriteria": { "correctness": { ... }, "depth": { ... }, "clarity": { ... } }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    categories: BTreeMap<String, CategoryEntry>,
    questions: Vec<Question>,
    rubric: Option<Rubric>,
}

impl QuestionBank {
    /// A bank with no category metadata and no rubric override.
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: BankFile = serde_json::from_str(json)?;
        if let Some(rubric) = &file.evaluation_criteria {
            rubric.validate()?;
        }

        let mut seen = std::collections::HashSet::new();
        for q in &file.questions {
            if !seen.insert(q.id.as_str()) {
                return Err(InterviewError::Validation(format!(
                    "duplicate question id in bank: {}",
                    q.id
                )));
            }
        }

        Ok(Self {
            categories: file.categories,
            questions: file.questions,
            rubric: file.evaluation_criteria,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let bank = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            questions = bank.questions.len(),
            categories = bank.categories.len(),
            "Question bank loaded"
        );
        Ok(bank)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn stats(&self) -> CorpusStats {
        let mut stats = CorpusStats {
            total_questions: self.questions.len(),
            categories: self.categories.len(),
            ..Default::default()
        };
        for q in &self.questions {
            *stats.by_category.entry(q.category.clone()).or_default() += 1;
            *stats.by_difficulty.entry(q.difficulty).or_default() += 1;
        }
        stats
    }
}

impl QuestionCorpus for QuestionBank {
    fn query(&self, category: Option<&str>, difficulty: Option<Difficulty>) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| category.is_none_or(|c| q.category.eq_ignore_ascii_case(c)))
            .filter(|q| difficulty.is_none_or(|d| q.difficulty == d))
            .cloned()
            .collect()
    }

    fn categories(&self) -> Vec<CategoryInfo> {
        self.categories
            .iter()
            .map(|(id, entry)| CategoryInfo {
                id: id.clone(),
                name: entry.name.clone(),
                description: entry.description.clone(),
            })
            .collect()
    }

    fn rubric(&self) -> Option<Rubric> {
        self.rubric.clone()
    }
}
