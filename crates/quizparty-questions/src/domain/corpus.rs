//! The in-memory question corpus.
//!
//! Loading and categorising question files is done by an outside loader;
//! this module only enforces the post-load invariants and answers lookups.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use quizparty_core::error::DomainError;
use serde::{Deserialize, Serialize};

use super::question::{ANSWER_COUNT, Question};

const FALLBACK_COLOR: &str = "#808080";
const FALLBACK_ICON: &str = "📚";

/// Display metadata for a category, as supplied by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    /// Stable key questions refer to.
    pub key: String,
    /// Display name.
    pub name: String,
    /// CSS color.
    pub color: String,
    /// Emoji icon.
    pub icon: String,
}

/// A category together with the ids of its questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Display metadata.
    pub definition: CategoryDefinition,
    /// Member question ids in load order.
    pub question_ids: Vec<String>,
}

/// Pre-categorised corpus document: `{"categories": [...], "questions": [...]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorpusDocument {
    /// Category definitions.
    #[serde(default)]
    pub categories: Vec<CategoryDefinition>,
    /// Questions referencing category keys.
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Per-category entry of [`CorpusStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    /// Display name.
    pub name: String,
    /// Number of questions.
    pub count: usize,
    /// Emoji icon.
    pub icon: String,
}

/// Corpus summary for the stats query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusStats {
    /// Total number of questions.
    pub total_questions: usize,
    /// Number of non-empty categories.
    pub total_categories: usize,
    /// Stats keyed by category key.
    pub categories: BTreeMap<String, CategoryStats>,
}

/// Validated, immutable set of questions grouped by category.
#[derive(Debug, Clone, Default)]
pub struct QuestionCorpus {
    questions: Vec<Arc<Question>>,
    by_id: HashMap<String, usize>,
    categories: BTreeMap<String, Category>,
}

impl QuestionCorpus {
    /// Builds a corpus, checking that ids are unique and every question has
    /// exactly [`ANSWER_COUNT`] answers with an in-bounds correct index.
    /// Categories without questions are dropped; questions pointing at an
    /// undefined category get a generated one named after the key.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the first offending question.
    pub fn build(
        definitions: Vec<CategoryDefinition>,
        questions: Vec<Question>,
    ) -> Result<Self, DomainError> {
        let mut categories: BTreeMap<String, Category> = definitions
            .into_iter()
            .map(|definition| {
                (
                    definition.key.clone(),
                    Category {
                        definition,
                        question_ids: Vec::new(),
                    },
                )
            })
            .collect();

        let mut by_id = HashMap::with_capacity(questions.len());
        let mut stored = Vec::with_capacity(questions.len());

        for question in questions {
            if question.answers.len() != ANSWER_COUNT {
                return Err(DomainError::Validation(format!(
                    "question {} has {} answers, expected {ANSWER_COUNT}",
                    question.id,
                    question.answers.len()
                )));
            }
            if question.correct >= question.answers.len() {
                return Err(DomainError::Validation(format!(
                    "question {} has correct index {} out of bounds",
                    question.id, question.correct
                )));
            }
            if by_id.contains_key(&question.id) {
                return Err(DomainError::Validation(format!(
                    "duplicate question id {}",
                    question.id
                )));
            }

            categories
                .entry(question.category.clone())
                .or_insert_with(|| Category {
                    definition: CategoryDefinition {
                        key: question.category.clone(),
                        name: question.category.clone(),
                        color: FALLBACK_COLOR.to_owned(),
                        icon: FALLBACK_ICON.to_owned(),
                    },
                    question_ids: Vec::new(),
                })
                .question_ids
                .push(question.id.clone());

            by_id.insert(question.id.clone(), stored.len());
            stored.push(Arc::new(question));
        }

        categories.retain(|_, category| !category.question_ids.is_empty());

        Ok(Self {
            questions: stored,
            by_id,
            categories,
        })
    }

    /// Builds a corpus from a parsed [`CorpusDocument`].
    ///
    /// # Errors
    ///
    /// See [`QuestionCorpus::build`].
    pub fn from_document(document: CorpusDocument) -> Result<Self, DomainError> {
        Self::build(document.categories, document.questions)
    }

    /// Number of questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the corpus holds no questions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// All questions in load order.
    #[must_use]
    pub fn questions(&self) -> &[Arc<Question>] {
        &self.questions
    }

    /// Looks a question up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<Question>> {
        self.by_id.get(id).map(|&i| &self.questions[i])
    }

    /// Non-empty categories keyed by category key.
    #[must_use]
    pub fn categories(&self) -> &BTreeMap<String, Category> {
        &self.categories
    }

    /// Display name of a category, falling back to the key.
    #[must_use]
    pub fn category_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.categories
            .get(key)
            .map_or(key, |category| category.definition.name.as_str())
    }

    /// Questions whose ids are not in `excluded`.
    #[must_use]
    pub fn excluding(&self, excluded: &HashSet<&str>) -> Vec<Arc<Question>> {
        self.questions
            .iter()
            .filter(|q| !excluded.contains(q.id.as_str()))
            .cloned()
            .collect()
    }

    /// Summary for the stats query.
    #[must_use]
    pub fn stats(&self) -> CorpusStats {
        let categories: BTreeMap<String, CategoryStats> = self
            .categories
            .iter()
            .map(|(key, category)| {
                (
                    key.clone(),
                    CategoryStats {
                        name: category.definition.name.clone(),
                        count: category.question_ids.len(),
                        icon: category.definition.icon.clone(),
                    },
                )
            })
            .collect();

        CorpusStats {
            total_questions: self.questions.len(),
            total_categories: categories.len(),
            categories,
        }
    }
}
