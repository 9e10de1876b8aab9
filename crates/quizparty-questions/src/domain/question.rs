//! Questions and their client-facing projection.

use serde::{Deserialize, Serialize};

/// Number of answers every question carries.
pub const ANSWER_COUNT: usize = 4;

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Globally unique identifier.
    pub id: String,
    /// The question text.
    #[serde(alias = "question")]
    pub text: String,
    /// Answers in display order.
    pub answers: Vec<String>,
    /// Index into `answers` of the correct answer.
    pub correct: usize,
    /// Category key.
    pub category: String,
    /// Shown after the question resolves.
    #[serde(default)]
    pub explanation: Option<String>,
    /// Optional illustration URL or data URI.
    #[serde(default)]
    pub image: Option<String>,
    /// Where the question was loaded from.
    #[serde(default)]
    pub source: Option<String>,
}

impl Question {
    /// Whether `answer` is the correct answer index.
    #[must_use]
    pub fn is_correct(&self, answer: usize) -> bool {
        self.correct == answer
    }

    /// Projection sent to clients while the question is open. The correct
    /// answer and the explanation are left out.
    #[must_use]
    pub fn redacted(&self, category_name: &str) -> QuestionView {
        QuestionView {
            id: self.id.clone(),
            text: self.text.clone(),
            answers: self.answers.clone(),
            category: category_name.to_owned(),
            image: self.image.clone(),
        }
    }
}

/// Question as shown to players before it resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    /// Question identifier.
    pub id: String,
    /// The question text.
    pub text: String,
    /// Answers in display order.
    pub answers: Vec<String>,
    /// Category display name.
    pub category: String,
    /// Optional illustration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question {
            id: "geo_1".to_owned(),
            text: "Capital of Australia?".to_owned(),
            answers: vec![
                "Sydney".to_owned(),
                "Melbourne".to_owned(),
                "Canberra".to_owned(),
                "Perth".to_owned(),
            ],
            correct: 2,
            category: "geography".to_owned(),
            explanation: Some("Canberra was purpose-built.".to_owned()),
            image: None,
            source: Some("geo.json".to_owned()),
        }
    }

    #[test]
    fn test_redacted_view_omits_correct_answer_and_explanation() {
        let view = question().redacted("Geography");

        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["category"], "Geography");
        assert!(json.get("correct").is_none());
        assert!(json.get("explanation").is_none());
        assert!(json.get("image").is_none());
        assert_eq!(json["answers"].as_array().unwrap().len(), ANSWER_COUNT);
    }

    #[test]
    fn test_deserializes_legacy_question_field() {
        let json = serde_json::json!({
            "id": "q1",
            "question": "2 + 2?",
            "answers": ["3", "4", "5", "6"],
            "correct": 1,
            "category": "math"
        });

        let q: Question = serde_json::from_value(json).unwrap();

        assert_eq!(q.text, "2 + 2?");
        assert!(q.is_correct(1));
        assert!(q.explanation.is_none());
    }
}
