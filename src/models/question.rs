// src/models/question.rs

use serde::{Deserialize, Serialize};

use crate::models::exam::Language;

/// Kind of a content fragment inside a question or answer body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
}

/// One fragment of a body. For images `value` is the relative image path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub value: String,
}

/// A selectable answer of a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: i64,
    pub body: Vec<ContentPart>,
    #[serde(default)]
    pub is_correct: bool,
}

impl Answer {
    /// Renders the body as plain text: every part's value joined by a single space.
    pub fn text(&self) -> String {
        self.body
            .iter()
            .map(|part| part.value.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A multiple-choice question as stored in a template document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub body: Vec<ContentPart>,
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Question {
    /// The answer flagged as correct.
    /// Stored data is expected to flag exactly one.
    pub fn correct_answer(&self) -> Option<&Answer> {
        self.answers.iter().find(|a| a.is_correct)
    }

    pub fn answer(&self, answer_id: i64) -> Option<&Answer> {
        self.answers.iter().find(|a| a.id == answer_id)
    }

    /// Projection sent to clients while the exam is running.
    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            body: self.body.clone(),
            answers: self
                .answers
                .iter()
                .map(|a| PublicAnswer {
                    id: a.id,
                    body: a.body.clone(),
                })
                .collect(),
        }
    }
}

/// The JSON document kept in the `templates.template` column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateDocument {
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// A question set for one language.
#[derive(Debug, Clone)]
pub struct Template {
    pub id: i64,
    pub language: Language,
    pub questions: Vec<Question>,
}

/// A question pulled into an exam pool, remembering where it came from.
#[derive(Debug, Clone)]
pub struct PooledQuestion {
    pub template_id: i64,
    pub question: Question,
}

/// DTO for sending a question to the client (no correctness flags, no explanation).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub body: Vec<ContentPart>,
    pub answers: Vec<PublicAnswer>,
}

#[derive(Debug, Serialize)]
pub struct PublicAnswer {
    pub id: i64,
    pub body: Vec<ContentPart>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> ContentPart {
        ContentPart {
            kind: ContentKind::Text,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_answer_text_joins_with_single_space() {
        let answer = Answer {
            id: 1,
            body: vec![
                text("Give way"),
                ContentPart {
                    kind: ContentKind::Image,
                    value: "uz-test-images/12.png".to_string(),
                },
                text("to the right"),
            ],
            is_correct: true,
        };

        assert_eq!(answer.text(), "Give way uz-test-images/12.png to the right");
    }

    #[test]
    fn test_public_projection_hides_correctness() {
        let question = Question {
            id: 7,
            body: vec![text("Which sign?")],
            answers: vec![
                Answer { id: 71, body: vec![text("A")], is_correct: false },
                Answer { id: 72, body: vec![text("B")], is_correct: true },
            ],
            explanation: Some("Because".to_string()),
        };

        let json = serde_json::to_value(question.to_public()).unwrap();
        assert_eq!(json["answers"].as_array().unwrap().len(), 2);
        assert!(json["answers"][1].get("isCorrect").is_none());
        assert!(json.get("explanation").is_none());
        assert_eq!(question.correct_answer().unwrap().id, 72);
    }

    #[test]
    fn test_template_document_parses_stored_shape() {
        let doc: TemplateDocument = serde_json::from_value(serde_json::json!({
            "questions": [{
                "id": 1,
                "body": [{ "type": "text", "value": "Q" }],
                "answers": [
                    { "id": 11, "body": [{ "type": "text", "value": "yes" }], "isCorrect": true },
                    { "id": 12, "body": [{ "type": "image", "value": "ru-test-images/1.png" }] }
                ]
            }]
        }))
        .unwrap();

        let q = &doc.questions[0];
        assert!(q.explanation.is_none());
        assert!(!q.answers[1].is_correct);
        assert_eq!(q.answers[1].body[0].kind, ContentKind::Image);
    }
}
