//! Question bank loading

use crate::types::Question;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum QuestionLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid questions JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Provides the current question pool. May return an empty list.
pub trait QuestionSource: Send {
    fn load(&self) -> Vec<Question>;
}

/// Fixed in-memory pool
#[derive(Debug, Clone, Default)]
pub struct StaticQuestions(pub Vec<Question>);

impl QuestionSource for StaticQuestions {
    fn load(&self) -> Vec<Question> {
        self.0.clone()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct QuestionFile {
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawQuestion {
    question: Option<String>,
    answer: Option<String>,
}

/// `questions.json` on disk: `{ "questions": [ { "question": .., "answer": .. } ] }`
pub struct JsonQuestionFile {
    path: PathBuf,
}

impl JsonQuestionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn try_load(&self) -> Result<Vec<Question>, QuestionLoadError> {
        if !self.path.exists() {
            self.write_defaults()?;
        }
        let json = std::fs::read_to_string(&self.path)?;
        let file: QuestionFile = serde_json::from_str(&json)?;
        Ok(file
            .questions
            .into_iter()
            .filter_map(|raw| match (raw.question, raw.answer) {
                (Some(q), Some(a)) if !q.trim().is_empty() => Some(Question::new(q, a)),
                _ => None,
            })
            .collect())
    }

    fn write_defaults(&self) -> Result<(), QuestionLoadError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = QuestionFile {
            questions: default_questions()
                .into_iter()
                .map(|q| RawQuestion {
                    question: Some(q.question),
                    answer: Some(q.answer),
                })
                .collect(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

impl QuestionSource for JsonQuestionFile {
    fn load(&self) -> Vec<Question> {
        match self.try_load() {
            Ok(questions) => {
                tracing::info!(
                    "Loaded {} trivia questions from {}",
                    questions.len(),
                    self.path.display()
                );
                questions
            }
            Err(e) => {
                tracing::error!("Failed to load questions from {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }
}

fn default_questions() -> Vec<Question> {
    vec![
        Question::new("What is the capital of France?", "Paris"),
        Question::new("Which planet is known as the Red Planet?", "Mars"),
        Question::new("What is the largest ocean on Earth?", "Pacific Ocean"),
        Question::new("How many legs does a spider have?", "8"),
        Question::new("Which mob explodes when it gets close to you?", "Creeper"),
    ]
}
