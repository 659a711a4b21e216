//! Diary questions and the question-of-the-day selection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{MindLogError, MindLogResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionCategory {
    #[serde(rename = "self")]
    SelfReflection,
    #[serde(rename = "past")]
    Past,
    #[serde(rename = "imagination")]
    Imagination,
}

impl QuestionCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionCategory::SelfReflection => "self",
            QuestionCategory::Past => "past",
            QuestionCategory::Imagination => "imagination",
        }
    }
}

impl FromStr for QuestionCategory {
    type Err = MindLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "self" => Ok(QuestionCategory::SelfReflection),
            "past" => Ok(QuestionCategory::Past),
            "imagination" => Ok(QuestionCategory::Imagination),
            other => Err(MindLogError::InvalidEvent(format!(
                "unknown question category '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub category: QuestionCategory,
}

/// On-disk layout of a question file. The `version` key is ignored.
#[derive(Debug, Deserialize)]
struct QuestionsFile {
    questions: Vec<Question>,
}

#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

const BUILTIN: &[(&str, &str, QuestionCategory)] = &[
    ("q001", "What made you smile today?", QuestionCategory::SelfReflection),
    ("q002", "Which habit of yours would you keep forever?", QuestionCategory::SelfReflection),
    ("q003", "What are you avoiding right now, and why?", QuestionCategory::SelfReflection),
    ("q004", "When did you last feel completely at ease?", QuestionCategory::SelfReflection),
    ("q005", "What did you love doing as a child?", QuestionCategory::Past),
    ("q006", "Which decision from last year are you glad you made?", QuestionCategory::Past),
    ("q007", "Who taught you something you still use?", QuestionCategory::Past),
    ("q008", "What smell takes you straight back somewhere?", QuestionCategory::Past),
    ("q009", "If today repeated forever, what would you change first?", QuestionCategory::Imagination),
    ("q010", "Where would you live if distance did not matter?", QuestionCategory::Imagination),
    ("q011", "What would you tell yourself ten years from now?", QuestionCategory::Imagination),
    ("q012", "Which skill would you learn overnight if you could?", QuestionCategory::Imagination),
];

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        QuestionBank { questions }
    }

    /// The question set shipped with the application.
    pub fn builtin() -> Self {
        let questions = BUILTIN
            .iter()
            .map(|(id, text, category)| Question {
                id: id.to_string(),
                text: text.to_string(),
                category: *category,
            })
            .collect();
        QuestionBank { questions }
    }

    /// Load a `{ "version": ..., "questions": [...] }` file.
    pub fn load(path: &Path) -> MindLogResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let file: QuestionsFile = serde_json::from_str(&contents)?;
        if file.questions.is_empty() {
            return Err(MindLogError::Config(format!(
                "{} contains no questions",
                path.display()
            )));
        }
        Ok(QuestionBank::new(file.questions))
    }

    pub fn all(&self) -> &[Question] {
        &self.questions
    }

    pub fn by_category(&self, category: QuestionCategory) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.category == category)
            .collect()
    }

    pub fn by_id(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// `count` questions for `date`. The same date always yields the same
    /// questions on every device; different dates reshuffle.
    pub fn daily(&self, date: NaiveDate, count: usize) -> Vec<&Question> {
        let seed = hash_code(&date.format("%Y-%m-%d").to_string());
        let mut picked: Vec<&Question> = self.questions.iter().collect();
        seeded_shuffle(&mut picked, seed);
        picked.truncate(count);
        picked
    }
}

/// 31-multiplier string hash over UTF-16 code units, 32-bit wrapping.
fn hash_code(s: &str) -> u64 {
    let hash = s.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    u64::from(hash.unsigned_abs())
}

/// Fisher-Yates driven by a 32-bit linear congruential generator.
fn seeded_shuffle<T>(items: &mut [T], seed: u64) {
    const MODULUS: u64 = 1 << 32;
    let mut state = seed;
    let mut next = || {
        state = (state * 1_664_525 + 1_013_904_223) % MODULUS;
        state as f64 / MODULUS as f64
    };

    for i in (1..items.len()).rev() {
        let j = (next() * (i + 1) as f64).floor() as usize;
        items.swap(i, j);
    }
}
