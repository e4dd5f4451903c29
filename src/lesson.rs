use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::request::Difficulty;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSection {
    pub title: String,
    pub content: String,
    pub key_points: Vec<String>,
}

/// Explanatory material for a topic, as returned by `/api/generate-content/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonContent {
    pub topic: String,
    pub summary: String,
    pub sections: Vec<LessonSection>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub difficulty_level: String,
}

pub fn decode_lesson(payload: &str, max_sections: usize, difficulty: Difficulty) -> Result<LessonContent> {
    let mut lesson: LessonContent = serde_json::from_str(payload.trim())?;

    if lesson.topic.trim().is_empty() {
        bail!("lesson topic is empty");
    }
    if lesson.sections.is_empty() {
        bail!("lesson has no sections");
    }
    if lesson.sections.len() > max_sections {
        tracing::warn!(
            expected = max_sections,
            received = lesson.sections.len(),
            "dropping surplus lesson sections"
        );
        lesson.sections.truncate(max_sections);
    }
    for section in &lesson.sections {
        if section.title.trim().is_empty() || section.content.trim().is_empty() {
            bail!("lesson section is missing a title or body");
        }
    }

    lesson.difficulty_level = difficulty.to_string();
    Ok(lesson)
}
