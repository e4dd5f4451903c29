use std::fmt;
use std::num::NonZeroUsize;

use thiserror::Error;

/// Caller input that failed validation. Always answered with a 400 and never
/// forwarded to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("Request body is not valid JSON: {0}")]
    MalformedBody(String),
    #[error("Difficulty must be one of: {}", allowed.join(", "))]
    InvalidDifficulty {
        label: String,
        allowed: &'static [&'static str],
    },
    #[error("{field} must be a positive integer, got {value}")]
    NonPositiveCount { field: &'static str, value: i64 },
    #[error("{field} must be at most {max}, got {value}")]
    CountTooLarge {
        field: &'static str,
        value: i64,
        max: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Beginner,
    Intermediate,
    Advanced,
}

/// The closed set of labels an endpoint accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DifficultyScale {
    Quiz,
    Lesson,
}

impl DifficultyScale {
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            DifficultyScale::Quiz => &["easy", "medium", "hard"],
            DifficultyScale::Lesson => &["beginner", "intermediate", "advanced"],
        }
    }

    pub fn default_difficulty(self) -> Difficulty {
        match self {
            DifficultyScale::Quiz => Difficulty::Easy,
            DifficultyScale::Lesson => Difficulty::Intermediate,
        }
    }
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn scale(self) -> DifficultyScale {
        match self {
            Difficulty::Easy | Difficulty::Medium | Difficulty::Hard => DifficultyScale::Quiz,
            Difficulty::Beginner | Difficulty::Intermediate | Difficulty::Advanced => {
                DifficultyScale::Lesson
            }
        }
    }

    /// Parses `label` against `scale`. Matching ignores case and surrounding
    /// whitespace; a label from the other scale is rejected.
    pub fn parse(label: &str, scale: DifficultyScale) -> Result<Self, ValidationError> {
        let normalized = label.trim().to_ascii_lowercase();
        let parsed = match normalized.as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            "beginner" => Some(Difficulty::Beginner),
            "intermediate" => Some(Difficulty::Intermediate),
            "advanced" => Some(Difficulty::Advanced),
            _ => None,
        };

        match parsed {
            Some(difficulty) if difficulty.scale() == scale => Ok(difficulty),
            _ => Err(ValidationError::InvalidDifficulty {
                label: label.to_string(),
                allowed: scale.labels(),
            }),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generation job. Built only through [`GenerationRequest::new`], so a
/// value in hand always has non-blank source text and a positive count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    source_text: String,
    item_count: NonZeroUsize,
    difficulty: Difficulty,
}

impl GenerationRequest {
    pub fn new(
        source_text: &str,
        item_count: NonZeroUsize,
        difficulty: Difficulty,
    ) -> Result<Self, ValidationError> {
        let source_text = source_text.trim();
        if source_text.is_empty() {
            return Err(ValidationError::MissingField {
                field: "source text",
            });
        }

        Ok(Self {
            source_text: source_text.to_string(),
            item_count,
            difficulty,
        })
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn item_count(&self) -> NonZeroUsize {
        self.item_count
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

/// Validates an optional count coming off the wire. An absent count falls
/// back to `default`, clamped to `max`.
pub fn parse_item_count(
    field: &'static str,
    value: Option<i64>,
    default: NonZeroUsize,
    max: usize,
) -> Result<NonZeroUsize, ValidationError> {
    let Some(value) = value else {
        return NonZeroUsize::new(default.get().min(max)).ok_or(ValidationError::CountTooLarge {
            field,
            value: i64::try_from(default.get()).unwrap_or(i64::MAX),
            max,
        });
    };

    if value <= 0 {
        return Err(ValidationError::NonPositiveCount { field, value });
    }

    let count = usize::try_from(value)
        .ok()
        .filter(|count| *count <= max)
        .and_then(NonZeroUsize::new)
        .ok_or(ValidationError::CountTooLarge { field, value, max })?;

    Ok(count)
}
