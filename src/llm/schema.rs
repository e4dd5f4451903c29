use serde_json::{Value, json};

use crate::error::{GenerationError, GenerationResult};
use crate::lesson::{LessonContent, decode_lesson};
use crate::quiz::{QuestionItem, decode_questions};
use crate::request::GenerationRequest;

/// Shape hint handed to the provider next to the prompt text. `schema` is a
/// provider-neutral JSON Schema subset; providers adapt it to their dialect.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaDescriptor {
    pub name: &'static str,
    pub schema: Value,
}

/// A structured output the generator knows how to ask for and decode.
pub trait OutputSchema: Sync {
    type Output;

    fn name(&self) -> &'static str;

    /// Role statement sent as the system instruction.
    fn system_prompt(&self) -> &'static str;

    /// Opening instruction of the prompt body.
    fn task(&self) -> &'static str;

    /// Singular noun for one generated item, e.g. "section".
    fn item_noun(&self) -> &'static str;

    /// Layout rules the reply has to follow.
    fn constraints(&self) -> &'static str;

    fn descriptor(&self, request: &GenerationRequest) -> SchemaDescriptor;

    fn decode(&self, payload: &str, request: &GenerationRequest) -> GenerationResult<Self::Output>;
}

const QUIZ_SYSTEM_PROMPT: &str = r#"
You are a teacher who writes multiple-choice questions that check whether a student understood a text.
Questions must be answerable from the text alone and must not give away their own answer.
"#;

const QUIZ_TASK: &str = "Create multiple-choice questions about the source text below. \
Focus on the core text, using any extra detail only for context.";

const QUIZ_CONSTRAINTS: &str = "Each question must have four options labeled a, b, c and d, \
with exactly one of them correct. Put the option texts in option_a, option_b, option_c and \
option_d and the letter of the correct option (A, B, C or D) in answer. \
Keep questions clear, concise and relevant to the text.";

#[derive(Clone, Copy, Debug, Default)]
pub struct QuizSchema;

impl OutputSchema for QuizSchema {
    type Output = Vec<QuestionItem>;

    fn name(&self) -> &'static str {
        "quiz"
    }

    fn system_prompt(&self) -> &'static str {
        QUIZ_SYSTEM_PROMPT
    }

    fn task(&self) -> &'static str {
        QUIZ_TASK
    }

    fn item_noun(&self) -> &'static str {
        "multiple-choice question"
    }

    fn constraints(&self) -> &'static str {
        QUIZ_CONSTRAINTS
    }

    fn descriptor(&self, request: &GenerationRequest) -> SchemaDescriptor {
        let count = request.item_count().get();
        let text = json!({ "type": "string" });
        let schema = json!({
            "type": "object",
            "properties": {
                "questions": {
                    "type": "array",
                    "minItems": count,
                    "maxItems": count,
                    "items": {
                        "type": "object",
                        "properties": {
                            "question": text,
                            "option_a": text,
                            "option_b": text,
                            "option_c": text,
                            "option_d": text,
                            "answer": {
                                "type": "string",
                                "enum": ["A", "B", "C", "D"],
                                "description": "Letter of the single correct option"
                            }
                        },
                        "required": ["question", "option_a", "option_b", "option_c", "option_d", "answer"]
                    }
                }
            },
            "required": ["questions"]
        });

        SchemaDescriptor {
            name: self.name(),
            schema,
        }
    }

    fn decode(&self, payload: &str, request: &GenerationRequest) -> GenerationResult<Self::Output> {
        decode_questions(payload, request.item_count().get()).map_err(|err| {
            GenerationError::schema_mismatch(format!(
                "model reply did not match the quiz schema: {err:#}"
            ))
        })
    }
}

const LESSON_SYSTEM_PROMPT: &str = r#"
You are an educator who writes accurate, well-structured study material.
Explain ideas plainly, define terms before using them and only state facts you are confident about.
"#;

const LESSON_TASK: &str = "Write explanatory study material about the topic below.";

const LESSON_CONSTRAINTS: &str = "Start with a short summary of the topic. Give every section a \
title, a body of one or two paragraphs and three key points. List the references a student \
could read next.";

#[derive(Clone, Copy, Debug, Default)]
pub struct LessonSchema;

impl OutputSchema for LessonSchema {
    type Output = LessonContent;

    fn name(&self) -> &'static str {
        "lesson"
    }

    fn system_prompt(&self) -> &'static str {
        LESSON_SYSTEM_PROMPT
    }

    fn task(&self) -> &'static str {
        LESSON_TASK
    }

    fn item_noun(&self) -> &'static str {
        "section"
    }

    fn constraints(&self) -> &'static str {
        LESSON_CONSTRAINTS
    }

    fn descriptor(&self, request: &GenerationRequest) -> SchemaDescriptor {
        let text = json!({ "type": "string" });
        let text_list = json!({ "type": "array", "items": { "type": "string" } });
        let schema = json!({
            "type": "object",
            "properties": {
                "topic": text,
                "summary": text,
                "sections": {
                    "type": "array",
                    "minItems": 1,
                    "maxItems": request.item_count().get(),
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": text,
                            "content": text,
                            "key_points": text_list
                        },
                        "required": ["title", "content", "key_points"]
                    }
                },
                "references": text_list,
                "difficulty_level": text
            },
            "required": ["topic", "summary", "sections", "references", "difficulty_level"]
        });

        SchemaDescriptor {
            name: self.name(),
            schema,
        }
    }

    fn decode(&self, payload: &str, request: &GenerationRequest) -> GenerationResult<Self::Output> {
        decode_lesson(payload, request.item_count().get(), request.difficulty()).map_err(|err| {
            GenerationError::schema_mismatch(format!(
                "model reply did not match the lesson schema: {err:#}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::error::ErrorKind;
    use crate::request::Difficulty;

    fn request(count: usize) -> GenerationRequest {
        GenerationRequest::new(
            "Photosynthesis converts light into chemical energy.",
            NonZeroUsize::new(count).unwrap(),
            Difficulty::Easy,
        )
        .unwrap()
    }

    #[test]
    fn quiz_descriptor_pins_item_count() {
        let descriptor = QuizSchema.descriptor(&request(3));
        assert_eq!(descriptor.name, "quiz");

        let questions = &descriptor.schema["properties"]["questions"];
        assert_eq!(questions["minItems"], 3);
        assert_eq!(questions["maxItems"], 3);
        assert_eq!(
            questions["items"]["properties"]["answer"]["enum"],
            json!(["A", "B", "C", "D"])
        );
        assert_eq!(questions["items"]["required"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn lesson_descriptor_requires_every_field() {
        let descriptor = LessonSchema.descriptor(&request(4));
        let required = descriptor.schema["required"].as_array().unwrap();
        let properties = descriptor.schema["properties"].as_object().unwrap();
        assert_eq!(required.len(), properties.len());
        assert_eq!(descriptor.schema["properties"]["sections"]["maxItems"], 4);
    }

    #[test]
    fn quiz_decode_failure_is_schema_mismatch() {
        let err = QuizSchema
            .decode(r#"{"questions": [{"question": "q"}]}"#, &request(1))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::SchemaMismatch);
        assert!(err.message.starts_with("model reply did not match the quiz schema"));
    }

    #[test]
    fn lesson_decode_failure_is_schema_mismatch() {
        let err = LessonSchema.decode("not json", &request(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SchemaMismatch);
    }
}
