use super::schema::OutputSchema;
use crate::request::GenerationRequest;
use crate::utils::pluralize;

const SOURCE_HEADER: &str = "Source text:";

/// Text sent to a provider. `body` carries everything request-specific; the
/// schema descriptor travels separately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub body: String,
}

/// Assembles the prompt for `request`. Pure: equal inputs give an equal prompt.
pub fn build_prompt<S: OutputSchema>(request: &GenerationRequest, schema: &S) -> Prompt {
    let count = request.item_count().get();
    let difficulty = request.difficulty();
    let noun = schema.item_noun();

    let mut body = String::new();
    body.push_str(schema.task());
    body.push_str(&format!("\nProduce exactly {}.", pluralize(noun, count)));
    body.push_str(&format!(
        "\nMake sure the difficulty of every {noun} is {difficulty}."
    ));
    body.push('\n');
    body.push_str(schema.constraints());
    body.push_str("\n\n");
    body.push_str(SOURCE_HEADER);
    body.push('\n');
    body.push_str(request.source_text());

    Prompt {
        system: schema.system_prompt().trim().to_string(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::llm::schema::{LessonSchema, QuizSchema};
    use crate::request::{Difficulty, DifficultyScale};
    use proptest::prelude::*;

    #[test]
    fn test_quiz_prompt() {
        let request = GenerationRequest::new(
            "The moon revolves around the earth.",
            NonZeroUsize::new(2).unwrap(),
            Difficulty::Medium,
        )
        .unwrap();

        let prompt = build_prompt(&request, &QuizSchema);
        assert!(prompt.system.starts_with("You are a teacher"));
        assert!(prompt.body.starts_with("Create multiple-choice questions"));
        assert!(prompt.body.contains("Produce exactly 2 multiple-choice questions."));
        assert!(prompt.body.contains("every multiple-choice question is medium."));
        assert!(prompt.body.contains("four options labeled a, b, c and d"));
        assert!(
            prompt
                .body
                .ends_with("Source text:\nThe moon revolves around the earth.")
        );
    }

    #[test]
    fn test_lesson_prompt_singular() {
        let request = GenerationRequest::new(
            "Quantum entanglement",
            NonZeroUsize::new(1).unwrap(),
            Difficulty::Beginner,
        )
        .unwrap();

        let prompt = build_prompt(&request, &LessonSchema);
        assert!(prompt.body.contains("Produce exactly 1 section."));
        assert!(prompt.body.contains("every section is beginner."));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let request = GenerationRequest::new(
            "Cells divide by mitosis.",
            NonZeroUsize::new(4).unwrap(),
            Difficulty::Hard,
        )
        .unwrap();
        assert_eq!(
            build_prompt(&request, &QuizSchema),
            build_prompt(&request, &QuizSchema)
        );
    }

    fn difficulty() -> impl Strategy<Value = Difficulty> {
        prop_oneof![
            Just(Difficulty::Easy),
            Just(Difficulty::Medium),
            Just(Difficulty::Hard),
        ]
    }

    proptest! {
        #[test]
        fn prompt_states_count_difficulty_and_source(
            count in 1usize..500,
            difficulty in difficulty(),
            source in "[a-zA-Z0-9 .,]{0,80}[a-zA-Z]",
        ) {
            prop_assert_eq!(difficulty.scale(), DifficultyScale::Quiz);
            let request = GenerationRequest::new(
                &source,
                NonZeroUsize::new(count).unwrap(),
                difficulty,
            ).unwrap();

            let prompt = build_prompt(&request, &QuizSchema);
            let expected_count = format!("exactly {count} ");
            prop_assert!(prompt.body.contains(&expected_count));
            prop_assert!(prompt.body.contains(difficulty.as_str()));
            prop_assert!(prompt.body.contains(source.trim()));
        }
    }
}
