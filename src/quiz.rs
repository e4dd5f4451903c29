use std::fmt;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerLabel {
    #[serde(alias = "a")]
    A,
    #[serde(alias = "b")]
    B,
    #[serde(alias = "c")]
    C,
    #[serde(alias = "d")]
    D,
}

impl AnswerLabel {
    pub const ALL: [AnswerLabel; 4] = [AnswerLabel::A, AnswerLabel::B, AnswerLabel::C, AnswerLabel::D];

    pub fn as_str(self) -> &'static str {
        match self {
            AnswerLabel::A => "A",
            AnswerLabel::B => "B",
            AnswerLabel::C => "C",
            AnswerLabel::D => "D",
        }
    }
}

impl fmt::Display for AnswerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A four-option multiple-choice question in its wire form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionItem {
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub answer: AnswerLabel,
}

impl QuestionItem {
    pub fn option(&self, label: AnswerLabel) -> &str {
        match label {
            AnswerLabel::A => &self.option_a,
            AnswerLabel::B => &self.option_b,
            AnswerLabel::C => &self.option_c,
            AnswerLabel::D => &self.option_d,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            bail!("question text is empty");
        }
        for label in AnswerLabel::ALL {
            if self.option(label).trim().is_empty() {
                bail!("option {label} is empty for question {:?}", self.question);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizPayload {
    pub questions: Vec<QuestionItem>,
}

/// Parses a provider reply into exactly `expected` validated questions.
/// Surplus questions are dropped; a short reply is an error.
pub fn decode_questions(payload: &str, expected: usize) -> Result<Vec<QuestionItem>> {
    let parsed: QuizPayload = serde_json::from_str(payload.trim())?;
    let mut questions = parsed.questions;

    if questions.len() < expected {
        bail!(
            "expected {expected} questions but the reply contained {}",
            questions.len()
        );
    }
    if questions.len() > expected {
        tracing::warn!(
            expected,
            received = questions.len(),
            "dropping surplus questions from model reply"
        );
        questions.truncate(expected);
    }

    for (idx, question) in questions.iter().enumerate() {
        question
            .validate()
            .map_err(|err| err.context(format!("question {}", idx + 1)))?;
    }

    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample(question: &str) -> serde_json::Value {
        json!({
            "question": question,
            "option_a": "Chlorophyll",
            "option_b": "Mitochondria",
            "option_c": "Ribosome",
            "option_d": "Nucleus",
            "answer": "A"
        })
    }

    #[test]
    fn decodes_and_accepts_lowercase_answer() {
        let mut second = sample("Which organelle makes ATP?");
        second["answer"] = json!("b");
        let payload = json!({ "questions": [sample("What absorbs light?"), second] }).to_string();

        let questions = decode_questions(&payload, 2).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].option(questions[0].answer), "Chlorophyll");
        assert_eq!(questions[1].answer, AnswerLabel::B);
        assert_eq!(questions[1].answer, AnswerLabel::B);
        assert_eq!(
            serde_json::to_value(&questions[1]).unwrap()["answer"],
            json!("B")
        );
    }

    #[test]
    fn surplus_questions_are_truncated() {
        let payload =
            json!({ "questions": [sample("one"), sample("two"), sample("three")] }).to_string();
        let questions = decode_questions(&payload, 2).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].question, "two");
    }

    #[test]
    fn short_reply_is_rejected() {
        let payload = json!({ "questions": [sample("one")] }).to_string();
        let err = decode_questions(&payload, 3).unwrap_err();
        assert!(err.to_string().contains("expected 3 questions"));
    }

    #[test]
    fn missing_field_is_rejected() {
        let mut broken = sample("one");
        broken.as_object_mut().unwrap().remove("option_d");
        let payload = json!({ "questions": [broken] }).to_string();

        let err = decode_questions(&payload, 1).unwrap_err();
        assert!(err.to_string().contains("option_d"), "{err}");
    }

    #[test]
    fn unknown_answer_label_is_rejected() {
        let mut broken = sample("one");
        broken["answer"] = json!("E");
        let payload = json!({ "questions": [broken] }).to_string();
        assert!(decode_questions(&payload, 1).is_err());
    }

    #[test]
    fn blank_option_is_rejected() {
        let mut broken = sample("one");
        broken["option_c"] = json!("   ");
        let payload = json!({ "questions": [broken] }).to_string();

        let err = decode_questions(&payload, 1).unwrap_err();
        assert!(format!("{err:#}").contains("option C is empty"));
    }

    fn answer_label() -> impl Strategy<Value = AnswerLabel> {
        prop_oneof![
            Just(AnswerLabel::A),
            Just(AnswerLabel::B),
            Just(AnswerLabel::C),
            Just(AnswerLabel::D),
        ]
    }

    fn payload_with(count: usize) -> String {
        let questions: Vec<_> = (0..count)
            .map(|n| {
                let mut item = sample(&format!("Question {n}?"));
                item["answer"] = json!(AnswerLabel::ALL[n % 4].as_str());
                item
            })
            .collect();
        json!({ "questions": questions }).to_string()
    }

    proptest! {
        #[test]
        fn decoded_reply_has_exactly_the_requested_count(n in 1usize..50, extra in 0usize..5) {
            let questions = decode_questions(&payload_with(n + extra), n).unwrap();
            prop_assert_eq!(questions.len(), n);
            for question in &questions {
                prop_assert!(AnswerLabel::ALL.contains(&question.answer));
                prop_assert!(!question.option(question.answer).is_empty());
            }
        }

        #[test]
        fn reply_one_short_is_always_rejected(n in 1usize..50) {
            let err = decode_questions(&payload_with(n - 1), n).unwrap_err();
            let expected = format!("expected {n} questions");
            prop_assert!(err.to_string().contains(&expected));
        }

        #[test]
        fn question_item_survives_wire_round_trip(
            question in "\\PC{1,60}",
            options in proptest::array::uniform4("\\PC{1,30}"),
            answer in answer_label(),
        ) {
            let [option_a, option_b, option_c, option_d] = options;
            let item = QuestionItem { question, option_a, option_b, option_c, option_d, answer };

            let wire = serde_json::to_string(&item).unwrap();
            let back: QuestionItem = serde_json::from_str(&wire).unwrap();
            prop_assert_eq!(back, item);
        }
    }
}
