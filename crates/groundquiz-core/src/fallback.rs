//! Deterministic synthetic quiz used whenever oracle-backed generation is
//! unavailable or unusable.

use crate::model::{Question, Quiz, QuizOrigin, QUIZ_LENGTH};

/// Default number of source characters quoted in each fallback question.
pub const BASIS_HINT_CHARS: usize = 160;

const PADDING_OPTIONS: [&str; 4] = [
    "Write a small example and test edge cases",
    "Memorize a paragraph without applying it",
    "Avoid definitions and rely only on intuition",
    "Skip evaluation entirely",
];

/// Leading excerpt of the source, cut on a char boundary.
fn basis_hint(source_text: &str, hint_chars: usize) -> String {
    let basis = source_text.trim();
    if basis.is_empty() {
        return "Based on the provided explanation.".to_string();
    }
    let excerpt: String = basis.chars().take(hint_chars).collect();
    format!("Based on the provided explanation: {}...", excerpt.trim_end())
}

fn question(text: String, options: [&str; 4]) -> Question {
    // Templates are fixed and well-formed; a failure here is a programming error.
    Question::new(text, options.iter().map(|o| o.to_string()).collect(), 0)
        .expect("fallback templates are always valid")
}

/// Build the synthetic quiz with the default hint length.
pub fn fallback_quiz(topic: &str, source_text: &str) -> Quiz {
    fallback_quiz_with_hint(topic, source_text, BASIS_HINT_CHARS)
}

/// Build the synthetic quiz: two topic templates, then numbered padding.
/// Option 0 is always the correct one.
pub fn fallback_quiz_with_hint(topic: &str, source_text: &str, hint_chars: usize) -> Quiz {
    let hint = basis_hint(source_text, hint_chars);
    let topic = topic.trim();

    let mut questions = vec![
        question(
            format!("{hint}\nWhich statement best matches the definition stated for '{topic}'?"),
            [
                "A precise formal definition used in engineering literature",
                "A purely opinion-based description with no measurable criteria",
                "A historical anecdote unrelated to engineering practice",
                "A marketing slogan without technical meaning",
            ],
        )
        .with_explanation("Technical topics are typically defined in formal, measurable terms."),
        question(
            format!("{hint}\nWhich option best represents a core concept mentioned in the explanation?"),
            [
                "A well-defined model/abstraction",
                "Astrology-based assumptions",
                "Random trial without evaluation",
                "Undefined terminology with no constraints",
            ],
        )
        .with_explanation("Engineering learning emphasizes abstractions, models, and constraints."),
    ];

    while questions.len() < QUIZ_LENGTH {
        let number = questions.len() + 1;
        questions.push(
            question(
                format!("{hint}\n[Demo] Which option is consistent with what was explained? (Q{number})"),
                PADDING_OPTIONS,
            )
            .with_explanation(
                "Applying concepts in small experiments and testing is a standard validation approach.",
            ),
        );
    }

    Quiz::new(questions, QuizOrigin::Fallback).expect("fallback always has QUIZ_LENGTH questions")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_ten_with_first_option_correct() {
        let quiz = fallback_quiz("Recursion", "Recursion is a function calling itself.");
        assert_eq!(quiz.questions().len(), QUIZ_LENGTH);
        assert!(quiz.is_fallback());
        assert!(quiz.answer_key().iter().all(|&i| i == 0));
        assert!(quiz.questions()[0].text().contains("'Recursion'"));
        assert!(quiz.questions()[9].text().ends_with("(Q10)"));
        assert!(quiz.questions()[2].text().ends_with("(Q3)"));
    }

    #[test]
    fn empty_source_uses_plain_hint() {
        let quiz = fallback_quiz("Topic", "   ");
        assert!(quiz.questions()[0]
            .text()
            .starts_with("Based on the provided explanation.\n"));
    }

    #[test]
    fn hint_is_truncated_on_char_boundary() {
        let source = "é".repeat(400);
        let quiz = fallback_quiz("Accents", &source);
        let first = quiz.questions()[0].text();
        let excerpt = first
            .strip_prefix("Based on the provided explanation: ")
            .and_then(|s| s.split("...").next())
            .unwrap();
        assert_eq!(excerpt.chars().count(), BASIS_HINT_CHARS);
    }

    #[test]
    fn custom_hint_length() {
        let quiz = fallback_quiz_with_hint("T", "abcdefghij", 4);
        assert!(quiz.questions()[0]
            .text()
            .starts_with("Based on the provided explanation: abcd..."));
    }

    #[test]
    fn deterministic() {
        let a = fallback_quiz("Graphs", "Graphs have vertices and edges.");
        let b = fallback_quiz("Graphs", "Graphs have vertices and edges.");
        assert_eq!(a, b);
    }
}
