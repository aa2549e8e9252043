//! crates/tube_quiz_core/src/preview.rs
//!
//! Plain-text rendering of generated drafts.

use crate::domain::QuestionDraft;
use crate::package::question_label;
use std::fmt::Write;

/// `A`, `B`, … `Z`, then the 1-based number for anything beyond.
pub fn answer_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}

pub fn render_preview(drafts: &[QuestionDraft]) -> String {
    let mut out = String::new();
    for (i, draft) in drafts.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}", question_label(i + 1));
        let _ = writeln!(out, "{}", draft.question_text);
        for (idx, answer) in draft.answer_texts.iter().enumerate() {
            let _ = writeln!(out, "- {}. {}", answer_label(idx), answer);
        }
        let _ = writeln!(out, "Correct answer: {}", answer_label(draft.correct_index));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_answers_with_letters() {
        assert_eq!(answer_label(0), "A");
        assert_eq!(answer_label(3), "D");
        assert_eq!(answer_label(25), "Z");
        assert_eq!(answer_label(26), "27");
    }

    #[test]
    fn renders_each_question_with_its_correct_answer() {
        let drafts = vec![
            QuestionDraft::new(
                "What is 2+2?",
                vec!["3".into(), "4".into(), "5".into(), "6".into()],
                1,
            ),
            QuestionDraft::new("Sky?", vec!["Blue".into(), "Green".into()], 0),
        ];
        let expected = "\
Question 1
What is 2+2?
- A. 3
- B. 4
- C. 5
- D. 6
Correct answer: B

Question 2
Sky?
- A. Blue
- B. Green
Correct answer: A
";
        assert_eq!(render_preview(&drafts), expected);
    }
}
