use super::engine::{QuizPhase, QuizState};
use super::{Quiz, KEY_TAKEAWAYS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub index: usize,
    pub text: String,
    pub is_correct: bool,
    /// Set only on the option the player picked.
    pub highlight: Option<Highlight>,
}

impl OptionView {
    pub fn label(&self) -> String {
        let mark = if self.is_correct { "✅" } else { "❌" };
        format!("{} {}", self.text, mark)
    }
}

/// Everything a renderer needs to draw the quiz card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizView {
    Question {
        number: usize,
        total: usize,
        text: String,
        options: Vec<OptionView>,
        /// Options stop accepting input while feedback is showing.
        locked: bool,
    },
    Complete {
        score: usize,
        total: usize,
        takeaways: Vec<String>,
    },
}

impl QuizView {
    pub fn build(quiz: &Quiz, state: &QuizState) -> Self {
        let total = quiz.len();
        let (index, selected) = match state.phase(total) {
            QuizPhase::Complete => {
                return QuizView::Complete {
                    score: state.score,
                    total,
                    takeaways: KEY_TAKEAWAYS.iter().map(|t| t.to_string()).collect(),
                }
            }
            QuizPhase::Answering(index) => (index, None),
            QuizPhase::ShowingFeedback { question, selected } => (question, Some(selected)),
        };

        let question = &quiz.questions[index];
        let options = question
            .answers
            .iter()
            .enumerate()
            .map(|(i, answer)| OptionView {
                index: i,
                text: answer.text.clone(),
                is_correct: answer.is_correct,
                highlight: (selected == Some(i)).then(|| {
                    if answer.is_correct {
                        Highlight::Correct
                    } else {
                        Highlight::Incorrect
                    }
                }),
            })
            .collect();

        QuizView::Question {
            number: index + 1,
            total,
            text: question.text.clone(),
            options,
            locked: selected.is_some(),
        }
    }

    pub fn title(&self) -> String {
        match self {
            QuizView::Question { number, total, .. } => format!("Question {}/{}", number, total),
            QuizView::Complete { .. } => "Quiz Complete! 🎉".to_string(),
        }
    }

    pub fn description(&self) -> String {
        match self {
            QuizView::Question { text, .. } => text.clone(),
            QuizView::Complete { score, total, .. } => format!("You scored {}/{}", score, total),
        }
    }
}
