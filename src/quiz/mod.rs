pub mod engine;
pub mod view;

pub use engine::{QuizEngine, QuizPhase, QuizState, Submission, DEFAULT_ADVANCE_DELAY};
pub use view::{Highlight, OptionView, QuizView};

pub const PROJECT_ID: &str = "farcaster-frames-template";
pub const PROJECT_TITLE: &str = "PhotoQuizFrame";
pub const PROJECT_DESCRIPTION: &str =
    "Learn Maschine's capabilities through an interactive quiz";

/// Question text followed by `(option text, is correct)` pairs.
const QUIZ_QUESTIONS: &[(&str, &[(&str, bool)])] = &[
    (
        "What CAN you build with Maschine?",
        &[
            ("Photo editing tools", true),
            ("NFT minting contracts", false),
            ("Interactive stories", true),
            ("Database-backed apps", false),
        ],
    ),
    (
        "What's NOT possible yet?",
        &[
            ("Simple image filters", false),
            ("Real-time multiplayer games", true),
            ("Basic quizzes", false),
            ("AI image generation", true),
        ],
    ),
];

pub const KEY_TAKEAWAYS: &[&str] = &[
    "✅ Do: Simple UIs, Image filters, Quizzes",
    "🚫 Don't: Complex contracts, Databases, AI",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Quiz {
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// The fixed question list shipped with the frame.
    pub fn builtin() -> Self {
        let questions = QUIZ_QUESTIONS
            .iter()
            .map(|(text, answers)| {
                Question::new(
                    text.to_string(),
                    answers
                        .iter()
                        .map(|(text, is_correct)| Answer::new(text.to_string(), *is_correct))
                        .collect(),
                )
            })
            .collect();
        Self::new(questions)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub text: String,
    pub answers: Vec<Answer>,
}
impl Question {
    pub fn new(text: String, answers: Vec<Answer>) -> Self {
        Self { text, answers }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Answer {
    pub text: String,
    pub is_correct: bool,
}
impl Answer {
    pub fn new(text: String, is_correct: bool) -> Self {
        Self { text, is_correct }
    }
}
