use std::str::FromStr;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html;

use crate::quiz::{Highlight, QuizView};

pub const LOADING_TEXT: &str = "Loading...";

/// Payload of an inline button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Answer(usize),
    Reset,
    AddPrompt { accepted: bool },
    PrimaryButton,
}

impl CallbackAction {
    pub fn data(&self) -> String {
        match self {
            CallbackAction::Answer(index) => format!("answer:{}", index),
            CallbackAction::Reset => "reset".to_string(),
            CallbackAction::AddPrompt { accepted: true } => "add:yes".to_string(),
            CallbackAction::AddPrompt { accepted: false } => "add:no".to_string(),
            CallbackAction::PrimaryButton => "primary".to_string(),
        }
    }

    /// Quiz buttons live on the card. The add prompt and the primary button
    /// are separate messages.
    pub fn targets_card(&self) -> bool {
        matches!(self, CallbackAction::Answer(_) | CallbackAction::Reset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown callback data {0:?}")]
pub struct UnknownCallback(pub String);

impl FromStr for CallbackAction {
    type Err = UnknownCallback;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownCallback(data.to_string());
        match data {
            "reset" => Ok(CallbackAction::Reset),
            "add:yes" => Ok(CallbackAction::AddPrompt { accepted: true }),
            "add:no" => Ok(CallbackAction::AddPrompt { accepted: false }),
            "primary" => Ok(CallbackAction::PrimaryButton),
            _ => data
                .strip_prefix("answer:")
                .and_then(|index| index.parse().ok())
                .map(CallbackAction::Answer)
                .ok_or_else(unknown),
        }
    }
}

fn button(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.data())
}

/// HTML body of the quiz card.
pub fn card_text(view: &QuizView) -> String {
    let mut text = format!(
        "<b>{}</b>\n{}",
        html::escape(&view.title()),
        html::escape(&view.description())
    );
    if let QuizView::Complete { takeaways, .. } = view {
        text.push_str("\n\n<b>Key Takeaways:</b>");
        for takeaway in takeaways {
            text.push('\n');
            text.push_str(&html::escape(takeaway));
        }
    }
    text
}

pub fn card_keyboard(view: &QuizView) -> InlineKeyboardMarkup {
    match view {
        QuizView::Question { options, .. } => InlineKeyboardMarkup::new(
            options
                .iter()
                .map(|option| {
                    let label = match option.highlight {
                        Some(Highlight::Correct) => format!("🟩 {}", option.label()),
                        Some(Highlight::Incorrect) => format!("🟥 {}", option.label()),
                        None => option.label(),
                    };
                    vec![button(label, CallbackAction::Answer(option.index))]
                })
                .collect::<Vec<_>>(),
        ),
        QuizView::Complete { .. } => {
            InlineKeyboardMarkup::new(vec![vec![button("Try Again", CallbackAction::Reset)]])
        }
    }
}

pub fn add_prompt_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button("Add", CallbackAction::AddPrompt { accepted: true }),
        button("Not now", CallbackAction::AddPrompt { accepted: false }),
    ]])
}

pub fn primary_button_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "Share quiz",
        CallbackAction::PrimaryButton,
    )]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{Quiz, QuizState};

    #[test]
    fn callback_data_parses_back() {
        for action in [
            CallbackAction::Answer(3),
            CallbackAction::Reset,
            CallbackAction::AddPrompt { accepted: true },
            CallbackAction::AddPrompt { accepted: false },
            CallbackAction::PrimaryButton,
        ] {
            assert_eq!(action.data().parse::<CallbackAction>(), Ok(action));
        }
    }

    #[test]
    fn only_quiz_buttons_are_bound_to_the_card() {
        assert!(CallbackAction::Answer(0).targets_card());
        assert!(CallbackAction::Reset.targets_card());
        assert!(!CallbackAction::AddPrompt { accepted: true }.targets_card());
        assert!(!CallbackAction::PrimaryButton.targets_card());
    }

    #[test]
    fn garbage_callback_is_rejected() {
        assert!("answer:".parse::<CallbackAction>().is_err());
        assert!("answer:-1".parse::<CallbackAction>().is_err());
        assert!("launch".parse::<CallbackAction>().is_err());
    }

    #[test]
    fn question_card_escapes_text() {
        let view = QuizView::build(&Quiz::builtin(), &QuizState::default());
        assert_eq!(
            card_text(&view),
            "<b>Question 1/2</b>\nWhat CAN you build with Maschine?"
        );
    }

    #[test]
    fn complete_card_lists_takeaways() {
        let state = QuizState {
            current_question: 2,
            score: 1,
            selected_answer: None,
        };
        let text = card_text(&QuizView::build(&Quiz::builtin(), &state));
        assert!(text.starts_with("<b>Quiz Complete! 🎉</b>\nYou scored 1/2"));
        assert!(text.contains("Key Takeaways:"));
        assert!(text.contains("Image filters"));
    }
}
