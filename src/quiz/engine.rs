use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::view::QuizView;
use super::Quiz;

/// How long the answer feedback stays on screen before the next question.
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuizState {
    pub current_question: usize,
    pub score: usize,
    /// Only set between a submission and the automatic advance.
    pub selected_answer: Option<usize>,
}

impl QuizState {
    pub fn phase(&self, total: usize) -> QuizPhase {
        if self.current_question >= total {
            return QuizPhase::Complete;
        }
        match self.selected_answer {
            Some(selected) => QuizPhase::ShowingFeedback {
                question: self.current_question,
                selected,
            },
            None => QuizPhase::Answering(self.current_question),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Answering(usize),
    ShowingFeedback { question: usize, selected: usize },
    Complete,
}

/// What happened to a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Accepted { correct: bool },
    /// Feedback for the previous answer is still showing.
    AnswerPending,
    Complete,
    UnknownOption,
}

pub struct QuizEngine {
    quiz: Arc<Quiz>,
    state: Arc<watch::Sender<QuizState>>,
    advance_delay: Duration,
    pending_advance: Option<JoinHandle<()>>,
}

impl QuizEngine {
    pub fn new(quiz: Arc<Quiz>, advance_delay: Duration) -> Self {
        let (state, _) = watch::channel(QuizState::default());
        Self {
            quiz,
            state: Arc::new(state),
            advance_delay,
            pending_advance: None,
        }
    }

    pub fn quiz(&self) -> &Arc<Quiz> {
        &self.quiz
    }

    pub fn total(&self) -> usize {
        self.quiz.len()
    }

    pub fn state(&self) -> QuizState {
        *self.state.borrow()
    }

    pub fn phase(&self) -> QuizPhase {
        self.state().phase(self.total())
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == QuizPhase::Complete
    }

    pub fn view(&self) -> QuizView {
        QuizView::build(&self.quiz, &self.state())
    }

    /// Receives every state change, including the delayed advance.
    pub fn subscribe(&self) -> watch::Receiver<QuizState> {
        self.state.subscribe()
    }

    /// Must be called from within a tokio runtime: an accepted answer spawns
    /// the timer that moves on to the next question.
    pub fn submit_answer(&mut self, option_index: usize) -> Submission {
        let total = self.total();
        let question_index = match self.phase() {
            QuizPhase::Answering(index) => index,
            QuizPhase::ShowingFeedback { .. } => return Submission::AnswerPending,
            QuizPhase::Complete => return Submission::Complete,
        };

        let Some(answer) = self.quiz.questions[question_index]
            .answers
            .get(option_index)
        else {
            return Submission::UnknownOption;
        };
        let correct = answer.is_correct;

        self.state.send_modify(|state| {
            state.selected_answer = Some(option_index);
            if correct {
                state.score += 1;
            }
        });
        debug!(
            "Question {} answered with option {} (correct: {})",
            question_index + 1,
            option_index,
            correct
        );

        self.schedule_advance(question_index, total);
        Submission::Accepted { correct }
    }

    pub fn reset(&mut self) {
        self.cancel_pending_advance();
        self.state.send_replace(QuizState::default());
        debug!("Quiz reset");
    }

    fn schedule_advance(&mut self, question_index: usize, total: usize) {
        self.cancel_pending_advance();

        let state = Arc::clone(&self.state);
        let delay = self.advance_delay;
        self.pending_advance = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.send_modify(|state| advance(state, question_index, total));
        }));
    }

    fn cancel_pending_advance(&mut self) {
        if let Some(handle) = self.pending_advance.take() {
            handle.abort();
        }
    }
}

impl Drop for QuizEngine {
    fn drop(&mut self) {
        self.cancel_pending_advance();
    }
}

fn advance(state: &mut QuizState, question_index: usize, total: usize) {
    // A reset may have raced the timer.
    if state.current_question != question_index || state.selected_answer.is_none() {
        return;
    }
    state.current_question = (question_index + 1).min(total);
    state.selected_answer = None;
}
