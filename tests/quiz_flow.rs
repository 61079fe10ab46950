use std::sync::Arc;
use std::time::Duration;

use photo_quiz_frame::quiz::{
    Highlight, Quiz, QuizEngine, QuizPhase, QuizState, QuizView, Submission,
    DEFAULT_ADVANCE_DELAY,
};

fn engine() -> QuizEngine {
    QuizEngine::new(Arc::new(Quiz::builtin()), DEFAULT_ADVANCE_DELAY)
}

async fn let_feedback_elapse() {
    tokio::time::sleep(DEFAULT_ADVANCE_DELAY + Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn perfect_run_reaches_complete_with_full_score() {
    let mut engine = engine();

    // "Photo editing tools"
    assert_eq!(engine.submit_answer(0), Submission::Accepted { correct: true });
    assert_eq!(engine.state().score, 1);
    let_feedback_elapse().await;
    assert_eq!(engine.state().current_question, 1);

    // "AI image generation"
    assert_eq!(engine.submit_answer(3), Submission::Accepted { correct: true });
    let_feedback_elapse().await;

    assert_eq!(engine.phase(), QuizPhase::Complete);
    let view = engine.view();
    assert_eq!(view.description(), "You scored 2/2");
}

#[tokio::test(start_paused = true)]
async fn either_correct_option_on_second_question_scores() {
    for option in [1, 3] {
        let mut engine = engine();
        engine.submit_answer(0);
        let_feedback_elapse().await;

        assert_eq!(
            engine.submit_answer(option),
            Submission::Accepted { correct: true }
        );
        assert_eq!(engine.state().score, 2);
    }
}

#[tokio::test(start_paused = true)]
async fn wrong_answer_shows_red_then_moves_on() {
    let mut engine = engine();

    // "NFT minting contracts"
    assert_eq!(engine.submit_answer(1), Submission::Accepted { correct: false });
    assert_eq!(engine.state().score, 0);

    match engine.view() {
        QuizView::Question {
            options, locked, ..
        } => {
            assert!(locked);
            assert_eq!(options[1].highlight, Some(Highlight::Incorrect));
        }
        other => panic!("expected question view, got {:?}", other),
    }

    let_feedback_elapse().await;
    assert_eq!(engine.phase(), QuizPhase::Answering(1));
    assert_eq!(engine.state().score, 0);
}

#[tokio::test(start_paused = true)]
async fn completed_quiz_ignores_answers_until_reset() {
    let mut engine = engine();
    for option in [2, 0] {
        engine.submit_answer(option);
        let_feedback_elapse().await;
    }
    assert!(engine.is_complete());
    let finished = engine.state();

    assert_eq!(engine.submit_answer(1), Submission::Complete);
    let_feedback_elapse().await;
    assert_eq!(engine.state(), finished);

    engine.reset();
    assert_eq!(engine.state(), QuizState::default());
    assert_eq!(engine.phase(), QuizPhase::Answering(0));
}

#[tokio::test(start_paused = true)]
async fn reset_from_feedback_returns_to_start() {
    let mut engine = engine();
    engine.submit_answer(0);
    let_feedback_elapse().await;
    engine.submit_answer(3);

    engine.reset();
    assert_eq!(engine.state(), QuizState::default());

    let_feedback_elapse().await;
    assert_eq!(engine.state(), QuizState::default());
}

#[tokio::test(start_paused = true)]
async fn score_counts_exactly_the_correct_answers() {
    let quiz = Quiz::builtin();
    for first in 0..4 {
        for second in 0..4 {
            let mut engine = engine();
            engine.submit_answer(first);
            let_feedback_elapse().await;
            engine.submit_answer(second);
            let_feedback_elapse().await;

            let expected = [
                quiz.questions[0].answers[first].is_correct,
                quiz.questions[1].answers[second].is_correct,
            ]
            .iter()
            .filter(|correct| **correct)
            .count();

            assert_eq!(engine.state().score, expected);
            assert!(engine.state().score <= engine.total());
        }
    }
}

#[tokio::test(start_paused = true)]
async fn dropping_the_engine_cancels_the_advance() {
    let mut engine = engine();
    let changes = engine.subscribe();
    engine.submit_answer(0);
    drop(engine);

    let_feedback_elapse().await;
    let state = *changes.borrow();
    assert_eq!(state.current_question, 0);
    assert_eq!(state.selected_answer, Some(0));
}

#[tokio::test(start_paused = true)]
async fn custom_delay_is_respected() {
    let mut engine = QuizEngine::new(Arc::new(Quiz::builtin()), Duration::from_millis(200));
    engine.submit_answer(0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(engine.state().current_question, 0);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(engine.state().current_question, 1);
}
