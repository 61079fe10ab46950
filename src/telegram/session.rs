use std::sync::Arc;

use log::{debug, warn};
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::host::TelegramHost;
use super::render::{card_keyboard, card_text, LOADING_TEXT};
use crate::config::FrameConfig;
use crate::frame::{FrameAdapter, InitOutcome};
use crate::quiz::{Quiz, QuizEngine, QuizState, QuizView};

/// One open frame in one chat: lifecycle adapter plus its quiz.
pub struct FrameSession {
    pub adapter: FrameAdapter<TelegramHost>,
    pub engine: QuizEngine,
    card: Option<MessageId>,
    redraw: Option<JoinHandle<()>>,
    add_status: Option<JoinHandle<()>>,
}

impl FrameSession {
    pub fn new(host: Arc<TelegramHost>, quiz: Arc<Quiz>, config: &FrameConfig) -> Self {
        Self {
            adapter: FrameAdapter::new(host),
            engine: QuizEngine::new(quiz, config.advance_delay),
            card: None,
            redraw: None,
            add_status: None,
        }
    }

    /// Initializes the adapter and, once the host has revealed the frame,
    /// posts the quiz card. A frame without host context only shows the
    /// loading text.
    pub async fn mount(&mut self, bot: &Bot) -> Result<InitOutcome, teloxide::RequestError> {
        let chat_id = self.adapter.host().chat_id();
        let outcome = self.adapter.initialize().await;

        match outcome {
            InitOutcome::Ready => {
                if !self.adapter.is_added() {
                    self.add_status = Some(tokio::spawn(show_add_status(
                        bot.clone(),
                        chat_id,
                        self.adapter.watch_add_status(),
                    )));
                }

                let view = self.engine.view();
                let card = bot
                    .send_message(chat_id, card_text(&view))
                    .parse_mode(ParseMode::Html)
                    .reply_markup(card_keyboard(&view))
                    .await?;
                self.card = Some(card.id);
                self.redraw = Some(tokio::spawn(follow_quiz(
                    bot.clone(),
                    chat_id,
                    card.id,
                    Arc::clone(self.engine.quiz()),
                    self.engine.subscribe(),
                )));
            }
            InitOutcome::ContextUnavailable => {
                bot.send_message(chat_id, LOADING_TEXT).await?;
            }
            InitOutcome::AlreadyInitialized => {
                debug!("Frame already mounted in chat {}", chat_id.0);
            }
        }
        Ok(outcome)
    }

    /// Whether `message` is the quiz card of this mount. Buttons on cards
    /// left over from an earlier mount must not drive this quiz.
    pub fn owns_card(&self, message: MessageId) -> bool {
        self.card == Some(message)
    }

    pub fn unmount(&mut self) {
        self.stop_tasks();
        self.card = None;
        self.engine.reset();
        self.adapter.teardown();
    }

    fn stop_tasks(&mut self) {
        for task in [self.redraw.take(), self.add_status.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

impl Drop for FrameSession {
    fn drop(&mut self) {
        self.stop_tasks();
    }
}

/// Redraws the card on every quiz state change, including the delayed
/// advance to the next question.
async fn follow_quiz(
    bot: Bot,
    chat_id: ChatId,
    card: MessageId,
    quiz: Arc<Quiz>,
    mut changes: watch::Receiver<QuizState>,
) {
    while changes.changed().await.is_ok() {
        let state = *changes.borrow_and_update();
        let view = QuizView::build(&quiz, &state);
        if let Err(err) = bot
            .edit_message_text(chat_id, card, card_text(&view))
            .parse_mode(ParseMode::Html)
            .reply_markup(card_keyboard(&view))
            .await
        {
            warn!("Failed to redraw quiz card in {}: {}", chat_id.0, err);
        }
    }
}

/// Posts the add status once a failed add request has set it.
async fn show_add_status(bot: Bot, chat_id: ChatId, status: watch::Receiver<String>) {
    let Some(text) = next_add_status(status).await else {
        return;
    };
    if let Err(err) = bot.send_message(chat_id, text).await {
        warn!("Failed to show add status in {}: {}", chat_id.0, err);
    }
}

/// Resolves to the first non-empty status, including one already set
/// before the call. `None` when the adapter goes away first.
async fn next_add_status(mut status: watch::Receiver<String>) -> Option<String> {
    loop {
        let current = status.borrow_and_update().clone();
        if !current.is_empty() {
            return Some(current);
        }
        status.changed().await.ok()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use teloxide::dispatching::dialogue::{InMemStorage, Storage};

    use crate::frame::FrameManifest;
    use crate::telegram::{Membership, MembershipDialogue};

    fn session() -> FrameSession {
        let storage = InMemStorage::<Membership>::new().erase();
        let host = TelegramHost::new(
            Bot::new("0:test"),
            MembershipDialogue::new(storage, ChatId(42)),
            host_manifest(),
        );
        let config = FrameConfig {
            db_path: "db.sqlite".to_string(),
            advance_delay: Duration::from_millis(1500),
            manifest: host_manifest(),
        };
        FrameSession::new(Arc::new(host), Arc::new(Quiz::builtin()), &config)
    }

    fn host_manifest() -> FrameManifest {
        FrameManifest {
            name: "PhotoQuizFrame".to_string(),
            description: "quiz".to_string(),
            home_url: "https://quiz.example.com".to_string(),
            icon_url: None,
        }
    }

    #[tokio::test]
    async fn only_the_current_card_is_owned() {
        let mut session = session();
        assert!(!session.owns_card(MessageId(7)));

        session.card = Some(MessageId(7));
        assert!(session.owns_card(MessageId(7)));
        assert!(!session.owns_card(MessageId(6)));

        session.unmount();
        assert!(!session.owns_card(MessageId(7)));
    }

    #[tokio::test]
    async fn status_set_before_watching_is_still_shown() {
        let (status, watcher) = watch::channel(String::new());
        status.send_replace("Not added: rejected by user: no".to_string());

        assert_eq!(
            next_add_status(watcher).await.as_deref(),
            Some("Not added: rejected by user: no")
        );
    }

    #[tokio::test]
    async fn status_waits_for_the_add_request() {
        let (status, watcher) = watch::channel(String::new());
        let shown = tokio::spawn(next_add_status(watcher));

        tokio::task::yield_now().await;
        status.send_replace("Error: the add prompt closed without an answer".to_string());

        assert_eq!(
            shown.await.unwrap().as_deref(),
            Some("Error: the add prompt closed without an answer")
        );
    }

    #[tokio::test]
    async fn closed_adapter_shows_nothing() {
        let (status, watcher) = watch::channel(String::new());
        drop(status);
        assert_eq!(next_add_status(watcher).await, None);
    }
}
