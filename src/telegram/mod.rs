//! Runs the frame inside Telegram chats.
//!
//! `/start` mounts the frame, the inline buttons drive the quiz and the add
//! prompt, and the remaining commands stand in for what a client app would do
//! from its own UI: remove the frame, toggle notifications, close it.

pub mod host;
pub mod render;
pub mod session;

pub use host::TelegramHost;
pub use session::FrameSession;

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use teloxide::{
    dispatching::{
        dialogue::{ErasedStorage, Storage},
        UpdateHandler,
    },
    prelude::*,
    utils::command::BotCommands,
};
use tokio::sync::Mutex;

use crate::config::FrameConfig;
use crate::quiz::{Quiz, Submission};
use render::CallbackAction;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
pub type StorageError = <ErasedStorage<Membership> as Storage<Membership>>::Error;
pub type MembershipStorage = Arc<ErasedStorage<Membership>>;
pub type MembershipDialogue = Dialogue<Membership, ErasedStorage<Membership>>;
pub type SharedSession = Arc<Mutex<FrameSession>>;
pub type Sessions = Arc<Mutex<HashMap<ChatId, SharedSession>>>;

/// Whether the chat has the frame in its collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Membership {
    #[default]
    NotAdded,
    Added {
        notifications: bool,
    },
}

impl Membership {
    pub fn is_added(&self) -> bool {
        matches!(self, Membership::Added { .. })
    }

    pub fn notifications_enabled(&self) -> bool {
        matches!(
            self,
            Membership::Added {
                notifications: true
            }
        )
    }
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "open the quiz frame.")]
    Start,
    #[command(description = "remove the frame from your collection.")]
    Remove,
    #[command(description = "turn notifications on or off.")]
    Notify(String),
    #[command(description = "close the frame.")]
    Close,
    #[command(description = "display this text.")]
    Help,
}

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler))
}

fn new_host(
    bot: &Bot,
    chat_id: ChatId,
    storage: &MembershipStorage,
    config: &FrameConfig,
) -> Arc<TelegramHost> {
    Arc::new(TelegramHost::new(
        bot.clone(),
        MembershipDialogue::new(storage.clone(), chat_id),
        config.manifest.clone(),
    ))
}

/// Looks up or opens the chat's session. The map lock is released before
/// the caller touches the session.
async fn open_session(
    sessions: &Sessions,
    chat_id: ChatId,
    open: impl FnOnce() -> FrameSession,
) -> SharedSession {
    let mut sessions = sessions.lock().await;
    let session = sessions.entry(chat_id).or_insert_with(|| {
        info!("Mounting frame in chat {}", chat_id.0);
        Arc::new(Mutex::new(open()))
    });
    Arc::clone(session)
}

async fn find_session(sessions: &Sessions, chat_id: ChatId) -> Option<SharedSession> {
    sessions.lock().await.get(&chat_id).cloned()
}

/// The open session's host, or a detached one for a chat without a frame.
async fn chat_host(
    bot: &Bot,
    chat_id: ChatId,
    storage: &MembershipStorage,
    sessions: &Sessions,
    config: &FrameConfig,
) -> Arc<TelegramHost> {
    match find_session(sessions, chat_id).await {
        Some(session) => Arc::clone(session.lock().await.adapter.host()),
        None => new_host(bot, chat_id, storage, config),
    }
}

async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    storage: MembershipStorage,
    sessions: Sessions,
    config: Arc<FrameConfig>,
    quiz: Arc<Quiz>,
) -> HandlerResult {
    let chat_id = msg.chat.id;

    match cmd {
        Command::Start => {
            let session = open_session(&sessions, chat_id, || {
                FrameSession::new(
                    new_host(&bot, chat_id, &storage, &config),
                    Arc::clone(&quiz),
                    &config,
                )
            })
            .await;
            let outcome = session.lock().await.mount(&bot).await?;
            debug!("Mount in chat {} finished: {:?}", chat_id.0, outcome);
        }
        Command::Remove => {
            let host = chat_host(&bot, chat_id, &storage, &sessions, &config).await;
            host.remove_frame().await?;
            bot.send_message(chat_id, "Frame removed from your collection.")
                .await?;
        }
        Command::Notify(setting) => {
            let enabled = match setting.trim() {
                "on" => true,
                "off" => false,
                _ => {
                    bot.send_message(chat_id, "Usage: /notify on|off").await?;
                    return Ok(());
                }
            };
            let host = chat_host(&bot, chat_id, &storage, &sessions, &config).await;
            let reply = if host.set_notifications(enabled).await? {
                if enabled {
                    "Notifications enabled."
                } else {
                    "Notifications disabled."
                }
            } else {
                "Add the frame first to manage notifications."
            };
            bot.send_message(chat_id, reply).await?;
        }
        Command::Close => {
            let closed = sessions.lock().await.remove(&chat_id);
            if let Some(session) = closed {
                session.lock().await.unmount();
                info!("Frame closed in chat {}", chat_id.0);
            }
            bot.send_message(chat_id, "Frame closed. Send /start to open it again.")
                .await?;
        }
        Command::Help => {
            bot.send_message(chat_id, Command::descriptions().to_string())
                .await?;
        }
    }
    Ok(())
}

async fn callback_handler(bot: Bot, q: CallbackQuery, sessions: Sessions) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let (Some(data), Some(message)) = (q.data.as_deref(), q.message.as_ref()) else {
        return Ok(());
    };
    let chat_id = message.chat.id;

    let action = match data.parse::<CallbackAction>() {
        Ok(action) => action,
        Err(err) => {
            debug!("Ignoring callback in chat {}: {}", chat_id.0, err);
            return Ok(());
        }
    };

    let Some(session) = find_session(&sessions, chat_id).await else {
        bot.send_message(chat_id, "This frame is closed. Send /start to open it.")
            .await?;
        return Ok(());
    };
    let mut session = session.lock().await;

    if action.targets_card() && !session.owns_card(message.id) {
        debug!(
            "Ignoring {:?} from stale card {} in chat {}",
            action, message.id.0, chat_id.0
        );
        return Ok(());
    }

    match action {
        CallbackAction::Answer(index) => match session.engine.submit_answer(index) {
            Submission::Accepted { correct } => {
                debug!("Chat {} answered (correct: {})", chat_id.0, correct)
            }
            ignored => debug!("Answer in chat {} ignored: {:?}", chat_id.0, ignored),
        },
        CallbackAction::Reset => session.engine.reset(),
        CallbackAction::AddPrompt { accepted } => {
            if !session.adapter.host().answer_add_prompt(accepted) {
                debug!("No add prompt waiting in chat {}", chat_id.0);
            }
        }
        CallbackAction::PrimaryButton => session.adapter.host().primary_button_clicked(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use teloxide::dispatching::dialogue::InMemStorage;

    fn opener(chat_id: ChatId) -> impl FnOnce() -> FrameSession {
        move || {
            let bot = Bot::new("0:test");
            let storage: MembershipStorage = InMemStorage::<Membership>::new().erase();
            let config = FrameConfig::from_lookup(|_| None).unwrap();
            FrameSession::new(
                new_host(&bot, chat_id, &storage, &config),
                Arc::new(Quiz::builtin()),
                &config,
            )
        }
    }

    #[tokio::test]
    async fn busy_chat_does_not_block_other_chats() {
        let sessions: Sessions = Arc::new(Mutex::new(HashMap::new()));
        let busy = open_session(&sessions, ChatId(1), opener(ChatId(1))).await;
        let _mounting = busy.lock().await;

        let other = tokio::time::timeout(
            Duration::from_secs(1),
            open_session(&sessions, ChatId(2), opener(ChatId(2))),
        )
        .await;
        assert!(other.is_ok());
        assert!(tokio::time::timeout(
            Duration::from_secs(1),
            find_session(&sessions, ChatId(1))
        )
        .await
        .unwrap()
        .is_some());
    }

    #[tokio::test]
    async fn reopening_a_chat_reuses_its_session() {
        let sessions: Sessions = Arc::new(Mutex::new(HashMap::new()));
        let first = open_session(&sessions, ChatId(5), opener(ChatId(5))).await;
        let second = open_session(&sessions, ChatId(5), || unreachable!()).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert!(find_session(&sessions, ChatId(6)).await.is_none());
    }

    #[test]
    fn membership_flags() {
        assert!(!Membership::default().is_added());
        assert!(Membership::Added {
            notifications: false
        }
        .is_added());
        assert!(!Membership::Added {
            notifications: false
        }
        .notifications_enabled());
        assert!(Membership::Added {
            notifications: true
        }
        .notifications_enabled());
    }

    #[test]
    fn membership_survives_json_storage() {
        let stored = serde_json::to_string(&Membership::Added {
            notifications: true,
        })
        .unwrap();
        let restored: Membership = serde_json::from_str(&stored).unwrap();
        assert!(restored.notifications_enabled());
    }
}
