use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::html;
use tokio::sync::oneshot;

use super::render::{add_prompt_keyboard, primary_button_keyboard};
use super::{Membership, MembershipDialogue, StorageError};
use crate::frame::{
    AddFrameError, AddRejectReason, ClientContext, EventEmitter, EventHandler, FrameHost,
    FrameManifest, HostContext, HostEvent, HostEventKind, NotificationDetails, Subscription,
};

/// A Telegram chat acting as the client that embeds the frame.
///
/// Whether the frame is in the user's collection lives in the dialogue
/// storage, so it survives restarts even though quiz progress does not.
pub struct TelegramHost {
    bot: Bot,
    chat_id: ChatId,
    dialogue: MembershipDialogue,
    manifest: FrameManifest,
    events: EventEmitter,
    pending_add: Mutex<Option<oneshot::Sender<bool>>>,
}

impl TelegramHost {
    pub fn new(bot: Bot, dialogue: MembershipDialogue, manifest: FrameManifest) -> Self {
        Self {
            bot,
            chat_id: dialogue.chat_id(),
            dialogue,
            manifest,
            events: EventEmitter::new(),
            pending_add: Mutex::new(None),
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Delivers the user's choice on the add prompt. Returns false when no
    /// prompt was waiting.
    pub fn answer_add_prompt(&self, accepted: bool) -> bool {
        match self.pending_add.lock().take() {
            Some(answer) => answer.send(accepted).is_ok(),
            None => false,
        }
    }

    pub async fn remove_frame(&self) -> Result<(), StorageError> {
        self.dialogue.update(Membership::NotAdded).await?;
        self.events.emit(&HostEvent::FrameRemoved);
        Ok(())
    }

    /// Returns false when the frame is not added, since only added frames
    /// may receive notifications.
    pub async fn set_notifications(&self, enabled: bool) -> Result<bool, StorageError> {
        if !self.membership().await.is_added() {
            return Ok(false);
        }
        self.dialogue
            .update(Membership::Added {
                notifications: enabled,
            })
            .await?;

        let event = if enabled {
            HostEvent::NotificationsEnabled {
                notification_details: self.notification_details(),
            }
        } else {
            HostEvent::NotificationsDisabled
        };
        self.events.emit(&event);
        Ok(true)
    }

    pub fn primary_button_clicked(&self) {
        self.events.emit(&HostEvent::PrimaryButtonClicked);
    }

    async fn membership(&self) -> Membership {
        match self.dialogue.get().await {
            Ok(membership) => membership.unwrap_or_default(),
            Err(err) => {
                warn!("Failed to read membership for {}: {}", self.chat_id.0, err);
                Membership::default()
            }
        }
    }

    fn notification_details(&self) -> NotificationDetails {
        NotificationDetails {
            url: self.manifest.home_url.clone(),
            token: self.chat_id.0.to_string(),
        }
    }

    fn reject(&self, reason: AddRejectReason) {
        self.events.emit(&HostEvent::FrameAddRejected { reason });
    }
}

#[async_trait]
impl FrameHost for TelegramHost {
    async fn context(&self) -> Option<HostContext> {
        let membership = match self.dialogue.get().await {
            Ok(membership) => membership.unwrap_or_default(),
            Err(err) => {
                warn!("No host context for {}: {}", self.chat_id.0, err);
                return None;
            }
        };

        let notification_details = membership
            .notifications_enabled()
            .then(|| self.notification_details());
        Some(HostContext {
            client: ClientContext {
                added: membership.is_added(),
                safe_area_insets: None,
                notification_details,
            },
        })
    }

    async fn add_frame(&self) -> Result<(), AddFrameError> {
        if let Err(err) = self.manifest.validate() {
            self.reject(AddRejectReason::InvalidDomainManifest);
            return Err(AddFrameError::InvalidDomainManifest(err.to_string()));
        }

        let (answer_tx, answer_rx) = oneshot::channel();
        *self.pending_add.lock() = Some(answer_tx);

        let prompt = self
            .bot
            .send_message(
                self.chat_id,
                format!("Add <b>{}</b> to your frames?", html::escape(&self.manifest.name)),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(add_prompt_keyboard())
            .await
            .map_err(|err| AddFrameError::Other(err.to_string()))?;

        let answer = answer_rx.await;
        if let Err(err) = self
            .bot
            .edit_message_reply_markup(self.chat_id, prompt.id)
            .await
        {
            debug!("Add prompt in {} kept its buttons: {}", self.chat_id.0, err);
        }

        match answer {
            Ok(true) => {
                self.dialogue
                    .update(Membership::Added {
                        notifications: true,
                    })
                    .await
                    .map_err(|err| AddFrameError::Other(err.to_string()))?;
                self.events.emit(&HostEvent::FrameAdded {
                    notification_details: Some(self.notification_details()),
                });
                Ok(())
            }
            Ok(false) => {
                self.reject(AddRejectReason::RejectedByUser);
                Err(AddFrameError::RejectedByUser(
                    "the add prompt was dismissed".to_string(),
                ))
            }
            Err(_) => Err(AddFrameError::Other(
                "the add prompt closed without an answer".to_string(),
            )),
        }
    }

    async fn ready(&self) {
        info!("Frame ready in chat {}", self.chat_id.0);
        let title = format!("<b>{}</b>", html::escape(&self.manifest.name));
        if let Err(err) = self
            .bot
            .send_message(self.chat_id, title)
            .parse_mode(ParseMode::Html)
            .reply_markup(primary_button_keyboard())
            .await
        {
            warn!("Failed to reveal frame in {}: {}", self.chat_id.0, err);
        }
    }

    fn subscribe(&self, kind: HostEventKind, handler: EventHandler) -> Subscription {
        debug!("{} subscribed in chat {}", kind.name(), self.chat_id.0);
        self.events.subscribe(kind, handler)
    }
}
