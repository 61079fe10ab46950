//! Lifecycle plumbing between the frame and the client that embeds it.
//!
//! The host is reached only through [`FrameHost`], so the adapter runs the
//! same against the Telegram host and against an in-memory fake in tests.

pub mod adapter;
pub mod events;
pub mod manifest;

pub use adapter::{handle_add_result, FrameAdapter, InitOutcome};
pub use events::{EventEmitter, EventHandler, Subscription};
pub use manifest::{FrameManifest, ManifestError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeAreaInsets {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDetails {
    pub url: String,
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContext {
    /// Whether the user already has the frame in their collection.
    pub added: bool,
    pub safe_area_insets: Option<SafeAreaInsets>,
    pub notification_details: Option<NotificationDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostContext {
    pub client: ClientContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HostEventKind {
    FrameAdded,
    FrameAddRejected,
    FrameRemoved,
    NotificationsEnabled,
    NotificationsDisabled,
    PrimaryButtonClicked,
}

impl HostEventKind {
    pub const ALL: [HostEventKind; 6] = [
        HostEventKind::FrameAdded,
        HostEventKind::FrameAddRejected,
        HostEventKind::FrameRemoved,
        HostEventKind::NotificationsEnabled,
        HostEventKind::NotificationsDisabled,
        HostEventKind::PrimaryButtonClicked,
    ];

    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            HostEventKind::FrameAdded => "frameAdded",
            HostEventKind::FrameAddRejected => "frameAddRejected",
            HostEventKind::FrameRemoved => "frameRemoved",
            HostEventKind::NotificationsEnabled => "notificationsEnabled",
            HostEventKind::NotificationsDisabled => "notificationsDisabled",
            HostEventKind::PrimaryButtonClicked => "primaryButtonClicked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddRejectReason {
    InvalidDomainManifest,
    RejectedByUser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    FrameAdded {
        notification_details: Option<NotificationDetails>,
    },
    FrameAddRejected {
        reason: AddRejectReason,
    },
    FrameRemoved,
    NotificationsEnabled {
        notification_details: NotificationDetails,
    },
    NotificationsDisabled,
    PrimaryButtonClicked,
}

impl HostEvent {
    pub fn kind(&self) -> HostEventKind {
        match self {
            HostEvent::FrameAdded { .. } => HostEventKind::FrameAdded,
            HostEvent::FrameAddRejected { .. } => HostEventKind::FrameAddRejected,
            HostEvent::FrameRemoved => HostEventKind::FrameRemoved,
            HostEvent::NotificationsEnabled { .. } => HostEventKind::NotificationsEnabled,
            HostEvent::NotificationsDisabled => HostEventKind::NotificationsDisabled,
            HostEvent::PrimaryButtonClicked => HostEventKind::PrimaryButtonClicked,
        }
    }
}

/// Ways an add request can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddFrameError {
    #[error("rejected by user: {0}")]
    RejectedByUser(String),
    #[error("invalid domain manifest: {0}")]
    InvalidDomainManifest(String),
    #[error("{0}")]
    Other(String),
}

/// Capabilities the embedding client offers to a frame.
#[async_trait]
pub trait FrameHost: Send + Sync {
    /// `None` when the frame is not running inside a host.
    async fn context(&self) -> Option<HostContext>;

    async fn add_frame(&self) -> Result<(), AddFrameError>;

    /// Tells the host the frame finished loading and may be shown.
    async fn ready(&self);

    fn subscribe(&self, kind: HostEventKind, handler: EventHandler) -> Subscription;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_names_match_serde() {
        for kind in HostEventKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
        }
    }

    #[test]
    fn add_errors_render_distinctly() {
        let rejected = AddFrameError::RejectedByUser("closed the prompt".to_string());
        let manifest = AddFrameError::InvalidDomainManifest("closed the prompt".to_string());
        assert_ne!(rejected.to_string(), manifest.to_string());
    }
}
