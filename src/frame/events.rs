use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::{HostEvent, HostEventKind};

pub type EventHandler = Box<dyn Fn(&HostEvent) + Send + Sync>;

type SharedHandler = Arc<dyn Fn(&HostEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_kind: HashMap<HostEventKind, Vec<(u64, SharedHandler)>>,
}

/// Fan-out of host events to registered handlers.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<RwLock<Listeners>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: HostEventKind, handler: EventHandler) -> Subscription {
        let id = {
            let mut listeners = self.listeners.write();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners
                .by_kind
                .entry(kind)
                .or_default()
                .push((id, Arc::from(handler)));
            id
        };

        let listeners: Weak<RwLock<Listeners>> = Arc::downgrade(&self.listeners);
        Subscription::new(kind, move || {
            if let Some(listeners) = listeners.upgrade() {
                if let Some(handlers) = listeners.write().by_kind.get_mut(&kind) {
                    handlers.retain(|(handler_id, _)| *handler_id != id);
                }
            }
        })
    }

    /// Returns how many handlers saw the event.
    pub fn emit(&self, event: &HostEvent) -> usize {
        // Handlers run outside the lock so they may subscribe or unsubscribe.
        let handlers: Vec<SharedHandler> = self
            .listeners
            .read()
            .by_kind
            .get(&event.kind())
            .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn listener_count(&self, kind: HostEventKind) -> usize {
        self.listeners
            .read()
            .by_kind
            .get(&kind)
            .map_or(0, |handlers| handlers.len())
    }
}

/// A registered handler. Released by [`Subscription::unsubscribe`] or on drop.
pub struct Subscription {
    kind: HostEventKind,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(kind: HostEventKind, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            kind,
            release: Some(Box::new(release)),
        }
    }

    pub fn kind(&self) -> HostEventKind {
        self.kind
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("active", &self.release.is_some())
            .finish()
    }
}
