use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{AddFrameError, FrameHost, HostContext, HostEvent, HostEventKind, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Ready,
    /// Not running inside a host. The frame stays on its loading screen.
    ContextUnavailable,
    AlreadyInitialized,
}

/// One mount of the frame inside a host.
pub struct FrameAdapter<H: FrameHost + 'static> {
    host: Arc<H>,
    initialized: bool,
    ready: bool,
    context: Option<HostContext>,
    added: Arc<AtomicBool>,
    add_frame_status: Arc<watch::Sender<String>>,
    pending_add: Option<JoinHandle<()>>,
    subscriptions: Vec<Subscription>,
}

impl<H: FrameHost + 'static> FrameAdapter<H> {
    pub fn new(host: Arc<H>) -> Self {
        let (add_frame_status, _) = watch::channel(String::new());
        Self {
            host,
            initialized: false,
            ready: false,
            context: None,
            added: Arc::new(AtomicBool::new(false)),
            add_frame_status: Arc::new(add_frame_status),
            pending_add: None,
            subscriptions: Vec::new(),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Runs at most once per mount.
    pub async fn initialize(&mut self) -> InitOutcome {
        if self.initialized {
            return InitOutcome::AlreadyInitialized;
        }
        self.initialized = true;
        debug!("Calling load");

        let Some(context) = self.host.context().await else {
            warn!("Host context unavailable, staying on the loading screen");
            return InitOutcome::ContextUnavailable;
        };

        let added = context.client.added;
        self.added.store(added, Ordering::SeqCst);
        self.context = Some(context);

        // Handlers first: the add request may emit events before it returns.
        self.register_handlers();
        if !added {
            self.request_add();
        }
        self.signal_ready().await;
        InitOutcome::Ready
    }

    /// Waits for an outstanding add request, if any.
    pub async fn add_request_finished(&mut self) {
        if let Some(pending) = self.pending_add.take() {
            if let Err(err) = pending.await {
                if !err.is_cancelled() {
                    warn!("Add request task failed: {}", err);
                }
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.ready
    }

    pub fn is_added(&self) -> bool {
        self.added.load(Ordering::SeqCst)
    }

    pub fn context(&self) -> Option<&HostContext> {
        self.context.as_ref()
    }

    pub fn add_frame_status(&self) -> String {
        self.add_frame_status.borrow().clone()
    }

    /// Follows the add status. It changes at most once per mount, when a
    /// failed add request finishes.
    pub fn watch_add_status(&self) -> watch::Receiver<String> {
        self.add_frame_status.subscribe()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Releases every host subscription and abandons an unanswered add request.
    pub fn teardown(&mut self) {
        if let Some(pending) = self.pending_add.take() {
            pending.abort();
        }
        for subscription in self.subscriptions.drain(..) {
            debug!("Releasing {} handler", subscription.kind().name());
            subscription.unsubscribe();
        }
    }

    fn request_add(&mut self) {
        let host = Arc::clone(&self.host);
        let status = Arc::clone(&self.add_frame_status);
        self.pending_add = Some(tokio::spawn(async move {
            if let Some(message) = handle_add_result(host.add_frame().await) {
                info!("{}", message);
                status.send_replace(message);
            }
        }));
    }

    fn register_handlers(&mut self) {
        for kind in HostEventKind::ALL {
            let added = Arc::clone(&self.added);
            let subscription = self.host.subscribe(
                kind,
                Box::new(move |event: &HostEvent| on_host_event(&added, event)),
            );
            self.subscriptions.push(subscription);
        }
    }

    async fn signal_ready(&mut self) {
        if self.ready {
            return;
        }
        info!("Calling ready");
        self.host.ready().await;
        self.ready = true;
    }
}

impl<H: FrameHost + 'static> Drop for FrameAdapter<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Turns the outcome of an add request into the status line shown to the
/// user. Success leaves the status untouched.
pub fn handle_add_result(result: Result<(), AddFrameError>) -> Option<String> {
    match result {
        Ok(()) => None,
        Err(err @ AddFrameError::RejectedByUser(_))
        | Err(err @ AddFrameError::InvalidDomainManifest(_)) => {
            Some(format!("Not added: {}", err))
        }
        Err(AddFrameError::Other(err)) => Some(format!("Error: {}", err)),
    }
}

fn on_host_event(added: &AtomicBool, event: &HostEvent) {
    match event {
        HostEvent::FrameAdded {
            notification_details,
        } => {
            info!("frameAdded {:?}", notification_details);
            added.store(true, Ordering::SeqCst);
        }
        HostEvent::FrameAddRejected { reason } => info!("frameAddRejected {:?}", reason),
        HostEvent::FrameRemoved => {
            info!("frameRemoved");
            added.store(false, Ordering::SeqCst);
        }
        HostEvent::NotificationsEnabled {
            notification_details,
        } => info!("notificationsEnabled {:?}", notification_details),
        HostEvent::NotificationsDisabled => info!("notificationsDisabled"),
        HostEvent::PrimaryButtonClicked => info!("primaryButtonClicked"),
    }
}
