//! # View events
//!
//! Views publish [`ViewEvent`]s through an [`Emitter`]. Two kinds of
//! subscription exist on the [`EventBus`]:
//!
//! * listeners registered with [`EventBus::subscribe`] run synchronously at
//!   emit time, in subscription order;
//! * names registered with [`EventBus::route`] are queued FIFO for the owning
//!   controller, which handles one event to completion before the next one is
//!   taken (see [`crate::view::run_controller`]).
//!
//! Events nobody subscribed to are dropped.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::{
    domain::{SentenceId, TaskId},
    protocol::{CreateSentenceRequest, LoginRequest, SentenceFilter, SignupRequest, TaskDetails},
};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Answer,
    Next,
    UploadStarted,
    UploadFailed,
    SaveFile,
    FilterUpdate,
    AddSentence,
    RemoveSentence,
    Save,
    Delete,
    FormData,
    Click,
}

impl EventName {
    pub fn as_str(self) -> &'static str {
        match self {
            EventName::Answer => "answer",
            EventName::Next => "next",
            EventName::UploadStarted => "upload_started",
            EventName::UploadFailed => "upload_failed",
            EventName::SaveFile => "save_file",
            EventName::FilterUpdate => "filter_update",
            EventName::AddSentence => "add_sentence",
            EventName::RemoveSentence => "remove_sentence",
            EventName::Save => "save",
            EventName::Delete => "delete",
            EventName::FormData => "form_data",
            EventName::Click => "click",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sentence creation form; `with_audio` is set when a recording is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceForm {
    pub fields: CreateSentenceRequest,
    pub with_audio: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormData {
    Login(LoginRequest),
    Signup(SignupRequest),
    Sentence(SentenceForm),
    RandomTask {
        search: SentenceFilter,
        details: TaskDetails,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Answer { student_answer: String },
    Next,
    UploadStarted,
    UploadFailed,
    SaveFile { url: String },
    FilterUpdate(SentenceFilter),
    AddSentence(SentenceId),
    RemoveSentence(SentenceId),
    Save(TaskDetails),
    Delete(TaskId),
    FormData(FormData),
    Click,
}

impl ViewEvent {
    pub fn name(&self) -> EventName {
        match self {
            ViewEvent::Answer { .. } => EventName::Answer,
            ViewEvent::Next => EventName::Next,
            ViewEvent::UploadStarted => EventName::UploadStarted,
            ViewEvent::UploadFailed => EventName::UploadFailed,
            ViewEvent::SaveFile { .. } => EventName::SaveFile,
            ViewEvent::FilterUpdate(_) => EventName::FilterUpdate,
            ViewEvent::AddSentence(_) => EventName::AddSentence,
            ViewEvent::RemoveSentence(_) => EventName::RemoveSentence,
            ViewEvent::Save(_) => EventName::Save,
            ViewEvent::Delete(_) => EventName::Delete,
            ViewEvent::FormData(_) => EventName::FormData,
            ViewEvent::Click => EventName::Click,
        }
    }
}

pub type Listener = Arc<dyn Fn(&ViewEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

#[derive(Default)]
struct Registry {
    next_handle: u64,
    listeners: Vec<(SubscriptionHandle, EventName, Listener)>,
    routes: Vec<(SubscriptionHandle, EventName)>,
}

impl Registry {
    fn next_handle(&mut self) -> SubscriptionHandle {
        self.next_handle += 1;
        SubscriptionHandle(self.next_handle)
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Publishing side of the bus, handed to views.
#[derive(Clone)]
pub struct Emitter {
    registry: Arc<Mutex<Registry>>,
    tx: mpsc::UnboundedSender<ViewEvent>,
}

impl Emitter {
    /// Runs matching listeners, then queues the event if a controller routed its name.
    /// Returns whether anyone received the event.
    pub fn emit(&self, event: ViewEvent) -> bool {
        let name = event.name();
        let (listeners, routed) = {
            let registry = lock(&self.registry);
            let listeners: Vec<Listener> = registry
                .listeners
                .iter()
                .filter(|(_, subscribed, _)| *subscribed == name)
                .map(|(_, _, listener)| Arc::clone(listener))
                .collect();
            let routed = registry.routes.iter().any(|(_, routed)| *routed == name);
            (listeners, routed)
        };

        for listener in &listeners {
            listener(&event);
        }

        let queued = routed && self.tx.send(event).is_ok();
        if listeners.is_empty() && !queued {
            debug!(event = %name, "dropping view event without subscribers");
        }
        !listeners.is_empty() || queued
    }
}

pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
    rx: mpsc::UnboundedReceiver<ViewEvent>,
}

impl EventBus {
    /// Creates a bus and its first emitter. The queue closes once every
    /// emitter is dropped.
    pub fn channel() -> (Self, Emitter) {
        let registry = Arc::new(Mutex::new(Registry::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                registry: Arc::clone(&registry),
                rx,
            },
            Emitter { registry, tx },
        )
    }

    pub fn subscribe(
        &self,
        name: EventName,
        listener: impl Fn(&ViewEvent) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        let mut registry = lock(&self.registry);
        let handle = registry.next_handle();
        registry.listeners.push((handle, name, Arc::new(listener)));
        handle
    }

    /// Queues events named `name` for the controller reading this bus.
    pub fn route(&self, name: EventName) -> SubscriptionHandle {
        let mut registry = lock(&self.registry);
        let handle = registry.next_handle();
        registry.routes.push((handle, name));
        handle
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut registry = lock(&self.registry);
        let before = registry.listeners.len() + registry.routes.len();
        registry.listeners.retain(|(h, _, _)| *h != handle);
        registry.routes.retain(|(h, _)| *h != handle);
        before != registry.listeners.len() + registry.routes.len()
    }

    pub fn is_routed(&self, name: EventName) -> bool {
        lock(&self.registry)
            .routes
            .iter()
            .any(|(_, routed)| *routed == name)
    }

    /// Next routed event; `None` once all emitters are gone and the queue is empty.
    pub async fn next_event(&mut self) -> Option<ViewEvent> {
        loop {
            let event = self.rx.recv().await?;
            // The route may have been dropped after the event was queued.
            if self.is_routed(event.name()) {
                return Some(event);
            }
        }
    }

    pub fn try_next_event(&mut self) -> Option<ViewEvent> {
        while let Ok(event) = self.rx.try_recv() {
            if self.is_routed(event.name()) {
                return Some(event);
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "tests/events_tests.rs"]
mod tests;
