//! Capabilities the controllers are wired to: views, alerts, navigation and
//! page-local storage.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::Duration,
};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use shared::domain::{Sentence, TaskId};

use crate::{
    api::TrainerApi,
    error::{ClientError, Result},
    events::{EventBus, ViewEvent},
    session::Tally,
};

/// Delay between a success alert and the navigation that follows it.
pub const REDIRECT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::Success => "success",
            AlertKind::Error => "error",
        }
    }
}

/// Transient, dismissable user-visible messages.
pub trait Alerts: Send + Sync {
    fn show(&self, kind: AlertKind, message: &str);
}

pub trait Navigator: Send + Sync {
    fn assign_after(&self, path: &str, delay: Duration);
}

/// Key-based access to data the server-rendered page left for the client.
pub trait LocalStore: Send + Sync {
    fn get_local(&self, key: &str) -> Option<serde_json::Value>;
}

pub fn get_local_as<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Result<T> {
    let value = store
        .get_local(key)
        .ok_or_else(|| ClientError::MissingLocal(key.to_string()))?;
    serde_json::from_value(value).map_err(|err| ClientError::Decode(format!("{key}: {err}")))
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_local(&self, key: impl Into<String>, value: serde_json::Value) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.into(), value);
    }
}

impl LocalStore for MemoryStore {
    fn get_local(&self, key: &str) -> Option<serde_json::Value> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

/// Counters shown next to the exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionCounts {
    pub correct: u32,
    pub incorrect: u32,
    pub remaining: usize,
}

pub trait TrainingView: Send {
    fn set_prompt(&mut self, prompt: &str);
    fn set_answer(&mut self, answer: &str);
    fn set_audio_url(&mut self, url: Option<&str>);
    fn show_result(&mut self, is_correct: bool, expected: &str);
    fn update_counts(&mut self, counts: SessionCounts);
    fn finish(&mut self, tally: &Tally);
}

pub trait AuthoringView: Send {
    fn update_display(&mut self, available: &[Sentence], selected: &[Sentence]);
    fn delete_row(&mut self, task_id: TaskId);
}

pub trait FormView: Send {
    fn clear_form_data(&mut self);
}

/// Shared collaborators every controller reaches for.
#[derive(Clone)]
pub struct Capabilities {
    pub api: Arc<dyn TrainerApi>,
    pub alerts: Arc<dyn Alerts>,
    pub navigator: Arc<dyn Navigator>,
}

impl Capabilities {
    pub fn report(&self, err: &ClientError) {
        tracing::warn!(error = %err, "controller action failed");
        self.alerts.show(AlertKind::Error, &err.to_string());
    }
}

#[async_trait]
pub trait Controller: Send {
    fn name(&self) -> &'static str;

    async fn handle(&mut self, event: ViewEvent);

    fn is_finished(&self) -> bool {
        false
    }
}

/// Feeds routed events to `controller` one at a time until it finishes or
/// the bus closes.
pub async fn run_controller<C>(controller: &mut C, bus: &mut EventBus)
where
    C: Controller + ?Sized,
{
    while !controller.is_finished() {
        let Some(event) = bus.next_event().await else {
            tracing::debug!(controller = controller.name(), "event bus closed");
            break;
        };
        tracing::debug!(controller = controller.name(), event = %event.name(), "dispatching");
        controller.handle(event).await;
    }
}

/// Handles every event already queued on `bus`; returns how many ran.
pub async fn dispatch_pending<C>(controller: &mut C, bus: &mut EventBus) -> usize
where
    C: Controller + ?Sized,
{
    let mut handled = 0;
    while let Some(event) = bus.try_next_event() {
        controller.handle(event).await;
        handled += 1;
    }
    handled
}
