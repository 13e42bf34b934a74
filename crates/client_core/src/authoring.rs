//! Task authoring: pick sentences from a filtered list and save them as a task.

use async_trait::async_trait;
use shared::{
    domain::{Sentence, SentenceId, TaskId},
    protocol::{CreateTaskRequest, SentenceFilter, TaskDetails},
};
use tracing::{debug, info};

use crate::{
    error::ClientError,
    events::{EventBus, EventName, FormData, ViewEvent},
    view::{AlertKind, AuthoringView, Capabilities, Controller},
};

pub const TASK_SAVED: &str = "Task saved";
pub const TASK_DELETED: &str = "Task deleted";
pub const TASK_CREATED: &str = "Task created";

pub struct TaskAuthoringController {
    view: Box<dyn AuthoringView>,
    caps: Capabilities,
    available: Vec<Sentence>,
    selected: Vec<Sentence>,
}

impl TaskAuthoringController {
    pub fn new(view: Box<dyn AuthoringView>, caps: Capabilities, bus: &EventBus) -> Self {
        for name in [
            EventName::FilterUpdate,
            EventName::AddSentence,
            EventName::RemoveSentence,
            EventName::Save,
            EventName::Delete,
        ] {
            bus.route(name);
        }

        Self {
            view,
            caps,
            available: Vec::new(),
            selected: Vec::new(),
        }
    }

    pub fn available(&self) -> &[Sentence] {
        &self.available
    }

    pub fn selected(&self) -> &[Sentence] {
        &self.selected
    }

    fn is_selected(&self, id: SentenceId) -> bool {
        self.selected.iter().any(|sentence| sentence.id == id)
    }

    fn refresh(&mut self) {
        self.view.update_display(&self.available, &self.selected);
    }

    pub async fn filter_update(&mut self, filter: &SentenceFilter) {
        match self.caps.api.search_sentences(filter).await {
            Ok(found) => {
                debug!(found = found.len(), "sentence search returned");
                let available = found
                    .into_iter()
                    .filter(|sentence| !self.is_selected(sentence.id))
                    .collect();
                self.available = available;
                self.refresh();
            }
            Err(err) => self.caps.report(&err),
        }
    }

    /// Moves `id` from the available list to the end of the selection.
    pub fn add_sentence(&mut self, id: SentenceId) {
        let Some(position) = self.available.iter().position(|s| s.id == id) else {
            return;
        };
        let sentence = self.available.remove(position);
        self.selected.push(sentence);
        self.refresh();
    }

    pub fn remove_sentence(&mut self, id: SentenceId) {
        let Some(position) = self.selected.iter().position(|s| s.id == id) else {
            return;
        };
        let sentence = self.selected.remove(position);
        self.available.push(sentence);
        self.refresh();
    }

    pub async fn save(&mut self, details: TaskDetails) {
        let request = CreateTaskRequest {
            details,
            sentences: self.selected.iter().map(|sentence| sentence.id).collect(),
        };

        match self.caps.api.create_task(&request).await {
            Ok(created) => {
                info!(task = %created.id, sentences = request.sentences.len(), "task saved");
                self.caps.alerts.show(AlertKind::Success, TASK_SAVED);
                let cleared = std::mem::take(&mut self.selected);
                self.available.extend(cleared);
                self.refresh();
            }
            Err(err) => self.caps.report(&err),
        }
    }

    pub async fn delete(&mut self, task_id: TaskId) {
        match self.caps.api.delete_task(task_id).await {
            Ok(()) => {
                info!(task = %task_id, "task deleted");
                self.view.delete_row(task_id);
                self.caps.alerts.show(AlertKind::Success, TASK_DELETED);
            }
            Err(err) => self.caps.report(&err),
        }
    }
}

#[async_trait]
impl Controller for TaskAuthoringController {
    fn name(&self) -> &'static str {
        "task_authoring"
    }

    async fn handle(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::FilterUpdate(filter) => self.filter_update(&filter).await,
            ViewEvent::AddSentence(id) => self.add_sentence(id),
            ViewEvent::RemoveSentence(id) => self.remove_sentence(id),
            ViewEvent::Save(details) => self.save(details).await,
            ViewEvent::Delete(task_id) => self.delete(task_id).await,
            other => debug!(event = %other.name(), "authoring controller ignores event"),
        }
    }
}

/// Builds a task out of whatever a sentence search returns.
pub struct RandomTaskController {
    caps: Capabilities,
}

impl RandomTaskController {
    pub fn new(caps: Capabilities, bus: &EventBus) -> Self {
        bus.route(EventName::FormData);
        Self { caps }
    }

    pub async fn create(&self, search: &SentenceFilter, details: TaskDetails) {
        let sentences = match self.caps.api.search_sentences(search).await {
            Ok(found) if found.is_empty() => {
                self.caps.report(&ClientError::Invalid(
                    "No sentences match the search".to_string(),
                ));
                return;
            }
            Ok(found) => found,
            Err(err) => {
                self.caps.report(&err);
                return;
            }
        };

        let request = CreateTaskRequest {
            details,
            sentences: sentences.iter().map(|sentence| sentence.id).collect(),
        };
        match self.caps.api.create_task(&request).await {
            Ok(created) => {
                info!(task = %created.id, sentences = request.sentences.len(), "random task created");
                self.caps.alerts.show(AlertKind::Success, TASK_CREATED);
            }
            Err(err) => self.caps.report(&err),
        }
    }
}

#[async_trait]
impl Controller for RandomTaskController {
    fn name(&self) -> &'static str {
        "random_task"
    }

    async fn handle(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::FormData(FormData::RandomTask { search, details }) => {
                self.create(&search, details).await;
            }
            other => debug!(event = %other.name(), "random task controller ignores event"),
        }
    }
}

#[cfg(test)]
#[path = "tests/authoring_tests.rs"]
mod tests;
