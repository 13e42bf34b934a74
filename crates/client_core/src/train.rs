//! Training session: missed items come back, results are sent once at the end.

use async_trait::async_trait;
use shared::{
    domain::{ExerciseKind, Sentence, StudentTaskId},
    protocol::{FinishedEntry, StudentResultsRequest},
};
use tracing::{debug, info};

use crate::{
    error::Result,
    events::{EventBus, EventName, ViewEvent},
    session::{AnswerOutcome, MissPolicy, SessionQueue, Tally},
    view::{
        get_local_as, AlertKind, Capabilities, Controller, LocalStore, SessionCounts,
        TrainingView, REDIRECT_DELAY,
    },
};

/// Local storage key the train page writes its sentences under.
pub const SENTENCES_KEY: &str = "sentences";
pub const TASKS_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Running,
    Submitted,
}

pub struct TrainController {
    view: Box<dyn TrainingView>,
    caps: Capabilities,
    queue: SessionQueue,
    kind: ExerciseKind,
    student_task: Option<StudentTaskId>,
    finished: Vec<FinishedEntry>,
    completion: Completion,
}

impl TrainController {
    pub fn new(
        sentences: &[Sentence],
        kind: ExerciseKind,
        student_task: Option<StudentTaskId>,
        view: Box<dyn TrainingView>,
        caps: Capabilities,
        bus: &EventBus,
    ) -> Self {
        bus.route(EventName::Answer);
        bus.route(EventName::Next);

        Self {
            view,
            caps,
            queue: SessionQueue::from_sentences(sentences, kind, MissPolicy::Requeue),
            kind,
            student_task,
            finished: Vec::new(),
            completion: Completion::Running,
        }
    }

    pub fn from_local(
        store: &dyn LocalStore,
        kind: ExerciseKind,
        student_task: Option<StudentTaskId>,
        view: Box<dyn TrainingView>,
        caps: Capabilities,
        bus: &EventBus,
    ) -> Result<Self> {
        let sentences: Vec<Sentence> = get_local_as(store, SENTENCES_KEY)?;
        Ok(Self::new(&sentences, kind, student_task, view, caps, bus))
    }

    /// Presents the first item (or finishes straight away on an empty list).
    pub async fn start(&mut self) {
        info!(
            items = self.queue.len(),
            kind = self.kind.as_str(),
            "training session started"
        );
        self.advance().await;
    }

    pub fn queue(&self) -> &SessionQueue {
        &self.queue
    }

    pub fn tally(&self) -> Tally {
        self.queue.tally()
    }

    pub fn finished_record(&self) -> &[FinishedEntry] {
        &self.finished
    }

    pub fn submit_answer(&mut self, student_answer: &str) -> Option<AnswerOutcome> {
        let outcome = self.queue.submit_answer(student_answer)?;
        self.finished.push(FinishedEntry {
            sentence: outcome.item.sentence_id,
            student_answer: student_answer.to_string(),
            is_correct: outcome.is_correct,
        });

        let tally = self.queue.tally();
        self.view
            .show_result(outcome.is_correct, &outcome.item.answer);
        self.view.update_counts(SessionCounts {
            correct: tally.correct,
            incorrect: tally.incorrect,
            remaining: self.queue.len(),
        });
        debug!(
            sentence = %outcome.item.sentence_id,
            is_correct = outcome.is_correct,
            requeued_at = ?outcome.requeued_at,
            remaining = self.queue.len(),
            "answer recorded"
        );
        Some(outcome)
    }

    /// Shows the next item, or submits the results once when the queue is empty.
    pub async fn advance(&mut self) {
        if let Some(item) = self.queue.front() {
            self.view.set_prompt(&item.prompt);
            self.view.set_answer(&item.answer);
            self.view.set_audio_url(item.audio_url.as_deref());
            return;
        }

        if self.completion == Completion::Submitted {
            return;
        }
        self.completion = Completion::Submitted;

        let tally = self.queue.tally();
        let request = StudentResultsRequest {
            student_task: self.student_task,
            correct_count: tally.correct,
            incorrect_count: tally.incorrect,
            initial_count: tally.initial,
            finished: self.finished.clone(),
        };

        match self.caps.api.send_results(&request).await {
            Ok(()) => {
                info!(
                    correct = tally.correct,
                    incorrect = tally.incorrect,
                    "training results submitted"
                );
                self.caps.alerts.show(AlertKind::Success, "Results saved");
            }
            Err(err) => self.caps.report(&err),
        }

        self.view.finish(&tally);
        self.caps.navigator.assign_after(TASKS_PATH, REDIRECT_DELAY);
    }
}

#[async_trait]
impl Controller for TrainController {
    fn name(&self) -> &'static str {
        "train"
    }

    async fn handle(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Answer { student_answer } => {
                self.submit_answer(&student_answer);
            }
            ViewEvent::Next => self.advance().await,
            other => debug!(event = %other.name(), "train controller ignores event"),
        }
    }

    fn is_finished(&self) -> bool {
        self.completion == Completion::Submitted
    }
}

#[cfg(test)]
#[path = "tests/train_tests.rs"]
mod tests;
