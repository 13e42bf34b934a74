//! Spaced-repetition revision: every due item is asked once and rescheduled
//! on the spot.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use shared::{
    domain::{ExerciseKind, RevisionItem, SentenceId},
    protocol::RevisionUpdateRequest,
};
use tracing::{debug, info};

use crate::{
    error::Result,
    events::{EventBus, EventName, ViewEvent},
    session::{MissPolicy, SessionQueue, Tally},
    view::{
        get_local_as, Capabilities, Controller, LocalStore, SessionCounts, TrainingView,
    },
};

pub const REVISIONS_KEY: &str = "revisions";

/// Growth factor applied to the interval after a correct answer.
pub const RETEST_FACTOR: u32 = 3;

/// Time source for scheduling; `Fixed` pins it in tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

/// Next state of `item` after one answer given at `now`.
pub fn reschedule(item: &RevisionItem, is_correct: bool, now: DateTime<Utc>) -> RevisionItem {
    let mut next = item.clone();
    if is_correct {
        next.retest_days = item.retest_days.saturating_mul(RETEST_FACTOR).max(1);
        next.correct_attempts = item.correct_attempts.saturating_add(1);
    } else {
        next.retest_days = 1;
        next.incorrect_attempts = item.incorrect_attempts.saturating_add(1);
    }
    next.next_due = Some(now + Duration::days(i64::from(next.retest_days)));
    next
}

pub struct ReviseController {
    view: Box<dyn TrainingView>,
    caps: Capabilities,
    clock: Clock,
    queue: SessionQueue,
    items: HashMap<SentenceId, RevisionItem>,
    finished: bool,
}

impl ReviseController {
    pub fn new(
        items: Vec<RevisionItem>,
        kind: ExerciseKind,
        clock: Clock,
        view: Box<dyn TrainingView>,
        caps: Capabilities,
        bus: &EventBus,
    ) -> Self {
        bus.route(EventName::Answer);
        bus.route(EventName::Next);

        let sentences: Vec<_> = items.iter().map(|item| item.sentence.clone()).collect();
        let queue = SessionQueue::from_sentences(&sentences, kind, MissPolicy::Drop);
        let items = items
            .into_iter()
            .map(|item| (item.sentence.id, item))
            .collect();

        Self {
            view,
            caps,
            clock,
            queue,
            items,
            finished: false,
        }
    }

    pub fn from_local(
        store: &dyn LocalStore,
        kind: ExerciseKind,
        clock: Clock,
        view: Box<dyn TrainingView>,
        caps: Capabilities,
        bus: &EventBus,
    ) -> Result<Self> {
        let items: Vec<RevisionItem> = get_local_as(store, REVISIONS_KEY)?;
        Ok(Self::new(items, kind, clock, view, caps, bus))
    }

    pub fn start(&mut self) {
        info!(items = self.queue.len(), "revision session started");
        self.advance();
    }

    pub fn tally(&self) -> Tally {
        self.queue.tally()
    }

    pub fn item(&self, sentence: SentenceId) -> Option<&RevisionItem> {
        self.items.get(&sentence)
    }

    pub async fn submit_answer(&mut self, student_answer: &str) {
        let Some(outcome) = self.queue.submit_answer(student_answer) else {
            return;
        };
        let tally = self.queue.tally();
        self.view.show_result(outcome.is_correct, &outcome.item.answer);
        self.view.update_counts(SessionCounts {
            correct: tally.correct,
            incorrect: tally.incorrect,
            remaining: self.queue.len(),
        });

        let sentence = outcome.item.sentence_id;
        let Some(current) = self.items.get(&sentence) else {
            return;
        };
        let updated = reschedule(current, outcome.is_correct, self.clock.now());
        let request = RevisionUpdateRequest {
            sentence,
            retest_days: updated.retest_days,
            correct_attempts: updated.correct_attempts,
            incorrect_attempts: updated.incorrect_attempts,
            next_due: updated.next_due.unwrap_or_else(|| self.clock.now()),
        };
        debug!(
            %sentence,
            retest_days = updated.retest_days,
            is_correct = outcome.is_correct,
            "revision rescheduled"
        );
        self.items.insert(sentence, updated);

        if let Err(err) = self.caps.api.update_revision(&request).await {
            self.caps.report(&err);
        }
    }

    pub fn advance(&mut self) {
        if let Some(item) = self.queue.front() {
            self.view.set_prompt(&item.prompt);
            self.view.set_answer(&item.answer);
            self.view.set_audio_url(item.audio_url.as_deref());
            return;
        }
        if self.finished {
            return;
        }
        self.finished = true;
        let tally = self.queue.tally();
        info!(
            correct = tally.correct,
            incorrect = tally.incorrect,
            "revision session finished"
        );
        self.view.finish(&tally);
    }
}

#[async_trait]
impl Controller for ReviseController {
    fn name(&self) -> &'static str {
        "revise"
    }

    async fn handle(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Answer { student_answer } => self.submit_answer(&student_answer).await,
            ViewEvent::Next => self.advance(),
            other => debug!(event = %other.name(), "revise controller ignores event"),
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
#[path = "tests/revise_tests.rs"]
mod tests;
