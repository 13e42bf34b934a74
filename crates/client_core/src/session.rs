//! Session queue shared by the training and revision controllers.

use std::collections::VecDeque;

use shared::domain::{ExerciseItem, ExerciseKind, Sentence};

/// A missed item resurfaces after at most this many other items.
pub const REQUEUE_OFFSET: usize = 3;

const CLOZE_BLANK: &str = "____";

/// Where a missed item comes back, given how many items are left after it was removed.
pub fn requeue_index(remaining: usize) -> usize {
    remaining.min(REQUEUE_OFFSET)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub correct: u32,
    pub incorrect: u32,
    pub initial: u32,
}

impl Tally {
    pub fn answered(&self) -> u32 {
        self.correct + self.incorrect
    }
}

/// What happens to an item answered incorrectly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissPolicy {
    Requeue,
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub item: ExerciseItem,
    pub is_correct: bool,
    pub requeued_at: Option<usize>,
}

/// Builds exercise items for one [`ExerciseKind`] and judges answers to them.
pub trait ExerciseStrategy: Send + Sync {
    fn build(&self, sentence: &Sentence) -> ExerciseItem;

    fn is_correct(&self, item: &ExerciseItem, answer: &str) -> bool {
        normalize_answer(&item.answer) == normalize_answer(answer)
    }
}

pub struct TranslationExercise;
pub struct ReverseExercise;
pub struct ClozeExercise;
pub struct AudioExercise;

impl ExerciseStrategy for TranslationExercise {
    fn build(&self, sentence: &Sentence) -> ExerciseItem {
        ExerciseItem {
            sentence_id: sentence.id,
            kind: ExerciseKind::Translation,
            prompt: sentence.sentence.clone(),
            answer: sentence.translation.clone(),
            audio_url: sentence.audio_url.clone(),
        }
    }
}

impl ExerciseStrategy for ReverseExercise {
    fn build(&self, sentence: &Sentence) -> ExerciseItem {
        ExerciseItem {
            sentence_id: sentence.id,
            kind: ExerciseKind::Reverse,
            prompt: sentence.translation.clone(),
            answer: sentence.sentence.clone(),
            audio_url: sentence.audio_url.clone(),
        }
    }
}

impl ExerciseStrategy for ClozeExercise {
    fn build(&self, sentence: &Sentence) -> ExerciseItem {
        let (prompt, answer) = cloze(&sentence.sentence);
        ExerciseItem {
            sentence_id: sentence.id,
            kind: ExerciseKind::Cloze,
            prompt,
            answer,
            audio_url: sentence.audio_url.clone(),
        }
    }
}

impl ExerciseStrategy for AudioExercise {
    fn build(&self, sentence: &Sentence) -> ExerciseItem {
        ExerciseItem {
            sentence_id: sentence.id,
            kind: ExerciseKind::Audio,
            prompt: String::new(),
            answer: sentence.sentence.clone(),
            audio_url: sentence.audio_url.clone(),
        }
    }
}

pub fn strategy_for(kind: ExerciseKind) -> &'static dyn ExerciseStrategy {
    match kind {
        ExerciseKind::Translation => &TranslationExercise,
        ExerciseKind::Reverse => &ReverseExercise,
        ExerciseKind::Cloze => &ClozeExercise,
        ExerciseKind::Audio => &AudioExercise,
    }
}

/// Case-folds, collapses whitespace and drops sentence punctuation at either end.
pub fn normalize_answer(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_start_matches(|c: char| c.is_whitespace() || ['¿', '¡'].contains(&c))
        .trim_end_matches(|c: char| c.is_whitespace() || ['.', '!', '?', '…'].contains(&c))
        .to_lowercase()
}

/// Blanks the longest word of `sentence` (first one on ties).
fn cloze(sentence: &str) -> (String, String) {
    let core = |token: &str| -> String {
        token
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_string()
    };

    let mut best: Option<(usize, String)> = None;
    for (index, token) in sentence.split_whitespace().enumerate() {
        let word = core(token);
        let len = word.chars().count();
        if len == 0 {
            continue;
        }
        if best
            .as_ref()
            .map_or(true, |(_, current)| len > current.chars().count())
        {
            best = Some((index, word));
        }
    }

    let Some((blank_index, answer)) = best else {
        return (sentence.to_string(), String::new());
    };

    let prompt = sentence
        .split_whitespace()
        .enumerate()
        .map(|(index, token)| {
            if index == blank_index {
                token.replacen(answer.as_str(), CLOZE_BLANK, 1)
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    (prompt, answer)
}

/// Ordered pending items of a session plus its running tally.
#[derive(Debug, Clone)]
pub struct SessionQueue {
    items: VecDeque<ExerciseItem>,
    tally: Tally,
    policy: MissPolicy,
}

impl SessionQueue {
    pub fn new(items: Vec<ExerciseItem>, policy: MissPolicy) -> Self {
        let initial = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Self {
            items: items.into(),
            tally: Tally {
                initial,
                ..Tally::default()
            },
            policy,
        }
    }

    pub fn from_sentences(sentences: &[Sentence], kind: ExerciseKind, policy: MissPolicy) -> Self {
        let strategy = strategy_for(kind);
        Self::new(sentences.iter().map(|s| strategy.build(s)).collect(), policy)
    }

    pub fn front(&self) -> Option<&ExerciseItem> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn items(&self) -> impl Iterator<Item = &ExerciseItem> {
        self.items.iter()
    }

    /// Judges `answer` against the front item with its kind's strategy.
    pub fn submit_answer(&mut self, answer: &str) -> Option<AnswerOutcome> {
        let front = self.items.front()?;
        let is_correct = strategy_for(front.kind).is_correct(front, answer);
        self.record(is_correct)
    }

    /// Removes the front item and applies an externally decided verdict.
    pub fn record(&mut self, is_correct: bool) -> Option<AnswerOutcome> {
        let item = self.items.pop_front()?;

        if is_correct {
            self.tally.correct += 1;
            return Some(AnswerOutcome {
                item,
                is_correct,
                requeued_at: None,
            });
        }

        self.tally.incorrect += 1;
        let requeued_at = match self.policy {
            MissPolicy::Requeue => {
                let index = requeue_index(self.items.len());
                self.items.insert(index, item.clone());
                Some(index)
            }
            MissPolicy::Drop => None,
        };
        Some(AnswerOutcome {
            item,
            is_correct,
            requeued_at,
        })
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
