use super::*;
use crate::testing::sentence;

fn queue_of(ids: &[i64], policy: MissPolicy) -> SessionQueue {
    let sentences: Vec<Sentence> = ids
        .iter()
        .map(|id| sentence(*id, &format!("frase {id}"), &format!("sentence {id}")))
        .collect();
    SessionQueue::from_sentences(&sentences, ExerciseKind::Translation, policy)
}

fn order(queue: &SessionQueue) -> Vec<i64> {
    queue.items().map(|item| item.sentence_id.0).collect()
}

#[test]
fn missed_item_returns_behind_the_rest() {
    let mut queue = queue_of(&[1, 2, 3], MissPolicy::Requeue);

    let outcome = queue.submit_answer("wrong").unwrap();
    assert!(!outcome.is_correct);
    assert_eq!(outcome.requeued_at, Some(2));
    assert_eq!(order(&queue), vec![2, 3, 1]);

    let outcome = queue.submit_answer("sentence 2").unwrap();
    assert!(outcome.is_correct);
    assert_eq!(order(&queue), vec![3, 1]);
    assert_eq!(
        queue.tally(),
        Tally {
            correct: 1,
            incorrect: 1,
            initial: 3
        }
    );
}

#[test]
fn requeue_index_is_capped() {
    assert_eq!(requeue_index(0), 0);
    assert_eq!(requeue_index(2), 2);
    assert_eq!(requeue_index(3), 3);
    assert_eq!(requeue_index(10), REQUEUE_OFFSET);

    let mut queue = queue_of(&[1, 2, 3, 4, 5, 6], MissPolicy::Requeue);
    queue.record(false);
    assert_eq!(order(&queue), vec![2, 3, 4, 1, 5, 6]);
}

#[test]
fn length_changes_follow_the_verdict() {
    let mut queue = queue_of(&[1, 2, 3, 4], MissPolicy::Requeue);
    let mut submitted = 0;
    for is_correct in [false, true, false, false, true, true] {
        let before = queue.len();
        queue.record(is_correct).unwrap();
        submitted += 1;
        if is_correct {
            assert_eq!(queue.len(), before - 1);
        } else {
            assert_eq!(queue.len(), before);
        }
        assert_eq!(queue.tally().answered(), submitted);
    }
}

#[test]
fn at_most_one_copy_of_each_item() {
    let mut queue = queue_of(&[1, 2], MissPolicy::Requeue);
    for _ in 0..5 {
        queue.record(false);
        let mut ids = order(&queue);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), queue.len());
    }
}

#[test]
fn last_item_missed_stays_at_front() {
    let mut queue = queue_of(&[1], MissPolicy::Requeue);
    let outcome = queue.record(false).unwrap();
    assert_eq!(outcome.requeued_at, Some(0));
    assert_eq!(order(&queue), vec![1]);
}

#[test]
fn drop_policy_shows_each_item_once() {
    let mut queue = queue_of(&[1, 2], MissPolicy::Drop);
    let outcome = queue.record(false).unwrap();
    assert_eq!(outcome.requeued_at, None);
    assert_eq!(order(&queue), vec![2]);
}

#[test]
fn empty_queue_leaves_tally_alone() {
    let mut queue = queue_of(&[], MissPolicy::Requeue);
    assert!(queue.submit_answer("anything").is_none());
    assert_eq!(queue.tally(), Tally::default());
}

#[test]
fn normalization_ignores_case_spacing_and_end_punctuation() {
    assert_eq!(normalize_answer("  Hello   World. "), "hello world");
    assert_eq!(normalize_answer("¿Dónde está?"), "dónde está");
    assert_eq!(normalize_answer("¡Hola!"), "hola");
    assert_eq!(normalize_answer("hola . !"), "hola");
    assert_eq!(normalize_answer("¡ ¿Qué tal ?"), "qué tal");
    assert_ne!(normalize_answer("hola mundo"), normalize_answer("holamundo"));
}

#[test]
fn strategies_build_items_per_kind() {
    let source = sentence(5, "Me gusta la música.", "I like music.");

    let reverse = strategy_for(ExerciseKind::Reverse).build(&source);
    assert_eq!(reverse.prompt, "I like music.");
    assert_eq!(reverse.answer, "Me gusta la música.");

    let cloze = strategy_for(ExerciseKind::Cloze).build(&source);
    assert_eq!(cloze.prompt, "Me gusta la ____.");
    assert_eq!(cloze.answer, "música");
    assert!(ClozeExercise.is_correct(&cloze, "Música"));

    let audio = strategy_for(ExerciseKind::Audio).build(&source);
    assert!(audio.prompt.is_empty());
    assert_eq!(audio.answer, "Me gusta la música.");
}
