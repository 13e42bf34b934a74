use super::*;
use crate::{
    testing::{sentence, FakeApi, Harness, RecordingTrainingView},
    view::MemoryStore,
};

fn controller(harness: &Harness, view: &RecordingTrainingView) -> (TrainController, EventBus) {
    let (bus, _emitter) = EventBus::channel();
    let sentences = vec![
        sentence(1, "Hola", "Hello"),
        sentence(2, "Gracias", "Thanks"),
    ];
    let controller = TrainController::new(
        &sentences,
        ExerciseKind::Translation,
        Some(StudentTaskId(11)),
        Box::new(view.clone()),
        harness.caps(),
        &bus,
    );
    (controller, bus)
}

#[tokio::test]
async fn start_presents_first_item() {
    let harness = Harness::new(FakeApi::default());
    let view = RecordingTrainingView::default();
    let (mut controller, bus) = controller(&harness, &view);

    assert!(bus.is_routed(EventName::Answer));
    assert!(bus.is_routed(EventName::Next));

    controller.start().await;
    let log = view.log.lock().unwrap();
    assert_eq!(log.prompts, vec!["Hola"]);
    assert_eq!(log.answers, vec!["Hello"]);
}

#[tokio::test]
async fn session_submits_once_with_tallied_counts() {
    let harness = Harness::new(FakeApi::default());
    let view = RecordingTrainingView::default();
    let (mut controller, _bus) = controller(&harness, &view);
    controller.start().await;

    controller.handle(ViewEvent::Answer { student_answer: "nope".into() }).await;
    controller.handle(ViewEvent::Next).await;
    controller.handle(ViewEvent::Answer { student_answer: "thanks!".into() }).await;
    controller.handle(ViewEvent::Next).await;
    assert!(harness.api.results.lock().unwrap().is_empty());
    controller.handle(ViewEvent::Answer { student_answer: "hello".into() }).await;
    controller.handle(ViewEvent::Next).await;
    controller.handle(ViewEvent::Next).await;

    let results = harness.api.results.lock().unwrap().clone();
    assert_eq!(results.len(), 1);
    let submitted = &results[0];
    assert_eq!(submitted.student_task, Some(StudentTaskId(11)));
    assert_eq!(submitted.correct_count, 2);
    assert_eq!(submitted.incorrect_count, 1);
    assert_eq!(submitted.initial_count, 2);
    assert_eq!(submitted.finished.len(), 3);
    assert!(!submitted.finished[0].is_correct);
    assert_eq!(submitted.finished[1].student_answer, "thanks!");

    assert!(controller.is_finished());
    assert_eq!(view.log.lock().unwrap().finished.len(), 1);
    assert_eq!(
        harness.alerts.shown(),
        vec![(AlertKind::Success, "Results saved".to_string())]
    );
    assert_eq!(
        harness.navigator.visits(),
        vec![(TASKS_PATH.to_string(), REDIRECT_DELAY)]
    );
}

#[tokio::test]
async fn counts_reflect_each_answer() {
    let harness = Harness::new(FakeApi::default());
    let view = RecordingTrainingView::default();
    let (mut controller, _bus) = controller(&harness, &view);
    controller.start().await;

    controller.submit_answer("wrong");
    controller.submit_answer("thanks");

    let log = view.log.lock().unwrap();
    assert_eq!(log.results, vec![(false, "Hello".to_string()), (true, "Thanks".to_string())]);
    assert_eq!(
        log.counts.last().copied(),
        Some(SessionCounts {
            correct: 1,
            incorrect: 1,
            remaining: 1
        })
    );
}

#[tokio::test]
async fn failed_submission_alerts_once_and_still_navigates() {
    let harness = Harness::new(FakeApi::failing("Task already completed"));
    let view = RecordingTrainingView::default();
    let (mut controller, _bus) = controller(&harness, &view);

    controller.submit_answer("hello");
    controller.submit_answer("thanks");
    controller.advance().await;
    controller.advance().await;

    assert_eq!(harness.api.results.lock().unwrap().len(), 1);
    assert_eq!(
        harness.alerts.shown(),
        vec![(AlertKind::Error, "Task already completed".to_string())]
    );
    assert_eq!(harness.navigator.visits().len(), 1);
    assert_eq!(view.log.lock().unwrap().finished.len(), 1);
}

#[tokio::test]
async fn empty_list_finishes_on_start() {
    let harness = Harness::new(FakeApi::default());
    let view = RecordingTrainingView::default();
    let (bus, _emitter) = EventBus::channel();
    let mut controller = TrainController::new(
        &[],
        ExerciseKind::Translation,
        None,
        Box::new(view.clone()),
        harness.caps(),
        &bus,
    );

    controller.start().await;

    let results = harness.api.results.lock().unwrap().clone();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].initial_count, 0);
    assert!(view.log.lock().unwrap().prompts.is_empty());
}

#[test]
fn loads_sentences_from_local_store() {
    let harness = Harness::new(FakeApi::default());
    let store = MemoryStore::new();
    let (bus, _emitter) = EventBus::channel();

    let missing = TrainController::from_local(
        &store,
        ExerciseKind::Reverse,
        None,
        Box::new(RecordingTrainingView::default()),
        harness.caps(),
        &bus,
    );
    assert!(matches!(missing, Err(crate::error::ClientError::MissingLocal(_))));

    store.set_local(
        SENTENCES_KEY,
        serde_json::to_value(vec![sentence(3, "Sí", "Yes")]).unwrap(),
    );
    let controller = TrainController::from_local(
        &store,
        ExerciseKind::Reverse,
        None,
        Box::new(RecordingTrainingView::default()),
        harness.caps(),
        &bus,
    )
    .unwrap();
    assert_eq!(controller.queue().front().map(|item| item.prompt.as_str()), Some("Yes"));
}

#[tokio::test]
async fn run_controller_stops_after_completion() {
    let harness = Harness::new(FakeApi::default());
    let view = RecordingTrainingView::default();
    let (mut bus, emitter) = EventBus::channel();
    let mut controller = TrainController::new(
        &[sentence(1, "Hola", "Hello")],
        ExerciseKind::Translation,
        None,
        Box::new(view.clone()),
        harness.caps(),
        &bus,
    );
    controller.start().await;

    emitter.emit(ViewEvent::Answer {
        student_answer: "Hello".into(),
    });
    emitter.emit(ViewEvent::Next);
    emitter.emit(ViewEvent::Next);

    crate::view::run_controller(&mut controller, &mut bus).await;

    assert!(controller.is_finished());
    assert_eq!(harness.api.results.lock().unwrap().len(), 1);
    // The trailing `next` is still queued; draining it changes nothing.
    assert_eq!(crate::view::dispatch_pending(&mut controller, &mut bus).await, 1);
    assert_eq!(harness.api.results.lock().unwrap().len(), 1);
}
