use super::*;
use shared::protocol::CreateSentenceRequest;

use crate::testing::{FakeApi, Harness, RecordingFormView};

fn sentence_form(with_audio: bool) -> SentenceForm {
    SentenceForm {
        fields: CreateSentenceRequest {
            sentence: "Tengo hambre".into(),
            translation: "I am hungry".into(),
            level: "A1".into(),
            viva_ref: "u2".into(),
            tense: "present".into(),
            grammar: "tener".into(),
            audio_url: None,
        },
        with_audio,
    }
}

#[tokio::test]
async fn login_success_alerts_and_goes_home() {
    let harness = Harness::new(FakeApi::default());
    let (bus, _emitter) = EventBus::channel();
    let mut controller = LoginController::new(harness.caps(), &bus);

    controller
        .handle(ViewEvent::FormData(FormData::Login(LoginRequest {
            email: "ana@example.com".into(),
            password: "secret".into(),
        })))
        .await;

    assert_eq!(harness.api.logins.lock().unwrap().len(), 1);
    assert_eq!(
        harness.alerts.shown(),
        vec![(AlertKind::Success, LOGGED_IN.to_string())]
    );
    assert_eq!(
        harness.navigator.visits(),
        vec![(HOME_PATH.to_string(), REDIRECT_DELAY)]
    );
}

#[tokio::test]
async fn login_failure_shows_server_message_and_stays() {
    let harness = Harness::new(FakeApi::failing("Incorrect email or password"));
    let (bus, _emitter) = EventBus::channel();
    let controller = LoginController::new(harness.caps(), &bus);

    controller
        .login(&LoginRequest {
            email: "ana@example.com".into(),
            password: "nope".into(),
        })
        .await;

    assert_eq!(
        harness.alerts.shown(),
        vec![(AlertKind::Error, "Incorrect email or password".to_string())]
    );
    assert!(harness.navigator.visits().is_empty());
}

#[tokio::test]
async fn logout_click_goes_to_login() {
    let harness = Harness::new(FakeApi::default());
    let (bus, _emitter) = EventBus::channel();
    let mut controller = LogoutController::new(harness.caps(), &bus);

    controller.handle(ViewEvent::Click).await;

    assert_eq!(
        harness.alerts.shown(),
        vec![(AlertKind::Success, LOGGED_OUT.to_string())]
    );
    assert_eq!(harness.navigator.visits()[0].0, LOGIN_PATH);
}

#[tokio::test]
async fn signup_alerts_and_goes_home() {
    let harness = Harness::new(FakeApi::default());
    let (bus, _emitter) = EventBus::channel();
    let mut controller = SignupController::new(harness.caps(), &bus);

    controller
        .handle(ViewEvent::FormData(FormData::Signup(SignupRequest {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: "pw".into(),
            password_confirm: "pw".into(),
            class_code: Some("ABC123".into()),
        })))
        .await;

    let signups = harness.api.signups.lock().unwrap().clone();
    assert_eq!(signups[0].class_code.as_deref(), Some("ABC123"));
    assert_eq!(
        harness.alerts.shown(),
        vec![(AlertKind::Success, SIGNED_UP.to_string())]
    );
    assert_eq!(harness.navigator.visits()[0].0, HOME_PATH);
}

#[tokio::test]
async fn sentence_without_audio_is_created_and_form_cleared() {
    let harness = Harness::new(FakeApi::default());
    let view = RecordingFormView::default();
    let (bus, _emitter) = EventBus::channel();
    let mut controller = CreateSentenceController::new(
        Box::new(view.clone()),
        harness.caps(),
        AudioAttachmentCoordinator::new(),
        &bus,
    );

    controller.create(sentence_form(false)).await;

    let created = harness.api.sentences.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].audio_url, None);
    assert_eq!(view.clears(), 1);
    assert_eq!(
        harness.alerts.shown(),
        vec![(AlertKind::Success, SENTENCE_CREATED.to_string())]
    );
}

#[tokio::test]
async fn sentence_save_waits_for_the_audio_upload() {
    let harness = Harness::new(FakeApi::default());
    let view = RecordingFormView::default();
    let (mut bus, emitter) = EventBus::channel();
    let mut controller = CreateSentenceController::new(
        Box::new(view.clone()),
        harness.caps(),
        AudioAttachmentCoordinator::new(),
        &bus,
    );
    assert_eq!(controller.listeners().len(), 3);

    emitter.emit(ViewEvent::UploadStarted);
    emitter.emit(ViewEvent::FormData(FormData::Sentence(sentence_form(true))));
    let event = bus.try_next_event().expect("form event is routed");

    let save = tokio::spawn(async move {
        controller.handle(event).await;
    });
    tokio::task::yield_now().await;
    assert!(harness.api.sentences.lock().unwrap().is_empty());

    assert!(emitter.emit(ViewEvent::SaveFile {
        url: "https://cdn.test/hambre.mp3".into()
    }));
    save.await.unwrap();

    let created = harness.api.sentences.lock().unwrap().clone();
    assert_eq!(
        created[0].audio_url.as_deref(),
        Some("https://cdn.test/hambre.mp3")
    );
    assert_eq!(view.clears(), 1);
}

#[tokio::test]
async fn abandoned_upload_reports_and_creates_nothing() {
    let harness = Harness::new(FakeApi::default());
    let audio = AudioAttachmentCoordinator::new();
    let (bus, emitter) = EventBus::channel();
    let mut controller = CreateSentenceController::new(
        Box::new(RecordingFormView::default()),
        harness.caps(),
        audio.clone(),
        &bus,
    );
    emitter.emit(ViewEvent::UploadStarted);

    let save = tokio::spawn(async move {
        controller.create(sentence_form(true)).await;
    });
    while audio.pending() == 0 {
        tokio::task::yield_now().await;
    }
    audio.upload_failed();
    save.await.unwrap();

    assert!(harness.api.sentences.lock().unwrap().is_empty());
    assert_eq!(harness.alerts.shown()[0].0, AlertKind::Error);
}

#[tokio::test]
async fn failed_upload_event_ends_the_waiting_save() {
    let harness = Harness::new(FakeApi::default());
    let (mut bus, emitter) = EventBus::channel();
    let mut controller = CreateSentenceController::new(
        Box::new(RecordingFormView::default()),
        harness.caps(),
        AudioAttachmentCoordinator::new(),
        &bus,
    );

    emitter.emit(ViewEvent::UploadStarted);
    emitter.emit(ViewEvent::FormData(FormData::Sentence(sentence_form(true))));
    let event = bus.try_next_event().expect("form event is routed");

    let save = tokio::spawn(async move {
        controller.handle(event).await;
        controller
    });
    tokio::task::yield_now().await;
    emitter.emit(ViewEvent::UploadFailed);

    let mut controller = tokio::time::timeout(std::time::Duration::from_secs(2), save)
        .await
        .expect("save finishes once the upload fails")
        .unwrap();
    assert!(harness.api.sentences.lock().unwrap().is_empty());
    assert_eq!(
        harness.alerts.shown(),
        vec![(
            AlertKind::Error,
            crate::error::ClientError::UploadAbandoned.to_string()
        )]
    );

    // A plain save still goes through afterwards.
    controller
        .handle(ViewEvent::FormData(FormData::Sentence(sentence_form(false))))
        .await;
    assert_eq!(harness.api.sentences.lock().unwrap().len(), 1);
}
