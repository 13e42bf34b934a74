use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::{Role, Sentence, SentenceId, TaskId, UserId, UserSummary},
    protocol::{
        CreateSentenceRequest, CreateTaskRequest, CreatedTask, LoginRequest,
        RevisionUpdateRequest, SentenceFilter, SignupRequest, StudentResultsRequest,
    },
};

use crate::{
    api::TrainerApi,
    error::{ClientError, Result},
    session::Tally,
    view::{
        AlertKind, Alerts, AuthoringView, Capabilities, FormView, Navigator, SessionCounts,
        TrainingView,
    },
};

pub(crate) fn sentence(id: i64, text: &str, translation: &str) -> Sentence {
    Sentence {
        id: SentenceId(id),
        sentence: text.to_string(),
        translation: translation.to_string(),
        level: "A1".to_string(),
        viva_ref: String::new(),
        tense: "present".to_string(),
        grammar: String::new(),
        audio_url: None,
    }
}

pub(crate) fn user(id: i64) -> UserSummary {
    UserSummary {
        id: UserId(id),
        name: "Ana".to_string(),
        email: "ana@example.com".to_string(),
        role: Role::Student,
        class_id: None,
    }
}

/// In-memory backend that records every request it receives.
#[derive(Default)]
pub(crate) struct FakeApi {
    pub failure: Mutex<Option<String>>,
    pub search_result: Mutex<Vec<Sentence>>,
    pub logins: Mutex<Vec<LoginRequest>>,
    pub logouts: AtomicUsize,
    pub signups: Mutex<Vec<SignupRequest>>,
    pub sentences: Mutex<Vec<CreateSentenceRequest>>,
    pub searches: Mutex<Vec<SentenceFilter>>,
    pub tasks: Mutex<Vec<CreateTaskRequest>>,
    pub deleted: Mutex<Vec<TaskId>>,
    pub results: Mutex<Vec<StudentResultsRequest>>,
    pub revisions: Mutex<Vec<RevisionUpdateRequest>>,
}

impl FakeApi {
    pub fn failing(message: &str) -> Self {
        let api = Self::default();
        api.fail_with(Some(message));
        api
    }

    pub fn fail_with(&self, message: Option<&str>) {
        *self.failure.lock().unwrap() = message.map(str::to_string);
    }

    pub fn set_search_result(&self, sentences: Vec<Sentence>) {
        *self.search_result.lock().unwrap() = sentences;
    }

    fn check(&self) -> Result<()> {
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(ClientError::Api {
                status: 400,
                message,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TrainerApi for FakeApi {
    async fn login(&self, request: &LoginRequest) -> Result<UserSummary> {
        self.logins.lock().unwrap().push(request.clone());
        self.check()?;
        Ok(user(1))
    }

    async fn logout(&self) -> Result<()> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    async fn signup(&self, request: &SignupRequest) -> Result<UserSummary> {
        self.signups.lock().unwrap().push(request.clone());
        self.check()?;
        Ok(user(2))
    }

    async fn create_sentence(&self, request: &CreateSentenceRequest) -> Result<Sentence> {
        self.sentences.lock().unwrap().push(request.clone());
        self.check()?;
        let mut created = sentence(100, &request.sentence, &request.translation);
        created.audio_url = request.audio_url.clone();
        Ok(created)
    }

    async fn search_sentences(&self, filter: &SentenceFilter) -> Result<Vec<Sentence>> {
        self.searches.lock().unwrap().push(filter.clone());
        self.check()?;
        Ok(self.search_result.lock().unwrap().clone())
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<CreatedTask> {
        self.tasks.lock().unwrap().push(request.clone());
        self.check()?;
        Ok(CreatedTask {
            id: TaskId(7),
            title: request.details.title.clone(),
            sentences: request.sentences.clone(),
        })
    }

    async fn delete_task(&self, task_id: TaskId) -> Result<()> {
        self.deleted.lock().unwrap().push(task_id);
        self.check()
    }

    async fn send_results(&self, request: &StudentResultsRequest) -> Result<()> {
        self.results.lock().unwrap().push(request.clone());
        self.check()
    }

    async fn update_revision(&self, request: &RevisionUpdateRequest) -> Result<()> {
        self.revisions.lock().unwrap().push(request.clone());
        self.check()
    }
}

#[derive(Default)]
pub(crate) struct RecordingAlerts {
    pub shown: Mutex<Vec<(AlertKind, String)>>,
}

impl RecordingAlerts {
    pub fn shown(&self) -> Vec<(AlertKind, String)> {
        self.shown.lock().unwrap().clone()
    }
}

impl Alerts for RecordingAlerts {
    fn show(&self, kind: AlertKind, message: &str) {
        self.shown.lock().unwrap().push((kind, message.to_string()));
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    pub visits: Mutex<Vec<(String, Duration)>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<(String, Duration)> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn assign_after(&self, path: &str, delay: Duration) {
        self.visits.lock().unwrap().push((path.to_string(), delay));
    }
}

pub(crate) struct Harness {
    pub api: Arc<FakeApi>,
    pub alerts: Arc<RecordingAlerts>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new(api: FakeApi) -> Self {
        Self {
            api: Arc::new(api),
            alerts: Arc::default(),
            navigator: Arc::default(),
        }
    }

    pub fn caps(&self) -> Capabilities {
        Capabilities {
            api: self.api.clone(),
            alerts: self.alerts.clone(),
            navigator: self.navigator.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct TrainingLog {
    pub prompts: Vec<String>,
    pub answers: Vec<String>,
    pub audio: Vec<Option<String>>,
    pub results: Vec<(bool, String)>,
    pub counts: Vec<SessionCounts>,
    pub finished: Vec<Tally>,
}

#[derive(Clone, Default)]
pub(crate) struct RecordingTrainingView {
    pub log: Arc<Mutex<TrainingLog>>,
}

impl TrainingView for RecordingTrainingView {
    fn set_prompt(&mut self, prompt: &str) {
        self.log.lock().unwrap().prompts.push(prompt.to_string());
    }

    fn set_answer(&mut self, answer: &str) {
        self.log.lock().unwrap().answers.push(answer.to_string());
    }

    fn set_audio_url(&mut self, url: Option<&str>) {
        self.log.lock().unwrap().audio.push(url.map(str::to_string));
    }

    fn show_result(&mut self, is_correct: bool, expected: &str) {
        self.log
            .lock()
            .unwrap()
            .results
            .push((is_correct, expected.to_string()));
    }

    fn update_counts(&mut self, counts: SessionCounts) {
        self.log.lock().unwrap().counts.push(counts);
    }

    fn finish(&mut self, tally: &Tally) {
        self.log.lock().unwrap().finished.push(*tally);
    }
}

#[derive(Debug, Default)]
pub(crate) struct AuthoringLog {
    pub displays: Vec<(Vec<SentenceId>, Vec<SentenceId>)>,
    pub deleted: Vec<TaskId>,
}

#[derive(Clone, Default)]
pub(crate) struct RecordingAuthoringView {
    pub log: Arc<Mutex<AuthoringLog>>,
}

impl AuthoringView for RecordingAuthoringView {
    fn update_display(&mut self, available: &[Sentence], selected: &[Sentence]) {
        self.log.lock().unwrap().displays.push((
            available.iter().map(|s| s.id).collect(),
            selected.iter().map(|s| s.id).collect(),
        ));
    }

    fn delete_row(&mut self, task_id: TaskId) {
        self.log.lock().unwrap().deleted.push(task_id);
    }
}

#[derive(Clone, Default)]
pub(crate) struct RecordingFormView {
    pub clears: Arc<AtomicUsize>,
}

impl RecordingFormView {
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl FormView for RecordingFormView {
    fn clear_form_data(&mut self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}
