//! Login, logout, signup and sentence creation forms.

use async_trait::async_trait;
use shared::protocol::{LoginRequest, SignupRequest};
use tracing::{debug, info};

use crate::{
    audio::AudioAttachmentCoordinator,
    events::{EventBus, EventName, FormData, SentenceForm, SubscriptionHandle, ViewEvent},
    view::{AlertKind, Capabilities, Controller, FormView, REDIRECT_DELAY},
};

pub const LOGGED_IN: &str = "Logged in successfully!";
pub const LOGGED_OUT: &str = "Logged out!";
pub const SIGNED_UP: &str = "Signed up successfully!";
pub const SENTENCE_CREATED: &str = "Sentence created";

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";

pub struct LoginController {
    caps: Capabilities,
}

impl LoginController {
    pub fn new(caps: Capabilities, bus: &EventBus) -> Self {
        bus.route(EventName::FormData);
        Self { caps }
    }

    pub async fn login(&self, request: &LoginRequest) {
        match self.caps.api.login(request).await {
            Ok(user) => {
                info!(user = %user.id, "logged in");
                self.caps.alerts.show(AlertKind::Success, LOGGED_IN);
                self.caps.navigator.assign_after(HOME_PATH, REDIRECT_DELAY);
            }
            Err(err) => self.caps.report(&err),
        }
    }
}

#[async_trait]
impl Controller for LoginController {
    fn name(&self) -> &'static str {
        "login"
    }

    async fn handle(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::FormData(FormData::Login(request)) => self.login(&request).await,
            other => debug!(event = %other.name(), "login controller ignores event"),
        }
    }
}

pub struct LogoutController {
    caps: Capabilities,
}

impl LogoutController {
    pub fn new(caps: Capabilities, bus: &EventBus) -> Self {
        bus.route(EventName::Click);
        Self { caps }
    }

    pub async fn logout(&self) {
        match self.caps.api.logout().await {
            Ok(()) => {
                self.caps.alerts.show(AlertKind::Success, LOGGED_OUT);
                self.caps.navigator.assign_after(LOGIN_PATH, REDIRECT_DELAY);
            }
            Err(err) => self.caps.report(&err),
        }
    }
}

#[async_trait]
impl Controller for LogoutController {
    fn name(&self) -> &'static str {
        "logout"
    }

    async fn handle(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Click => self.logout().await,
            other => debug!(event = %other.name(), "logout controller ignores event"),
        }
    }
}

pub struct SignupController {
    caps: Capabilities,
}

impl SignupController {
    pub fn new(caps: Capabilities, bus: &EventBus) -> Self {
        bus.route(EventName::FormData);
        Self { caps }
    }

    pub async fn signup(&self, request: &SignupRequest) {
        match self.caps.api.signup(request).await {
            Ok(user) => {
                info!(user = %user.id, "signed up");
                self.caps.alerts.show(AlertKind::Success, SIGNED_UP);
                self.caps.navigator.assign_after(HOME_PATH, REDIRECT_DELAY);
            }
            Err(err) => self.caps.report(&err),
        }
    }
}

#[async_trait]
impl Controller for SignupController {
    fn name(&self) -> &'static str {
        "signup"
    }

    async fn handle(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::FormData(FormData::Signup(request)) => self.signup(&request).await,
            other => debug!(event = %other.name(), "signup controller ignores event"),
        }
    }
}

/// Creates sentences, attaching the recorded audio when the form says so.
///
/// Upload notifications are handled as listeners rather than routed events,
/// so a save that is waiting for its audio URL still sees the `save_file`
/// that resolves it.
pub struct CreateSentenceController {
    view: Box<dyn FormView>,
    caps: Capabilities,
    audio: AudioAttachmentCoordinator,
    listeners: [SubscriptionHandle; 3],
}

impl CreateSentenceController {
    pub fn new(
        view: Box<dyn FormView>,
        caps: Capabilities,
        audio: AudioAttachmentCoordinator,
        bus: &EventBus,
    ) -> Self {
        let started = {
            let audio = audio.clone();
            bus.subscribe(EventName::UploadStarted, move |_| audio.upload_started())
        };
        let failed = {
            let audio = audio.clone();
            bus.subscribe(EventName::UploadFailed, move |_| {
                audio.upload_failed();
            })
        };
        let saved = {
            let audio = audio.clone();
            bus.subscribe(EventName::SaveFile, move |event| {
                if let ViewEvent::SaveFile { url } = event {
                    audio.file_saved(url);
                }
            })
        };
        bus.route(EventName::FormData);

        Self {
            view,
            caps,
            audio,
            listeners: [started, failed, saved],
        }
    }

    pub fn listeners(&self) -> &[SubscriptionHandle] {
        &self.listeners
    }

    pub async fn create(&mut self, form: SentenceForm) {
        let SentenceForm {
            mut fields,
            with_audio,
        } = form;

        if with_audio {
            match self.audio.request_url().await {
                Ok(url) => fields.audio_url = Some(url),
                Err(err) => {
                    self.caps.report(&err);
                    return;
                }
            }
        }

        match self.caps.api.create_sentence(&fields).await {
            Ok(sentence) => {
                info!(sentence = %sentence.id, with_audio, "sentence created");
                self.view.clear_form_data();
                self.caps.alerts.show(AlertKind::Success, SENTENCE_CREATED);
            }
            Err(err) => self.caps.report(&err),
        }
    }
}

#[async_trait]
impl Controller for CreateSentenceController {
    fn name(&self) -> &'static str {
        "create_sentence"
    }

    async fn handle(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::FormData(FormData::Sentence(form)) => self.create(form).await,
            other => debug!(event = %other.name(), "sentence controller ignores event"),
        }
    }
}

#[cfg(test)]
#[path = "tests/forms_tests.rs"]
mod tests;
