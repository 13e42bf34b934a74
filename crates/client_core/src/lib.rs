//! Controllers behind the sentence trainer pages.
//!
//! A page wires one controller to its view through an [`events::EventBus`]
//! and hands it [`view::Capabilities`] (backend, alerts, navigation). The
//! controller then reacts to view events one at a time; see
//! [`view::run_controller`].

pub mod api;
pub mod audio;
pub mod authoring;
pub mod error;
pub mod events;
pub mod forms;
pub mod revise;
pub mod session;
pub mod train;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, TrainerApi};
pub use audio::AudioAttachmentCoordinator;
pub use authoring::{RandomTaskController, TaskAuthoringController};
pub use error::{ClientError, Result};
pub use events::{Emitter, EventBus, EventName, FormData, SentenceForm, ViewEvent};
pub use forms::{CreateSentenceController, LoginController, LogoutController, SignupController};
pub use revise::{Clock, ReviseController};
pub use session::{SessionQueue, Tally};
pub use train::TrainController;
pub use view::{
    run_controller, AlertKind, Alerts, Capabilities, Controller, LocalStore, MemoryStore,
    Navigator, TrainingView,
};
