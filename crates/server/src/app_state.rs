use shared::domain::ExerciseKind;
use storage::Storage;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) storage: Storage,
    pub(crate) site_title: String,
    pub(crate) default_exercise: ExerciseKind,
}
