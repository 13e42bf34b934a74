//! Server-rendered pages. Each page loads its read model from storage and
//! hands what the client controllers need to the template, either as markup
//! or as JSON embedded in a `<script type="application/json">` element.

mod templates;

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{ClassId, ExerciseKind, StudentTaskId, UserId, UserSummary},
    error::{ApiError, ErrorCode},
};
use thiserror::Error;
use tracing::{debug, error};

use crate::app_state::AppState;
use templates::*;

pub(crate) const LOGIN_PATH: &str = "/login";

#[derive(Debug, Error)]
pub(crate) enum PageError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("this page belongs to another user")]
    Forbidden,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
    #[error("failed to render page: {0}")]
    Render(#[from] askama::Error),
    #[error("failed to encode page data: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PageError {
    fn api_error(&self) -> ApiError {
        match self {
            PageError::NotFound(what) => ApiError::not_found(what),
            PageError::Forbidden => ApiError::new(ErrorCode::Forbidden, self.to_string()),
            PageError::Storage(_) | PageError::Render(_) | PageError::Encode(_) => {
                ApiError::new(ErrorCode::Internal, "Something went wrong, please try again")
            }
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let api_error = self.api_error();
        if api_error.code == ErrorCode::Internal {
            error!(error = %self, "page failed");
        } else {
            debug!(error = %self, "page rejected");
        }

        let status = StatusCode::from_u16(api_error.code.status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let page = ErrorTemplate {
            status: status.as_u16(),
            message: api_error.message,
        };
        match page.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(_) => (status, page.message).into_response(),
        }
    }
}

type PageResult = Result<Response, PageError>;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ViewerQuery {
    user_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TrainQuery {
    user_id: Option<i64>,
    exercise: Option<String>,
}

/// Serializes `value` for a `<script>` element; `<`, `>` and `&` are
/// written as unicode escapes so the data cannot close the element.
pub(crate) fn embed_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let raw = serde_json::to_string(value)?;
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            _ => out.push(c),
        }
    }
    Ok(out)
}

fn render(template: &impl Template) -> PageResult {
    Ok(Html(template.render()?).into_response())
}

async fn load_viewer(state: &AppState, user_id: i64) -> Result<UserSummary, PageError> {
    state
        .storage
        .load_user(UserId(user_id))
        .await?
        .ok_or(PageError::NotFound("user"))
}

fn exercise_kind(state: &AppState, raw: Option<&str>) -> ExerciseKind {
    raw.and_then(ExerciseKind::parse)
        .unwrap_or(state.default_exercise)
}

pub(crate) async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable")
        }
    }
}

pub(crate) async fn tasks_page(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ViewerQuery>,
) -> PageResult {
    let Some(user_id) = q.user_id else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    let viewer = load_viewer(&state, user_id).await?;
    let tasks = state.storage.list_student_tasks(viewer.id).await?;

    let rows = tasks
        .into_iter()
        .map(|student_task| TaskRow {
            title: student_task.task.title,
            description: student_task.task.description,
            due: student_task
                .task
                .due_date
                .map(|due| due.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "No due date".to_string()),
            status: student_task.status.as_str(),
            progress: format!(
                "{} of {}",
                student_task.correct_count, student_task.task.sentence_count
            ),
            train_href: format!("/train/{}?user_id={}", student_task.id, viewer.id),
        })
        .collect();

    render(&TasksTemplate {
        site_title: state.site_title.clone(),
        viewer_id: viewer.id.0,
        viewer_name: viewer.name,
        rows,
    })
}

pub(crate) async fn train_page(
    State(state): State<Arc<AppState>>,
    Path(student_task_id): Path<i64>,
    Query(q): Query<TrainQuery>,
) -> PageResult {
    let Some(user_id) = q.user_id else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    let loaded = state
        .storage
        .load_student_task(StudentTaskId(student_task_id))
        .await?
        .ok_or(PageError::NotFound("task"))?;
    if user_id != loaded.student_task.student_id.0 {
        return Err(PageError::Forbidden);
    }

    let exercise = exercise_kind(&state, q.exercise.as_deref());
    render(&TrainTemplate {
        site_title: state.site_title.clone(),
        title: loaded.task.title,
        exercise: exercise.as_str(),
        student_task: loaded.student_task.id.0,
        sentence_count: loaded.task.sentences.len(),
        sentences_json: embed_json(&loaded.task.sentences)?,
    })
}

pub(crate) async fn revise_page(
    State(state): State<Arc<AppState>>,
    Query(q): Query<TrainQuery>,
) -> PageResult {
    let Some(user_id) = q.user_id else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    let viewer = load_viewer(&state, user_id).await?;
    let due = state
        .storage
        .list_due_revisions(viewer.id, Utc::now())
        .await?;

    render(&ReviseTemplate {
        site_title: state.site_title.clone(),
        viewer_name: viewer.name,
        exercise: exercise_kind(&state, q.exercise.as_deref()).as_str(),
        due_count: due.len(),
        revisions_json: embed_json(&due)?,
    })
}

pub(crate) async fn login_page(State(state): State<Arc<AppState>>) -> PageResult {
    render(&LoginTemplate {
        site_title: state.site_title.clone(),
    })
}

pub(crate) async fn signup_page(State(state): State<Arc<AppState>>) -> PageResult {
    render(&SignupTemplate {
        site_title: state.site_title.clone(),
    })
}

pub(crate) async fn new_sentence_page(State(state): State<Arc<AppState>>) -> PageResult {
    render(&NewSentenceTemplate {
        site_title: state.site_title.clone(),
    })
}

pub(crate) async fn new_task_page(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ViewerQuery>,
) -> PageResult {
    let classes = match q.user_id {
        Some(user_id) => {
            state
                .storage
                .list_classes_for_teacher(UserId(user_id))
                .await?
        }
        None => Vec::new(),
    };
    render(&NewTaskTemplate {
        site_title: state.site_title.clone(),
        classes,
    })
}

pub(crate) async fn classes_page(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ViewerQuery>,
) -> PageResult {
    let Some(user_id) = q.user_id else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    let viewer = load_viewer(&state, user_id).await?;
    let classes = state.storage.list_classes_for_teacher(viewer.id).await?;

    render(&ClassesTemplate {
        site_title: state.site_title.clone(),
        viewer_id: viewer.id.0,
        viewer_name: viewer.name,
        classes,
    })
}

pub(crate) async fn class_page(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<i64>,
    Query(q): Query<ViewerQuery>,
) -> PageResult {
    let Some(user_id) = q.user_id else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    let class = state
        .storage
        .load_class(ClassId(class_id))
        .await?
        .ok_or(PageError::NotFound("class"))?;
    if user_id != class.teacher_id.0 {
        return Err(PageError::Forbidden);
    }
    let students = state.storage.list_students_in_class(class.id).await?;

    render(&ClassTemplate {
        site_title: state.site_title.clone(),
        class,
        students,
    })
}

pub(crate) async fn account_page(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ViewerQuery>,
) -> PageResult {
    let Some(user_id) = q.user_id else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    let user = load_viewer(&state, user_id).await?;
    let class_name = match user.class_id {
        Some(class_id) => state
            .storage
            .load_class(class_id)
            .await?
            .map(|class| class.name)
            .unwrap_or_default(),
        None => String::new(),
    };

    render(&AccountTemplate {
        site_title: state.site_title.clone(),
        role: user.role.as_str(),
        user,
        class_name,
    })
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
