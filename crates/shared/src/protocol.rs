use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ClassId, SentenceId, StudentTaskId, TaskId, UserSummary};

/// Success envelope used by every backend endpoint: `{ "status": "success", "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "success_status")]
    pub status: String,
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: success_status(),
            data,
        }
    }
}

fn success_status() -> String {
    "success".to_string()
}

/// Failure body: `{ "message": "..." }`, shown to the user verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub status: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSentenceRequest {
    pub sentence: String,
    pub translation: String,
    pub level: String,
    #[serde(default)]
    pub viva_ref: String,
    #[serde(default)]
    pub tense: String,
    #[serde(default)]
    pub grammar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Sentence search criteria, sent as the query string of `GET /api/v1/sentences`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tense: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grammar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viva_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Task metadata collected by the authoring form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetails {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<ClassId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(flatten)]
    pub details: TaskDetails,
    pub sentences: Vec<SentenceId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTask {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub sentences: Vec<SentenceId>,
}

/// One entry of the training log sent when a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedEntry {
    pub sentence: SentenceId,
    #[serde(rename = "student_answer")]
    pub student_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResultsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_task: Option<StudentTaskId>,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub initial_count: u32,
    pub finished: Vec<FinishedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionUpdateRequest {
    pub sentence: SentenceId,
    pub retest_days: u32,
    pub correct_attempts: u32,
    pub incorrect_attempts: u32,
    pub next_due: DateTime<Utc>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
