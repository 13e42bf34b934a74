use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(ClassId);
id_newtype!(SentenceId);
id_newtype!(TaskId);
id_newtype!(StudentTaskId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentTaskStatus {
    #[default]
    Assigned,
    Completed,
}

impl StudentTaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StudentTaskStatus::Assigned => "assigned",
            StudentTaskStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("completed") {
            StudentTaskStatus::Completed
        } else {
            StudentTaskStatus::Assigned
        }
    }
}

/// Which way a sentence is turned into an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    /// Prompt with the sentence, expect the translation.
    #[default]
    Translation,
    /// Prompt with the translation, expect the sentence.
    Reverse,
    /// Prompt with the sentence minus its longest word, expect that word.
    Cloze,
    /// Play the recording, expect the sentence.
    Audio,
}

impl ExerciseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::Translation => "translation",
            ExerciseKind::Reverse => "reverse",
            ExerciseKind::Cloze => "cloze",
            ExerciseKind::Audio => "audio",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "translation" => Some(ExerciseKind::Translation),
            "reverse" => Some(ExerciseKind::Reverse),
            "cloze" => Some(ExerciseKind::Cloze),
            "audio" => Some(ExerciseKind::Audio),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: SentenceId,
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

/// One presentable unit of a training or revision session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseItem {
    pub sentence_id: SentenceId,
    pub kind: ExerciseKind,
    pub prompt: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub sentence_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub sentences: Vec<Sentence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentTask {
    pub id: StudentTaskId,
    pub student_id: UserId,
    pub task: TaskSummary,
    pub status: StudentTaskStatus,
    pub correct_count: u32,
    pub incorrect_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub id: ClassId,
    pub name: String,
    pub class_code: String,
    pub teacher_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<ClassId>,
}

/// Spaced-repetition state of one sentence for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionItem {
    pub sentence: Sentence,
    pub retest_days: u32,
    pub correct_attempts: u32,
    pub incorrect_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_due: Option<DateTime<Utc>>,
}
