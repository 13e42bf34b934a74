use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{
    ClassId, ClassSummary, RevisionItem, Role, Sentence, SentenceId, StudentTask, StudentTaskId,
    StudentTaskStatus, Task, TaskId, TaskSummary, UserId, UserSummary,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct NewSentence<'a> {
    pub sentence: &'a str,
    pub translation: &'a str,
    pub level: &'a str,
    pub viva_ref: &'a str,
    pub tense: &'a str,
    pub grammar: &'a str,
    pub audio_url: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct NewTask<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub due_date: Option<DateTime<Utc>>,
    pub class_id: Option<ClassId>,
    pub sentences: &'a [SentenceId],
}

/// A student task together with the sentences of its task, in task order.
#[derive(Debug, Clone)]
pub struct StudentTaskWithSentences {
    pub student_task: StudentTask,
    pub task: Task,
}

#[derive(Debug, Clone)]
pub struct StoredRevision {
    pub sentence_id: SentenceId,
    pub retest_days: u32,
    pub correct_attempts: u32,
    pub incorrect_attempts: u32,
    pub next_due: Option<DateTime<Utc>>,
}

const SENTENCE_COLUMNS: &str =
    "s.id, s.sentence, s.translation, s.level, s.viva_ref, s.tense, s.grammar, s.audio_url";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // Every connection to `sqlite::memory:` opens a separate database.
        let max_connections = if database_url.starts_with("sqlite::memory:") {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        role: Role,
        class_id: Option<ClassId>,
    ) -> Result<UserId> {
        let rec = sqlx::query(
            "INSERT INTO users (name, email, role, class_id) VALUES (?, ?, ?, ?)
             ON CONFLICT(email) DO UPDATE SET name=excluded.name, role=excluded.role, class_id=excluded.class_id
             RETURNING id",
        )
        .bind(name)
        .bind(email.trim().to_ascii_lowercase())
        .bind(role.as_str())
        .bind(class_id.map(|id| id.0))
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to create user '{email}'"))?;
        Ok(UserId(rec.get::<i64, _>(0)))
    }

    pub async fn load_user(&self, user_id: UserId) -> Result<Option<UserSummary>> {
        let row = sqlx::query("SELECT id, name, email, role, class_id FROM users WHERE id = ?")
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn create_class(
        &self,
        name: &str,
        class_code: &str,
        teacher_id: UserId,
    ) -> Result<ClassId> {
        let rec = sqlx::query(
            "INSERT INTO classes (name, class_code, teacher_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(name)
        .bind(class_code)
        .bind(teacher_id.0)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to create class '{name}'"))?;
        Ok(ClassId(rec.get::<i64, _>(0)))
    }

    pub async fn load_class(&self, class_id: ClassId) -> Result<Option<ClassSummary>> {
        let row =
            sqlx::query("SELECT id, name, class_code, teacher_id FROM classes WHERE id = ?")
                .bind(class_id.0)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.as_ref().map(class_from_row))
    }

    pub async fn list_classes_for_teacher(&self, teacher_id: UserId) -> Result<Vec<ClassSummary>> {
        let rows = sqlx::query(
            "SELECT id, name, class_code, teacher_id FROM classes WHERE teacher_id = ? ORDER BY name",
        )
        .bind(teacher_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(class_from_row).collect())
    }

    pub async fn list_students_in_class(&self, class_id: ClassId) -> Result<Vec<UserSummary>> {
        let rows = sqlx::query(
            "SELECT id, name, email, role, class_id FROM users
             WHERE class_id = ? AND role = 'student'
             ORDER BY name",
        )
        .bind(class_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    pub async fn create_sentence(&self, new: &NewSentence<'_>) -> Result<SentenceId> {
        let rec = sqlx::query(
            "INSERT INTO sentences (sentence, translation, level, viva_ref, tense, grammar, audio_url)
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(new.sentence)
        .bind(new.translation)
        .bind(new.level)
        .bind(new.viva_ref)
        .bind(new.tense)
        .bind(new.grammar)
        .bind(new.audio_url)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert sentence")?;
        Ok(SentenceId(rec.get::<i64, _>(0)))
    }

    pub async fn load_sentence(&self, sentence_id: SentenceId) -> Result<Option<Sentence>> {
        let row = sqlx::query(&format!("SELECT {SENTENCE_COLUMNS} FROM sentences s WHERE s.id = ?"))
            .bind(sentence_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(sentence_from_row))
    }

    /// Creates a task whose sentences keep the order of `new.sentences`.
    pub async fn create_task(&self, new: &NewTask<'_>) -> Result<TaskId> {
        let mut tx = self.pool.begin().await?;
        let rec = sqlx::query(
            "INSERT INTO tasks (title, description, due_date, class_id) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(new.title)
        .bind(new.description)
        .bind(new.due_date)
        .bind(new.class_id.map(|id| id.0))
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("failed to insert task '{}'", new.title))?;
        let task_id = TaskId(rec.get::<i64, _>(0));

        for (position, sentence_id) in new.sentences.iter().enumerate() {
            sqlx::query(
                "INSERT INTO task_sentences (task_id, sentence_id, position) VALUES (?, ?, ?)
                 ON CONFLICT(task_id, sentence_id) DO NOTHING",
            )
            .bind(task_id.0)
            .bind(sentence_id.0)
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to attach sentence {sentence_id} to task {task_id}"))?;
        }

        tx.commit().await?;
        Ok(task_id)
    }

    pub async fn load_task(&self, task_id: TaskId) -> Result<Option<Task>> {
        let Some(row) =
            sqlx::query("SELECT id, title, description, due_date FROM tasks WHERE id = ?")
                .bind(task_id.0)
                .fetch_optional(&self.pool)
                .await?
        else {
            return Ok(None);
        };

        let sentences = self.task_sentences(task_id).await?;
        Ok(Some(Task {
            id: task_id,
            title: row.get::<String, _>(1),
            description: row.get::<String, _>(2),
            due_date: row.get::<Option<DateTime<Utc>>, _>(3),
            sentences,
        }))
    }

    async fn task_sentences(&self, task_id: TaskId) -> Result<Vec<Sentence>> {
        let rows = sqlx::query(&format!(
            "SELECT {SENTENCE_COLUMNS}
             FROM sentences s
             INNER JOIN task_sentences ts ON ts.sentence_id = s.id
             WHERE ts.task_id = ?
             ORDER BY ts.position"
        ))
        .bind(task_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(sentence_from_row).collect())
    }

    pub async fn assign_task(&self, student_id: UserId, task_id: TaskId) -> Result<StudentTaskId> {
        let rec = sqlx::query(
            "INSERT INTO student_tasks (student_id, task_id) VALUES (?, ?)
             ON CONFLICT(student_id, task_id) DO UPDATE SET student_id=excluded.student_id
             RETURNING id",
        )
        .bind(student_id.0)
        .bind(task_id.0)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to assign task {task_id} to user {student_id}"))?;
        Ok(StudentTaskId(rec.get::<i64, _>(0)))
    }

    pub async fn record_task_result(
        &self,
        student_task_id: StudentTaskId,
        correct_count: u32,
        incorrect_count: u32,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE student_tasks
             SET status = 'completed', correct_count = ?, incorrect_count = ?
             WHERE id = ?",
        )
        .bind(i64::from(correct_count))
        .bind(i64::from(incorrect_count))
        .bind(student_task_id.0)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_student_tasks(&self, student_id: UserId) -> Result<Vec<StudentTask>> {
        let rows = sqlx::query(
            "SELECT st.id, st.student_id, st.status, st.correct_count, st.incorrect_count,
                    t.id, t.title, t.description, t.due_date,
                    (SELECT COUNT(*) FROM task_sentences ts WHERE ts.task_id = t.id)
             FROM student_tasks st
             INNER JOIN tasks t ON t.id = st.task_id
             WHERE st.student_id = ?
             ORDER BY st.status, t.due_date IS NULL, t.due_date, st.id",
        )
        .bind(student_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(student_task_from_row).collect())
    }

    pub async fn load_student_task(
        &self,
        student_task_id: StudentTaskId,
    ) -> Result<Option<StudentTaskWithSentences>> {
        let Some(row) = sqlx::query(
            "SELECT st.id, st.student_id, st.status, st.correct_count, st.incorrect_count,
                    t.id, t.title, t.description, t.due_date,
                    (SELECT COUNT(*) FROM task_sentences ts WHERE ts.task_id = t.id)
             FROM student_tasks st
             INNER JOIN tasks t ON t.id = st.task_id
             WHERE st.id = ?",
        )
        .bind(student_task_id.0)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let student_task = student_task_from_row(&row);
        let task = self
            .load_task(student_task.task.id)
            .await?
            .with_context(|| format!("student task {student_task_id} references a missing task"))?;
        Ok(Some(StudentTaskWithSentences { student_task, task }))
    }

    pub async fn upsert_revision(&self, student_id: UserId, revision: &StoredRevision) -> Result<()> {
        sqlx::query(
            "INSERT INTO revision_items
                (student_id, sentence_id, retest_days, correct_attempts, incorrect_attempts, next_due)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(student_id, sentence_id) DO UPDATE SET
                retest_days=excluded.retest_days,
                correct_attempts=excluded.correct_attempts,
                incorrect_attempts=excluded.incorrect_attempts,
                next_due=excluded.next_due",
        )
        .bind(student_id.0)
        .bind(revision.sentence_id.0)
        .bind(i64::from(revision.retest_days))
        .bind(i64::from(revision.correct_attempts))
        .bind(i64::from(revision.incorrect_attempts))
        .bind(revision.next_due)
        .execute(&self.pool)
        .await
        .with_context(|| {
            format!(
                "failed to store revision of sentence {} for user {student_id}",
                revision.sentence_id
            )
        })?;
        Ok(())
    }

    /// Revision items that were never scheduled or whose due date is not after `now`.
    pub async fn list_due_revisions(
        &self,
        student_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<RevisionItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {SENTENCE_COLUMNS},
                    r.retest_days, r.correct_attempts, r.incorrect_attempts, r.next_due
             FROM revision_items r
             INNER JOIN sentences s ON s.id = r.sentence_id
             WHERE r.student_id = ?
             ORDER BY r.sentence_id"
        ))
        .bind(student_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| RevisionItem {
                sentence: sentence_from_row(r),
                retest_days: to_u32(r.get::<i64, _>(8)),
                correct_attempts: to_u32(r.get::<i64, _>(9)),
                incorrect_attempts: to_u32(r.get::<i64, _>(10)),
                next_due: r.get::<Option<DateTime<Utc>>, _>(11),
            })
            .filter(|item| item.next_due.map_or(true, |due| due <= now))
            .collect())
    }
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn user_from_row(r: &SqliteRow) -> UserSummary {
    UserSummary {
        id: UserId(r.get::<i64, _>(0)),
        name: r.get::<String, _>(1),
        email: r.get::<String, _>(2),
        role: Role::parse(&r.get::<String, _>(3)).unwrap_or(Role::Student),
        class_id: r.get::<Option<i64>, _>(4).map(ClassId),
    }
}

fn class_from_row(r: &SqliteRow) -> ClassSummary {
    ClassSummary {
        id: ClassId(r.get::<i64, _>(0)),
        name: r.get::<String, _>(1),
        class_code: r.get::<String, _>(2),
        teacher_id: UserId(r.get::<i64, _>(3)),
    }
}

fn sentence_from_row(r: &SqliteRow) -> Sentence {
    Sentence {
        id: SentenceId(r.get::<i64, _>(0)),
        sentence: r.get::<String, _>(1),
        translation: r.get::<String, _>(2),
        level: r.get::<String, _>(3),
        viva_ref: r.get::<String, _>(4),
        tense: r.get::<String, _>(5),
        grammar: r.get::<String, _>(6),
        audio_url: r.get::<Option<String>, _>(7),
    }
}

fn student_task_from_row(r: &SqliteRow) -> StudentTask {
    StudentTask {
        id: StudentTaskId(r.get::<i64, _>(0)),
        student_id: UserId(r.get::<i64, _>(1)),
        status: StudentTaskStatus::parse(&r.get::<String, _>(2)),
        correct_count: to_u32(r.get::<i64, _>(3)),
        incorrect_count: to_u32(r.get::<i64, _>(4)),
        task: TaskSummary {
            id: TaskId(r.get::<i64, _>(5)),
            title: r.get::<String, _>(6),
            description: r.get::<String, _>(7),
            due_date: r.get::<Option<DateTime<Utc>>, _>(8),
            sentence_count: to_u32(r.get::<i64, _>(9)),
        },
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
