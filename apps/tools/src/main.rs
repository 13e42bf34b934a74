use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use shared::domain::{ClassId, Role, SentenceId, TaskId, UserId};
use storage::{NewSentence, NewTask, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/trainer.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateUser {
        name: String,
        email: String,
        #[arg(long, default_value = "student")]
        role: String,
        #[arg(long)]
        class_id: Option<i64>,
    },
    CreateClass {
        teacher_id: i64,
        name: String,
    },
    CreateSentence {
        sentence: String,
        translation: String,
        level: String,
        #[arg(long, default_value = "")]
        viva_ref: String,
        #[arg(long, default_value = "")]
        tense: String,
        #[arg(long, default_value = "")]
        grammar: String,
        #[arg(long)]
        audio_url: Option<String>,
    },
    CreateTask {
        title: String,
        /// Sentence ids in the order they should be trained.
        #[arg(required = true)]
        sentences: Vec<i64>,
        #[arg(long, default_value = "")]
        description: String,
        /// Due date as YYYY-MM-DD.
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        class_id: Option<i64>,
    },
    AssignTask {
        student_id: i64,
        task_id: i64,
    },
}

/// Short code students type to join a class.
fn new_class_code() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_ascii_uppercase()
}

fn parse_due(raw: &str) -> Result<chrono::DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid due date '{raw}', expected YYYY-MM-DD"))?;
    let end_of_day = date
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| anyhow!("invalid due date '{raw}'"))?;
    Ok(Utc.from_utc_datetime(&end_of_day))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::CreateUser {
            name,
            email,
            role,
            class_id,
        } => {
            let role = Role::parse(&role).ok_or_else(|| anyhow!("unknown role '{role}'"))?;
            let user_id = storage
                .create_user(&name, &email, role, class_id.map(ClassId))
                .await?;
            println!("created user_id={}", user_id.0);
        }
        Command::CreateClass { teacher_id, name } => {
            let code = new_class_code();
            let class_id = storage
                .create_class(&name, &code, UserId(teacher_id))
                .await?;
            println!("created class_id={} class_code={code}", class_id.0);
        }
        Command::CreateSentence {
            sentence,
            translation,
            level,
            viva_ref,
            tense,
            grammar,
            audio_url,
        } => {
            let sentence_id = storage
                .create_sentence(&NewSentence {
                    sentence: &sentence,
                    translation: &translation,
                    level: &level,
                    viva_ref: &viva_ref,
                    tense: &tense,
                    grammar: &grammar,
                    audio_url: audio_url.as_deref(),
                })
                .await?;
            println!("created sentence_id={}", sentence_id.0);
        }
        Command::CreateTask {
            title,
            sentences,
            description,
            due,
            class_id,
        } => {
            let due_date = due.as_deref().map(parse_due).transpose()?;
            let sentences: Vec<SentenceId> = sentences.into_iter().map(SentenceId).collect();
            let task_id = storage
                .create_task(&NewTask {
                    title: &title,
                    description: &description,
                    due_date,
                    class_id: class_id.map(ClassId),
                    sentences: &sentences,
                })
                .await?;
            println!("created task_id={}", task_id.0);
        }
        Command::AssignTask {
            student_id,
            task_id,
        } => {
            let student_task = storage
                .assign_task(UserId(student_id), TaskId(task_id))
                .await?;
            println!("assigned student_task_id={}", student_task.0);
        }
    }

    Ok(())
}
