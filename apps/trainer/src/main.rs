use std::{fs, io::BufRead, path::PathBuf, sync::Arc, thread};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use client_core::{
    revise::REVISIONS_KEY, run_controller, train::SENTENCES_KEY, ApiClient, Capabilities,
    Clock, Controller, Emitter, EventBus, MemoryStore, ReviseController, TrainController,
    ViewEvent,
};
use shared::domain::{ExerciseKind, StudentTaskId};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod terminal;

use terminal::{ConsoleAlerts, LoggingNavigator, TerminalView};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Train,
    Revise,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    api_url: String,
    /// JSON file with the sentences (train) or revision items (revise).
    #[arg(long)]
    items: PathBuf,
    #[arg(long, value_enum, default_value = "train")]
    mode: Mode,
    #[arg(long, default_value = "translation")]
    exercise: String,
    #[arg(long)]
    student_task: Option<i64>,
}

/// Feeds stdin lines to the bus as an answer followed by `next`.
fn spawn_stdin_reader(emitter: Emitter) {
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            emitter.emit(ViewEvent::Answer {
                student_answer: line,
            });
            emitter.emit(ViewEvent::Next);
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let args = Args::parse();

    let kind = ExerciseKind::parse(&args.exercise)
        .ok_or_else(|| anyhow!("unknown exercise '{}'", args.exercise))?;
    let raw = fs::read_to_string(&args.items)
        .with_context(|| format!("failed to read {}", args.items.display()))?;
    let items: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", args.items.display()))?;

    let store = MemoryStore::new();
    let caps = Capabilities {
        api: Arc::new(ApiClient::new(&args.api_url)?),
        alerts: Arc::new(ConsoleAlerts),
        navigator: Arc::new(LoggingNavigator),
    };
    let (mut bus, emitter) = EventBus::channel();

    let mut controller: Box<dyn Controller> = match args.mode {
        Mode::Train => {
            store.set_local(SENTENCES_KEY, items);
            let mut controller = TrainController::from_local(
                &store,
                kind,
                args.student_task.map(StudentTaskId),
                Box::new(TerminalView::default()),
                caps,
                &bus,
            )?;
            controller.start().await;
            Box::new(controller)
        }
        Mode::Revise => {
            store.set_local(REVISIONS_KEY, items);
            let mut controller = ReviseController::from_local(
                &store,
                kind,
                Clock::Default,
                Box::new(TerminalView::default()),
                caps,
                &bus,
            )?;
            controller.start();
            Box::new(controller)
        }
    };

    info!(controller = controller.name(), "session running");
    spawn_stdin_reader(emitter);
    run_controller(controller.as_mut(), &mut bus).await;
    Ok(())
}
