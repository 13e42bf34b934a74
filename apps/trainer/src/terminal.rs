use std::time::Duration;

use client_core::{
    session::Tally,
    view::{AlertKind, Alerts, Navigator, SessionCounts, TrainingView},
};
use tracing::info;

/// Training view that prints to stdout.
#[derive(Default)]
pub struct TerminalView {
    expected: String,
}

impl TrainingView for TerminalView {
    fn set_prompt(&mut self, prompt: &str) {
        if prompt.is_empty() {
            println!("\n(listen and type what you hear)");
        } else {
            println!("\n> {prompt}");
        }
    }

    fn set_answer(&mut self, answer: &str) {
        self.expected = answer.to_string();
    }

    fn set_audio_url(&mut self, url: Option<&str>) {
        if let Some(url) = url {
            println!("  audio: {url}");
        }
    }

    fn show_result(&mut self, is_correct: bool, expected: &str) {
        if is_correct {
            println!("  correct");
        } else {
            println!("  incorrect, expected: {expected}");
        }
    }

    fn update_counts(&mut self, counts: SessionCounts) {
        println!("  {}", format_counts(counts));
    }

    fn finish(&mut self, tally: &Tally) {
        println!(
            "\nFinished: {} correct, {} incorrect over {} items",
            tally.correct, tally.incorrect, tally.initial
        );
    }
}

pub fn format_counts(counts: SessionCounts) -> String {
    format!(
        "{} correct | {} incorrect | {} left",
        counts.correct, counts.incorrect, counts.remaining
    )
}

pub struct ConsoleAlerts;

impl Alerts for ConsoleAlerts {
    fn show(&self, kind: AlertKind, message: &str) {
        eprintln!("[{}] {message}", kind.as_str());
    }
}

/// There is no page to leave in a terminal; the requested navigation is logged.
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn assign_after(&self, path: &str, delay: Duration) {
        info!(path, delay_ms = delay.as_millis() as u64, "navigation requested");
    }
}
