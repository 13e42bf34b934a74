use std::{collections::HashMap, fs};

use shared::domain::ExerciseKind;
const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub site_title: String,
    pub default_exercise: ExerciseKind,
    pub log_filter: String,
    /// Problems found while loading; logged once the subscriber is up.
    pub warnings: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/trainer.db".into(),
            site_title: "Sentence Trainer".into(),
            default_exercise: ExerciseKind::Translation,
            log_filter: "info".into(),
            warnings: Vec::new(),
        }
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    settings_from_sources(file.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the flat `server.toml` table, then environment variables.
pub fn settings_from_sources(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("bind_addr") {
                    settings.server_bind = v.clone();
                }
                if let Some(v) = file_cfg.get("database_url") {
                    settings.database_url = v.clone();
                }
                if let Some(v) = file_cfg.get("site_title") {
                    settings.site_title = v.clone();
                }
                if let Some(v) = file_cfg.get("default_exercise") {
                    set_exercise(&mut settings, v);
                }
                if let Some(v) = file_cfg.get("log_filter") {
                    settings.log_filter = v.clone();
                }
            }
            Err(error) => settings
                .warnings
                .push(format!("ignoring unreadable {SETTINGS_FILE}: {error}")),
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__SITE_TITLE") {
        settings.site_title = v;
    }
    if let Some(v) = env("APP__DEFAULT_EXERCISE") {
        set_exercise(&mut settings, &v);
    }
    if let Some(v) = env("RUST_LOG") {
        settings.log_filter = v;
    }

    settings
}

fn set_exercise(settings: &mut Settings, raw: &str) {
    match ExerciseKind::parse(raw) {
        Some(kind) => settings.default_exercise = kind,
        None => {
            let kept = settings.default_exercise.as_str();
            settings
                .warnings
                .push(format!("unknown default exercise '{raw}', keeping {kept}"));
        }
    }
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        if is_windows_absolute(path) {
            return format!("sqlite:{}", path.replace('\\', "/"));
        }
        return raw_database_url.to_string();
    }

    if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        if is_windows_absolute(&path) {
            return format!("sqlite:{path}");
        }
        return format!("sqlite://{path}");
    }

    let path = raw_database_url.replace('\\', "/");
    if is_windows_absolute(&path) {
        return format!("sqlite:{path}");
    }
    format!("sqlite://{path}")
}

fn is_windows_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
