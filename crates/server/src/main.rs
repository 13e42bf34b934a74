use std::{net::SocketAddr, sync::Arc};

use axum::{routing::get, Router};
use storage::Storage;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod pages;

use app_state::AppState;
use config::{load_settings, normalize_database_url};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    for warning in &settings.warnings {
        warn!(%warning, "configuration");
    }

    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        storage,
        site_title: settings.site_title,
        default_exercise: settings.default_exercise,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::tasks_page))
        .route("/healthz", get(pages::healthz))
        .route("/train/:student_task", get(pages::train_page))
        .route("/revise", get(pages::revise_page))
        .route("/login", get(pages::login_page))
        .route("/signup", get(pages::signup_page))
        .route("/sentences/new", get(pages::new_sentence_page))
        .route("/tasks/new", get(pages::new_task_page))
        .route("/classes", get(pages::classes_page))
        .route("/classes/:class", get(pages::class_page))
        .route("/account", get(pages::account_page))
        .with_state(state)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
