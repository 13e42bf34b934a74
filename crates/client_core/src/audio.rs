//! Hands the URL of an uploaded recording to whoever is waiting for it.

use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{ClientError, Result};

#[derive(Default)]
struct AudioState {
    pending: VecDeque<oneshot::Sender<String>>,
    saved_url: Option<String>,
    uploading: bool,
    failed: bool,
}

/// Cheap to clone; every clone shares the same pending queue.
#[derive(Clone, Default)]
pub struct AudioAttachmentCoordinator {
    state: Arc<Mutex<AudioState>>,
}

impl AudioAttachmentCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AudioState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn upload_started(&self) {
        let mut state = self.lock();
        state.uploading = true;
        state.failed = false;
        state.saved_url = None;
        debug!(pending = state.pending.len(), "audio upload started");
    }

    /// Resolves every waiting request with `url`, oldest first. Returns how
    /// many were resolved.
    pub fn file_saved(&self, url: &str) -> usize {
        let waiters = {
            let mut state = self.lock();
            state.uploading = false;
            state.failed = false;
            state.saved_url = Some(url.to_string());
            std::mem::take(&mut state.pending)
        };

        let mut resolved = 0;
        for waiter in waiters {
            // A dropped receiver means the requester went away.
            if waiter.send(url.to_string()).is_ok() {
                resolved += 1;
            }
        }
        debug!(resolved, url, "audio file saved");
        resolved
    }

    /// Abandons the in-flight upload; waiting requests, and any issued
    /// before the next upload starts, fail with
    /// [`ClientError::UploadAbandoned`].
    pub fn upload_failed(&self) -> usize {
        let mut state = self.lock();
        state.uploading = false;
        state.failed = true;
        state.saved_url = None;
        let dropped = state.pending.len();
        state.pending.clear();
        debug!(dropped, "audio upload failed");
        dropped
    }

    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// URL of the finished upload, or of the next one to finish.
    pub fn request_url(&self) -> impl Future<Output = Result<String>> + Send + 'static {
        let ready = {
            let mut state = self.lock();
            match (&state.saved_url, state.uploading) {
                (Some(url), false) => Ready::Now(Ok(url.clone())),
                (None, false) if state.failed => Ready::Now(Err(ClientError::UploadAbandoned)),
                _ => {
                    let (tx, rx) = oneshot::channel();
                    state.pending.push_back(tx);
                    Ready::Later(rx)
                }
            }
        };

        async move {
            match ready {
                Ready::Now(result) => result,
                Ready::Later(rx) => rx.await.map_err(|_| ClientError::UploadAbandoned),
            }
        }
    }
}

enum Ready {
    Now(Result<String>),
    Later(oneshot::Receiver<String>),
}

#[cfg(test)]
#[path = "tests/audio_tests.rs"]
mod tests;
