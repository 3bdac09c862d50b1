//! Debounced background saving of the session.
//!
//! Every change marks the session dirty and pushes the save deadline out by
//! the debounce interval. When the deadline passes, only the latest snapshot
//! is written. `flush` and `shutdown` write whatever is still pending.

use std::sync::Arc;
use std::time::Duration;

use seo_brief_sdk::log_state_saved;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::services::SessionStore;
use crate::session::SessionState;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1500);

enum SaverCommand {
    Changed(Box<SessionState>),
    Flush(oneshot::Sender<anyhow::Result<()>>),
    Shutdown(oneshot::Sender<anyhow::Result<()>>),
}

/// Latest unsaved snapshot and when it becomes due
struct Pending {
    state: Option<SessionState>,
    deadline: Option<Instant>,
    debounce: Duration,
}

impl Pending {
    fn mark(&mut self, state: SessionState) {
        self.state = Some(state);
        self.deadline = Some(Instant::now() + self.debounce);
    }

    fn take(&mut self) -> Option<SessionState> {
        self.deadline = None;
        self.state.take()
    }
}

/// Handle to the background save task
pub struct AutoSaver {
    tx: mpsc::UnboundedSender<SaverCommand>,
    handle: JoinHandle<()>,
}

impl AutoSaver {
    pub fn spawn(store: Arc<dyn SessionStore>, debounce: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<SaverCommand>();

        let handle = tokio::spawn(async move {
            let mut pending = Pending {
                state: None,
                deadline: None,
                debounce,
            };

            loop {
                let deadline = pending.deadline;

                tokio::select! {
                    cmd = rx.recv() => match cmd {
                        Some(SaverCommand::Changed(state)) => pending.mark(*state),
                        Some(SaverCommand::Flush(reply)) => {
                            let result = write(store.as_ref(), pending.take()).await;
                            let _ = reply.send(result);
                        }
                        Some(SaverCommand::Shutdown(reply)) => {
                            let result = write(store.as_ref(), pending.take()).await;
                            let _ = reply.send(result);
                            break;
                        }
                        // All handles dropped without shutdown: still write the tail
                        None => {
                            if let Err(e) = write(store.as_ref(), pending.take()).await {
                                tracing::warn!(error = %e, "final autosave failed");
                            }
                            break;
                        }
                    },
                    () = async {
                        if let Some(deadline) = deadline {
                            time::sleep_until(deadline).await;
                        }
                    }, if deadline.is_some() => {
                        if let Err(e) = write(store.as_ref(), pending.take()).await {
                            tracing::warn!(error = %e, "autosave failed");
                        }
                    }
                }
            }
        });

        Self { tx, handle }
    }

    /// Record a new snapshot. Cheap to call on every change.
    pub fn mark_dirty(&self, state: &SessionState) {
        if self
            .tx
            .send(SaverCommand::Changed(Box::new(state.clone())))
            .is_err()
        {
            tracing::warn!(brief_id = %state.id, "autosave task is gone, change not queued");
        }
    }

    /// Write the pending snapshot now, if any
    pub async fn flush(&self) -> anyhow::Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SaverCommand::Flush(reply))
            .map_err(|_| anyhow::anyhow!("autosave task is gone"))?;
        rx.await
            .map_err(|_| anyhow::anyhow!("autosave task dropped the flush"))?
    }

    /// Write the pending snapshot and stop the task
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SaverCommand::Shutdown(reply))
            .map_err(|_| anyhow::anyhow!("autosave task is gone"))?;
        let result = rx
            .await
            .map_err(|_| anyhow::anyhow!("autosave task dropped the shutdown"))?;
        let _ = self.handle.await;
        result
    }
}

async fn write(store: &dyn SessionStore, state: Option<SessionState>) -> anyhow::Result<()> {
    let Some(state) = state else {
        return Ok(());
    };
    store.save(&state).await?;
    tracing::debug!(brief_id = %state.id, "session saved");
    log_state_saved!(&state.id, format!("{} (step {})", state.name, state.wizard.step));
    Ok(())
}
