#[cfg(test)]
#[path = "action_test.rs"]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::ArcBackend;
use crate::error_notice;
use crate::models::{Action, ArcEventTx, Event};
use eyre::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// ActionService turns user intents into backend requests. Every request
/// runs on its own task so a slow mutation never blocks the next one; the
/// results come back as events.
pub struct ActionService {
    backend: ArcBackend,
    action_rx: mpsc::UnboundedReceiver<Action>,
    event_tx: ArcEventTx,
    cancel_token: CancellationToken,
    pending_tasks: Arc<AtomicUsize>,
}

/// Decrements the pending counter when a request finishes, even on panic.
struct PendingGuard(Arc<AtomicUsize>);

impl PendingGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ActionService {
    pub fn new(
        backend: ArcBackend,
        action_rx: mpsc::UnboundedReceiver<Action>,
        event_tx: ArcEventTx,
        cancel_token: CancellationToken,
        pending_tasks: Arc<AtomicUsize>,
    ) -> ActionService {
        ActionService {
            backend,
            action_rx,
            event_tx,
            cancel_token,
            pending_tasks,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    log::debug!("Action service cancelled");
                    return Ok(());
                }

                action = self.action_rx.recv() => {
                    let Some(action) = action else {
                        log::debug!("Action channel closed");
                        return Ok(());
                    };
                    self.dispatch(action);
                }
            }
        }
    }

    fn dispatch(&self, action: Action) {
        log::debug!("Dispatching {:?}", action);
        let guard = PendingGuard::new(Arc::clone(&self.pending_tasks));
        let backend = Arc::clone(&self.backend);
        let event_tx = Arc::clone(&self.event_tx);

        // Not tied to the cancel token, shutdown waits for in-flight requests
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(err) = execute(&backend, action, &event_tx).await {
                log::error!("{:#}", err);
                event_tx
                    .send(Event::Notice(error_notice!(format!("{:#}", err))))
                    .await
                    .unwrap_or_else(|err| log::error!("Failed to send notice: {}", err));
            }
        });
    }
}

/// execute performs a single request. Mutations report nothing on success;
/// the change reaches the list through the subscriptions.
async fn execute(backend: &ArcBackend, action: Action, event_tx: &ArcEventTx) -> Result<()> {
    match action {
        Action::ListTasks => {
            let tasks = backend.list_tasks().await.wrap_err("loading tasks")?;
            log::info!("Fetched {} tasks from {}", tasks.len(), backend.name());
            event_tx.send(Event::TasksLoaded(tasks)).await?;
        }

        Action::CreateTask(title) => {
            let task = backend.create_task(title).await.wrap_err("creating task")?;
            log::info!("Created task {}", task.id());
        }

        Action::UpdateTask { id, title } => {
            let task = backend
                .update_task(id.clone(), title)
                .await
                .wrap_err(format!("updating task {}", id))?;
            log::info!("Updated task {}", task.id());
        }

        Action::DeleteTask(id) => {
            backend
                .delete_task(id.clone())
                .await
                .wrap_err(format!("deleting task {}", id))?;
            log::info!("Deleted task {}", id);
        }
    }
    Ok(())
}
