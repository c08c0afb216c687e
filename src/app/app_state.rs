#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use ratatui::widgets::ListState;

use crate::error_notice;
use crate::models::{NoticeMessage, Task, TaskChange};
use crate::reconciler::Reconciler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Live,
    Offline(Option<String>),
}

/// AppState is everything the UI renders. The app loop is its only writer.
pub(crate) struct AppState {
    pub reconciler: Reconciler,
    pub cursor: ListState,
    pub status: ConnectionStatus,
    pub loading: bool,
}

impl AppState {
    pub fn new() -> AppState {
        AppState {
            reconciler: Reconciler::new(),
            cursor: ListState::default(),
            status: ConnectionStatus::Connecting,
            loading: true,
        }
    }

    pub fn load(&mut self, tasks: Vec<Task>) {
        self.loading = false;
        self.keep_cursor(|state| state.reconciler.load(tasks));
    }

    pub fn apply(&mut self, change: TaskChange) {
        self.keep_cursor(|state| state.reconciler.apply(change));
    }

    /// go_offline records a lost realtime connection and returns the one
    /// notice shown for it.
    pub fn go_offline(&mut self, reason: Option<String>) -> NoticeMessage {
        let notice = error_notice!(format!(
            "Realtime updates stopped: {}. Press Ctrl+R to refresh the list.",
            reason.as_deref().unwrap_or("connection dropped")
        ));
        self.status = ConnectionStatus::Offline(reason);
        notice
    }

    /// highlighted returns the task under the cursor.
    pub fn highlighted(&self) -> Option<&Task> {
        self.cursor
            .selected()
            .and_then(|index| self.reconciler.tasks().tasks().get(index))
    }

    pub fn cursor_up(&mut self) {
        if self.reconciler.tasks().is_empty() {
            return;
        }
        let index = self.cursor.selected().unwrap_or(0);
        self.cursor.select(Some(index.saturating_sub(1)));
    }

    pub fn cursor_down(&mut self) {
        let len = self.reconciler.tasks().len();
        if len == 0 {
            return;
        }
        let index = self.cursor.selected().map_or(0, |index| index + 1);
        self.cursor.select(Some(index.min(len - 1)));
    }

    /// Runs a mutation while keeping the cursor on the same task when it
    /// survives, otherwise on the nearest row.
    fn keep_cursor(&mut self, mutate: impl FnOnce(&mut AppState)) {
        let highlighted = self.highlighted().map(|task| task.id().to_string());
        mutate(self);

        let tasks = self.reconciler.tasks();
        if tasks.is_empty() {
            self.cursor.select(None);
            return;
        }

        let index = highlighted
            .and_then(|id| tasks.position(&id))
            .or(self.cursor.selected())
            .unwrap_or(0)
            .min(tasks.len() - 1);
        self.cursor.select(Some(index));
    }
}
