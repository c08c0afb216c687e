//! Client-side reconciliation of the task list.
//!
//! The backend is the source of truth. Local state only changes when a
//! bulk load or a change notification arrives; user actions become
//! [`Action`]s and their effect is observed through the notifications.
//! Every handler tolerates duplicates and arbitrary ordering between the
//! three streams and in-flight requests.

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;

pub mod edit_state;
pub mod task_list;

pub use edit_state::EditState;
pub use task_list::TaskList;

use crate::models::{Action, Task, TaskChange};

#[derive(Debug, Default)]
pub struct Reconciler {
    tasks: TaskList,
    edit: EditState,
}

impl Reconciler {
    pub fn new() -> Reconciler {
        Reconciler::default()
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn edit_state(&self) -> &EditState {
        &self.edit
    }

    pub fn draft(&self) -> &str {
        self.edit.draft()
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.edit.set_draft(draft);
    }

    /// load replaces the local collection with the result of a bulk fetch.
    pub fn load(&mut self, tasks: Vec<Task>) {
        log::debug!("Loaded {} tasks", tasks.len());
        self.tasks.replace(tasks);
    }

    pub fn apply(&mut self, change: TaskChange) {
        match change {
            TaskChange::Created(task) => self.apply_created(task),
            TaskChange::Updated(task) => self.apply_updated(task),
            TaskChange::Deleted(id) => self.apply_deleted(&id),
        }
    }

    fn apply_created(&mut self, task: Task) {
        log::debug!("Task {} created", task.id());
        self.tasks.insert(task);
        // The draft belongs to whoever issued the create
        self.edit.clear_draft();
    }

    fn apply_updated(&mut self, task: Task) {
        let id = task.id().to_string();
        if !self.tasks.update(task) {
            log::debug!("Dropping update for unknown task {}", id);
        }
        self.edit.clear();
    }

    fn apply_deleted(&mut self, id: &str) {
        if !self.tasks.remove(id) {
            log::debug!("Task {} already gone", id);
        }

        if self.edit.selected() == Some(id) {
            log::debug!("Task {} deleted while being edited", id);
            self.edit.clear_selection();
        }
    }

    /// select_for_edit switches the form to update mode for the given task.
    pub fn select_for_edit(&mut self, task: &Task) {
        self.edit.select(task);
    }

    pub fn cancel_edit(&mut self) {
        self.edit.clear();
    }

    /// editing returns the selected task when it still exists locally.
    pub fn editing(&self) -> Option<&Task> {
        self.edit.selected().and_then(|id| self.tasks.get(id))
    }

    /// submit turns the draft into a request: an update of the selected
    /// task if it is still present, otherwise a create.
    pub fn submit(&self) -> Action {
        let title = self.edit.draft().to_string();
        match self.editing() {
            Some(task) => Action::UpdateTask {
                id: task.id().to_string(),
                title,
            },
            None => Action::CreateTask(title),
        }
    }

    pub fn delete(&self, id: &str) -> Action {
        Action::DeleteTask(id.to_string())
    }
}
