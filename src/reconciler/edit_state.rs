use crate::models::Task;

/// EditState tracks the draft title and the task selected for editing.
/// `Idle` when `selected` is empty, `Editing` otherwise.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EditState {
    selected: Option<String>,
    draft: String,
}

impl EditState {
    pub fn select(&mut self, task: &Task) {
        self.selected = Some(task.id().to_string());
        self.draft = task.title().to_string();
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref().filter(|id| !id.is_empty())
    }

    pub fn is_editing(&self) -> bool {
        self.selected().is_some()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn clear_draft(&mut self) {
        self.draft.clear();
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn clear(&mut self) {
        self.clear_selection();
        self.clear_draft();
    }
}
