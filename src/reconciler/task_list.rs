#[cfg(test)]
#[path = "task_list_test.rs"]
mod tests;

use crate::models::Task;

/// TaskList is the ordered local copy of the backend's tasks. Order is
/// arrival order and every id appears at most once.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new(tasks: Vec<Task>) -> TaskList {
        let mut list = TaskList::default();
        list.replace(tasks);
        list
    }

    /// replace drops the current content and takes the given tasks. Later
    /// duplicates of an id are ignored.
    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks.clear();
        for task in tasks {
            if self.contains(task.id()) {
                log::warn!("Ignoring duplicate task {} in list", task.id());
                continue;
            }
            self.tasks.push(task);
        }
    }

    /// insert appends the task after removing any entry with the same id.
    pub fn insert(&mut self, task: Task) {
        self.remove(task.id());
        self.tasks.push(task);
    }

    /// update replaces the entry with the same id in place. Unknown ids
    /// are not inserted. Returns whether an entry was replaced.
    pub fn update(&mut self, task: Task) -> bool {
        match self.position(task.id()) {
            Some(index) => {
                self.tasks[index] = task;
                true
            }
            None => false,
        }
    }

    /// remove deletes every entry with the given id. Returns whether
    /// anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id() != id);
        self.tasks.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
