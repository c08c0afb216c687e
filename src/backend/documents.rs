//! GraphQL documents for the task schema.

use crate::models::SubscriptionKind;

pub const LIST_TASKS: &str = r#"query ListTasks($limit: Int, $nextToken: String) {
  listTasks(limit: $limit, nextToken: $nextToken) {
    items {
      id
      title
    }
    nextToken
  }
}"#;

pub const CREATE_TASK: &str = r#"mutation CreateTask($input: CreateTaskInput!) {
  createTask(input: $input) {
    id
    title
  }
}"#;

pub const UPDATE_TASK: &str = r#"mutation UpdateTask($input: UpdateTaskInput!) {
  updateTask(input: $input) {
    id
    title
  }
}"#;

pub const DELETE_TASK: &str = r#"mutation DeleteTask($input: DeleteTaskInput!) {
  deleteTask(input: $input) {
    id
    title
  }
}"#;

pub const ON_CREATE_TASK: &str = r#"subscription OnCreateTask {
  onCreateTask {
    id
    title
  }
}"#;

pub const ON_UPDATE_TASK: &str = r#"subscription OnUpdateTask {
  onUpdateTask {
    id
    title
  }
}"#;

pub const ON_DELETE_TASK: &str = r#"subscription OnDeleteTask {
  onDeleteTask {
    id
  }
}"#;

pub fn subscription(kind: SubscriptionKind) -> &'static str {
    match kind {
        SubscriptionKind::Created => ON_CREATE_TASK,
        SubscriptionKind::Updated => ON_UPDATE_TASK,
        SubscriptionKind::Deleted => ON_DELETE_TASK,
    }
}
