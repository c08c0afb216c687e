#[cfg(test)]
#[path = "change_test.rs"]
mod tests;

use std::fmt::Display;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::Task;

/// The three realtime streams the backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    Created,
    Updated,
    Deleted,
}

/// A change notification that passed validation at the subscription
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    Created(Task),
    Updated(Task),
    Deleted(String), // Task ID
}

#[derive(Debug, Error)]
pub enum ChangeError {
    #[error("payload has no data.{0}")]
    MissingField(&'static str),

    #[error("malformed {field} payload: {source}")]
    Malformed {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} payload carries an empty id")]
    EmptyId(&'static str),
}

/// Deletion events only need the identifier.
#[derive(Deserialize)]
struct DeletedTask {
    id: String,
}

impl SubscriptionKind {
    pub const ALL: [SubscriptionKind; 3] = [
        SubscriptionKind::Created,
        SubscriptionKind::Updated,
        SubscriptionKind::Deleted,
    ];

    /// Name of the subscription field in the GraphQL schema.
    pub fn field(&self) -> &'static str {
        match self {
            SubscriptionKind::Created => "onCreateTask",
            SubscriptionKind::Updated => "onUpdateTask",
            SubscriptionKind::Deleted => "onDeleteTask",
        }
    }
}

impl Display for SubscriptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.field())
    }
}

impl TaskChange {
    /// decode validates a subscription `next` payload of the form
    /// `{"data": {"<field>": {...}}}`.
    pub fn decode(kind: SubscriptionKind, payload: &Value) -> Result<TaskChange, ChangeError> {
        let field = kind.field();
        let raw = payload
            .get("data")
            .and_then(|data| data.get(field))
            .filter(|value| !value.is_null())
            .ok_or(ChangeError::MissingField(field))?
            .clone();

        let change = match kind {
            SubscriptionKind::Created => TaskChange::Created(parse_task(field, raw)?),
            SubscriptionKind::Updated => TaskChange::Updated(parse_task(field, raw)?),
            SubscriptionKind::Deleted => {
                let deleted: DeletedTask = serde_json::from_value(raw)
                    .map_err(|source| ChangeError::Malformed { field, source })?;
                if deleted.id.is_empty() {
                    return Err(ChangeError::EmptyId(field));
                }
                TaskChange::Deleted(deleted.id)
            }
        };
        Ok(change)
    }

    pub fn id(&self) -> &str {
        match self {
            TaskChange::Created(task) | TaskChange::Updated(task) => task.id(),
            TaskChange::Deleted(id) => id,
        }
    }

    pub fn kind(&self) -> SubscriptionKind {
        match self {
            TaskChange::Created(_) => SubscriptionKind::Created,
            TaskChange::Updated(_) => SubscriptionKind::Updated,
            TaskChange::Deleted(_) => SubscriptionKind::Deleted,
        }
    }
}

fn parse_task(field: &'static str, raw: Value) -> Result<Task, ChangeError> {
    let task: Task =
        serde_json::from_value(raw).map_err(|source| ChangeError::Malformed { field, source })?;
    if task.id().is_empty() {
        return Err(ChangeError::EmptyId(field));
    }
    Ok(task)
}
