/// Requests the UI hands to the action service. None of them touch local
/// state; their effect comes back as an `Event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ListTasks,
    CreateTask(String), // Title
    UpdateTask { id: String, title: String },
    DeleteTask(String), // Task ID
}
