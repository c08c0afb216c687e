use std::sync::Arc;

use tokio::sync::mpsc;
use tui_textarea::Input;

use super::{NoticeMessage, Task, TaskChange};

#[derive(Debug)]
pub enum Event {
    Notice(NoticeMessage),

    TasksLoaded(Vec<Task>),
    TaskChanged(TaskChange),
    SubscriptionReady,
    SubscriptionClosed(Option<String>), // Reason

    KeyboardCharInput(Input),
    KeyboardEsc,
    KeyboardEnter,
    KeyboardCtrlD,
    KeyboardCtrlE,
    KeyboardCtrlR,
    KeyboardF1,
    KeyboardPaste(String),

    Quit,

    UiTick,
    UiScrollUp,
    UiScrollDown,
}

#[async_trait::async_trait]
pub trait EventTx {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>>;
}

#[async_trait::async_trait]
impl EventTx for mpsc::Sender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event).await
    }
}

#[async_trait::async_trait]
impl EventTx for mpsc::UnboundedSender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event)
    }
}

pub type ArcEventTx = Arc<dyn EventTx + Send + Sync>;
