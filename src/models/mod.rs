pub mod action;
pub mod change;
pub mod event;
pub mod notice;
pub mod task;

pub use action::Action;
pub use change::{ChangeError, SubscriptionKind, TaskChange};
pub use event::{ArcEventTx, Event, EventTx};
pub use notice::*;
pub use task::Task;
