use super::*;

use std::time::Duration;

use crate::backend::MockBackend;
use crate::models::{NoticeKind, Task};

struct Harness {
    action_tx: mpsc::UnboundedSender<Action>,
    event_rx: mpsc::UnboundedReceiver<Event>,
    pending_tasks: Arc<AtomicUsize>,
    token: CancellationToken,
}

fn start(backend: MockBackend) -> Harness {
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
    let token = CancellationToken::new();
    let pending_tasks = Arc::new(AtomicUsize::new(0));

    let mut service = ActionService::new(
        Arc::new(backend),
        action_rx,
        Arc::new(event_tx),
        token.clone(),
        pending_tasks.clone(),
    );
    tokio::spawn(async move { service.run().await });

    Harness {
        action_tx,
        event_rx,
        pending_tasks,
        token,
    }
}

impl Harness {
    async fn next_event(&mut self) -> Event {
        tokio::time::timeout(Duration::from_secs(2), self.event_rx.recv())
            .await
            .expect("Timed out waiting for event")
            .expect("Event channel closed")
    }

    async fn wait_idle(&self) {
        // The counter goes up as soon as the action is dispatched
        tokio::time::sleep(Duration::from_millis(20)).await;
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.pending_tasks.load(Ordering::SeqCst) > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Requests did not finish");
    }
}

#[tokio::test]
async fn test_list_tasks_emits_loaded() {
    let mut backend = MockBackend::new();
    backend.expect_name().return_const("mock".to_string());
    backend
        .expect_list_tasks()
        .times(1)
        .returning(|| Ok(vec![Task::new("1", "a"), Task::new("2", "b")]));

    let mut harness = start(backend);
    harness.action_tx.send(Action::ListTasks).expect("Failed to send");

    match harness.next_event().await {
        Event::TasksLoaded(tasks) => {
            assert_eq!(tasks, vec![Task::new("1", "a"), Task::new("2", "b")])
        }
        other => panic!("unexpected event: {other:?}"),
    }
    harness.token.cancel();
}

#[tokio::test]
async fn test_list_failure_becomes_error_notice() {
    let mut backend = MockBackend::new();
    backend
        .expect_list_tasks()
        .returning(|| Err(eyre::eyre!("connection refused")));

    let mut harness = start(backend);
    harness.action_tx.send(Action::ListTasks).expect("Failed to send");

    match harness.next_event().await {
        Event::Notice(notice) => {
            assert_eq!(notice.kind(), &NoticeKind::Error);
            assert!(notice.message().contains("loading tasks"));
            assert!(notice.message().contains("connection refused"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    harness.token.cancel();
}

#[tokio::test]
async fn test_mutations_emit_nothing_on_success() {
    let mut backend = MockBackend::new();
    backend
        .expect_create_task()
        .withf(|title| title == "new")
        .times(1)
        .returning(|title| Ok(Task::new("1", title)));
    backend
        .expect_update_task()
        .withf(|id, title| id == "1" && title == "renamed")
        .times(1)
        .returning(|id, title| Ok(Task::new(id, title)));
    backend
        .expect_delete_task()
        .withf(|id| id == "1")
        .times(1)
        .returning(|_| Ok(()));

    let mut harness = start(backend);
    for action in [
        Action::CreateTask("new".to_string()),
        Action::UpdateTask {
            id: "1".to_string(),
            title: "renamed".to_string(),
        },
        Action::DeleteTask("1".to_string()),
    ] {
        harness.action_tx.send(action).expect("Failed to send");
    }

    harness.wait_idle().await;
    assert!(harness.event_rx.try_recv().is_err());
    harness.token.cancel();
}

#[tokio::test]
async fn test_mutation_failure_names_the_task() {
    let mut backend = MockBackend::new();
    backend
        .expect_delete_task()
        .returning(|_| Err(eyre::eyre!("conditional check failed")));

    let mut harness = start(backend);
    harness
        .action_tx
        .send(Action::DeleteTask("42".to_string()))
        .expect("Failed to send");

    match harness.next_event().await {
        Event::Notice(notice) => {
            assert!(notice.sticky());
            assert!(notice.message().contains("deleting task 42"));
            assert!(notice.message().contains("conditional check failed"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    harness.token.cancel();
}

#[tokio::test]
async fn test_run_stops_on_cancel() {
    let (_action_tx, action_rx) = mpsc::unbounded_channel();
    let (event_tx, _event_rx) = mpsc::unbounded_channel::<Event>();
    let token = CancellationToken::new();

    let mut service = ActionService::new(
        Arc::new(MockBackend::new()),
        action_rx,
        Arc::new(event_tx),
        token.clone(),
        Arc::new(AtomicUsize::new(0)),
    );
    let worker = tokio::spawn(async move { service.run().await });

    token.cancel();
    let result = tokio::time::timeout(Duration::from_secs(2), worker)
        .await
        .expect("Service did not stop")
        .expect("Service panicked");
    assert!(result.is_ok());
}
