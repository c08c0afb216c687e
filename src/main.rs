use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use errtracker::app::services::{ActionService, EventService, ShutdownCoordinator};
use errtracker::backend::{new_backend, new_subscription_client};
use errtracker::config::constants::SHUTDOWN_TIMEOUT;
use errtracker::config::{Configuration, init_logger, verbose};
use errtracker::models::{Action, Event};
use errtracker::{
    app::{App, destruct_terminal_for_panic},
    cli::Command,
};
use eyre::{Context, Result};
use tokio::{sync::mpsc, task};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Command::new();
    if cmd.version() {
        cmd.print_version();
        return Ok(());
    }

    std::panic::set_hook(Box::new(|panic_info| {
        destruct_terminal_for_panic();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let config = cmd.get_config()?;
    Configuration::init(config.clone())?;
    init_logger(&config.log)?;
    verbose!("[+] Logger initialized");

    verbose!("[+] Initializing backend...");
    let backend = new_backend(&config.backend).wrap_err("initializing backend")?;
    let subscriptions = new_subscription_client(&config.backend)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let (action_tx, action_rx) = mpsc::unbounded_channel::<Action>();

    let mut events = EventService::new();
    let event_tx = Arc::new(events.event_tx());

    let mut task_set = task::JoinSet::new();
    let token = CancellationToken::new();
    let pending_tasks = Arc::new(AtomicUsize::new(0));

    let mut action_service = ActionService::new(
        backend.clone(),
        action_rx,
        event_tx.clone(),
        token.clone(),
        pending_tasks.clone(),
    );
    task_set.spawn(async move { action_service.run().await });

    // Subscribe before the bulk load so no change between the two is lost
    verbose!("[+] Subscribing to {}...", subscriptions.endpoint());
    let subscription = match subscriptions.connect(event_tx.clone()).await {
        Ok(handle) => Some(handle),
        Err(err) => {
            log::error!("Failed to subscribe: {}", err);
            // The app reports the closed subscription as a notice
            if let Err(err) = event_tx.send(Event::SubscriptionClosed(Some(err.to_string()))) {
                log::error!("Failed to send event: {}", err);
            }
            None
        }
    };

    action_tx
        .send(Action::ListTasks)
        .wrap_err("requesting initial task list")?;

    let mut app = App::new(action_tx, &mut events, token.clone());

    let coordinator = ShutdownCoordinator {
        pending_tasks: pending_tasks.clone(),
        shutdown_complete: shutdown_tx,
        timeout: Some(SHUTDOWN_TIMEOUT),
    };

    if let Err(err) = app.run().await {
        eprintln!("Error: {}", err);
    }

    // The app is gone, wait for requests it already issued
    task_set.spawn(coordinator.wait_for_completion());
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, shutdown_rx).await {
        Ok(Ok(Ok(_))) => {}
        Ok(Ok(Err(e))) => eprintln!("Shutdown error: {}", e),
        Ok(Err(e)) => eprintln!("Shutdown error: {}", e),
        Err(_) => eprintln!("Shutdown timeout reached"),
    }

    if let Some(subscription) = subscription {
        subscription.close().await;
    }

    task_set.abort_all();
    while let Some(res) = task_set.join_next().await {
        match res {
            Ok(_) => {}
            Err(err) if err.is_cancelled() => {}
            Err(err) => log::error!("Task error: {}", err),
        }
    }

    Ok(())
}
