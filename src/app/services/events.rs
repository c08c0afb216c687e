#[cfg(test)]
#[path = "events_test.rs"]
mod tests;

use crate::{config::constants::FRAME_DURATION, models::Event};
use crossterm::event::{Event as CrosstermEvent, EventStream, MouseEventKind};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time;
use tui_textarea::{Input, Key};

/// EventService merges terminal input, backend events and a UI tick into
/// a single stream consumed by the app loop.
pub struct EventService {
    crossterm_events: EventStream,
    event_rx: mpsc::UnboundedReceiver<Event>,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl EventService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_tx(&self) -> mpsc::UnboundedSender<Event> {
        self.event_tx.clone()
    }

    pub async fn next(&mut self) -> Event {
        loop {
            let e = tokio::select! {
                event = self.event_rx.recv() => event,
                event = self.crossterm_events.next().fuse() => match event {
                    Some(Ok(input)) => map_crossterm(input),
                    Some(Err(err)) => {
                        log::warn!("Failed to read terminal event: {}", err);
                        None
                    }
                    None => None
                },
                _ = time::sleep(FRAME_DURATION) => Some(Event::UiTick)
            };

            if let Some(event) = e {
                return event;
            }
        }
    }
}

impl Default for EventService {
    fn default() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
        Self {
            crossterm_events: EventStream::new(),
            event_rx,
            event_tx,
        }
    }
}

fn map_crossterm(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Paste(text) => Some(Event::KeyboardPaste(text)),
        CrosstermEvent::Mouse(mouse_event) => match mouse_event.kind {
            MouseEventKind::ScrollUp => Some(Event::UiScrollUp),
            MouseEventKind::ScrollDown => Some(Event::UiScrollDown),
            _ => None,
        },
        CrosstermEvent::Key(key_event) => {
            let input: Input = key_event.into();

            // Map ctrl events
            if input.ctrl {
                return match input.key {
                    Key::Char('q') | Key::Char('c') => Some(Event::Quit),
                    Key::Char('d') => Some(Event::KeyboardCtrlD),
                    Key::Char('e') => Some(Event::KeyboardCtrlE),
                    Key::Char('r') => Some(Event::KeyboardCtrlR),
                    // Let the text area handle its own shortcuts
                    _ => Some(Event::KeyboardCharInput(input)),
                };
            }

            match input.key {
                Key::Null => None,
                Key::Esc => Some(Event::KeyboardEsc),
                Key::F(1) => Some(Event::KeyboardF1),
                Key::Enter => Some(Event::KeyboardEnter),
                Key::Up => Some(Event::UiScrollUp),
                Key::Down => Some(Event::UiScrollDown),
                Key::MouseScrollUp => Some(Event::UiScrollUp),
                Key::MouseScrollDown => Some(Event::UiScrollDown),
                _ => Some(Event::KeyboardCharInput(input)),
            }
        }
        _ => None,
    }
}
