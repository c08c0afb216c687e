use std::io;

use crate::models::{Action, Event, TaskChange};
use crate::{error_notice, info_notice};
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use eyre::Result;
use ratatui::crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    layout::{Alignment, Constraint, Direction, Layout},
    prelude::{Backend, CrosstermBackend},
    widgets::Paragraph,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::app::app_state::{AppState, ConnectionStatus};
use crate::app::ui::{self, Dim, HelpScreen, Notice, TextArea, utils};

use super::services::EventService;

const MIN_WIDTH: u16 = 40;
const MIN_HEIGHT: u16 = 8;

pub struct App<'a> {
    action_tx: mpsc::UnboundedSender<Action>,

    events: &'a mut EventService,

    app_state: AppState,
    help_screen: HelpScreen,
    input: tui_textarea::TextArea<'a>,
    input_editing: bool,

    notice: Notice,

    cancel_token: CancellationToken,
}

impl<'a> App<'a> {
    pub fn new(
        action_tx: mpsc::UnboundedSender<Action>,
        events: &'a mut EventService,
        cancel_token: CancellationToken,
    ) -> App<'a> {
        App {
            action_tx,
            events,
            app_state: AppState::new(),
            help_screen: HelpScreen::new(),
            input: TextArea::default().build(),
            input_editing: false,
            notice: Notice::default(),
            cancel_token,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        enable_raw_mode()?;
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;

        let term_backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(term_backend)?;
        let result = self.start_loop(&mut terminal).await;

        self.cancel_token.cancel();

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        )?;

        terminal.show_cursor()?;
        result
    }

    async fn start_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.render(terminal)?;
            let event = self.events.next().await;
            if self.handle_event(event) {
                return Ok(());
            }
        }
    }

    /// handle_event returns true when the app should quit.
    fn handle_event(&mut self, event: Event) -> bool {
        // Handle critical events first
        if let Some(stop) = self.handle_global_event(&event) {
            return stop;
        }

        if self.help_screen.showing() {
            return self.help_screen.handle_key_event(&event);
        }

        self.handle_input_event(event);
        false
    }

    fn handle_global_event(&mut self, event: &Event) -> Option<bool> {
        match event {
            Event::Quit => Some(true),

            Event::Notice(msg) => {
                self.notice.add_message(msg.clone());
                Some(false)
            }

            Event::TasksLoaded(tasks) => {
                let reload = !self.app_state.loading;
                self.app_state.load(tasks.clone());
                if reload {
                    self.notice
                        .info(format!("Loaded {} tasks", self.app_state.reconciler.tasks().len()));
                }
                self.sync_input();
                Some(false)
            }

            Event::TaskChanged(change) => {
                self.handle_change(change.clone());
                Some(false)
            }

            Event::SubscriptionReady => {
                self.app_state.status = ConnectionStatus::Live;
                Some(false)
            }

            Event::SubscriptionClosed(reason) => {
                let notice = self.app_state.go_offline(reason.clone());
                self.notice.add_message(notice);
                Some(false)
            }

            Event::UiTick => {
                self.notice.tick();
                Some(false)
            }

            // Fallthrough to the next event handler
            _ => None,
        }
    }

    fn handle_input_event(&mut self, event: Event) {
        match event {
            Event::KeyboardCharInput(input) => {
                if self.input.input(input) {
                    self.app_state
                        .reconciler
                        .set_draft(ui::textarea::text(&self.input));
                }
            }

            Event::KeyboardPaste(text) => {
                self.input
                    .insert_str(text.replace(['\r', '\n'], " "));
                self.app_state
                    .reconciler
                    .set_draft(ui::textarea::text(&self.input));
            }

            Event::KeyboardEnter => {
                let action = self.app_state.reconciler.submit();
                self.send_action(action);
            }

            Event::KeyboardCtrlE => {
                let Some(task) = self.app_state.highlighted().cloned() else {
                    return;
                };
                self.app_state.reconciler.select_for_edit(&task);
                self.sync_input();
            }

            Event::KeyboardCtrlD => {
                let Some(task) = self.app_state.highlighted() else {
                    return;
                };
                let action = self.app_state.reconciler.delete(task.id());
                self.send_action(action);
            }

            Event::KeyboardEsc => {
                if self.app_state.reconciler.edit_state().is_editing() {
                    self.app_state.reconciler.cancel_edit();
                    self.sync_input();
                } else {
                    self.notice.dismiss();
                }
            }

            Event::KeyboardCtrlR => {
                self.send_action(Action::ListTasks);
            }

            Event::KeyboardF1 => self.help_screen.toggle_showing(),

            Event::UiScrollUp => self.app_state.cursor_up(),
            Event::UiScrollDown => self.app_state.cursor_down(),
            _ => {}
        }
    }

    fn handle_change(&mut self, change: TaskChange) {
        let id = change.id().to_string();
        let was_editing = self.app_state.reconciler.editing().map(|task| task.id().to_string());
        self.app_state.apply(change);

        if was_editing.as_deref() == Some(id.as_str())
            && !self.app_state.reconciler.tasks().contains(&id)
        {
            self.notice
                .add_message(info_notice!("The task you were editing was deleted"));
        }
        self.sync_input();
    }

    fn send_action(&mut self, action: Action) {
        log::debug!("Requesting {:?}", action);
        if let Err(err) = self.action_tx.send(action) {
            log::error!("Failed to send action: {}", err);
            self.notice
                .add_message(error_notice!("Request queue is closed, restart the app"));
        }
    }

    /// sync_input rebuilds the input box when the draft or the edit mode
    /// changed outside of typing.
    fn sync_input(&mut self) {
        let editing = self.app_state.reconciler.editing().is_some();
        let draft = self.app_state.reconciler.draft();
        if editing == self.input_editing && ui::textarea::text(&self.input) == draft {
            return;
        }

        let title = if editing { " Update Task " } else { " Add Task " };
        self.input = TextArea::default().with_title(title).with_text(draft).build();
        self.input_editing = editing;
    }

    fn render<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        terminal.draw(|f| {
            let area = f.area();
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                f.render_widget(
                    Paragraph::new(utils::split_to_lines(
                        &format!(
                            "I'm too small, make me bigger! I need at least {}x{} cells (current: {}x{})",
                            MIN_WIDTH, MIN_HEIGHT, area.width, area.height
                        ),
                        area.width.saturating_sub(2) as usize,
                    ))
                    .alignment(Alignment::Left),
                    area,
                );
                return;
            }

            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![
                    Constraint::Min(1),
                    Constraint::Length(3),
                    Constraint::Length(1),
                ])
                .split(area);

            ui::tasks::render_tasks(f, layout[0], &mut self.app_state);
            f.render_widget(&self.input, layout[1]);
            self.help_screen.render_help_line(f, layout[2]);

            if self.help_screen.showing() {
                f.dim_bg();
                self.help_screen.render(f, utils::popup_area(area, 60, 50));
            }

            self.notice.render(f, utils::notice_area(area, 35));
        })?;
        Ok(())
    }
}
