use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Row, Table},
};
use ratatui_macros::span;

use crate::models::Event;

const KEYMAPS: &[(&str, &str)] = &[
    ("Enter", "Add the task, or save it while editing"),
    ("Up / Down", "Move through the list"),
    ("Ctrl+E", "Edit the highlighted task"),
    ("Ctrl+D", "Delete the highlighted task"),
    ("Esc", "Cancel editing / dismiss notices"),
    ("Ctrl+R", "Reload the list from the backend"),
    ("F1", "Toggle this help"),
    ("Ctrl+Q", "Quit"),
];

#[derive(Default)]
pub struct HelpScreen {
    showing: bool,
}

impl HelpScreen {
    pub fn new() -> HelpScreen {
        HelpScreen::default()
    }

    pub fn showing(&self) -> bool {
        self.showing
    }

    pub fn toggle_showing(&mut self) {
        self.showing = !self.showing;
    }

    /// handle_key_event returns true when the app should quit.
    pub fn handle_key_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Quit => {
                self.showing = false;
                true
            }
            Event::KeyboardEsc | Event::KeyboardF1 => {
                self.showing = false;
                false
            }
            _ => false,
        }
    }

    pub fn render_help_line(&self, f: &mut Frame, area: Rect) {
        let help: Vec<Span> = vec![
            span!("Ctrl+E").green().bold(),
            span!(" edit, ").gray(),
            span!("Ctrl+D").green().bold(),
            span!(" delete, ").gray(),
            span!("F1").green().bold(),
            span!(" help, ").gray(),
            span!("Ctrl+Q").green().bold(),
            span!(" quit").gray(),
        ];
        f.render_widget(Paragraph::new(Line::from(help)).alignment(Alignment::Left), area);
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        if !self.showing {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::LightBlue))
            .padding(Padding::symmetric(1, 0))
            .title(Line::from(" Help ").bold())
            .title_alignment(Alignment::Center)
            .title_bottom(Line::from(vec![
                " ".into(),
                span!("Esc").green().bold(),
                span!(" to close ").white(),
            ]));

        let rows = KEYMAPS
            .iter()
            .map(|(key, desc)| Row::new(vec![Span::from(*key).green().bold(), Span::from(*desc).white()]));
        let table = Table::new(rows, [Constraint::Length(12), Constraint::Fill(1)]).block(block);

        f.render_widget(Clear, area);
        f.render_widget(table, area);
    }
}
