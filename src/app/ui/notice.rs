#[cfg(test)]
#[path = "notice_test.rs"]
mod tests;

use std::time::Instant;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Style, Stylize},
    text::Line,
    widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph},
};

use crate::config::constants::NOTICE_DURATION;
use crate::models::NoticeMessage;

use super::utils;

const MAX_NOTICES: usize = 5;

/// Notice stacks transient messages in the top right corner. Errors stay
/// until dismissed, everything else fades after its duration.
#[derive(Default)]
pub struct Notice {
    messages: Vec<(NoticeMessage, Instant)>,
}

impl Notice {
    pub fn add_message(&mut self, message: NoticeMessage) {
        self.messages.push((message, Instant::now()));
        if self.messages.len() > MAX_NOTICES {
            self.messages.remove(0);
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.add_message(NoticeMessage::info(message));
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// dismiss drops every notice and reports whether any was showing.
    pub fn dismiss(&mut self) -> bool {
        let showing = !self.messages.is_empty();
        self.messages.clear();
        showing
    }

    pub fn tick(&mut self) {
        self.expire(Instant::now());
    }

    fn expire(&mut self, now: Instant) {
        self.messages.retain(|(message, shown_at)| {
            if message.sticky() {
                return true;
            }
            let duration = message.duration().unwrap_or(NOTICE_DURATION);
            now.duration_since(*shown_at) < duration
        });
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        self.tick();

        let mut y = area.y;
        let bottom = area.y + area.height;
        for (message, _) in self.messages.iter().rev() {
            let width = area.width.saturating_sub(4) as usize;
            let lines = utils::split_to_lines(message.message(), width);
            let height = lines.len() as u16 + 2;
            if y + height > bottom {
                break;
            }

            let kind = message.kind();
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(kind.border_color()))
                .padding(Padding::symmetric(1, 0));
            let paragraph = Paragraph::new(
                lines
                    .into_iter()
                    .map(|line| line.fg(kind.text_color()))
                    .collect::<Vec<Line>>(),
            )
            .block(block);

            let rect = Rect::new(area.x, y, area.width, height);
            f.render_widget(Clear, rect);
            f.render_widget(paragraph, rect);
            y += height;
        }
    }
}
