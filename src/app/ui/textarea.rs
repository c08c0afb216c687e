use ratatui::{
    style::{Color, Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, BorderType, Borders, Padding},
};

/// TextArea builds the single line input used for the task draft.
pub struct TextArea {
    title: String,
    placeholder: String,
    text: String,
}

impl Default for TextArea {
    fn default() -> Self {
        Self {
            title: " Add Task ".to_string(),
            placeholder: "What needs to be done?".to_string(),
            text: String::new(),
        }
    }
}

impl TextArea {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn build<'a>(self) -> tui_textarea::TextArea<'a> {
        let mut textarea = tui_textarea::TextArea::new(vec![self.text]);
        textarea.move_cursor(tui_textarea::CursorMove::End);
        textarea.set_cursor_line_style(Style::default());
        textarea.set_placeholder_text(self.placeholder);
        textarea.set_placeholder_style(Style::default().fg(Color::DarkGray));
        textarea.set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::LightBlue))
                .padding(Padding::symmetric(1, 0))
                .title(Line::from(self.title).bold()),
        );
        textarea
    }
}

/// text returns the content of a single line text area.
pub fn text(textarea: &tui_textarea::TextArea) -> String {
    textarea.lines().join(" ")
}
