#[cfg(test)]
#[path = "utils_test.rs"]
mod tests;

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

pub fn popup_area(area: Rect, percent_width: u16, percent_height: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_height)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_width)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

pub fn notice_area(area: Rect, percent_width: u16) -> Rect {
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_width)]).flex(Flex::End);
    let [area] = horizontal.areas(area);
    area
}

/// split_to_lines wraps the text on spaces so no line is wider than
/// `max_width` cells. A single word longer than the width keeps its own line.
pub fn split_to_lines<'a>(text: &str, max_width: usize) -> Vec<Line<'a>> {
    let mut lines = vec![];
    let mut line: Vec<Span> = vec![];
    let mut line_width = 0;

    for word in text.split(' ').filter(|word| !word.is_empty()) {
        let word_width = word.width();
        let space = if line.is_empty() { 0 } else { 1 };
        if line_width + space + word_width > max_width && !line.is_empty() {
            lines.push(Line::from(std::mem::take(&mut line)));
            line_width = 0;
        } else if space > 0 {
            line.push(Span::raw(" "));
            line_width += space;
        }
        line_width += word_width;
        line.push(Span::raw(word.to_string()));
    }

    if !line.is_empty() {
        lines.push(Line::from(line));
    }
    lines
}

/// truncate cuts the text to `max_width` cells, marking the cut with an
/// ellipsis.
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut width = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push('…');
    out
}
