use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Padding, Paragraph},
};
use ratatui_macros::span;

use crate::app::app_state::{AppState, ConnectionStatus};

use super::utils;

/// render_tasks draws the task list with the cursor highlighted and the
/// task being edited marked with `*`.
pub(crate) fn render_tasks(f: &mut Frame, area: Rect, state: &mut AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::LightBlue))
        .padding(Padding::symmetric(1, 0))
        .title(Line::from(format!(" Tasks ({}) ", state.reconciler.tasks().len())).bold())
        .title_bottom(status_line(&state.status))
        .title_alignment(Alignment::Left);

    let inner = block.inner(area);
    if state.reconciler.tasks().is_empty() {
        let text = if state.loading {
            "Loading tasks..."
        } else {
            "No tasks yet. Type a title below and press Enter."
        };
        f.render_widget(
            Paragraph::new(Span::from(text).dark_gray().italic()).block(block),
            area,
        );
        return;
    }

    let editing = state.reconciler.editing().map(|task| task.id().to_string());
    let width = inner.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = state
        .reconciler
        .tasks()
        .iter()
        .map(|task| {
            let marker = if editing.as_deref() == Some(task.id()) {
                span!("* ").yellow().bold()
            } else {
                span!("  ")
            };
            let title = if task.title().is_empty() {
                span!("(untitled)").dark_gray().italic()
            } else {
                Span::raw(utils::truncate(task.title(), width))
            };
            ListItem::new(Line::from(vec![marker, title]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut state.cursor);
}

fn status_line<'a>(status: &ConnectionStatus) -> Line<'a> {
    let status = match status {
        ConnectionStatus::Connecting => span!("connecting").yellow(),
        ConnectionStatus::Live => span!("live").green(),
        ConnectionStatus::Offline(_) => span!("offline").red().bold(),
    };
    Line::from(vec![" ".into(), status, " ".into()])
}
