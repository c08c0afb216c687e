pub mod help;
pub mod notice;
pub mod tasks;
pub mod textarea;
pub mod utils;

pub use help::HelpScreen;
pub use notice::Notice;
pub use textarea::TextArea;

use ratatui::{
    style::{Color, Modifier, Style},
    widgets::Block,
};

pub trait Dim {
    fn dim_bg(&mut self);
}

impl Dim for ratatui::Frame<'_> {
    fn dim_bg(&mut self) {
        self.render_widget(
            Block::default().style(
                Style::default()
                    .bg(Color::Rgb(0, 0, 0))
                    .add_modifier(Modifier::DIM),
            ),
            self.area(),
        );
    }
}
