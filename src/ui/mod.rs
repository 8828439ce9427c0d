mod help;
mod library;
mod modal;
mod picture;

use crate::app::{App, CardKey, FetchState};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
};

const ACCENT: Color = Color::Rgb(229, 160, 13);
const MUTED: Color = Color::Rgb(179, 179, 179);
const SURFACE: Color = Color::Rgb(45, 45, 45);
const BACKDROP: Color = Color::Rgb(26, 26, 26);
const POSTER: Color = Color::Rgb(64, 64, 64);

/// Top-level render dispatch. Loading wins over error, error over content.
/// Returns the library cards drawn this frame.
pub fn render(app: &App, frame: &mut Frame) -> Vec<CardKey> {
    let visible = match &app.fetch {
        FetchState::Loading => {
            library::render_loading(frame);
            Vec::new()
        }
        FetchState::Failed(message) => {
            library::render_error(message, frame);
            Vec::new()
        }
        FetchState::Ready(envelope) => {
            let visible = library::render(app, envelope, frame);
            modal::render(app.modal(), frame);
            visible
        }
    };

    // Render help overlay on top if active
    if app.show_help {
        help::render(frame);
    }
    visible
}

fn hint(key: &str) -> Span<'_> {
    Span::styled(
        key,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )
}

/// Create a centered rectangle using percentage of parent area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    let horizontal = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(vertical[1]);

    horizontal[1]
}
