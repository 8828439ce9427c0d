use super::picture::Picture;
use super::{ACCENT, BACKDROP, MUTED, POSTER, hint};
use crate::app::{self, App, CardKey, PAGE_MARGIN};
use crate::format;
use crate::model::{LibraryEnvelope, LibraryItem};
use crate::thumbnail::{Thumbnail, ThumbnailStatus};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

pub const APP_TITLE: &str = "Plex Library";
pub const LOADING_MESSAGE: &str = "Loading...";
pub const EMPTY_LIBRARY_MESSAGE: &str = "No items found in this library";

/// Card height in rows: borders, poster, two title lines, year.
pub const CARD_HEIGHT: u16 = 11;
const POSTER_HEIGHT: u16 = 6;
const EMPTY_HEIGHT: u16 = 3;

/// One horizontal band of the scrolling library page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageRow {
    Header(usize),
    Cards { section: usize, start: usize },
    Empty(usize),
    Gap,
}

impl PageRow {
    fn height(self) -> u16 {
        match self {
            PageRow::Header(_) | PageRow::Gap => 1,
            PageRow::Cards { .. } => CARD_HEIGHT,
            PageRow::Empty(_) => EMPTY_HEIGHT,
        }
    }
}

fn page_rows(envelope: &LibraryEnvelope, columns: usize) -> Vec<PageRow> {
    let mut rows = Vec::new();
    for (section, library) in envelope.libraries.iter().enumerate() {
        rows.push(PageRow::Header(section));
        if library.items.is_empty() {
            rows.push(PageRow::Empty(section));
        } else {
            for start in (0..library.items.len()).step_by(columns) {
                rows.push(PageRow::Cards { section, start });
            }
        }
        rows.push(PageRow::Gap);
    }
    rows
}

/// First row to draw so that `focused` ends up inside `height`.
fn first_visible(rows: &[PageRow], focused: Option<usize>, height: u16) -> usize {
    let Some(focused) = focused else {
        return 0;
    };
    let mut start = focused;
    let mut used = rows[focused].height();
    while start > 0 && used + rows[start - 1].height() <= height {
        start -= 1;
        used += rows[start].height();
    }
    start
}

pub fn render_loading(frame: &mut Frame) {
    render_centered(frame, Line::from(LOADING_MESSAGE).style(Style::default().fg(Color::White)));
}

pub fn render_error(message: &str, frame: &mut Frame) {
    render_centered(
        frame,
        Line::from(message).style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
    );
}

fn render_centered(frame: &mut Frame, line: Line) {
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(frame.area());
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), middle);
}

/// Draw the library page. Returns the cards that ended up on screen.
pub fn render(app: &App, envelope: &LibraryEnvelope, frame: &mut Frame) -> Vec<CardKey> {
    let area = frame.area();

    // Layout: header(3) + page(min) + status(1)
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .split(area);

    // ── Header ──
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            format!(" {APP_TITLE}"),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(" Last updated: {}", envelope.last_updated),
            Style::default().fg(MUTED),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(header, chunks[0]);

    // ── Library page ──
    let page = chunks[1].inner(Margin {
        horizontal: PAGE_MARGIN,
        vertical: 0,
    });
    let visible = if envelope.libraries.is_empty() {
        frame.render_widget(
            Paragraph::new("No libraries available").style(Style::default().fg(MUTED)),
            page,
        );
        Vec::new()
    } else {
        render_page(app, envelope, frame, page)
    };

    // ── Status bar ──
    let status_line = Line::from(vec![
        hint(" ←↑↓→"),
        Span::raw(" Navigate  "),
        hint("Tab"),
        Span::raw(" Section  "),
        hint("Enter"),
        Span::raw(" Details  "),
        hint("?"),
        Span::raw(" Help  "),
        hint("q"),
        Span::raw(" Quit  "),
        Span::styled(&app.status_msg, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(status_line), chunks[2]);

    visible
}

fn render_page(
    app: &App,
    envelope: &LibraryEnvelope,
    frame: &mut Frame,
    page: Rect,
) -> Vec<CardKey> {
    let columns = app::grid_columns(page.width);
    let rows = page_rows(envelope, columns);
    let cursor = app.cursor();
    let focused_row = rows.iter().position(|row| {
        matches!(*row, PageRow::Cards { section, start }
            if section == app.focused && (start..start + columns).contains(&cursor))
    });

    let mut visible = Vec::new();
    let mut y = page.y;
    for row in &rows[first_visible(&rows, focused_row, page.height)..] {
        let height = row.height();
        if y + height > page.bottom() {
            break;
        }
        let area = Rect::new(page.x, y, page.width, height);
        match *row {
            PageRow::Header(section) => {
                if let Some(library) = envelope.libraries.get(section) {
                    render_section_header(frame, area, &library.name, library.items.len());
                }
            }
            PageRow::Empty(_) => render_empty(frame, area),
            PageRow::Cards { section, start } => {
                if let Some(library) = envelope.libraries.get(section) {
                    let end = (start + columns).min(library.items.len());
                    let selected = (section == app.focused).then_some(cursor);
                    for (offset, cell) in card_cells(area, columns).into_iter().enumerate() {
                        let index = start + offset;
                        if index >= end {
                            break;
                        }
                        render_card(
                            frame,
                            cell,
                            &library.items[index],
                            app.card_thumbnail(section, index),
                            selected == Some(index),
                        );
                        visible.push((section, index));
                    }
                }
            }
            PageRow::Gap => {}
        }
        y += height;
    }
    visible
}

fn render_section_header(frame: &mut Frame, area: Rect, name: &str, count: usize) {
    let line = Line::from(vec![
        Span::styled(
            name.to_string(),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  ({count})"), Style::default().fg(MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_empty(frame: &mut Frame, area: Rect) {
    let empty = Paragraph::new(EMPTY_LIBRARY_MESSAGE)
        .alignment(Alignment::Center)
        .style(Style::default().fg(MUTED))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(empty, area);
}

fn card_cells(area: Rect, columns: usize) -> Vec<Rect> {
    Layout::horizontal(vec![Constraint::Ratio(1, columns as u32); columns])
        .split(area)
        .to_vec()
}

fn render_card(
    frame: &mut Frame,
    area: Rect,
    item: &LibraryItem,
    thumbnail: Option<&Thumbnail>,
    focused: bool,
) {
    let border_style = if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default().borders(Borders::ALL).border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [poster, title, year] = Layout::vertical([
        Constraint::Length(POSTER_HEIGHT),
        Constraint::Length(2),
        Constraint::Length(1),
    ])
    .areas(inner);

    render_poster(frame, poster, item, thumbnail);

    let title_style = if focused {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let title_lines: Vec<Line> = format::clamp_lines(&item.title, title.width as usize, 2)
        .into_iter()
        .map(|line| Line::styled(line, title_style))
        .collect();
    frame.render_widget(Paragraph::new(title_lines), title);

    if let Some(y) = item.year {
        frame.render_widget(
            Paragraph::new(y.to_string()).style(Style::default().fg(MUTED)),
            year,
        );
    }
}

/// Poster area of a card: the picture once loaded, a marked block while it
/// is on its way, and the plain placeholder when there is none or it failed.
fn render_poster(
    frame: &mut Frame,
    area: Rect,
    item: &LibraryItem,
    thumbnail: Option<&Thumbnail>,
) {
    let pending = match thumbnail.map(Thumbnail::status) {
        Some(ThumbnailStatus::Loaded(image)) => {
            frame.render_widget(Block::default().style(Style::default().bg(BACKDROP)), area);
            frame.render_widget(Picture::new(image), area);
            return;
        }
        Some(ThumbnailStatus::Loading { .. }) => true,
        Some(ThumbnailStatus::Missing | ThumbnailStatus::Failed) => false,
        // Not requested yet; it will be after this frame.
        None => item.thumbnail_source().is_some(),
    };

    if pending {
        let [_, middle, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(area);
        frame.render_widget(Block::default().style(Style::default().bg(POSTER)), area);
        frame.render_widget(
            Paragraph::new("◆")
                .alignment(Alignment::Center)
                .style(Style::default().fg(ACCENT).bg(POSTER)),
            middle,
        );
    } else {
        frame.render_widget(Block::default().style(Style::default().bg(BACKDROP)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{envelope, item};

    #[test]
    fn test_page_rows_layout() {
        let env = envelope(vec![
            ("Movies", (0..5).map(|i| item(&format!("m{i}"))).collect()),
            ("Empty", vec![]),
        ]);
        let rows = page_rows(&env, 2);
        assert_eq!(
            rows,
            [
                PageRow::Header(0),
                PageRow::Cards { section: 0, start: 0 },
                PageRow::Cards { section: 0, start: 2 },
                PageRow::Cards { section: 0, start: 4 },
                PageRow::Gap,
                PageRow::Header(1),
                PageRow::Empty(1),
                PageRow::Gap,
            ]
        );
    }

    #[test]
    fn test_first_visible_keeps_focus_on_screen() {
        let rows = [
            PageRow::Header(0),
            PageRow::Cards { section: 0, start: 0 },
            PageRow::Cards { section: 0, start: 3 },
            PageRow::Cards { section: 0, start: 6 },
        ];
        // Everything up to the focused row fits.
        assert_eq!(first_visible(&rows, Some(1), 20), 0);
        // Only two card rows fit in 24 lines, so the header scrolls away.
        assert_eq!(first_visible(&rows, Some(3), 24), 2);
        assert_eq!(first_visible(&rows, Some(3), 20), 3);
        assert_eq!(first_visible(&rows, None, 5), 0);
    }
}
