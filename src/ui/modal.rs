use super::{ACCENT, BACKDROP, MUTED, SURFACE, centered_rect};
use crate::format;
use crate::model::LibraryItem;
use crate::thumbnail::{Thumbnail, ThumbnailStatus};
use crate::ui::picture::Picture;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub const NO_IMAGE: &str = "No image";
pub const LOADING_IMAGE: &str = "Loading image…";
pub const FAILED_IMAGE: &str = "Failed to load image";
pub const TRAILER_LABEL: &str = "Watch Trailer";

/// Draw the detail overlay for `open`. Does nothing when no item is open.
pub fn render(open: Option<(&LibraryItem, &Thumbnail)>, frame: &mut Frame) {
    let Some((item, thumbnail)) = open else {
        return;
    };

    let area = centered_rect(80, 80, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(Line::from(Span::styled(
            format!(" {} ", item.title),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )))
        .title_bottom(
            Line::from(" Esc/x Close  o Open trailer  y Copy link ")
                .style(Style::default().fg(Color::DarkGray)),
        )
        .style(Style::default().bg(SURFACE).fg(Color::White));
    let inner = block.inner(area).inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    frame.render_widget(block, area);

    let [image_area, _, details_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Length(2),
        Constraint::Fill(1),
    ])
    .areas(inner);

    render_thumbnail(frame, image_area, thumbnail);
    frame.render_widget(
        Paragraph::new(detail_lines(item)).wrap(Wrap { trim: false }),
        details_area,
    );
}

fn render_thumbnail(frame: &mut Frame, area: Rect, thumbnail: &Thumbnail) {
    let message = match thumbnail.status() {
        ThumbnailStatus::Loaded(image) => {
            frame.render_widget(Picture::new(image), area);
            return;
        }
        ThumbnailStatus::Missing => NO_IMAGE,
        ThumbnailStatus::Loading { .. } => LOADING_IMAGE,
        ThumbnailStatus::Failed => FAILED_IMAGE,
    };

    frame.render_widget(Block::default().style(Style::default().bg(BACKDROP)), area);
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(area);
    frame.render_widget(
        Paragraph::new(message)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray).bg(BACKDROP)),
        middle,
    );
}

fn heading(text: &str) -> Line<'_> {
    Line::from(Span::styled(
        text,
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    ))
}

fn field(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(MUTED)),
        Span::styled(value, Style::default().fg(Color::Gray)),
    ])
}

/// Text content of the details column.
fn detail_lines(item: &LibraryItem) -> Vec<Line<'_>> {
    let mut lines = vec![
        heading("Details"),
        field("Year: ", format::year_label(item.year)),
        field("Rating: ", format::rating_label(item.rating)),
        field("Added: ", format::added_at_label(&item.added_at)),
    ];

    let cast = format::cast_tags(item.cast());
    if !cast.is_empty() {
        lines.push(Line::from(""));
        lines.push(heading("Cast"));
        let mut tags = Vec::with_capacity(cast.len() * 2);
        for (i, actor) in cast.iter().enumerate() {
            if i > 0 {
                tags.push(Span::raw(" "));
            }
            tags.push(Span::styled(
                format!(" {actor} "),
                Style::default().bg(BACKDROP).fg(Color::White),
            ));
        }
        lines.push(Line::from(tags));
    }

    if let Some(description) = item.description_text() {
        lines.push(Line::from(""));
        lines.push(heading("Description"));
        lines.push(Line::from(Span::styled(
            description,
            Style::default().fg(Color::Gray),
        )));
    }

    if item.trailer_source().is_some() {
        lines.push(Line::from(""));
        lines.push(heading("Trailer"));
        lines.push(Line::from(vec![
            Span::styled(
                TRAILER_LABEL,
                Style::default()
                    .fg(Color::LightBlue)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            Span::styled("  (o open, y copy)", Style::default().fg(Color::DarkGray)),
        ]));
    }

    lines
}
