mod anime_detail;
mod anime_list;
mod popup;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::App;

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[1]);

    anime_list::render(frame, app, body[0]);
    anime_detail::render(frame, app, body[1]);

    render_status_bar(frame, app, chunks[2]);

    if let Some(picker) = &app.genre_picker {
        popup::render_genre_picker(frame, &app.genres, app.genres_loading, picker);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let filters = app.controller.filters();
    let filter_label = if filters.is_empty() {
        "all genres".to_string()
    } else {
        filters
            .iter()
            .map(|id| {
                app.genre_name(id)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("#{}", id))
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("anigrid - {}", app.controller.source_name()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  [{}]", filter_label),
            Style::default().fg(Color::Gray),
        ),
    ]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(error) = &app.error {
        Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )])
    } else if let (Some(error), Some(page)) =
        (app.controller.last_error(), app.controller.failed_page())
    {
        Line::from(vec![
            Span::styled(
                format!("Page {} failed: {}", page, error),
                Style::default().fg(Color::Red),
            ),
            Span::styled(
                if app.controller.rollback_on_failure() {
                    "  r: retry"
                } else {
                    "  r: skip"
                },
                Style::default().fg(Color::Gray),
            ),
        ])
    } else if let Some(notice) = &app.notice {
        Line::from(vec![Span::styled(
            notice.as_str(),
            Style::default().fg(Color::Green),
        )])
    } else if app.controller.is_loading() {
        Line::from(vec![Span::styled(
            format!("Loading page {}...", app.controller.page()),
            Style::default().fg(Color::Yellow),
        )])
    } else {
        let help = if app.genre_picker.is_some() {
            "j/k: nav | space: toggle | c: clear | Enter: apply | Esc: cancel"
        } else {
            "j/k/g/G: nav | Ctrl+d/u: page | f: genres | o: open | y: yank url | q: quit"
        };
        Line::from(vec![Span::styled(help, Style::default().fg(Color::Gray))])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

/// Cut `s` to at most `max` characters, ending in "..." when shortened.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_unchanged() {
        assert_eq!(truncate("Monster", 10), "Monster");
    }

    #[test]
    fn truncate_long_adds_ellipsis() {
        assert_eq!(truncate("Fullmetal Alchemist", 10), "Fullmet...");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("鋼の錬金術師 FULLMETAL", 7), "鋼の錬金...");
    }
}
