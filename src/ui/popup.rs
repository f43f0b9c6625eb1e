use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::app::GenrePicker;
use crate::types::Genre;

/// Render the genre picker: a checklist over the full genre catalog.
pub fn render_genre_picker(frame: &mut Frame, genres: &[Genre], loading: bool, picker: &GenrePicker) {
    let height = (genres.len() + 2).clamp(5, 20) as u16; // +2 for borders
    let area = centered_rect(44, height, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        format!(" Genres ({} selected) ", picker.pending.len()),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ));

    if genres.is_empty() {
        let message = if loading {
            "Loading genres..."
        } else {
            "No genres available"
        };
        let empty = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let list_items: Vec<ListItem> = genres
        .iter()
        .enumerate()
        .map(|(i, genre)| {
            let style = if i == picker.index {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let mark = if picker.pending.contains(genre.id) {
                "[x]"
            } else {
                "[ ]"
            };
            let count = genre
                .count
                .map(|c| format!(" ({})", c))
                .unwrap_or_default();

            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", mark), Style::default().fg(Color::Green)),
                Span::styled(genre.name.as_str(), style),
                Span::styled(count, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(list_items).block(block);

    let mut state = ListState::default();
    state.select(Some(picker.index));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Create a centered rect of the given size, clamped to the outer rect
fn centered_rect(width: u16, height: u16, outer: Rect) -> Rect {
    let popup_width = width.min(outer.width);
    let popup_height = height.min(outer.height);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((outer.height.saturating_sub(popup_height)) / 2),
            Constraint::Length(popup_height),
            Constraint::Min(0),
        ])
        .split(outer);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((outer.width.saturating_sub(popup_width)) / 2),
            Constraint::Length(popup_width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_is_centered() {
        let rect = centered_rect(40, 10, Rect::new(0, 0, 100, 30));
        assert_eq!(rect, Rect::new(30, 10, 40, 10));
    }

    #[test]
    fn centered_rect_clamps_to_outer() {
        let rect = centered_rect(80, 40, Rect::new(0, 0, 50, 20));
        assert_eq!(rect, Rect::new(0, 0, 50, 20));
    }
}
