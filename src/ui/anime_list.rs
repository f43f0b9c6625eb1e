use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::types::Anime;

use super::truncate;

const SKELETON_ROWS: usize = 10;

// rank(6) + score(6) + status(16) + eps(4) + three 1-col gaps
const ROW_FIXED: usize = 35;

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Anime ({}) ", app.controller.items().len()));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(block.inner(area));
    frame.render_widget(block, area);

    let list_area = chunks[0];
    app.visible_rows = list_area.height as usize;

    let loading = app.controller.is_loading();
    if app.controller.items().is_empty() {
        if loading {
            render_skeleton(frame, list_area);
        } else {
            let empty = Paragraph::new("No anime found.").style(Style::default().fg(Color::Gray));
            frame.render_widget(empty, list_area);
        }
        return;
    }

    let flex = (list_area.width as usize).saturating_sub(ROW_FIXED).max(10);

    let items: Vec<ListItem> = app
        .controller
        .items()
        .iter()
        .enumerate()
        .map(|(i, anime)| {
            let style = if i == app.selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(anime_row(anime, flex, style))
        })
        .collect();

    let list = List::new(items).highlight_style(Style::default().bg(Color::DarkGray));
    app.list_state.select(Some(app.selected));
    frame.render_stateful_widget(list, list_area, &mut app.list_state);

    let footer = if loading {
        Some(Span::styled(
            "Loading more anime...",
            Style::default().fg(Color::Yellow),
        ))
    } else if !app.controller.has_more() {
        Some(Span::styled(
            "End of results",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        None
    };
    if let Some(footer) = footer {
        let footer = Paragraph::new(Line::from(footer)).alignment(ratatui::layout::Alignment::Center);
        frame.render_widget(footer, chunks[1]);
    }
}

fn anime_row(anime: &Anime, flex: usize, style: Style) -> Line<'static> {
    let rank = anime
        .rank
        .map(|r| format!("#{}", r))
        .unwrap_or_else(|| "-".to_string());
    let score = anime
        .score
        .map(|s| format!("★ {:.2}", s))
        .unwrap_or_else(|| "★  -".to_string());
    let episodes = anime
        .episodes
        .map(|e| e.to_string())
        .unwrap_or_else(|| "?".to_string());

    Line::from(vec![
        Span::styled(format!("{:<6}", rank), Style::default().fg(Color::Cyan)),
        Span::raw(" "),
        Span::styled(format!("{:<flex$}", truncate(&anime.title, flex)), style),
        Span::raw(" "),
        Span::styled(format!("{:<6}", score), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("{:<16}", truncate(&anime.status, 16)),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(format!("{:>4}", episodes), Style::default().fg(Color::DarkGray)),
    ])
}

fn render_skeleton(frame: &mut Frame, area: Rect) {
    let width = area.width.saturating_sub(2) as usize;
    let rows: Vec<ListItem> = (0..SKELETON_ROWS)
        .map(|i| {
            // vary widths a little so the placeholder reads as a list
            let len = width.saturating_sub((i % 3) * 6);
            ListItem::new(Line::from(Span::styled(
                "░".repeat(len),
                Style::default().fg(Color::DarkGray),
            )))
        })
        .collect();
    frame.render_widget(List::new(rows), area);
}
