use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Details ");

    let Some(anime) = app.selected_anime() else {
        let empty = Paragraph::new("Nothing selected")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let field = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<9}", name), label),
            Span::raw(value),
        ])
    };

    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());

    let genres = if anime.genres.is_empty() {
        "-".to_string()
    } else {
        anime
            .genres
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let lines = vec![
        Line::from(Span::styled(
            anime.title.as_str(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field("Score", or_dash(anime.score.map(|s| format!("{:.2}", s)))),
        field("Rank", or_dash(anime.rank.map(|r| format!("#{}", r)))),
        field("Status", anime.status.clone()),
        field("Episodes", or_dash(anime.episodes.map(|e| e.to_string()))),
        field(
            "Aired",
            or_dash(anime.aired_from.map(|d| d.format("%b %Y").to_string())),
        ),
        field("Rating", or_dash(anime.age_rating.clone())),
        field("Genres", genres),
        Line::from(""),
        field("MAL", or_dash(anime.url.clone())),
        field("Image", or_dash(anime.image_url.clone())),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
