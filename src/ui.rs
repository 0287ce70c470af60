//! TUI rendering for the nearby-places screen.
//!
//! One card is shown at a time, the terminal stand-in for a swipeable deck.
//! The loading, permission-denied and failure states each get their own view.

use crate::app::{App, Status};
use crate::geo;
use ratatui::{prelude::*, widgets::*};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const CARD_BG: Color = Color::Rgb(205, 220, 237);

/// Renders one frame of the TUI based on current application state.
///
/// The header and footer are always drawn; the body depends on
/// [`Session::status`](crate::app::Session::status).
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.size());

    render_header(f, chunks[0]);

    match &app.session.status {
        Status::Locating => render_loading(f, app, chunks[1]),
        Status::PermissionDenied => {
            render_message(f, chunks[1], "Location permissions not granted.", Color::Red)
        }
        Status::Failed(reason) => render_message(
            f,
            chunks[1],
            &format!("Could not load nearby places ({}). Press r to retry.", reason),
            Color::Yellow,
        ),
        Status::Resolved if app.session.places.is_empty() => {
            render_message(f, chunks[1], "No places found nearby.", Color::DarkGray)
        }
        Status::Resolved => render_card(f, app, chunks[1]),
    }

    if let Some(ref msg) = app.status_message {
        let p = Paragraph::new(msg.as_str())
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);
        f.render_widget(p, chunks[2]);
    }

    let help = Paragraph::new(" ←/→ swipe   m map   o article   s share   r refresh   q quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[3]);
}

fn render_header(f: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::from(vec![
        Span::raw("nearby "),
        Span::styled("places", Style::default().add_modifier(Modifier::BOLD)),
    ]))
    .alignment(Alignment::Left)
    .block(Block::default().padding(Padding::new(2, 2, 1, 0)));
    f.render_widget(title, area);
}

fn render_loading(f: &mut Frame, app: &App, area: Rect) {
    let frame = SPINNER[app.tick_count % SPINNER.len()];
    let text = format!("{} Finding places near you...", frame);
    render_message(f, area, &text, Color::Cyan);
}

fn render_message(f: &mut Frame, area: Rect, text: &str, color: Color) {
    let card = card_area(area);
    let p = Paragraph::new(text)
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .padding(Padding::new(2, 2, 1, 1)),
        );
    f.render_widget(p, card);
}

/// The selected place as a card: title, description, distance and links.
fn render_card(f: &mut Frame, app: &App, area: Rect) {
    let Some(place) = app.selected_place() else {
        return;
    };

    let distance = app
        .session
        .coordinates
        .map(|me| geo::format_distance(geo::distance_km(place.coordinates, me)))
        .unwrap_or_else(|| "?".to_string());

    let label = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();
    if let Some(ref desc) = place.description {
        lines.push(Line::from(Span::styled(
            desc.as_str(),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(vec![
        Span::styled("Distance:  ", label),
        Span::styled(format!("{} km", distance), Style::default().fg(Color::Cyan)),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Map:       ", label),
        Span::raw(place.map_url()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Article:   ", label),
        Span::raw(place.article_url(&app.session.locale)),
    ]));
    if let Some(ref thumb) = place.thumbnail {
        lines.push(Line::from(vec![
            Span::styled("Thumbnail: ", label),
            Span::styled(thumb.as_str(), Style::default().fg(Color::DarkGray)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("{} / {}", app.selected_index + 1, app.session.places.len()),
        Style::default().fg(Color::DarkGray),
    )));

    let card = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(Span::styled(
                format!(" {} ", place.title),
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(CARD_BG))
            .padding(Padding::new(2, 2, 1, 1)),
    );
    f.render_widget(card, card_area(area));
}

/// Cards take 70% of the width, offset like the first card of a deck.
fn card_area(area: Rect) -> Rect {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(10),
            Constraint::Percentage(70),
            Constraint::Percentage(20),
        ])
        .split(area)[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::models::{Coordinates, Place};
    use crate::resolver::Resolution;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn permission_denied_shows_static_message() {
        let mut app = App::new("en");
        app.finish_cycle(Err(ResolveError::PermissionDenied));
        assert!(draw(&app).contains("Location permissions not granted."));
    }

    #[test]
    fn card_shows_title_description_and_distance() {
        let mut app = App::new("en");
        app.finish_cycle(Ok(Resolution {
            coordinates: Coordinates { lat: 0.0, lon: 0.0 },
            locale: "en".into(),
            places: vec![Place {
                id: 5,
                title: "Equator Marker".into(),
                coordinates: Coordinates { lat: 0.0, lon: 1.0 },
                description: Some("A monument".into()),
                thumbnail: None,
            }],
        }));

        let screen = draw(&app);
        assert!(screen.contains("Equator Marker"));
        assert!(screen.contains("A monument"));
        assert!(screen.contains("110 km"));
        assert!(screen.contains("1 / 1"));
    }

    #[test]
    fn empty_result_is_not_an_error_screen() {
        let mut app = App::new("en");
        app.finish_cycle(Ok(Resolution {
            coordinates: Coordinates { lat: 0.0, lon: 0.0 },
            locale: "en".into(),
            places: vec![],
        }));
        assert!(draw(&app).contains("No places found nearby."));
    }
}
