//! Status bar widget for the sound pack, settings and key help

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::App;
use crate::sound::AudioBackend;

/// Status bar widget
pub struct StatusBar;

impl StatusBar {
    /// Render the status bar: current state on top, key help below
    pub fn render<B: AudioBackend>(f: &mut Frame, area: Rect, app: &App<B>) {
        let accent = app.config().preferences.special_key_color.to_ratatui_color();
        let muted = Style::default().fg(Color::DarkGray);

        let first_line = if app.status_message().is_empty() {
            Self::state_line(app, accent)
        } else {
            Line::from(Span::styled(app.status_message(), Style::default().fg(accent)))
        };

        let help_line = Line::from(Span::styled(
            "F1 pack  F2/F3 volume  F4 length  F5 timer  F6 restart  F7 backspace  Esc quit",
            muted,
        ));

        let paragraph = Paragraph::new(vec![first_line, help_line])
            .block(Block::default().borders(Borders::TOP));
        f.render_widget(paragraph, area);
    }

    fn state_line<B: AudioBackend>(app: &App<B>, accent: Color) -> Line<'static> {
        let sound = app.pipeline().sound();
        let pack = if app.is_loading() {
            "loading...".to_string()
        } else {
            sound
                .active_pack()
                .map_or_else(|| "none".to_string(), |pack| pack.display_name().to_string())
        };

        let label = Style::default().fg(accent);
        let value = Style::default();
        Line::from(vec![
            Span::styled("Sound: ", label),
            Span::styled(pack, value),
            Span::styled("  Volume: ", label),
            Span::styled(format!("{:.0}%", sound.volume() * 100.0), value),
            Span::styled("  Timer: ", label),
            Span::styled(format!("{}s", app.config().timer.default_secs), value),
            Span::styled("  Backspace: ", label),
            Span::styled(app.pipeline().typing().backspace_policy().to_string(), value),
        ])
    }
}
