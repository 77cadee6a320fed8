//! Typing panel: the word queue colored by typing progress, plus the timer

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::config::PreferencesConfig;
use crate::session::{SessionController, SessionSummary, TimerState};
use crate::typing::{CharClass, TypingEngine};

/// Color of mistyped characters.
const INCORRECT_COLOR: Color = Color::Rgb(0xE0, 0x4F, 0x4F);

/// Color of characters not typed yet.
const UNTYPED_COLOR: Color = Color::DarkGray;

/// Typing widget
pub struct TypingWidget;

impl TypingWidget {
    /// Render the word queue, or the results of a finished session
    pub fn render(
        f: &mut Frame,
        area: Rect,
        typing: &TypingEngine,
        session: &SessionController,
        preferences: &PreferencesConfig,
    ) {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", crate::constants::APP_NAME));
        if let Some(timer) = Self::timer_label(session) {
            block = block.title(Line::from(timer).right_aligned());
        }

        let text_color = preferences.normal_key_color.to_ratatui_color();
        let content = match session.summary() {
            Some(summary) => Self::summary_lines(summary, text_color),
            None => vec![Self::queue_line(typing, text_color)],
        };

        let paragraph = Paragraph::new(content)
            .block(block)
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    /// Title text for the timer corner.
    #[must_use]
    pub fn timer_label(session: &SessionController) -> Option<String> {
        let label = match session.state() {
            TimerState::Off => return None,
            TimerState::Armed => format!(" {}s, starts on first key ", session.limit().as_secs()),
            TimerState::Running { remaining } => {
                format!(" {}s ", remaining.as_secs_f64().ceil() as u64)
            }
            TimerState::Finished(_) => " time! ".to_string(),
        };
        Some(label)
    }

    fn queue_line(typing: &TypingEngine, text_color: Color) -> Line<'static> {
        let cursor: usize = typing
            .queue()
            .take(typing.word_index())
            .map(|word| word.chars().count())
            .sum::<usize>()
            + typing.char_index();

        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut run = String::new();
        let mut run_style = None;

        for (idx, (c, class)) in typing.render().enumerate() {
            let mut style = Style::default().fg(match class {
                CharClass::Correct => text_color,
                CharClass::Incorrect => INCORRECT_COLOR,
                CharClass::Untyped => UNTYPED_COLOR,
            });
            if idx == cursor {
                style = style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
            }

            if run_style != Some(style) {
                if let Some(previous) = run_style {
                    spans.push(Span::styled(std::mem::take(&mut run), previous));
                }
                run_style = Some(style);
            }
            run.push(c);
        }
        if let Some(style) = run_style {
            spans.push(Span::styled(run, style));
        }

        Line::from(spans)
    }

    fn summary_lines(summary: &SessionSummary, text_color: Color) -> Vec<Line<'static>> {
        let value = Style::default().fg(text_color).add_modifier(Modifier::BOLD);
        let muted = Style::default().fg(UNTYPED_COLOR);
        vec![
            Line::from(vec![
                Span::styled(format!("{:.0}", summary.wpm), value),
                Span::styled(" wpm   ", muted),
                Span::styled(format!("{:.1}%", summary.accuracy), value),
                Span::styled(" accuracy   ", muted),
                Span::styled(summary.words.to_string(), value),
                Span::styled(" words", muted),
            ]),
            Line::from(Span::styled(
                format!(
                    "{} correct, {} incorrect characters in {}s",
                    summary.correct_chars,
                    summary.incorrect_chars,
                    summary.duration.as_secs()
                ),
                muted,
            )),
            Line::from(Span::styled("F6 to restart, F5 to hide the timer", muted)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KeyEvent;
    use std::time::Duration;

    #[test]
    fn test_queue_line_groups_runs() {
        let mut typing = TypingEngine::from_words(["cat", "dog"], 5, 1);
        typing.handle_key(&KeyEvent::Char('c'));
        typing.handle_key(&KeyEvent::Char('x'));

        let line = TypingWidget::queue_line(&typing, Color::White);
        let texts: Vec<&str> = line.spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(texts, ["c", "a", "t", " dog "]);

        assert_eq!(line.spans[0].style.fg, Some(Color::White));
        assert_eq!(line.spans[1].style.fg, Some(INCORRECT_COLOR));
        assert!(line.spans[2].style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_timer_label() {
        let mut session = SessionController::default();
        assert_eq!(TypingWidget::timer_label(&session), None);

        session.toggle(Duration::from_secs(15));
        assert!(TypingWidget::timer_label(&session).unwrap().contains("15s"));

        session.on_keystroke();
        session.tick(Duration::from_millis(2500), &Default::default());
        assert_eq!(TypingWidget::timer_label(&session).unwrap(), " 13s ");
    }
}
