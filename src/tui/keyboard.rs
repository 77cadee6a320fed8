//! Keyboard widget for rendering the animated key caps

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::config::PreferencesConfig;
use crate::keyboard::{KeyInstance, Keyboard, Ray, PRESSED_DEPTH};
use crate::layout::{LayoutTable, ROW_SPACING};

/// Terminal lines per keyboard row.
pub const ROW_LINES: u16 = 3;

/// Brightness of a fully pressed key cap, in percent.
const PRESSED_BRIGHTNESS: u8 = 45;

/// Mapping between terminal cells and the keyboard plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyboardViewport {
    area: Rect,
    min_x: f32,
    cols_per_unit: f32,
}

impl KeyboardViewport {
    /// Fits the layout's width into `area`.
    #[must_use]
    pub fn new(area: Rect, layout: &LayoutTable) -> Self {
        let (min_x, max_x) = layout.horizontal_extent();
        let span = (max_x - min_x).max(1.0);
        Self {
            area,
            min_x,
            cols_per_unit: f32::from(area.width.max(1)) / span,
        }
    }

    /// Area the keys are drawn in.
    #[must_use]
    pub const fn area(&self) -> Rect {
        self.area
    }

    fn column_of(&self, x: f32) -> u16 {
        let offset = ((x - self.min_x) * self.cols_per_unit).round().max(0.0) as u16;
        self.area.x + offset.min(self.area.width)
    }

    /// Cells covered by a key.
    #[must_use]
    pub fn key_rect(&self, key: &KeyInstance) -> Rect {
        let bounds = key.bounds();
        let start = self.column_of(bounds.min.x);
        let end = self.column_of(bounds.max.x);

        let bottom = self.area.y + self.area.height;
        let y = (self.area.y + u16::from(key.row()) * ROW_LINES).min(bottom);
        let height = ROW_LINES.min(bottom - y);

        Rect::new(start, y, end.saturating_sub(start), height)
    }

    /// Pointer ray through the center of a terminal cell.
    ///
    /// Returns `None` for cells outside the keyboard area.
    #[must_use]
    pub fn ray_at(&self, column: u16, row: u16) -> Option<Ray> {
        let area = self.area;
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        if !inside {
            return None;
        }

        let x = self.min_x + (f32::from(column - area.x) + 0.5) / self.cols_per_unit;
        let rows_down = (f32::from(row - area.y) + 0.5) / f32::from(ROW_LINES);
        let y = -(rows_down - 0.5) * ROW_SPACING;
        Some(Ray::from_pointer(x, y))
    }
}

/// Keyboard widget renders one bordered cap per key instance
pub struct KeyboardWidget;

impl KeyboardWidget {
    /// Height needed for the whole layout, borders included.
    #[must_use]
    pub fn height(layout: &LayoutTable) -> u16 {
        layout.row_count() as u16 * ROW_LINES + 2
    }

    /// Render the keyboard, returning the viewport used for hit testing
    pub fn render(
        f: &mut Frame,
        area: Rect,
        layout: &LayoutTable,
        keyboard: &Keyboard,
        preferences: &PreferencesConfig,
    ) -> KeyboardViewport {
        let block = Block::default().borders(Borders::ALL).title(" Keyboard ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let viewport = KeyboardViewport::new(inner, layout);
        let background = preferences.background_color.to_ratatui_color();

        for key in keyboard.instances() {
            let rect = viewport.key_rect(key);
            if rect.width < 2 || rect.height < ROW_LINES {
                continue;
            }

            let pressed = (key.current_depth() / PRESSED_DEPTH).clamp(0.0, 1.0);
            let brightness = 100 - (f32::from(100 - PRESSED_BRIGHTNESS) * pressed).round() as u8;
            let cap = key.color().dim(brightness).to_ratatui_color();

            let mut cap_block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(cap));
            if key.is_hovered() {
                cap_block = cap_block.border_type(BorderType::Thick);
            }

            // Held keys fill in so a press reads at a glance.
            let label_style = if pressed > 0.5 {
                Style::default()
                    .fg(background)
                    .bg(cap)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(cap)
            };

            let label = Paragraph::new(key.label())
                .style(label_style)
                .alignment(Alignment::Center)
                .block(cap_block);
            f.render_widget(label, rect);
        }

        viewport
    }
}
