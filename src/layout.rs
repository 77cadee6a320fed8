//! Static keyboard layout table.
//!
//! Maps each logical key name to its width and grid position, and places
//! keys on the keyboard plane. Widths are in model units, where a standard
//! letter key is 18 units wide.

use std::collections::HashMap;

use crate::error::PipelineError;

/// Width used for keys missing from the table.
pub const DEFAULT_KEY_WIDTH: f32 = 18.0;

/// Horizontal gap between neighbouring keys.
pub const KEY_GAP: f32 = 2.0;

/// Vertical distance between row centers.
pub const ROW_SPACING: f32 = 20.0;

/// Key height along the row axis.
pub const KEY_HEIGHT: f32 = 18.0;

/// Key display names, row by row.
const ROWS: [&[&str]; 5] = [
    &[
        "`", "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "-", "=", "Backspace",
    ],
    &[
        "Tab", "q", "w", "e", "r", "t", "y", "u", "i", "o", "p", "[", "]", "\\",
    ],
    &[
        "Caps", "a", "s", "d", "f", "g", "h", "j", "k", "l", ";", "'", "Enter",
    ],
    &[
        "Shift", "z", "x", "c", "v", "b", "n", "m", ",", ".", "/", "Shift",
    ],
    &["Ctrl", "Win", "Alt", "Spacebar", "Alt", "Fn", "Menu"],
];

/// Keys themed with the special key color.
const SPECIAL_KEYS: [&str; 10] = [
    "tab",
    "caps",
    "shift",
    "ctrl",
    "alt",
    "win",
    "fn",
    "menu",
    "enter",
    "backspace",
];

/// Normalizes a raw key name for lookups.
///
/// Lowercases and folds aliases: `capslock` → `caps`, `" "`/`space` →
/// `spacebar`, `control` → `ctrl`.
#[must_use]
pub fn normalize_key_name(raw: &str) -> String {
    if raw == " " {
        return "spacebar".to_string();
    }
    let lower = raw.to_lowercase();
    match lower.as_str() {
        "capslock" => "caps".to_string(),
        "space" => "spacebar".to_string(),
        "control" => "ctrl".to_string(),
        _ => lower,
    }
}

/// Returns true if the normalized key name takes the special key color.
#[must_use]
pub fn is_special_key(name: &str) -> bool {
    SPECIAL_KEYS.contains(&name)
}

/// One placed key of the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyDefinition {
    /// Display name, case preserved (e.g. "Shift", "q")
    pub name: &'static str,
    /// Width in model units
    pub width: f32,
    /// Row index, 0 = number row
    pub row: u8,
    /// Column index within the row
    pub column: u8,
    /// Left edge on the keyboard plane
    pub x: f32,
    /// Row center on the keyboard plane (rows grow downward as negative y)
    pub y: f32,
}

impl KeyDefinition {
    /// Normalized lookup name.
    #[must_use]
    pub fn key_name(&self) -> String {
        normalize_key_name(self.name)
    }
}

/// Read-only layout table, built once at startup.
#[derive(Debug, Clone)]
pub struct LayoutTable {
    keys: Vec<KeyDefinition>,
    widths: HashMap<String, f32>,
}

impl LayoutTable {
    /// Builds the standard 5-row layout.
    #[must_use]
    pub fn standard() -> Self {
        let mut keys = Vec::new();
        let mut widths = HashMap::new();

        for (row_idx, row) in ROWS.iter().enumerate() {
            let row_width: f32 = row.iter().map(|name| Self::table_width(name) + KEY_GAP).sum();
            let mut cursor_x = -row_width / 2.0;
            let y = -(row_idx as f32) * ROW_SPACING;

            for (col_idx, &name) in row.iter().enumerate() {
                let width = Self::table_width(name);
                keys.push(KeyDefinition {
                    name,
                    width,
                    row: row_idx as u8,
                    column: col_idx as u8,
                    x: cursor_x,
                    y,
                });
                widths.insert(normalize_key_name(name), width);
                cursor_x += width + KEY_GAP;
            }
        }

        Self { keys, widths }
    }

    /// Raw width table.
    fn table_width(name: &str) -> f32 {
        match name {
            "Backspace" | "Caps" => 32.0,
            "Enter" | "Shift" => 41.5,
            "Tab" => 28.5,
            "Spacebar" => 118.0,
            _ => DEFAULT_KEY_WIDTH,
        }
    }

    /// Width of a key by name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownKey`] if the layout has no such key.
    pub fn width_of(&self, name: &str) -> Result<f32, PipelineError> {
        self.widths
            .get(&normalize_key_name(name))
            .copied()
            .ok_or_else(|| PipelineError::UnknownKey(name.to_string()))
    }

    /// Width of a key, falling back to the canonical default width.
    #[must_use]
    pub fn width_or_default(&self, name: &str) -> f32 {
        self.width_of(name).unwrap_or(DEFAULT_KEY_WIDTH)
    }

    /// All placed keys, row-major.
    #[must_use]
    pub fn keys(&self) -> &[KeyDefinition] {
        &self.keys
    }

    /// Number of rows.
    #[must_use]
    pub const fn row_count(&self) -> usize {
        ROWS.len()
    }

    /// Horizontal extent `(min_x, max_x)` of the placed keys.
    #[must_use]
    pub fn horizontal_extent(&self) -> (f32, f32) {
        self.keys.iter().fold((f32::MAX, f32::MIN), |(lo, hi), key| {
            (lo.min(key.x), hi.max(key.x + key.width))
        })
    }
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_of_known_keys() {
        let table = LayoutTable::standard();
        assert_eq!(table.width_of("q").unwrap(), 18.0);
        assert_eq!(table.width_of("Backspace").unwrap(), 32.0);
        assert_eq!(table.width_of("ENTER").unwrap(), 41.5);
        assert_eq!(table.width_of("CapsLock").unwrap(), 32.0);
        assert_eq!(table.width_of(" ").unwrap(), 118.0);
    }

    #[test]
    fn test_width_of_unknown_key() {
        let table = LayoutTable::standard();
        let err = table.width_of("F13").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownKey(ref name) if name == "F13"));
        assert_eq!(table.width_or_default("F13"), DEFAULT_KEY_WIDTH);
    }

    #[test]
    fn test_normalize_key_name() {
        assert_eq!(normalize_key_name("CapsLock"), "caps");
        assert_eq!(normalize_key_name(" "), "spacebar");
        assert_eq!(normalize_key_name("Control"), "ctrl");
        assert_eq!(normalize_key_name("Shift"), "shift");
        assert_eq!(normalize_key_name("A"), "a");
    }

    #[test]
    fn test_rows_are_centered() {
        let table = LayoutTable::standard();
        for row in 0..table.row_count() {
            let row_keys: Vec<_> = table.keys().iter().filter(|k| k.row as usize == row).collect();
            let left = row_keys.first().unwrap().x;
            let last = row_keys.last().unwrap();
            let right = last.x + last.width + KEY_GAP;
            assert!((left + right).abs() < 1e-3, "row {row} is not centered");
        }
    }

    #[test]
    fn test_duplicate_keys_share_a_name() {
        let table = LayoutTable::standard();
        let shifts = table.keys().iter().filter(|k| k.key_name() == "shift").count();
        let alts = table.keys().iter().filter(|k| k.key_name() == "alt").count();
        assert_eq!(shifts, 2);
        assert_eq!(alts, 2);
    }

    #[test]
    fn test_special_keys() {
        assert!(is_special_key("shift"));
        assert!(is_special_key("backspace"));
        assert!(!is_special_key("a"));
        assert!(!is_special_key("spacebar"));
    }
}
