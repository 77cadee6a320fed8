//! Terminal input translation.
//!
//! Crossterm key events become either pipeline key events or app commands.

use crossterm::event::{KeyCode, KeyEvent as TermKeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode};

use crate::models::{KeyEvent, NamedKey};

/// App-level commands bound to function keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Leave the app
    Quit,
    /// Switch to the next sound pack in the catalog
    NextPack,
    /// Lower the volume one step
    VolumeDown,
    /// Raise the volume one step
    VolumeUp,
    /// Cycle the timer length
    CycleTimerLength,
    /// Show or hide the timer
    ToggleTimer,
    /// Start a new session
    Restart,
    /// Switch the backspace behavior
    ToggleBackspacePolicy,
}

/// What a terminal key event means to the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Run an app command
    Command(Command),
    /// Feed a key press into the pipeline
    KeyDown(KeyEvent),
    /// Feed a key release into the pipeline
    KeyUp(KeyEvent),
    /// Nothing to do
    Ignore,
}

/// Maps a terminal key to a pipeline key event.
///
/// Returns `None` for keys the keyboard has no cap for.
#[must_use]
pub fn key_event_from(code: KeyCode) -> Option<KeyEvent> {
    let event = match code {
        KeyCode::Char(c) => KeyEvent::from_char(c),
        KeyCode::Backspace => KeyEvent::Named(NamedKey::Backspace),
        KeyCode::Enter => KeyEvent::Named(NamedKey::Enter),
        KeyCode::Tab | KeyCode::BackTab => KeyEvent::Named(NamedKey::Tab),
        KeyCode::CapsLock => KeyEvent::Named(NamedKey::CapsLock),
        KeyCode::Modifier(modifier) => match modifier {
            ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => {
                KeyEvent::Named(NamedKey::Shift)
            }
            ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => {
                KeyEvent::Named(NamedKey::Control)
            }
            ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => KeyEvent::Named(NamedKey::Alt),
            _ => return None,
        },
        _ => return None,
    };
    Some(event)
}

/// Function key bindings.
const fn command_for(code: KeyCode) -> Option<Command> {
    let command = match code {
        KeyCode::Esc => Command::Quit,
        KeyCode::F(1) => Command::NextPack,
        KeyCode::F(2) => Command::VolumeDown,
        KeyCode::F(3) => Command::VolumeUp,
        KeyCode::F(4) => Command::CycleTimerLength,
        KeyCode::F(5) => Command::ToggleTimer,
        KeyCode::F(6) => Command::Restart,
        KeyCode::F(7) => Command::ToggleBackspacePolicy,
        _ => return None,
    };
    Some(command)
}

/// Translates one terminal key event.
#[must_use]
pub fn translate_key(key: &TermKeyEvent) -> InputAction {
    if key.kind == KeyEventKind::Release {
        return key_event_from(key.code).map_or(InputAction::Ignore, InputAction::KeyUp);
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return InputAction::Command(Command::Quit);
    }

    if let Some(command) = command_for(key.code) {
        return InputAction::Command(command);
    }

    key_event_from(shifted(key)).map_or(InputAction::Ignore, InputAction::KeyDown)
}

/// Letters reported unshifted with a Shift modifier, as terminals do once
/// every key is sent as an escape code.
fn shifted(key: &TermKeyEvent) -> KeyCode {
    match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::SHIFT) && c.is_ascii_lowercase() => {
            KeyCode::Char(c.to_ascii_uppercase())
        }
        code => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> TermKeyEvent {
        TermKeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_printable_keys() {
        assert_eq!(
            translate_key(&press(KeyCode::Char('Q'))),
            InputAction::KeyDown(KeyEvent::Char('Q'))
        );
        assert_eq!(
            translate_key(&press(KeyCode::Char(' '))),
            InputAction::KeyDown(KeyEvent::Named(NamedKey::Space))
        );
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(
            key_event_from(KeyCode::Backspace),
            Some(KeyEvent::Named(NamedKey::Backspace))
        );
        assert_eq!(key_event_from(KeyCode::BackTab), Some(KeyEvent::Named(NamedKey::Tab)));
        assert_eq!(
            key_event_from(KeyCode::Modifier(ModifierKeyCode::RightShift)),
            Some(KeyEvent::Named(NamedKey::Shift))
        );
        assert_eq!(key_event_from(KeyCode::Modifier(ModifierKeyCode::LeftMeta)), None);
        assert_eq!(key_event_from(KeyCode::Home), None);
    }

    #[test]
    fn test_modifier_presses_and_shifted_letters() {
        assert_eq!(
            translate_key(&TermKeyEvent::new(
                KeyCode::Modifier(ModifierKeyCode::LeftControl),
                KeyModifiers::CONTROL,
            )),
            InputAction::KeyDown(KeyEvent::Named(NamedKey::Control))
        );
        assert_eq!(
            translate_key(&TermKeyEvent::new(KeyCode::Char('a'), KeyModifiers::SHIFT)),
            InputAction::KeyDown(KeyEvent::Char('A'))
        );
        assert_eq!(
            translate_key(&TermKeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            InputAction::KeyDown(KeyEvent::Char('A'))
        );
    }

    #[test]
    fn test_release_maps_to_key_up() {
        let release = TermKeyEvent::new_with_kind(
            KeyCode::Char('a'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        );
        assert_eq!(translate_key(&release), InputAction::KeyUp(KeyEvent::Char('a')));

        // Releasing a function key does not repeat its command.
        let release = TermKeyEvent::new_with_kind(KeyCode::F(5), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(translate_key(&release), InputAction::Ignore);
    }

    #[test]
    fn test_commands() {
        assert_eq!(translate_key(&press(KeyCode::Esc)), InputAction::Command(Command::Quit));
        assert_eq!(
            translate_key(&TermKeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            InputAction::Command(Command::Quit)
        );
        assert_eq!(
            translate_key(&press(KeyCode::F(1))),
            InputAction::Command(Command::NextPack)
        );
        assert_eq!(
            translate_key(&press(KeyCode::F(7))),
            InputAction::Command(Command::ToggleBackspacePolicy)
        );
        assert_eq!(translate_key(&press(KeyCode::F(12))), InputAction::Ignore);
    }
}
