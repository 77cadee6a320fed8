//! Keystroke feedback pipeline.
//!
//! [`Pipeline`] owns every state machine and is the only thing the front end
//! talks to. A key-down fans out to three stages in a fixed order: key
//! animation, typing, sound. Each stage reports its own reaction; a failing
//! stage never stops the ones after it.

use std::time::Duration;

use crate::error::PipelineError;
use crate::keyboard::{HoverChange, HoverDetector, Keyboard, Ray};
use crate::layout::LayoutTable;
use crate::models::{KeyEvent, RgbColor};
use crate::session::{SessionController, SessionSummary};
use crate::sound::{AudioBackend, PlayOutcome, SoundEngine};
use crate::typing::{TypingEngine, TypingOutcome};

/// What the typing stage did with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextReaction {
    /// The engine handled the key
    Typing(TypingOutcome),
    /// The timed session is over; input was not forwarded
    Frozen,
}

/// One stage's reaction to a key-down.
#[derive(Debug)]
pub enum Reaction {
    /// Key animation: number of key instances pressed
    Visual {
        /// Instances whose target changed to pressed
        keys: usize,
    },
    /// Typing
    Text(TextReaction),
    /// Sound
    Audio(Result<PlayOutcome, PipelineError>),
}

/// Reactions of all stages to one key-down, in dispatch order.
#[derive(Debug)]
pub struct Dispatch {
    /// Visual, text, audio
    pub reactions: Vec<Reaction>,
}

impl Dispatch {
    /// The typing reaction.
    #[must_use]
    pub fn text(&self) -> Option<TextReaction> {
        self.reactions.iter().find_map(|reaction| match reaction {
            Reaction::Text(text) => Some(*text),
            _ => None,
        })
    }

    /// The sound reaction.
    #[must_use]
    pub fn audio(&self) -> Option<&Result<PlayOutcome, PipelineError>> {
        self.reactions.iter().find_map(|reaction| match reaction {
            Reaction::Audio(audio) => Some(audio),
            _ => None,
        })
    }

    /// True if the sound stage failed.
    #[must_use]
    pub fn audio_failed(&self) -> bool {
        matches!(self.audio(), Some(Err(_)))
    }
}

/// Owner of all keystroke feedback state.
pub struct Pipeline<B: AudioBackend> {
    layout: LayoutTable,
    keyboard: Keyboard,
    hover: HoverDetector,
    typing: TypingEngine,
    sound: SoundEngine<B>,
    session: SessionController,
}

impl<B: AudioBackend> Pipeline<B> {
    /// Builds a pipeline on the standard layout.
    pub fn new(typing: TypingEngine, sound: SoundEngine<B>, session: SessionController) -> Self {
        let layout = LayoutTable::standard();
        let keyboard = Keyboard::from_layout(&layout);
        Self {
            layout,
            keyboard,
            hover: HoverDetector::new(),
            typing,
            sound,
            session,
        }
    }

    /// Handles a key press: animate, type, then play.
    pub fn key_down(&mut self, event: KeyEvent) -> Dispatch {
        let keys = self.keyboard.press(&event.key_name());

        let text = if self.session.accepts_input() {
            let outcome = self.typing.handle_key(&event);
            if outcome.consumed() {
                self.session.on_keystroke();
            }
            TextReaction::Typing(outcome)
        } else {
            TextReaction::Frozen
        };

        let audio = self.sound.play_key(&event);
        if let Err(err) = &audio {
            tracing::warn!(key = %event, error = %err.report(), "Keystroke sound failed");
        }

        Dispatch {
            reactions: vec![
                Reaction::Visual { keys },
                Reaction::Text(text),
                Reaction::Audio(audio),
            ],
        }
    }

    /// Handles a key release. Returns the number of instances released.
    pub fn key_up(&mut self, event: KeyEvent) -> usize {
        self.keyboard.release(&event.key_name())
    }

    /// Updates hover from the pointer; `None` when the pointer left.
    pub fn pointer_moved(&mut self, ray: Option<Ray>) -> HoverChange {
        self.hover.update(ray.as_ref(), &mut self.keyboard)
    }

    /// Advances animation and the session clock by one frame.
    ///
    /// Returns the summary on the frame a timed session ends.
    pub fn frame(&mut self, dt: Duration) -> Option<SessionSummary> {
        self.keyboard.tick();
        self.session.tick(dt, &self.typing.stats())
    }

    /// Shows or hides the timer, resetting the session either way.
    ///
    /// Returns true if the timer is now armed.
    pub fn toggle_timer(&mut self, limit: Duration) -> bool {
        let armed = self.session.toggle(limit);
        self.reset_all();
        armed
    }

    /// Starts a new session with the same timer setting.
    pub fn restart(&mut self) {
        self.session.restart();
        self.reset_all();
    }

    fn reset_all(&mut self) {
        self.typing.reset();
        self.keyboard.reset();
        self.hover = HoverDetector::new();
        self.sound.reset_stats();
    }

    /// Colors special and normal keys.
    pub fn apply_theme(&mut self, special: RgbColor, normal: RgbColor) {
        self.keyboard.apply_theme(special, normal);
    }

    /// Layout table.
    #[must_use]
    pub const fn layout(&self) -> &LayoutTable {
        &self.layout
    }

    /// Key state.
    #[must_use]
    pub const fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    /// Hover state.
    #[must_use]
    pub const fn hover(&self) -> &HoverDetector {
        &self.hover
    }

    /// Typing state.
    #[must_use]
    pub const fn typing(&self) -> &TypingEngine {
        &self.typing
    }

    /// Mutable typing state, for settings changes.
    pub fn typing_mut(&mut self) -> &mut TypingEngine {
        &mut self.typing
    }

    /// Sound state.
    #[must_use]
    pub const fn sound(&self) -> &SoundEngine<B> {
        &self.sound
    }

    /// Mutable sound state, for pack and volume changes.
    pub fn sound_mut(&mut self) -> &mut SoundEngine<B> {
        &mut self.sound
    }

    /// Session timer.
    #[must_use]
    pub const fn session(&self) -> &SessionController {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::PRESSED_DEPTH;
    use crate::models::NamedKey;
    use crate::sound::{KeyCodeTable, RecordingBackend};
    use crate::typing::BackspacePolicy;

    fn pipeline() -> Pipeline<RecordingBackend> {
        let sound = SoundEngine::new(
            RecordingBackend::new(),
            KeyCodeTable::load_embedded().unwrap(),
        );
        Pipeline::new(
            TypingEngine::from_words(["hello", "world"], 10, 5),
            sound,
            SessionController::default(),
        )
    }

    #[test]
    fn test_key_down_dispatch_order() {
        let mut pipeline = pipeline();
        let dispatch = pipeline.key_down(KeyEvent::Char('h'));

        assert_eq!(dispatch.reactions.len(), 3);
        assert!(matches!(dispatch.reactions[0], Reaction::Visual { keys: 1 }));
        assert!(matches!(
            dispatch.reactions[1],
            Reaction::Text(TextReaction::Typing(TypingOutcome::Typed { correct: true, .. }))
        ));
        // No pack selected yet.
        assert!(matches!(
            dispatch.reactions[2],
            Reaction::Audio(Ok(PlayOutcome::Dropped))
        ));
    }

    #[test]
    fn test_key_down_presses_and_key_up_releases() {
        let mut pipeline = pipeline();
        pipeline.key_down(KeyEvent::Named(NamedKey::Shift));

        let shifts = pipeline.keyboard().ids_named("shift").to_vec();
        for id in &shifts {
            let key = pipeline.keyboard().instance(*id).unwrap();
            assert_eq!(key.target_depth(), PRESSED_DEPTH);
        }

        assert_eq!(pipeline.key_up(KeyEvent::Named(NamedKey::Shift)), 2);
    }

    #[test]
    fn test_frame_animates_keys() {
        let mut pipeline = pipeline();
        pipeline.key_down(KeyEvent::Char('w'));
        pipeline.frame(Duration::from_millis(16));

        let id = pipeline.keyboard().ids_named("w")[0];
        assert!(pipeline.keyboard().instance(id).unwrap().current_depth() > 0.0);
    }

    #[test]
    fn test_toggle_timer_resets_typing() {
        let mut pipeline = pipeline();
        pipeline.key_down(KeyEvent::Char('h'));
        assert_eq!(pipeline.typing().char_index(), 1);

        assert!(pipeline.toggle_timer(Duration::from_secs(15)));
        assert_eq!(pipeline.typing().char_index(), 0);
        assert_eq!(pipeline.session().limit(), Duration::from_secs(15));
    }

    #[test]
    fn test_finished_session_freezes_typing() {
        let mut pipeline = pipeline();
        pipeline.typing_mut().set_backspace_policy(BackspacePolicy::StayInWord);
        pipeline.toggle_timer(Duration::from_secs(15));

        let word = pipeline.typing().current_word().to_string();
        for c in word.chars() {
            pipeline.key_down(KeyEvent::from_char(c));
        }
        let summary = pipeline.frame(Duration::from_secs(15)).unwrap();
        assert_eq!(summary.words, 1);

        let index = pipeline.typing().char_index();
        let dispatch = pipeline.key_down(KeyEvent::Char('x'));
        assert_eq!(dispatch.text(), Some(TextReaction::Frozen));
        assert_eq!(pipeline.typing().char_index(), index);
        // Keys still move while frozen.
        assert!(matches!(dispatch.reactions[0], Reaction::Visual { keys: 1 }));
    }
}
