//! End-to-end keystroke handling through the pipeline.

mod fixtures;
use fixtures::*;

use keyclack::keyboard::{Ray, HOVER_DEPTH, PRESSED_DEPTH, REST_DEPTH};
use keyclack::models::{KeyEvent, NamedKey};
use keyclack::pipeline::{Reaction, TextReaction};
use keyclack::session::{SessionController, TimerState};
use keyclack::sound::{PackLoader, PlayOutcome, RecordingBackend};
use keyclack::typing::{CharClass, TypingEngine, TypingOutcome};
use keyclack::{Pipeline, PipelineError};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn depth_target(pipeline: &Pipeline<RecordingBackend>, name: &str) -> f32 {
    let keyboard = pipeline.keyboard();
    let id = keyboard.ids_named(name)[0];
    keyboard.instance(id).unwrap().target_depth()
}

#[test]
fn test_keystroke_reaches_every_stage_in_order() {
    let dir = packs_dir();
    let (mut engine, backend, source) = engine_for(dir.path());
    engine.select_pack("blue", &source);
    let mut pipeline = pipeline_with(engine, &["as", "sa"]);

    let dispatch = pipeline.key_down(KeyEvent::Char('a'));

    assert!(matches!(dispatch.reactions[0], Reaction::Visual { keys: 1 }));
    assert_eq!(
        dispatch.text(),
        Some(TextReaction::Typing(TypingOutcome::Typed {
            correct: true,
            completed_word: false,
        }))
    );
    assert!(matches!(dispatch.audio(), Some(Ok(PlayOutcome::Played(_)))));

    assert_eq!(depth_target(&pipeline, "a"), PRESSED_DEPTH);
    assert_eq!(pipeline.typing().char_index(), 1);
    assert_eq!(backend.played().len(), 1);
}

#[test]
fn test_audio_failure_leaves_other_stages_intact() {
    let dir = packs_dir();
    let (mut engine, backend, source) = engine_for(dir.path());
    engine.select_pack("blue", &source);
    let mut pipeline = pipeline_with(engine, &["as"]);
    backend.set_fail_playback(true);

    let dispatch = pipeline.key_down(KeyEvent::Char('a'));

    assert!(dispatch.audio_failed());
    assert!(matches!(
        dispatch.audio(),
        Some(Err(PipelineError::Playback(_)))
    ));
    assert!(matches!(dispatch.reactions[0], Reaction::Visual { keys: 1 }));
    assert_eq!(pipeline.typing().char_index(), 1);

    // The next key plays again once the device recovers.
    backend.set_fail_playback(false);
    let dispatch = pipeline.key_down(KeyEvent::Char('s'));
    assert!(!dispatch.audio_failed());
    assert_eq!(backend.played().len(), 1);
}

#[test]
fn test_without_pack_typing_and_animation_continue() {
    let (engine, backend) = sound_engine();
    let mut pipeline = pipeline_with(engine, &["hi"]);

    for c in "hi ".chars() {
        let dispatch = pipeline.key_down(KeyEvent::from_char(c));
        assert!(matches!(dispatch.audio(), Some(Ok(PlayOutcome::Dropped))));
    }

    assert_eq!(pipeline.typing().stats().completed_words, 1);
    assert_eq!(pipeline.sound().stats().dropped, 3);
    assert!(backend.played().is_empty());
}

#[test]
fn test_word_completes_on_delimiter() {
    let (engine, _) = sound_engine();
    let mut pipeline = pipeline_with(engine, &["ok", "go"]);

    pipeline.key_down(KeyEvent::Char('o'));
    pipeline.key_down(KeyEvent::Char('x'));
    let dispatch = pipeline.key_down(KeyEvent::Named(NamedKey::Space));

    assert_eq!(
        dispatch.text(),
        Some(TextReaction::Typing(TypingOutcome::Typed {
            correct: true,
            completed_word: true,
        }))
    );
    assert_eq!(pipeline.typing().current_word(), "go ");
    assert_eq!(pipeline.typing().absolute_word_index(), 1);

    let classes: Vec<CharClass> = pipeline.typing().render().take(3).map(|(_, class)| class).collect();
    assert_eq!(
        classes,
        [CharClass::Correct, CharClass::Incorrect, CharClass::Correct]
    );
}

#[test]
fn test_release_and_hover_interplay() {
    let (engine, _) = sound_engine();
    let mut pipeline = pipeline_with(engine, &["a"]);

    let q = pipeline.keyboard().ids_named("q")[0];
    let bounds = pipeline.keyboard().instance(q).unwrap().bounds();
    let center = (bounds.min + bounds.max) / 2.0;
    let ray = Ray::from_pointer(center.x, center.y);

    let change = pipeline.pointer_moved(Some(ray));
    assert_eq!(change.entered, [q]);
    assert_eq!(depth_target(&pipeline, "q"), HOVER_DEPTH);

    pipeline.key_down(KeyEvent::Char('q'));
    assert_eq!(depth_target(&pipeline, "q"), PRESSED_DEPTH);

    // Hover does not lift a held key.
    pipeline.pointer_moved(Some(ray));
    assert_eq!(depth_target(&pipeline, "q"), PRESSED_DEPTH);

    pipeline.key_up(KeyEvent::Char('q'));
    assert_eq!(depth_target(&pipeline, "q"), HOVER_DEPTH);

    let change = pipeline.pointer_moved(None);
    assert_eq!(change.left, [q]);
    assert_eq!(depth_target(&pipeline, "q"), REST_DEPTH);
}

#[test]
fn test_animation_settles_after_release() {
    let (engine, _) = sound_engine();
    let mut pipeline = pipeline_with(engine, &["a"]);

    pipeline.key_down(KeyEvent::Named(NamedKey::Enter));
    for _ in 0..30 {
        pipeline.frame(Duration::from_millis(16));
    }
    pipeline.key_up(KeyEvent::Named(NamedKey::Enter));
    for _ in 0..200 {
        pipeline.frame(Duration::from_millis(16));
    }

    assert!(pipeline.keyboard().is_settled());
}

#[test]
fn test_timed_session_end_to_end() {
    let dir = packs_dir();
    let (mut engine, backend, source) = engine_for(dir.path());
    engine.select_pack("brown", &source);
    let mut session = SessionController::default();
    assert!(session.toggle(Duration::from_secs(15)));
    let mut pipeline = Pipeline::new(
        TypingEngine::from_words(["aa", "aa", "aa"], 10, 7),
        engine,
        session,
    );
    assert_eq!(pipeline.session().state(), &TimerState::Armed);

    // The clock does not run before the first key.
    assert!(pipeline.frame(Duration::from_secs(20)).is_none());

    for c in "aa aa ".chars() {
        pipeline.key_down(KeyEvent::from_char(c));
    }
    assert!(matches!(
        pipeline.session().state(),
        TimerState::Running { .. }
    ));

    let summary = pipeline.frame(Duration::from_secs(15)).unwrap();
    assert_eq!(summary.words, 2);
    assert_eq!(summary.correct_chars, 6);
    // 6 chars / 5 = 1.2 words in a quarter minute.
    assert!((summary.wpm - 4.8).abs() < 1e-9);

    // Frozen text, but keys still animate and click.
    let played = backend.played().len();
    let dispatch = pipeline.key_down(KeyEvent::Char('a'));
    assert_eq!(dispatch.text(), Some(TextReaction::Frozen));
    assert_eq!(backend.played().len(), played + 1);

    pipeline.restart();
    assert_eq!(pipeline.session().state(), &TimerState::Armed);
    assert_eq!(pipeline.typing().stats().completed_words, 0);
    assert_eq!(pipeline.sound().stats().triggered, 0);
}

#[test]
fn test_background_loader_switches_pack() {
    let dir = packs_dir();
    let (mut engine, backend, source) = engine_for(dir.path());
    let mut loader = PackLoader::new(Arc::new(source));

    let ticket = engine.begin_selection("clicky").unwrap().into_ticket().unwrap();
    loader.start(ticket);
    let mut pipeline = pipeline_with(engine, &["q"]);

    // Keys typed while the pack loads are dropped, not queued.
    let dispatch = pipeline.key_down(KeyEvent::Char('q'));
    assert!(matches!(dispatch.audio(), Some(Ok(PlayOutcome::Dropped))));

    let deadline = Instant::now() + Duration::from_secs(5);
    let fetched = loop {
        if let Some(fetched) = loader.poll() {
            break fetched;
        }
        assert!(Instant::now() < deadline, "pack did not load");
        std::thread::sleep(Duration::from_millis(5));
    };
    assert!(pipeline.sound_mut().complete_selection(fetched).is_applied());

    pipeline.key_down(KeyEvent::Char('q'));
    let played = backend.played();
    assert_eq!(played.len(), 1);
    assert_eq!(played[0].buffer_tag, "audio-q.wav");
}
