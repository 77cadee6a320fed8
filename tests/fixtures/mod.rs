//! Shared test fixtures: sound pack directories on disk.
#![allow(dead_code)] // Not every test file uses every fixture

use keyclack::pipeline::Pipeline;
use keyclack::session::SessionController;
use keyclack::sound::{DirAssetSource, KeyCodeTable, RecordingBackend, SoundEngine};
use keyclack::typing::TypingEngine;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Key code of `a` in the embedded table.
pub const CODE_A: u32 = 30;
/// Key code of `s` in the embedded table.
pub const CODE_S: u32 = 31;
/// Key code of `q` in the embedded table.
pub const CODE_Q: u32 = 16;

/// Writes a file under `root`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: impl AsRef<[u8]>) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Writes a single-mode pack: one shared `sound.ogg` sliced by `regions`.
///
/// The audio file starts with `audio` so decoding can be made to fail with
/// a `BAD` prefix.
pub fn write_single_pack(
    root: &Path,
    id: &str,
    name: &str,
    regions: &[(u32, [f64; 2])],
    default: bool,
    audio: &str,
) {
    let defines: Map<String, Value> = regions
        .iter()
        .map(|(code, region)| (code.to_string(), json!(region)))
        .collect();
    let manifest = json!({
        "id": id,
        "name": name,
        "key_define_type": "single",
        "includes_numpad": false,
        "sound": "sound.ogg",
        "defines": defines,
        "default": default,
    });

    write_file(root, &format!("{id}/config.json"), manifest.to_string());
    write_file(root, &format!("{id}/sound.ogg"), audio);
}

/// Writes a multi-mode pack with one file per key; `None` leaves a key
/// without a sample.
///
/// Each file contains `audio-<file>` unless its name starts with `bad`,
/// in which case its contents start with `BAD`.
pub fn write_multi_pack(root: &Path, id: &str, name: &str, files: &[(u32, Option<&str>)]) {
    let defines: Map<String, Value> = files
        .iter()
        .map(|(code, file)| (code.to_string(), json!(file)))
        .collect();
    let manifest = json!({
        "name": name,
        "key_define_type": "multi",
        "sound": "",
        "defines": defines,
    });

    write_file(root, &format!("{id}/config.json"), manifest.to_string());
    for file in files.iter().filter_map(|(_, file)| *file) {
        let contents = if file.starts_with("bad") {
            format!("BAD-{file}")
        } else {
            format!("audio-{file}")
        };
        write_file(root, &format!("{id}/{file}"), contents);
    }
}

/// A packs directory with a typical mix of packs:
///
/// - `blue`: single mode, `a` and `s` mapped
/// - `brown`: single mode, marked default, `a` mapped
/// - `clicky`: multi mode, `a` and `q` mapped, `s` defined without a file
pub fn packs_dir() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write_single_pack(
        root,
        "blue",
        "Cherry MX Blue",
        &[(CODE_A, [120.0, 45.0]), (CODE_S, [300.0, 80.0])],
        false,
        "blue-audio",
    );
    write_single_pack(
        root,
        "brown",
        "Cherry MX Brown",
        &[(CODE_A, [0.0, 50.0])],
        true,
        "brown-audio",
    );
    write_multi_pack(
        root,
        "clicky",
        "Clicky",
        &[
            (CODE_A, Some("a.wav")),
            (CODE_Q, Some("q.wav")),
            (CODE_S, None),
        ],
    );

    temp_dir
}

/// Sound engine over a recording backend; returns the backend handle too.
pub fn sound_engine() -> (SoundEngine<RecordingBackend>, RecordingBackend) {
    let backend = RecordingBackend::new();
    let engine = SoundEngine::new(backend.clone(), KeyCodeTable::load_embedded().unwrap());
    (engine, backend)
}

/// Engine with the catalog of `dir` loaded.
pub fn engine_for(dir: &Path) -> (SoundEngine<RecordingBackend>, RecordingBackend, DirAssetSource) {
    let (mut engine, backend) = sound_engine();
    let source = DirAssetSource::new(dir);
    let ids = source.discover_packs().unwrap();
    engine.load_catalog(&source, &ids);
    (engine, backend, source)
}

/// Pipeline over `engine` with a fixed word queue.
pub fn pipeline_with(
    engine: SoundEngine<RecordingBackend>,
    words: &[&str],
) -> Pipeline<RecordingBackend> {
    Pipeline::new(
        TypingEngine::from_words(words.iter().copied(), 10, 7),
        engine,
        SessionController::default(),
    )
}
