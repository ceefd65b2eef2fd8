//! Content import/export, paste handling and engine lifecycle.

mod common;

use common::{change_log, engine_with};
use scribe::{Engine, EngineConfig, PasteMode};

#[test]
fn test_set_content_full_sanitizes() {
    let mut engine = engine_with(
        "<p onclick=\"x()\">ok</p><script>bad()</script><custom>kept</custom>",
    );
    assert_eq!(engine.get_content(), "<p>ok</p><p>kept</p>");
}

#[test]
fn test_malformed_content_fails_closed_to_empty_document() {
    let mut engine = engine_with("<div class=\"unterminated");
    assert_eq!(engine.get_content(), "<p><br></p>");
    assert!(engine.is_empty());
}

#[test]
fn test_trusted_embed_survives_export_when_allowed() {
    let src = "<iframe src=\"https://www.youtube.com/embed/abc123\"></iframe>";
    let mut engine = engine_with(src);
    assert!(engine.get_content().contains("youtube.com/embed/abc123"));
}

#[test]
fn test_embeds_dropped_when_disabled() {
    let mut engine = Engine::new(EngineConfig::default());
    engine.init(
        "<iframe src=\"https://www.youtube.com/embed/abc123\"></iframe>",
        Some(EngineConfig {
            allow_embeds: false,
            ..EngineConfig::default()
        }),
    );
    assert!(!engine.get_content().contains("iframe"));
}

#[test]
fn test_untrusted_iframe_always_dropped() {
    let mut engine = engine_with("<p>x</p><iframe src=\"https://evil.example/\"></iframe>");
    assert_eq!(engine.get_content(), "<p>x</p>");
}

#[test]
fn test_paste_clean_strips_styling_but_keeps_structure() {
    let mut engine = engine_with("<p>x</p>");
    engine
        .paste("<p style=\"color:red\" class=\"doc\">pasted <b>bold</b></p>")
        .unwrap();
    let content = engine.get_content();
    assert!(content.contains("pasted <strong>bold</strong>"), "{content}");
    assert!(!content.contains("style="));
    assert!(!content.contains("class="));
}

#[test]
fn test_paste_plain_text_inserts_literal_text() {
    let mut engine = Engine::new(EngineConfig {
        paste_mode: PasteMode::PlainText,
        ..EngineConfig::default()
    });
    engine.init("<p>x</p>", None);
    engine.paste("<h1>big</h1> title").unwrap();
    assert_eq!(engine.get_content(), "<p>xbig title</p>");
}

#[test]
fn test_paste_raw_keeps_author_styling() {
    let mut engine = Engine::new(EngineConfig {
        paste_mode: PasteMode::Raw,
        ..EngineConfig::default()
    });
    engine.init("<p>x</p>", None);
    engine.paste("<span style=\"font-weight: bold\">kept</span>").unwrap();
    // The style lift turns the styled span into a semantic tag.
    assert_eq!(engine.get_content(), "<p>x<strong>kept</strong></p>");
}

#[test]
fn test_paste_script_never_enters_document() {
    let mut engine = engine_with("<p>x</p>");
    engine.paste("<script>alert(1)</script>safe").unwrap();
    assert_eq!(engine.get_content(), "<p>xsafe</p>");
}

#[test]
fn test_destroy_then_reuse_is_inert() {
    let mut engine = engine_with("<p>x</p>");
    let log = change_log(&mut engine);
    engine.destroy();
    assert!(!engine.is_initialized());
    assert!(!engine.set_content("<p>y</p>"));
    assert!(engine.execute("insertText", Some("z")).is_ok());
    assert!(!engine.undo());
    assert_eq!(engine.get_content(), "");
    assert!(log.borrow().is_empty());
}

#[test]
fn test_reinit_revives_destroyed_engine() {
    let mut engine = engine_with("<p>x</p>");
    engine.destroy();
    engine.init("<p>y</p>", None);
    assert!(engine.is_initialized());
    assert_eq!(engine.get_content(), "<p>y</p>");
    assert!(!engine.can_undo());
}
