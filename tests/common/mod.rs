//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use scribe::{DomSelection, DomTree, Engine, EngineConfig, SelectionPath};

/// Initialized engine preloaded with content.
pub fn engine_with(html: &str) -> Engine {
    let mut engine = Engine::new(EngineConfig::default());
    engine.init(html, None);
    engine
}

/// Select the absolute character range `[start, end)` of the document.
pub fn select_chars(tree: &DomTree, start: usize, end: usize) -> DomSelection {
    let path = SelectionPath {
        start_container_path: vec![],
        start_offset: 0,
        end_container_path: vec![],
        end_offset: 0,
        absolute_start: start,
        absolute_end: end,
    };
    scribe::selection::restore_by_absolute_offset(tree, &path)
        .expect("document has text to select")
}

/// Point the engine's selection at an absolute character range.
pub fn select(engine: &mut Engine, start: usize, end: usize) {
    let sel = {
        let tree = engine.tree().expect("engine not destroyed");
        select_chars(tree, start, end)
    };
    assert!(engine.set_selection(sel));
}

/// Record every change notification's HTML.
pub fn change_log(engine: &mut Engine) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    engine.on_change(Box::new(move |html| sink.borrow_mut().push(html.to_string())));
    log
}
