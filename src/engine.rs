//! Engine facade tying the pipeline together.
//!
//! An [`Engine`] owns one document plus its history, selection, toolbar
//! and configuration. Every mutation funnels through the same commit
//! pipeline: snapshot, mutate, normalize, quick-sanitize, restore the
//! selection, then notify change sinks. Hosts observe the document through
//! registered sinks; the engine itself renders nothing.
//!
//! An engine without a document — not yet initialized, or destroyed —
//! fails closed: every operation becomes a logged no-op until the host
//! calls [`Engine::init`].

use std::time::Instant;

use anyhow::{bail, Result};

use crate::commands::{self, NativeCommand};
use crate::config::{EngineConfig, PasteMode};
use crate::dom::{self, DomTree, NodeId};
use crate::history::{HistoryLog, InputDebounce, Snapshot};
use crate::sanitize::{self, Policy};
use crate::selection::{self, Caret, DomSelection, SelectionPath};
use crate::toolbar::{ToolbarButton, ToolbarRegistry};

/// Host-registered command implementation. Receives the tree, the current
/// selection, and the command payload.
pub type CommandHandler =
    Box<dyn FnMut(&mut DomTree, Option<&DomSelection>, Option<&str>) -> Result<()>>;

/// Change notification callback; receives the new document HTML.
pub type ChangeSink = Box<dyn FnMut(&str)>;

/// A headless rich-text editing engine instance.
pub struct Engine {
    /// `None` before [`Engine::init`] and after [`Engine::destroy`]; every
    /// operation then no-ops.
    tree: Option<DomTree>,
    config: EngineConfig,
    history: HistoryLog,
    debounce: InputDebounce,
    selection: Option<DomSelection>,
    handlers: Vec<(String, CommandHandler)>,
    sinks: Vec<ChangeSink>,
    toolbar: ToolbarRegistry,
    disabled: bool,
    fullscreen: bool,
    epoch: Instant,
}

impl Engine {
    /// Build an uninitialized instance. Every operation fails closed until
    /// [`Engine::init`] gives it a document.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            history: HistoryLog::new(config.max_history_size),
            debounce: InputDebounce::new(std::time::Duration::from_millis(
                config.update_delay_ms,
            )),
            tree: None,
            config,
            selection: None,
            handlers: Vec::new(),
            sinks: Vec::new(),
            toolbar: ToolbarRegistry::new(),
            disabled: false,
            fullscreen: false,
            epoch: Instant::now(),
        }
    }

    /// Bring the engine up with initial content. `overrides`, when given,
    /// replaces the construction-time configuration. Re-init is a fresh
    /// start: history restarts from the new document. Also revives a
    /// destroyed instance.
    pub fn init(&mut self, html: &str, overrides: Option<EngineConfig>) {
        if let Some(config) = overrides {
            self.history = HistoryLog::new(config.max_history_size);
            self.debounce = InputDebounce::new(std::time::Duration::from_millis(
                config.update_delay_ms,
            ));
            self.config = config;
        }
        let tree = self.sanitized_tree(html);
        self.selection = Some(selection::cursor_to_end(&tree));
        self.tree = Some(tree);
        self.history.clear();
        self.debounce.clear();
        self.push_current_snapshot();
        self.notify();
    }

    pub fn is_initialized(&self) -> bool {
        self.tree.is_some()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Export the document under the full sanitization policy.
    pub fn get_content(&self) -> String {
        let Some(tree) = &self.tree else {
            tracing::warn!("get_content without a document");
            return String::new();
        };
        sanitize::sanitize_opts(&tree.html(), Policy::Full, self.config.allow_embeds)
    }

    /// Replace the document. The input is fully sanitized and normalized.
    /// The replacement is recorded as a history step, so an undo restores
    /// the previous document; only [`Engine::init`] restarts history.
    pub fn set_content(&mut self, html: &str) -> bool {
        if self.tree.is_none() {
            tracing::warn!("set_content on uninitialized engine");
            return false;
        }
        let tree = self.sanitized_tree(html);
        self.selection = Some(selection::cursor_to_end(&tree));
        self.tree = Some(tree);
        self.debounce.clear();
        self.push_current_snapshot();
        self.notify();
        true
    }

    /// Full sanitize, parse and normalize external HTML into a fresh tree.
    fn sanitized_tree(&self, html: &str) -> DomTree {
        let sanitized = sanitize::sanitize_opts(html, Policy::Full, self.config.allow_embeds);
        let mut tree = match dom::parse(&sanitized) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!("sanitized content failed to parse: {e}");
                DomTree::new()
            }
        };
        crate::normalize::normalize(&mut tree);
        tree
    }

    /// Whether the document has no visible content (hosts show the
    /// configured placeholder in that case).
    pub fn is_empty(&self) -> bool {
        let Some(tree) = &self.tree else {
            return true;
        };
        if !tree.text_content(tree.root()).trim().is_empty() {
            return false;
        }
        !tree
            .descendants(tree.root())
            .any(|id| matches!(tree.tag(id), Some("img") | Some("hr") | Some("iframe")))
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Execute a command by name. Custom handlers shadow the built-in
    /// table. Unknown commands are rejected without touching history or
    /// notifying sinks; a failing known command is logged and leaves the
    /// document unchanged.
    pub fn execute(&mut self, name: &str, payload: Option<&str>) -> Result<()> {
        if self.disabled {
            tracing::debug!(command = name, "ignoring command while disabled");
            return Ok(());
        }
        if self.tree.is_none() {
            tracing::warn!(command = name, "command without a document");
            return Ok(());
        }

        if let Some(index) = self.handlers.iter().position(|(n, _)| n == name) {
            let mut entry = self.handlers.remove(index);
            let payload = payload.map(str::to_string);
            let result = self.commit(true, |tree, sel| {
                (entry.1)(tree, sel, payload.as_deref()).map(|()| None)
            });
            self.handlers.insert(index, entry);
            // A failing registered handler is the host's bug; surface it.
            return result;
        }

        let Some(command) = NativeCommand::resolve(name) else {
            bail!("unknown command {name:?}");
        };
        let payload = payload.map(str::to_string);
        if let Err(e) = self.commit(true, |tree, sel| {
            commands::apply(tree, sel, command, payload.as_deref())
        }) {
            tracing::warn!(command = name, "command failed: {e}");
        }
        Ok(())
    }

    /// Register a host command. Replaces any previous handler under the
    /// same name; shadows a built-in of the same name.
    pub fn register_command(&mut self, name: &str, handler: CommandHandler) {
        if let Some(entry) = self.handlers.iter_mut().find(|(n, _)| n == name) {
            entry.1 = handler;
        } else {
            self.handlers.push((name.to_string(), handler));
        }
    }

    // ------------------------------------------------------------------
    // Input and paste
    // ------------------------------------------------------------------

    /// Apply a typed text run. Unlike [`Engine::execute`], no snapshot is
    /// taken up front; the debounce window coalesces a burst of input into
    /// one snapshot claimed by a later [`Engine::poll`].
    pub fn input_text(&mut self, text: &str, now: Instant) {
        if self.disabled || self.tree.is_none() {
            return;
        }
        let owned = text.to_string();
        if let Err(e) = self.commit(false, |tree, sel| {
            commands::apply(tree, sel, NativeCommand::InsertText, Some(&owned))
        }) {
            tracing::warn!("text input failed: {e}");
        }
        self.debounce.record(now);
    }

    /// Claim a due debounced snapshot. Returns true when one was recorded.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.tree.is_none() || !self.debounce.take_due(now) {
            return false;
        }
        self.push_current_snapshot();
        true
    }

    /// Insert clipboard content according to the configured paste mode.
    pub fn paste(&mut self, content: &str) -> Result<()> {
        match self.config.paste_mode {
            PasteMode::PlainText => {
                let text = plain_text_of(content);
                self.execute("insertText", Some(&text))
            }
            PasteMode::Clean => {
                let cleaned = self.clean_for_paste(content);
                self.execute("insertHTML", Some(&cleaned))
            }
            PasteMode::Raw => {
                let sanitized =
                    sanitize::sanitize_opts(content, Policy::Full, self.config.allow_embeds);
                self.execute("insertHTML", Some(&sanitized))
            }
        }
    }

    /// Insert literal text at the caret, snapshotting immediately.
    pub fn paste_text(&mut self, text: &str) -> Result<()> {
        self.execute("insertText", Some(text))
    }

    /// Insert an image, applying the configured dimension caps as `width`
    /// and `height` attributes.
    pub fn insert_image(&mut self, src: &str) -> Result<()> {
        if self.disabled || self.tree.is_none() {
            return Ok(());
        }
        let src = src.to_string();
        let (max_w, max_h) = (self.config.max_image_width, self.config.max_image_height);
        let result = self.commit(true, move |tree, sel| {
            let caret = commands::apply(tree, sel, NativeCommand::InsertImage, Some(&src))?;
            if max_w == 0 && max_h == 0 {
                return Ok(caret);
            }
            let imgs: Vec<NodeId> = tree
                .descendants(tree.root())
                .filter(|&id| tree.tag(id) == Some("img") && tree.attr(id, "src") == Some(&src))
                .collect();
            for img in imgs {
                if max_w > 0 && tree.attr(img, "width").is_none() {
                    tree.set_attr(img, "width", &max_w.to_string());
                }
                if max_h > 0 && tree.attr(img, "height").is_none() {
                    tree.set_attr(img, "height", &max_h.to_string());
                }
            }
            Ok(caret)
        });
        if let Err(e) = result {
            tracing::warn!("insertImage failed: {e}");
        }
        Ok(())
    }

    /// Full sanitize plus stripping of author styling.
    fn clean_for_paste(&self, content: &str) -> String {
        let sanitized =
            sanitize::sanitize_opts(content, Policy::Full, self.config.allow_embeds);
        let mut tree = match dom::parse(&sanitized) {
            Ok(tree) => tree,
            Err(_) => return String::new(),
        };
        let elements: Vec<NodeId> = tree
            .descendants(tree.root())
            .filter(|&id| tree.is_element(id))
            .collect();
        for id in elements {
            tree.remove_attr(id, "style");
            tree.remove_attr(id, "class");
        }
        tree.html()
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.is_dirty()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step the document back one snapshot. Un-snapshotted edits (a
    /// pending debounce burst) are flushed into history first, so nothing
    /// is silently lost.
    pub fn undo(&mut self) -> bool {
        if self.tree.is_none() {
            return false;
        }
        if self.is_dirty() {
            self.push_current_snapshot();
            self.debounce.clear();
        }
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore_snapshot(&snapshot);
        true
    }

    /// Step the document forward one snapshot. Un-snapshotted edits count
    /// as new work: they are flushed into history, which abandons the redo
    /// branch instead of letting a stale snapshot overwrite them.
    pub fn redo(&mut self) -> bool {
        if self.tree.is_none() {
            return false;
        }
        if self.is_dirty() {
            self.push_current_snapshot();
            self.debounce.clear();
            return false;
        }
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore_snapshot(&snapshot);
        true
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn is_dirty(&self) -> bool {
        match (&self.tree, self.history.current()) {
            (Some(tree), Some(current)) => tree.html() != current.html,
            (Some(_), None) => true,
            _ => false,
        }
    }

    fn restore_snapshot(&mut self, snapshot: &Snapshot) {
        let tree = match dom::parse(&snapshot.html) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!("history snapshot failed to parse: {e}");
                return;
            }
        };
        self.selection = Some(restore_selection(&tree, snapshot.selection.as_ref()));
        self.tree = Some(tree);
        self.notify();
    }

    fn push_current_snapshot(&mut self) {
        let Some(tree) = &self.tree else {
            return;
        };
        let selection = self
            .selection
            .as_ref()
            .and_then(|sel| selection::save(tree, sel));
        self.history.push(Snapshot {
            html: tree.html(),
            selection,
            timestamp_ms: self.epoch.elapsed().as_millis() as u64,
        });
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn selection(&self) -> Option<&DomSelection> {
        self.selection.as_ref()
    }

    /// Adopt a host-reported selection. Detached endpoints are rejected.
    pub fn set_selection(&mut self, sel: DomSelection) -> bool {
        let Some(tree) = &self.tree else {
            return false;
        };
        if !tree.is_attached(sel.anchor.node) || !tree.is_attached(sel.focus.node) {
            tracing::debug!("rejecting selection with detached endpoint");
            return false;
        }
        self.selection = Some(sel);
        true
    }

    /// Borrow the live tree, for hosts that need to map carets to nodes.
    pub fn tree(&self) -> Option<&DomTree> {
        self.tree.as_ref()
    }

    // ------------------------------------------------------------------
    // Toolbar, sinks, flags
    // ------------------------------------------------------------------

    pub fn on_change(&mut self, sink: ChangeSink) {
        self.sinks.push(sink);
    }

    pub fn register_button(&mut self, button: ToolbarButton) {
        self.toolbar.register(button);
    }

    pub fn unregister_button(&mut self, command: &str) -> bool {
        self.toolbar.remove(command)
    }

    pub fn toolbar_buttons(&self) -> Vec<&ToolbarButton> {
        self.toolbar.buttons()
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Tear the instance down. Further operations are logged no-ops.
    pub fn destroy(&mut self) {
        self.tree = None;
        self.selection = None;
        self.history.clear();
        self.debounce.clear();
        self.handlers.clear();
        self.sinks.clear();
        self.toolbar.clear();
        tracing::debug!("engine destroyed");
    }

    // ------------------------------------------------------------------
    // Commit pipeline
    // ------------------------------------------------------------------

    /// Shared mutation pipeline: optional snapshots, mutate, normalize,
    /// quick-sanitize (rebuilding the tree), restore the selection by the
    /// best surviving coordinates, then notify sinks. The mutation's error
    /// is returned to the caller, but the pipeline runs to completion
    /// either way, so the document can never be left half-mutated and
    /// un-normalized.
    ///
    /// With `snapshot` set, the pre-mutation state is flushed into history
    /// up front and the result is recorded at the end; recording the
    /// result is what truncates a pending redo branch, so an edit made
    /// after an undo abandons the branch even when the pre-mutation state
    /// matches the snapshot under the history cursor. Debounced text input
    /// passes `false` and leaves snapshotting to [`Engine::poll`].
    fn commit<F>(&mut self, snapshot: bool, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut DomTree, Option<&DomSelection>) -> Result<Option<Caret>>,
    {
        if snapshot {
            self.push_current_snapshot();
            self.debounce.clear();
        }
        let Some(tree) = self.tree.as_mut() else {
            return Ok(());
        };
        let pre_saved = self
            .selection
            .as_ref()
            .and_then(|sel| selection::save(tree, sel));

        let selection = self.selection;
        let result = mutate(tree, selection.as_ref());
        // Insertion commands report where the caret should land; everything
        // else keeps the pre-mutation selection coordinates.
        let saved = match &result {
            Ok(Some(caret)) => {
                selection::save(tree, &DomSelection::collapsed(*caret)).or(pre_saved)
            }
            _ => pre_saved,
        };

        crate::normalize::normalize(tree);
        let cleaned =
            sanitize::sanitize_opts(&tree.html(), Policy::Quick, self.config.allow_embeds);
        match dom::parse(&cleaned) {
            Ok(mut rebuilt) => {
                crate::normalize::normalize(&mut rebuilt);
                *tree = rebuilt;
            }
            Err(e) => {
                tracing::warn!("quick sanitize produced unparseable output: {e}");
            }
        }

        let tree = match &self.tree {
            Some(tree) => tree,
            None => return Ok(()),
        };
        self.selection = Some(restore_selection(tree, saved.as_ref()));
        if snapshot {
            self.push_current_snapshot();
        }
        self.notify();
        result.map(|_| ())
    }

    fn notify(&mut self) {
        let Some(tree) = &self.tree else {
            return;
        };
        let html = tree.html();
        for sink in &mut self.sinks {
            sink(&html);
        }
    }
}

/// Three-tier selection restoration: exact path, then absolute character
/// offsets, then a caret at the end of the document.
fn restore_selection(tree: &DomTree, saved: Option<&SelectionPath>) -> DomSelection {
    if let Some(path) = saved {
        if let Some(sel) = selection::restore_by_path(tree, path) {
            return sel;
        }
        if let Some(sel) = selection::restore_by_absolute_offset(tree, path) {
            return sel;
        }
    }
    selection::cursor_to_end(tree)
}

/// Text content of pasted markup; unparseable input is treated as the
/// literal text it is.
fn plain_text_of(content: &str) -> String {
    match dom::parse(content) {
        Ok(tree) => tree.text_content(tree.root()),
        Err(_) => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        let mut engine = Engine::new(EngineConfig::default());
        engine.init("", None);
        engine
    }

    #[test]
    fn test_uninitialized_engine_fails_closed() {
        let mut engine = Engine::new(EngineConfig::default());
        assert!(!engine.is_initialized());
        assert_eq!(engine.get_content(), "");
        assert!(!engine.set_content("<p>x</p>"));
        assert!(engine.execute("insertText", Some("y")).is_ok());
        assert!(!engine.undo());
    }

    #[test]
    fn test_init_empty_gives_placeholder_paragraph() {
        let engine = engine();
        assert!(engine.is_initialized());
        assert_eq!(engine.get_content(), "<p><br></p>");
        assert!(engine.is_empty());
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_init_overrides_replace_config() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.init(
            "<p>x</p>",
            Some(EngineConfig {
                max_history_size: 2,
                ..EngineConfig::default()
            }),
        );
        assert_eq!(engine.config().max_history_size, 2);
        assert_eq!(engine.get_content(), "<p>x</p>");
    }

    #[test]
    fn test_set_content_sanitizes_and_normalizes() {
        let mut engine = engine();
        engine.set_content("<b>x</b><script>alert(1)</script>");
        assert_eq!(engine.get_content(), "<p><strong>x</strong></p>");
        assert!(!engine.is_empty());
    }

    #[test]
    fn test_set_content_is_one_undo_step() {
        let mut engine = engine();
        engine.set_content("<p>a</p>");
        engine.set_content("<p>b</p>");
        assert!(engine.undo());
        assert_eq!(engine.get_content(), "<p>a</p>");
    }

    #[test]
    fn test_reinit_restarts_history() {
        let mut engine = engine();
        engine.execute("insertText", Some("old")).unwrap();
        engine.init("<p>new</p>", None);
        assert!(!engine.can_undo());
        assert_eq!(engine.history_len(), 1);
        assert_eq!(engine.get_content(), "<p>new</p>");
    }

    #[test]
    fn test_unknown_command_rejected_without_side_effects() {
        let mut engine = engine();
        let before_len = engine.history_len();
        let notified = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = notified.clone();
        engine.on_change(Box::new(move |_| counter.set(counter.get() + 1)));
        assert!(engine.execute("frobnicate", None).is_err());
        assert_eq!(engine.history_len(), before_len);
        assert_eq!(notified.get(), 0);
    }

    #[test]
    fn test_execute_notifies_sinks() {
        let mut engine = engine();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        engine.on_change(Box::new(move |html| sink.borrow_mut().push(html.to_string())));
        engine.execute("insertText", Some("hi")).unwrap();
        assert_eq!(seen.borrow().last().unwrap(), "<p>hi<br></p>");
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut engine = engine();
        engine.set_content("<p>one</p>");
        engine.execute("insertText", Some(" two")).unwrap();
        assert_eq!(engine.get_content(), "<p>one two</p>");
        assert!(engine.undo());
        assert_eq!(engine.get_content(), "<p>one</p>");
        assert!(engine.redo());
        assert_eq!(engine.get_content(), "<p>one two</p>");
    }

    #[test]
    fn test_disabled_engine_ignores_commands() {
        let mut engine = engine();
        engine.set_content("<p>x</p>");
        engine.set_disabled(true);
        engine.execute("insertText", Some("y")).unwrap();
        assert_eq!(engine.get_content(), "<p>x</p>");
        engine.set_disabled(false);
        engine.execute("insertText", Some("y")).unwrap();
        assert_eq!(engine.get_content(), "<p>xy</p>");
    }

    #[test]
    fn test_destroyed_engine_fails_closed() {
        let mut engine = engine();
        engine.set_content("<p>x</p>");
        engine.destroy();
        assert_eq!(engine.get_content(), "");
        assert!(engine.execute("insertText", Some("y")).is_ok());
        assert!(!engine.undo());
        assert!(engine.is_empty());
    }

    #[test]
    fn test_custom_handler_shadows_builtin() {
        let mut engine = engine();
        engine.set_content("<p>x</p>");
        engine.register_command(
            "bold",
            Box::new(|tree, _sel, _payload| {
                let root = tree.root();
                let p = tree.create_element("p");
                let text = tree.create_text("custom");
                tree.append_child(p, text);
                tree.append_child(root, p);
                Ok(())
            }),
        );
        engine.execute("bold", None).unwrap();
        assert_eq!(engine.get_content(), "<p>x</p><p>custom</p>");
    }

    #[test]
    fn test_input_debounce_snapshots_once() {
        let mut engine = engine();
        engine.set_content("<p></p>");
        let base = engine.history_len();
        let start = Instant::now();
        engine.input_text("a", start);
        engine.input_text("b", start + std::time::Duration::from_millis(100));
        assert_eq!(engine.history_len(), base);
        assert!(!engine.poll(start + std::time::Duration::from_millis(200)));
        assert!(engine.poll(start + std::time::Duration::from_millis(500)));
        assert_eq!(engine.history_len(), base + 1);
        assert!(!engine.poll(start + std::time::Duration::from_millis(600)));
    }

    #[test]
    fn test_undo_flushes_pending_input() {
        let mut engine = engine();
        engine.set_content("<p>x</p>");
        let start = Instant::now();
        engine.input_text("y", start);
        assert_eq!(engine.get_content(), "<p>xy</p>");
        assert!(engine.undo());
        assert_eq!(engine.get_content(), "<p>x</p>");
        assert!(engine.redo());
        assert_eq!(engine.get_content(), "<p>xy</p>");
    }

    #[test]
    fn test_paste_plain_text_mode_strips_markup() {
        let mut engine = Engine::new(EngineConfig {
            paste_mode: PasteMode::PlainText,
            ..EngineConfig::default()
        });
        engine.init("<p>x</p>", None);
        engine.paste("<strong>bold</strong> text").unwrap();
        assert_eq!(engine.get_content(), "<p>xbold text</p>");
    }

    #[test]
    fn test_paste_clean_mode_strips_styling() {
        let mut engine = engine();
        engine.set_content("<p>x</p>");
        engine
            .paste("<strong class=\"x\" style=\"color:red\">bold</strong>")
            .unwrap();
        assert_eq!(engine.get_content(), "<p>x<strong>bold</strong></p>");
    }

    #[test]
    fn test_insert_image_applies_caps() {
        let mut engine = Engine::new(EngineConfig {
            max_image_width: 640,
            ..EngineConfig::default()
        });
        engine.init("<p>x</p>", None);
        engine.insert_image("https://x.example/i.png").unwrap();
        let content = engine.get_content();
        assert!(content.contains("src=\"https://x.example/i.png\""));
        assert!(content.contains("width=\"640\""));
        assert!(!content.contains("height="));
    }

    #[test]
    fn test_toolbar_registration_through_engine() {
        let mut engine = engine();
        engine.register_button(ToolbarButton {
            command: "bold".to_string(),
            icon: "icon-bold".to_string(),
            group: 0,
            order: 1,
            dropdown: None,
        });
        engine.register_button(ToolbarButton {
            command: "undo".to_string(),
            icon: "icon-undo".to_string(),
            group: 0,
            order: 0,
        dropdown: None,
        });
        let commands: Vec<&str> = engine
            .toolbar_buttons()
            .iter()
            .map(|b| b.command.as_str())
            .collect();
        assert_eq!(commands, vec!["undo", "bold"]);
    }

    #[test]
    fn test_fullscreen_flag() {
        let mut engine = engine();
        assert!(!engine.is_fullscreen());
        engine.set_fullscreen(true);
        assert!(engine.is_fullscreen());
    }
}
