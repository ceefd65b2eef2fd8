//! Scribe - a headless WYSIWYG rich-text editing engine.
//!
//! Scribe owns the document model, command execution, undo history and
//! HTML sanitization of a rich-text editor, while leaving rendering and
//! event capture to the host. The host feeds it commands, input and
//! selections; Scribe hands back canonical, sanitized HTML through change
//! sinks.
//!
//! ```
//! use scribe::{Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig::default());
//! engine.init("<p>hello</p>", None);
//! engine.execute("insertText", Some(" world")).unwrap();
//! assert_eq!(engine.get_content(), "<p>hello world</p>");
//! assert!(engine.undo());
//! assert_eq!(engine.get_content(), "<p>hello</p>");
//! ```

pub mod commands;
pub mod config;
pub mod dom;
pub mod engine;
pub mod history;
pub mod normalize;
pub mod sanitize;
pub mod selection;
pub mod toolbar;

pub use commands::NativeCommand;
pub use config::{EngineConfig, PasteMode};
pub use dom::{DomTree, NodeId};
pub use engine::{ChangeSink, CommandHandler, Engine};
pub use history::{HistoryLog, Snapshot};
pub use normalize::normalize;
pub use sanitize::{sanitize, Policy};
pub use selection::{Caret, DomSelection, SelectionPath};
pub use toolbar::{DropdownItem, ToolbarButton, ToolbarRegistry};
