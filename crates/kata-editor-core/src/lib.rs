//! kata-editor-core: problem authoring logic without framework dependencies.
//!
//! This crate provides:
//! - `SectionStore` - ordered sections and metadata, invariants enforced on every mutation
//! - `RichTextSurface` trait and `BlockSurface`, its in-process implementation
//! - `RichTextEditor<S>` - statement editor state machine with undo
//! - actions, keybindings and `execute_action`
//! - `ProblemComposer` - binds editors to the store for a whole problem page

pub mod actions;
pub mod block;
pub mod composer;
pub mod editor;
pub mod execute;
pub mod history;
pub mod store;
pub mod surface;
pub mod types;

pub use actions::{
    EditorAction, Key, KeyCombo, KeybindingConfig, KeydownResult, Modifiers, Range,
};
pub use block::BlockSurface;
pub use composer::ProblemComposer;
pub use editor::{EditorState, LinkDialog, LinkDialogError, RichTextEditor};
pub use execute::{execute_action, handle_keydown};
pub use history::History;
pub use smol_str::SmolStr;
pub use store::{MoveDirection, SectionStore, normalize};
pub use surface::{BlockFormat, InlineMark, LinkInfo, ListKind, Marks, RichTextSurface};
pub use types::Selection;
