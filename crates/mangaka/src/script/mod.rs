//! Script parsing for text-model output.
//!
//! The text collaborator answers with a loosely formatted script: a sequence
//! of `Panel N:` blocks, each carrying `Description:`, `Dialogue:` and an
//! optional `SFX:` section. This module turns that blob into an ordered list
//! of [`PanelScript`] records.
//!
//! # Examples
//!
//! ```rust
//! use mangaka::script::parse_script;
//!
//! let script = "Panel 2:\nDescription: The cat lands.\nDialogue: Made it!\n\
//!               Panel 1:\nDescription: A cat leaps.\nDialogue: Here goes...\nSFX: WHOOSH";
//! let panels = parse_script(script).unwrap();
//!
//! assert_eq!(panels.len(), 2);
//! assert_eq!(panels[0].panel, 1);
//! assert_eq!(panels[0].sfx.as_deref(), Some("WHOOSH"));
//! assert_eq!(panels[1].sfx, None);
//! ```

pub mod error;
pub mod parser;

pub use self::error::ScriptParseError;
pub use self::parser::{DEFAULT_DESCRIPTION, ScriptParser, parse_script};
