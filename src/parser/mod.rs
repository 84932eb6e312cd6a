//! Parser for cliQ template files
//!
//! Two representations are produced from the same text: a typed
//! [`Document`] for consumers, and a positioned [`tree::Tree`] for the
//! validator.

mod decode;
pub mod model;
pub mod tree;

pub use decode::decode;
pub use model::*;
pub use tree::{parse_tree, Entry, Node, NodeKind, NodeValue, Position, ScalarStyle, Tree};
