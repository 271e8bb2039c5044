//! Dynamic element tree: a recursive-descent XML parser producing a mutable,
//! arena-backed in-memory tree.
//!
//! Nodes live in an arena addressed by integer indices; the public surface
//! exposes opaque [`ElementRef`] handles, so parent/child links never form
//! ownership cycles. The tree is single-threaded by design: handles share the
//! arena through `Rc<RefCell<..>>` and must not cross threads.

pub mod arena;
pub mod element;
pub mod entity;
pub mod error;
pub mod parse;
pub mod pattern;

pub use arena::NodeId;
pub use element::{Document, ElementInit, ElementPatch, ElementRef, XmlWriteOptions};
pub use error::{Error, Result};
pub use parse::{ParseOptions, parse_document};
pub use pattern::{NamePattern, wildcard_to_regex};
