//! Firstline Core Library
//!
//! Title derivation and rename decision engine: keeps a note's filename in
//! sync with the first meaningful line of its content, reversibly
//! substituting filesystem-forbidden characters, optionally stripping
//! markup, and optionally mirroring the derived title into a frontmatter
//! alias property.

pub mod alias;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod host;
pub mod logging;
pub mod rename;
pub mod sanitize;
pub mod scope;
pub mod vault;
