//! # Script Sources
//!
//! The parsing layer. Turns the two loosely structured source formats into
//! typed records that every analysis downstream consumes:
//!
//! - **event_dump**: the line-oriented RPG Maker event dump (maps, events,
//!   commands), plus per-map density and flattened dialogue.
//! - **outline**: the heading-structured Markdown narrative outline (arcs,
//!   sequences, beats, quoted dialogue and speakers).
//!
//! This crate holds no analysis logic. Records are built once per parse and
//! never mutated afterwards.

pub mod error;
pub mod event_dump;
pub mod outline;

pub use error::*;
pub use event_dump::*;
pub use outline::*;
