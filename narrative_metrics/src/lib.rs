//! # Narrative Metrics
//!
//! Descriptive analyses over a game's parsed event dump and narrative
//! outline. This crate consumes the records produced by `script_sources`
//! and writes flat JSON metrics plus Markdown/CSV tables.
//!
//! ## Analyses
//!
//! - **census**: Summary counts of both sources and the outline's speakers
//! - **alignment**: Beat-by-beat alignment against a reference story
//! - **density**: Share of dialogue among each map's commands
//! - **network**: Keyword co-occurrence network with Louvain communities
//! - **motif**: How the contexts around one motif shift between arcs
//!
//! [`Pipeline`] runs them all; one failing analysis does not stop the others.

pub mod alignment;
pub mod census;
pub mod config;
pub mod density;
pub mod error;
pub mod motif;
pub mod network;
pub mod pipeline;
pub mod report;

pub use alignment::*;
pub use census::*;
pub use config::*;
pub use density::*;
pub use error::*;
pub use motif::*;
pub use network::*;
pub use pipeline::*;
pub use report::*;
