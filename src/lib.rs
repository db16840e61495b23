//! The `fmi-gen` crate prepares a simulation, described by a tree of YAML documents, for export as
//! a ModelC FMU.
//!
//! It indexes the documents of a simulation directory, resolves which SimBus channel each
//! SignalGroup is wired to, compiles a deterministic direct index of signal byte offsets and
//! annotates SignalGroups with FMI variable information according to a ruleset.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fmi_gen::{annotate, options::AnnotateOptions};
//!
//! let options = AnnotateOptions {
//!     sim: "out/sim".into(),
//!     ruleset: Some("signal-direction".to_string()),
//!     index: true,
//!     ..Default::default()
//! };
//! let summary = annotate::run(&options).unwrap();
//! println!("annotated: {:?}", summary.annotated);
//! ```
#![deny(clippy::all)]

use std::path::PathBuf;

// Re-export the sim-kind crate
pub use sim_kind as kind;

pub mod annotate;
pub mod direct_index;
pub mod index;
pub mod options;
pub mod patch;
pub mod ruleset;
pub mod selector;
pub mod stack;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid simulation configuration: {0}")]
    Config(String),

    #[error("Unable to load rules: {0}")]
    Load(String),

    #[error("Not supported: {0}")]
    Unsupported(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unable to write {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },

    #[error(transparent)]
    Schema(#[from] sim_kind::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
