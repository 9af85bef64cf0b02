//! preslib-core: S-52 presentation library reader and symbology compiler.
//!
//! Turns the fixed-format `.dai` record file -- colour tables, graphic
//! modules and lookup rules -- into declarative rendering rules: a filter
//! tree, paint/layout properties and a draw-order key per rule. The
//! whole pipeline is a pure transformation of the input text; file I/O,
//! sprite generation and actual drawing live with the callers.
//!
//! # Public API
//!
//! Key entry points are re-exported at the crate root:
//!
//! - [`parse()`] -- `.dai` text to a typed [`Library`]
//! - [`compile()`] -- [`Library`] + [`CompileConfig`] to rendering rules
//! - [`Palette`] / [`cie_to_rgb()`] -- colour table resolution
//!
//! Per-module entry points (record decoding, instruction parsing, the
//! command registry) stay public for selective use.

pub mod colour;
pub mod command;
pub mod compile;
pub mod error;
pub mod filter;
pub mod format;
pub mod instruction;
pub mod library;
pub mod model;
pub mod procedure;
pub mod record;
pub mod rule;

// ── Convenience re-exports: key types ────────────────────────────────

pub use error::{Diagnostic, Error, Severity};
pub use model::Library;
pub use rule::{Rule, RuleKind};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use colour::{cie_to_rgb, rgb_to_hex, Palette};
pub use compile::{compile, BoundaryStyle, CompileConfig, CompileOutcome, PointSymbolStyle};
pub use library::{parse, ParseOutcome};
