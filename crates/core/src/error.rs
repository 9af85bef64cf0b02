//! Error taxonomy and non-fatal diagnostics.
//!
//! Two channels: [`Error`] for conditions that abort the current unit of
//! work (a record group, a single instruction string, or the whole parse
//! when the input is unusable), and [`Diagnostic`] for everything the
//! pipeline recovers from. One bad group or instruction never takes down
//! the rest of the library.

use serde::Serialize;
use std::fmt;

/// A fatal condition, scoped to the unit of work that raised it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The input text contains no record groups at all.
    #[error("input contains no record groups")]
    EmptyInput,

    /// A module group lacks the record it cannot be constructed without.
    #[error("{module} group is missing its mandatory {record} record")]
    MissingRecord {
        module: String,
        record: &'static str,
    },

    /// Raster rows disagree with the declared bounding-box extent.
    #[error("raster for '{name}' does not fill its declared {width}x{height} box: {detail}")]
    RasterDimensions {
        name: String,
        width: i32,
        height: i32,
        detail: String,
    },

    /// An instruction does not match the `CC(p1,p2,...)` grammar.
    #[error("invalid symbology instruction {0:?}")]
    InstructionSyntax(String),

    /// A parsed command code has no registry entry.
    #[error("unknown symbology command '{0}'")]
    UnknownCommand(String),

    /// A command received a parameter of the wrong shape.
    #[error("{command}: {detail}")]
    BadParameter {
        command: &'static str,
        detail: String,
    },
}

// ──────────────────────────────────────────────
// Diagnostics
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Recovered without losing output (skipped line, unresolved name, ...).
    Warning,
    /// A group or instruction was dropped; the rest of the run continued.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A non-fatal finding surfaced to the caller alongside the parse or
/// compile result. `context` names the unit that produced it (a field
/// tag, an object class, a command code).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub context: String,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(context: impl Into<String>, message: impl Into<String>) -> Self {
        let diagnostic = Diagnostic {
            severity: Severity::Warning,
            context: context.into(),
            message: message.into(),
        };
        log::warn!("{}: {}", diagnostic.context, diagnostic.message);
        diagnostic
    }

    pub fn error(context: impl Into<String>, message: impl Into<String>) -> Self {
        let diagnostic = Diagnostic {
            severity: Severity::Error,
            context: context.into(),
            message: message.into(),
        };
        log::error!("{}: {}", diagnostic.context, diagnostic.message);
        diagnostic
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.context, self.message)
    }
}
