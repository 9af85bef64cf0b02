//! Typed entities of the parsed presentation library.
//!
//! These types are produced once by [`crate::library::parse`] and are
//! immutable afterwards; every compilation call borrows the same
//! [`Library`]. They live here so the compiler modules can import them
//! without depending on the parser.

use crate::record::Field;
use serde::Serialize;

// ──────────────────────────────────────────────
// Enumerated field codes
// ──────────────────────────────────────────────

/// Geometry kind of a lookup entry (FTYP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Area,
    Line,
    Point,
}

impl GeometryKind {
    pub fn from_code(code: &str) -> Option<GeometryKind> {
        match code {
            "A" => Some(GeometryKind::Area),
            "L" => Some(GeometryKind::Line),
            "P" => Some(GeometryKind::Point),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match self {
            GeometryKind::Area => 'A',
            GeometryKind::Line => 'L',
            GeometryKind::Point => 'P',
        }
    }
}

/// Radar overlay priority of a lookup entry (RPRI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RadarPriority {
    OnTop,
    Suppressed,
}

impl RadarPriority {
    pub fn from_code(code: &str) -> Option<RadarPriority> {
        match code {
            "O" => Some(RadarPriority::OnTop),
            "S" => Some(RadarPriority::Suppressed),
            _ => None,
        }
    }
}

/// Record amendment status (STAT). Unknown values read as `Nil`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Nil,
    Add,
    Mod,
    Del,
}

impl RecordStatus {
    pub fn from_code(code: &str) -> RecordStatus {
        match code {
            "ADD" => RecordStatus::Add,
            "MOD" => RecordStatus::Mod,
            "DEL" => RecordStatus::Del,
            _ => RecordStatus::Nil,
        }
    }
}

/// Whether a graphic is defined in vector or raster form (PADF/SYDF).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Vector,
    Raster,
}

impl DefinitionKind {
    pub fn from_code(code: &str) -> DefinitionKind {
        match code {
            "R" => DefinitionKind::Raster,
            _ => DefinitionKind::Vector,
        }
    }
}

/// Pattern tiling arrangement (PATP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternFill {
    Staggered,
    Linear,
}

impl PatternFill {
    pub fn from_code(code: &str) -> PatternFill {
        match code {
            "LIN" => PatternFill::Linear,
            _ => PatternFill::Staggered,
        }
    }
}

/// Pattern tile spacing behaviour (PASP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSpacing {
    Constant,
    Scaled,
}

impl PatternSpacing {
    pub fn from_code(code: &str) -> PatternSpacing {
        match code {
            "SCL" => PatternSpacing::Scaled,
            _ => PatternSpacing::Constant,
        }
    }
}

// ──────────────────────────────────────────────
// Library identification
// ──────────────────────────────────────────────

/// The LBID identification record: edition, profile and issue dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryId {
    pub rcid: u32,
    pub exchange_purpose: String,
    pub product_type: String,
    pub exchange_set_id: String,
    pub edition: String,
    pub compile_date: String,
    pub compile_time: String,
    pub version_date: String,
    pub library_profile: String,
    pub object_catalogue_date: String,
    pub comment: String,
}

// ──────────────────────────────────────────────
// Colour tables
// ──────────────────────────────────────────────

/// A named display-mode colour table (COLS + CCIE*).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColourTable {
    pub rcid: u32,
    pub status: RecordStatus,
    /// Display mode name, e.g. "DAY_BRIGHT" or "NIGHT".
    pub name: String,
    pub entries: Vec<ColourEntry>,
}

/// One CIE xyY chromaticity definition for a colour token.
///
/// Token uniqueness is not guaranteed by the format; when a table repeats
/// a token, the later entry is the one in effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColourEntry {
    /// 5-character colour token, e.g. "NODTA".
    pub token: String,
    pub x: f64,
    pub y: f64,
    pub luminance: f64,
    pub usage: String,
}

// ──────────────────────────────────────────────
// Lookup entries
// ──────────────────────────────────────────────

/// One look-up table entry (LUPT + ATTC* + INST + DISC + LUCM).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupEntry {
    pub rcid: u32,
    pub status: RecordStatus,
    /// 6-character object class code, e.g. "ACHARE".
    pub object_class: String,
    pub geometry: GeometryKind,
    /// Display priority, 0-9.
    pub display_priority: u8,
    pub radar: RadarPriority,
    /// Table-set name, e.g. "PLAIN_BOUNDARIES" or "LINES".
    pub table_set: String,
    /// Ordered attribute-match conditions; order participates in the
    /// entry-matching rule.
    pub conditions: Vec<AttributeCondition>,
    pub instruction: Option<String>,
    pub display_category: Option<String>,
    pub comment: Option<String>,
}

/// One ATTC condition: 6-character attribute label plus match value.
/// An empty value is a presence check; the value "?" requires absence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeCondition {
    pub label: String,
    pub value: String,
}

// ──────────────────────────────────────────────
// Graphic modules
// ──────────────────────────────────────────────

/// Raster rows or vector command rows; whichever tag the module carries
/// determines the storage kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicShape {
    Raster(Vec<String>),
    Vector(Vec<String>),
}

/// Pattern module (PATT + PATD + PXPO* + PCRF + PBTM*|PVCT*).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternModule {
    pub rcid: u32,
    pub status: RecordStatus,
    pub def: PatternDefinition,
    pub exposition: Vec<String>,
    /// Colour-index letter to 5-character colour token, in file order.
    pub colour_refs: Vec<(char, String)>,
    pub shape: GraphicShape,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternDefinition {
    /// 8-character pattern name (PANM).
    pub name: String,
    pub kind: DefinitionKind,
    pub fill: PatternFill,
    pub spacing: PatternSpacing,
    /// Minimum and maximum tile distance (PAMI/PAMA), format units.
    pub min_distance: i32,
    pub max_distance: i32,
    pub pivot_col: i32,
    pub pivot_row: i32,
    pub box_width: i32,
    pub box_height: i32,
    pub box_col: i32,
    pub box_row: i32,
}

/// Symbol module (SYMB + SYMD + SXPO* + SCRF + SBTM*|SVCT*).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolModule {
    pub rcid: u32,
    pub status: RecordStatus,
    pub def: SymbolDefinition,
    pub exposition: Vec<String>,
    pub colour_refs: Vec<(char, String)>,
    pub shape: GraphicShape,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolDefinition {
    /// 8-character symbol name (SYNM).
    pub name: String,
    pub kind: DefinitionKind,
    pub pivot_col: i32,
    pub pivot_row: i32,
    pub box_width: i32,
    pub box_height: i32,
    pub box_col: i32,
    pub box_row: i32,
}

/// Linestyle module (LNST + LIND + LXPO* + LCRF + LVCT*); vector only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinestyleModule {
    pub rcid: u32,
    pub status: RecordStatus,
    pub def: LinestyleDefinition,
    pub exposition: Vec<String>,
    pub colour_refs: Vec<(char, String)>,
    pub rows: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinestyleDefinition {
    /// 8-character linestyle name (LINM).
    pub name: String,
    pub pivot_col: i32,
    pub pivot_row: i32,
    pub box_width: i32,
    pub box_height: i32,
    pub box_col: i32,
    pub box_row: i32,
}

// ──────────────────────────────────────────────
// The library
// ──────────────────────────────────────────────

/// A record group whose first tag is not in the known-module table,
/// preserved verbatim for forward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawModule {
    pub tag: String,
    pub fields: Vec<RawField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawField {
    pub tag: String,
    pub raw: String,
}

impl From<&Field> for RawField {
    fn from(field: &Field) -> RawField {
        RawField {
            tag: field.tag.clone(),
            raw: field.raw.clone(),
        }
    }
}

/// The parsed presentation library, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Library {
    pub id: Option<LibraryId>,
    pub colour_tables: Vec<ColourTable>,
    pub lookups: Vec<LookupEntry>,
    pub patterns: Vec<PatternModule>,
    pub symbols: Vec<SymbolModule>,
    pub linestyles: Vec<LinestyleModule>,
    pub unrecognized: Vec<RawModule>,
}

impl Library {
    pub fn colour_table(&self, name: &str) -> Option<&ColourTable> {
        self.colour_tables.iter().find(|t| t.name == name)
    }

    pub fn symbol(&self, name: &str) -> Option<&SymbolModule> {
        self.symbols.iter().find(|s| s.def.name == name)
    }

    pub fn pattern(&self, name: &str) -> Option<&PatternModule> {
        self.patterns.iter().find(|p| p.def.name == name)
    }

    pub fn linestyle(&self, name: &str) -> Option<&LinestyleModule> {
        self.linestyles.iter().find(|l| l.def.name == name)
    }
}
