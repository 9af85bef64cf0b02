//! Assembly of record groups into the typed [`Library`].
//!
//! Records are identified by tag, not by position within their group; only
//! the attribute-code and graphic-row tags legitimately repeat. The first
//! tag of a group selects its constructor from a closed table -- anything
//! else lands in [`Library::unrecognized`] untouched.

use crate::error::{Diagnostic, Error};
use crate::model::*;
use crate::record::{self, FieldDef, RecordGroup, VARIABLE};

/// A parsed library plus everything non-fatal that happened on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub library: Library,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse the full text of a `.dai` presentation library file.
///
/// A group that cannot be constructed (missing mandatory record, raster
/// rows disagreeing with their declared extent) is reported and dropped;
/// the remaining groups still parse. Only input with no record groups at
/// all is a top-level error.
pub fn parse(text: &str) -> Result<ParseOutcome, Error> {
    let mut diagnostics = Vec::new();
    let groups = record::read_groups(text, &mut diagnostics);
    if groups.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut library = Library::default();
    for group in &groups {
        let Some(tag) = group.first_tag() else { continue };
        let result = match tag {
            "LBID" => parse_library_id(group).map(|id| library.id = Some(id)),
            "COLS" => parse_colour_table(group).map(|t| library.colour_tables.push(t)),
            "LUPT" => parse_lookup(group).map(|l| library.lookups.push(l)),
            "PATT" => parse_pattern(group).map(|p| library.patterns.push(p)),
            "SYMB" => parse_symbol(group).map(|s| library.symbols.push(s)),
            "LNST" => parse_linestyle(group).map(|l| library.linestyles.push(l)),
            other => {
                diagnostics.push(Diagnostic::warning(
                    other,
                    "unrecognized module kind, preserved as raw fields",
                ));
                library.unrecognized.push(RawModule {
                    tag: other.to_owned(),
                    fields: group.fields.iter().map(RawField::from).collect(),
                });
                Ok(())
            }
        };
        if let Err(err) = result {
            diagnostics.push(Diagnostic::error(tag, err.to_string()));
        }
    }

    Ok(ParseOutcome {
        library,
        diagnostics,
    })
}

// ──────────────────────────────────────────────
// Field layouts (IHO PresLib Part I, ch. 11)
// ──────────────────────────────────────────────

const LBID_DEF: FieldDef = &[
    ("modn", 2),
    ("rcid", 5),
    ("expp", 3),
    ("ptyp", VARIABLE),
    ("esid", VARIABLE),
    ("edtn", VARIABLE),
    ("codt", 8),
    ("coti", 6),
    ("vrdt", 8),
    ("prof", 2),
    ("ocdt", 8),
    ("comt", VARIABLE),
];

const COLS_DEF: FieldDef = &[("modn", 2), ("rcid", 5), ("stat", 3), ("ctus", VARIABLE)];

const CCIE_DEF: FieldDef = &[
    ("ctok", 5),
    ("chrx", VARIABLE),
    ("chry", VARIABLE),
    ("clum", VARIABLE),
    ("cuse", VARIABLE),
];

const LUPT_DEF: FieldDef = &[
    ("modn", 2),
    ("rcid", 5),
    ("stat", 3),
    ("obcl", 6),
    ("ftyp", 1),
    ("dpri", 5),
    ("rpri", 1),
    ("tnam", VARIABLE),
];

const MODULE_HEADER_DEF: FieldDef = &[("modn", 2), ("rcid", 5), ("stat", 3)];

const PATD_DEF: FieldDef = &[
    ("panm", 8),
    ("padf", 1),
    ("patp", 3),
    ("pasp", 3),
    ("pami", 5),
    ("pama", 5),
    ("pacl", 5),
    ("parw", 5),
    ("pahl", 5),
    ("pavl", 5),
    ("pbxc", 5),
    ("pbxr", 5),
];

const SYMD_DEF: FieldDef = &[
    ("synm", 8),
    ("sydf", 1),
    ("sycl", 5),
    ("syrw", 5),
    ("syhl", 5),
    ("syvl", 5),
    ("sbxc", 5),
    ("sbxr", 5),
];

const LIND_DEF: FieldDef = &[
    ("linm", 8),
    ("licl", 5),
    ("lirw", 5),
    ("lihl", 5),
    ("livl", 5),
    ("lbxc", 5),
    ("lbxr", 5),
];

// ──────────────────────────────────────────────
// Group constructors
// ──────────────────────────────────────────────

fn parse_library_id(group: &RecordGroup) -> Result<LibraryId, Error> {
    let field = mandatory(group, "LBID", "LBID")?;
    let line = record::decode_line(LBID_DEF, &field.raw);
    Ok(LibraryId {
        rcid: line.int("rcid") as u32,
        exchange_purpose: line.get("expp").to_owned(),
        product_type: line.get("ptyp").to_owned(),
        exchange_set_id: line.get("esid").to_owned(),
        edition: line.get("edtn").to_owned(),
        compile_date: line.get("codt").to_owned(),
        compile_time: line.get("coti").to_owned(),
        version_date: line.get("vrdt").to_owned(),
        library_profile: line.get("prof").to_owned(),
        object_catalogue_date: line.get("ocdt").to_owned(),
        comment: line.get("comt").to_owned(),
    })
}

fn parse_colour_table(group: &RecordGroup) -> Result<ColourTable, Error> {
    let header = mandatory(group, "COLS", "COLS")?;
    let line = record::decode_line(COLS_DEF, &header.raw);

    let mut entries = Vec::new();
    for field in group.all("CCIE") {
        let ccie = record::decode_line(CCIE_DEF, &field.raw);
        entries.push(ColourEntry {
            token: ccie.get("ctok").to_owned(),
            x: ccie.float("chrx"),
            y: ccie.float("chry"),
            luminance: ccie.float("clum"),
            usage: ccie.get("cuse").to_owned(),
        });
    }

    Ok(ColourTable {
        rcid: line.int("rcid") as u32,
        status: RecordStatus::from_code(line.get("stat")),
        name: line.get("ctus").to_owned(),
        entries,
    })
}

fn parse_lookup(group: &RecordGroup) -> Result<LookupEntry, Error> {
    let header = mandatory(group, "LUPT", "LUPT")?;
    let line = record::decode_line(LUPT_DEF, &header.raw);

    let geometry = GeometryKind::from_code(line.get("ftyp")).ok_or_else(|| {
        Error::MissingRecord {
            module: "LUPT".to_owned(),
            record: "geometry kind (FTYP)",
        }
    })?;

    let mut conditions = Vec::new();
    for field in group.all("ATTC") {
        if field.raw.is_empty() {
            continue;
        }
        for token in record::us_list(&field.raw) {
            if token.is_empty() {
                continue;
            }
            let (label, value) = record::take_fixed(token, 6);
            conditions.push(AttributeCondition { label, value });
        }
    }

    Ok(LookupEntry {
        rcid: line.int("rcid") as u32,
        status: RecordStatus::from_code(line.get("stat")),
        object_class: line.get("obcl").to_owned(),
        geometry,
        display_priority: line.int("dpri").clamp(0, 9) as u8,
        radar: RadarPriority::from_code(line.get("rpri")).unwrap_or(RadarPriority::OnTop),
        table_set: line.get("tnam").to_owned(),
        conditions,
        instruction: optional(group, "INST"),
        display_category: optional(group, "DISC"),
        comment: optional(group, "LUCM"),
    })
}

fn parse_pattern(group: &RecordGroup) -> Result<PatternModule, Error> {
    let header = mandatory(group, "PATT", "PATT")?;
    let line = record::decode_line(MODULE_HEADER_DEF, &header.raw);
    let def_field = mandatory(group, "PATT", "PATD")?;
    let d = record::decode_line(PATD_DEF, &def_field.raw);

    let def = PatternDefinition {
        name: d.get("panm").to_owned(),
        kind: DefinitionKind::from_code(d.get("padf")),
        fill: PatternFill::from_code(d.get("patp")),
        spacing: PatternSpacing::from_code(d.get("pasp")),
        min_distance: d.int("pami"),
        max_distance: d.int("pama"),
        pivot_col: d.int("pacl"),
        pivot_row: d.int("parw"),
        box_width: d.int("pahl"),
        box_height: d.int("pavl"),
        box_col: d.int("pbxc"),
        box_row: d.int("pbxr"),
    };
    let shape = graphic_shape(group, "PBTM", "PVCT", &def.name, def.box_width, def.box_height)?;

    Ok(PatternModule {
        rcid: line.int("rcid") as u32,
        status: RecordStatus::from_code(line.get("stat")),
        def,
        exposition: rows(group, "PXPO"),
        colour_refs: colour_refs(group, "PCRF"),
        shape,
    })
}

fn parse_symbol(group: &RecordGroup) -> Result<SymbolModule, Error> {
    let header = mandatory(group, "SYMB", "SYMB")?;
    let line = record::decode_line(MODULE_HEADER_DEF, &header.raw);
    let def_field = mandatory(group, "SYMB", "SYMD")?;
    let d = record::decode_line(SYMD_DEF, &def_field.raw);

    let def = SymbolDefinition {
        name: d.get("synm").to_owned(),
        kind: DefinitionKind::from_code(d.get("sydf")),
        pivot_col: d.int("sycl"),
        pivot_row: d.int("syrw"),
        box_width: d.int("syhl"),
        box_height: d.int("syvl"),
        box_col: d.int("sbxc"),
        box_row: d.int("sbxr"),
    };
    let shape = graphic_shape(group, "SBTM", "SVCT", &def.name, def.box_width, def.box_height)?;

    Ok(SymbolModule {
        rcid: line.int("rcid") as u32,
        status: RecordStatus::from_code(line.get("stat")),
        def,
        exposition: rows(group, "SXPO"),
        colour_refs: colour_refs(group, "SCRF"),
        shape,
    })
}

fn parse_linestyle(group: &RecordGroup) -> Result<LinestyleModule, Error> {
    let header = mandatory(group, "LNST", "LNST")?;
    let line = record::decode_line(MODULE_HEADER_DEF, &header.raw);
    let def_field = mandatory(group, "LNST", "LIND")?;
    let d = record::decode_line(LIND_DEF, &def_field.raw);

    Ok(LinestyleModule {
        rcid: line.int("rcid") as u32,
        status: RecordStatus::from_code(line.get("stat")),
        def: LinestyleDefinition {
            name: d.get("linm").to_owned(),
            pivot_col: d.int("licl"),
            pivot_row: d.int("lirw"),
            box_width: d.int("lihl"),
            box_height: d.int("livl"),
            box_col: d.int("lbxc"),
            box_row: d.int("lbxr"),
        },
        exposition: rows(group, "LXPO"),
        colour_refs: colour_refs(group, "LCRF"),
        rows: rows(group, "LVCT"),
    })
}

// ──────────────────────────────────────────────
// Shared helpers
// ──────────────────────────────────────────────

fn mandatory<'a>(
    group: &'a RecordGroup,
    module: &str,
    tag: &'static str,
) -> Result<&'a crate::record::Field, Error> {
    group.find(tag).ok_or_else(|| Error::MissingRecord {
        module: module.to_owned(),
        record: tag,
    })
}

fn optional(group: &RecordGroup, tag: &str) -> Option<String> {
    group.find(tag).map(|f| f.raw.clone())
}

fn rows(group: &RecordGroup, tag: &str) -> Vec<String> {
    group.all(tag).map(|f| f.raw.clone()).collect()
}

/// CIDX(1) + CTOK(5) groups, concatenated with no separator. A repeated
/// index letter overwrites its earlier mapping but keeps its position.
fn colour_refs(group: &RecordGroup, tag: &str) -> Vec<(char, String)> {
    let mut refs: Vec<(char, String)> = Vec::new();
    for field in group.all(tag) {
        for chunk in record::fixed_groups(&field.raw, 6) {
            let mut chars = chunk.chars();
            let Some(index) = chars.next() else { continue };
            let token: String = chars.collect();
            match refs.iter_mut().find(|(i, _)| *i == index) {
                Some(existing) => existing.1 = token,
                None => refs.push((index, token)),
            }
        }
    }
    refs
}

/// Bitmap rows win over vector rows when both tags are present; a raster
/// that does not fill its declared box is a data-integrity error, never
/// silently padded or truncated.
fn graphic_shape(
    group: &RecordGroup,
    raster_tag: &str,
    vector_tag: &'static str,
    name: &str,
    width: i32,
    height: i32,
) -> Result<GraphicShape, Error> {
    let raster = rows(group, raster_tag);
    if !raster.is_empty() {
        if raster.len() as i32 != height {
            return Err(Error::RasterDimensions {
                name: name.to_owned(),
                width,
                height,
                detail: format!("{} rows", raster.len()),
            });
        }
        if let Some(row) = raster.iter().find(|r| r.chars().count() as i32 != width) {
            return Err(Error::RasterDimensions {
                name: name.to_owned(),
                width,
                height,
                detail: format!("row of {} cells", row.chars().count()),
            });
        }
        return Ok(GraphicShape::Raster(raster));
    }

    let vector = rows(group, vector_tag);
    if vector.is_empty() {
        return Err(Error::MissingRecord {
            module: name.to_owned(),
            record: vector_tag,
        });
    }
    Ok(GraphicShape::Vector(vector))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
