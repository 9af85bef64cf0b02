//! Lookup resolution and rule assembly: the compilation entry point.
//!
//! For the active table-sets, every lookup entry of an object class forms
//! a match group. A single entry applies unconditionally; in a larger
//! group the first entry is the fallback and applies exactly when no
//! other entry matches. Each fragment a command produces is combined
//! with the scale guard, the geometry guard and the entry's attribute
//! conditions, then ordered by the priority key.

use crate::colour::Palette;
use crate::command::{self, Context};
use crate::error::Diagnostic;
use crate::filter::{self, Filter};
use crate::model::{Library, LookupEntry};
use crate::rule::{Fragment, Rule, RuleKind};
use std::collections::HashMap;

/// Area boundary rendering mode, selecting one boundary table-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryStyle {
    Plain,
    Symbolized,
}

/// Point symbol rendering mode, selecting one point table-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSymbolStyle {
    PaperChart,
    Simplified,
}

/// Options for one compilation run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileConfig {
    /// Colour table (display mode) name, e.g. "DAY".
    pub colour_table: String,
    pub boundaries: BoundaryStyle,
    pub symbols: PointSymbolStyle,
    /// Depth-band thresholds in metres for the depth-area procedures.
    pub shallow_depth: f64,
    pub safety_depth: f64,
    pub deep_depth: f64,
    /// Renderer tile size, feeding the scale-visibility constant.
    pub tile_size: u32,
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig {
            colour_table: "DAY".to_owned(),
            boundaries: BoundaryStyle::Plain,
            symbols: PointSymbolStyle::PaperChart,
            shallow_depth: 2.0,
            safety_depth: 6.0,
            deep_depth: 30.0,
            tile_size: 512,
        }
    }
}

/// Compiled rules plus everything non-fatal that happened on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutcome {
    pub rules: Vec<Rule>,
    pub diagnostics: Vec<Diagnostic>,
}

/// The table-sets the configuration makes active: lines always, one
/// boundary set, one point-symbol set.
pub fn active_table_sets(config: &CompileConfig) -> [&'static str; 3] {
    [
        "LINES",
        match config.boundaries {
            BoundaryStyle::Plain => "PLAIN_BOUNDARIES",
            BoundaryStyle::Symbolized => "SYMBOLIZED_BOUNDARIES",
        },
        match config.symbols {
            PointSymbolStyle::PaperChart => "PAPER_CHART",
            PointSymbolStyle::Simplified => "SIMPLIFIED",
        },
    ]
}

/// Compile the library's active lookup entries into rendering rules.
///
/// The background rule comes first; the rest follow lookup order. A
/// malformed instruction string drops its entry only.
pub fn compile(library: &Library, config: &CompileConfig) -> CompileOutcome {
    let mut diagnostics = Vec::new();
    let palette = select_palette(library, config, &mut diagnostics);
    let ctx = Context {
        library,
        palette: &palette,
        config,
    };

    let mut rules = Vec::new();
    rules.push(background(&ctx, &mut diagnostics));

    let mut seq = 0usize;
    for group in match_groups(library, config) {
        if group.len() <= 1 {
            for &entry in &group {
                emit(entry, None, &ctx, &mut rules, &mut seq, &mut diagnostics);
            }
            continue;
        }
        // The first entry of a group is the fallback: it applies exactly
        // when no other entry's ordered condition list matches.
        let arms: Vec<Filter> = group[1..]
            .iter()
            .map(|entry| {
                filter::all(filter::attribute_conditions(&entry.conditions))
                    .unwrap_or(Filter::All(vec![]))
            })
            .collect();
        let fallback = Filter::Not(Box::new(Filter::Any(arms)));
        emit(
            group[0],
            Some(fallback),
            &ctx,
            &mut rules,
            &mut seq,
            &mut diagnostics,
        );
        for &entry in &group[1..] {
            emit(entry, None, &ctx, &mut rules, &mut seq, &mut diagnostics);
        }
    }

    CompileOutcome { rules, diagnostics }
}

/// Active lookup entries grouped by (object class, table-set), in order
/// of first appearance.
fn match_groups<'a>(library: &'a Library, config: &CompileConfig) -> Vec<Vec<&'a LookupEntry>> {
    let sets = active_table_sets(config);
    let mut groups: Vec<Vec<&LookupEntry>> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for entry in &library.lookups {
        if !sets.contains(&entry.table_set.as_str()) {
            continue;
        }
        let key = (entry.object_class.as_str(), entry.table_set.as_str());
        match index.get(&key) {
            Some(&i) => groups[i].push(entry),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![entry]);
            }
        }
    }
    groups
}

fn emit(
    entry: &LookupEntry,
    fallback: Option<Filter>,
    ctx: &Context<'_>,
    rules: &mut Vec<Rule>,
    seq: &mut usize,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(instruction) = entry.instruction.as_deref() else {
        return;
    };
    let fragments = match command::compile_instructions(instruction, ctx, diagnostics) {
        Ok(fragments) => fragments,
        Err(err) => {
            diagnostics.push(Diagnostic::error(
                format!("{} {}", entry.object_class, entry.table_set),
                err.to_string(),
            ));
            return;
        }
    };

    for fragment in fragments {
        let mut filters = vec![
            filter::scale_range(ctx.config.tile_size),
            Filter::Geometry(entry.geometry),
        ];
        filters.extend(filter::attribute_conditions(&entry.conditions));
        if let Some(fallback) = &fallback {
            filters.push(fallback.clone());
        }
        let id = format!("{}-{}-{}", seq, entry.object_class, entry.geometry.code());
        *seq += 1;
        rules.push(Rule::assemble(
            id,
            Some(entry.object_class.clone()),
            fragment,
            filters,
            entry.display_priority,
        ));
    }
}

/// The chart background, filled with the no-data colour of the active
/// palette.
fn background(ctx: &Context<'_>, diagnostics: &mut Vec<Diagnostic>) -> Rule {
    let mut fragment = Fragment::new(RuleKind::Background);
    fragment.paint.background_colour =
        Some(command::colour_hex("NODTA", "background", ctx, diagnostics));
    Rule::assemble("background".to_owned(), None, fragment, Vec::new(), 0)
}

fn select_palette(
    library: &Library,
    config: &CompileConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Palette {
    if let Some(palette) = Palette::select(library, &config.colour_table) {
        return palette;
    }
    match library.colour_tables.first() {
        Some(first) => {
            diagnostics.push(Diagnostic::warning(
                "palette",
                format!(
                    "colour table '{}' not found, using '{}'",
                    config.colour_table, first.name
                ),
            ));
            Palette::from_table(first)
        }
        None => {
            diagnostics.push(Diagnostic::error(
                "palette",
                "library has no colour tables",
            ));
            Palette::empty(&config.colour_table)
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AttributeCondition, ColourEntry, ColourTable, GeometryKind, RadarPriority, RecordStatus,
    };

    fn colour_table() -> ColourTable {
        ColourTable {
            rcid: 1,
            status: RecordStatus::Nil,
            name: "DAY".to_owned(),
            entries: vec![ColourEntry {
                token: "NODTA".to_owned(),
                x: 0.28,
                y: 0.31,
                luminance: 40.0,
                usage: "grey".to_owned(),
            }],
        }
    }

    fn lookup(
        object_class: &str,
        table_set: &str,
        conditions: &[(&str, &str)],
        instruction: Option<&str>,
    ) -> LookupEntry {
        LookupEntry {
            rcid: 0,
            status: RecordStatus::Nil,
            object_class: object_class.to_owned(),
            geometry: GeometryKind::Area,
            display_priority: 3,
            radar: RadarPriority::OnTop,
            table_set: table_set.to_owned(),
            conditions: conditions
                .iter()
                .map(|(label, value)| AttributeCondition {
                    label: (*label).to_owned(),
                    value: (*value).to_owned(),
                })
                .collect(),
            instruction: instruction.map(str::to_owned),
            display_category: None,
            comment: None,
        }
    }

    fn library(lookups: Vec<LookupEntry>) -> Library {
        Library {
            colour_tables: vec![colour_table()],
            lookups,
            ..Library::default()
        }
    }

    #[test]
    fn table_set_selection_follows_the_config() {
        let config = CompileConfig::default();
        assert_eq!(
            active_table_sets(&config),
            ["LINES", "PLAIN_BOUNDARIES", "PAPER_CHART"]
        );
        let config = CompileConfig {
            boundaries: BoundaryStyle::Symbolized,
            symbols: PointSymbolStyle::Simplified,
            ..CompileConfig::default()
        };
        assert_eq!(
            active_table_sets(&config),
            ["LINES", "SYMBOLIZED_BOUNDARIES", "SIMPLIFIED"]
        );
    }

    #[test]
    fn background_rule_comes_first() {
        let outcome = compile(&library(vec![]), &CompileConfig::default());
        assert_eq!(outcome.rules.len(), 1);
        let background = &outcome.rules[0];
        assert_eq!(background.id, "background");
        assert_eq!(background.kind, RuleKind::Background);
        assert_eq!(
            background.paint.background_colour.as_deref(),
            Some("#93AEBB")
        );
        assert_eq!(background.sort_key, 0);
    }

    #[test]
    fn inactive_table_sets_are_ignored() {
        let outcome = compile(
            &library(vec![lookup(
                "ACHARE",
                "SYMBOLIZED_BOUNDARIES",
                &[],
                Some("AC(NODTA)"),
            )]),
            &CompileConfig::default(),
        );
        assert_eq!(outcome.rules.len(), 1); // background only
    }

    #[test]
    fn single_entry_applies_with_scale_and_geometry_guards() {
        let outcome = compile(
            &library(vec![lookup(
                "ACHARE",
                "PLAIN_BOUNDARIES",
                &[],
                Some("AC(NODTA)"),
            )]),
            &CompileConfig::default(),
        );
        assert_eq!(outcome.rules.len(), 2);
        let rule = &outcome.rules[1];
        assert_eq!(rule.id, "0-ACHARE-A");
        assert_eq!(rule.object_class.as_deref(), Some("ACHARE"));
        assert_eq!(
            rule.filter,
            filter::all(vec![
                filter::scale_range(512),
                Filter::Geometry(GeometryKind::Area),
            ])
        );
        assert_eq!(rule.sort_key, 33);
    }

    #[test]
    fn fallback_entry_negates_the_other_entries_conditions() {
        let outcome = compile(
            &library(vec![
                lookup("RESARE", "PLAIN_BOUNDARIES", &[], Some("AC(NODTA)")),
                lookup(
                    "RESARE",
                    "PLAIN_BOUNDARIES",
                    &[("CATREA", "4")],
                    Some("AC(NODTA)"),
                ),
                lookup(
                    "RESARE",
                    "PLAIN_BOUNDARIES",
                    &[("CATREA", "9"), ("RESTRN", "")],
                    Some("AC(NODTA)"),
                ),
            ]),
            &CompileConfig::default(),
        );
        assert_eq!(outcome.rules.len(), 4);

        let fallback = &outcome.rules[1];
        let expected = Filter::Not(Box::new(Filter::Any(vec![
            Filter::equals("CATREA", "4"),
            Filter::All(vec![
                Filter::equals("CATREA", "9"),
                Filter::has("RESTRN"),
            ]),
        ])));
        match &fallback.filter {
            Some(Filter::All(parts)) => assert_eq!(parts[2], expected),
            other => panic!("expected a conjunction, got {other:?}"),
        }

        // The conditioned entries carry their own ordered conjunctions.
        match &outcome.rules[2].filter {
            Some(Filter::All(parts)) => {
                assert_eq!(parts[2], Filter::equals("CATREA", "4"));
            }
            other => panic!("expected a conjunction, got {other:?}"),
        }
    }

    #[test]
    fn malformed_instruction_drops_its_entry_only() {
        let outcome = compile(
            &library(vec![
                lookup("ACHARE", "PLAIN_BOUNDARIES", &[], Some("not-a-command")),
                lookup("DEPARE", "PLAIN_BOUNDARIES", &[], Some("AC(NODTA)")),
            ]),
            &CompileConfig::default(),
        );
        assert_eq!(outcome.rules.len(), 2); // background + DEPARE
        assert_eq!(outcome.rules[1].object_class.as_deref(), Some("DEPARE"));
        assert!(outcome
            .diagnostics
            .iter()
            .any(|d| d.context == "ACHARE PLAIN_BOUNDARIES"));
    }

    #[test]
    fn entry_without_an_instruction_emits_nothing() {
        let outcome = compile(
            &library(vec![lookup("ACHARE", "PLAIN_BOUNDARIES", &[], None)]),
            &CompileConfig::default(),
        );
        assert_eq!(outcome.rules.len(), 1);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn missing_colour_table_falls_back_to_the_first() {
        let outcome = compile(
            &library(vec![]),
            &CompileConfig {
                colour_table: "NIGHT".to_owned(),
                ..CompileConfig::default()
            },
        );
        assert_eq!(
            outcome.rules[0].paint.background_colour.as_deref(),
            Some("#93AEBB")
        );
        assert_eq!(outcome.diagnostics.len(), 1);
    }
}
