//! Record-group splitting and fixed-width field decoding for the `.dai`
//! presentation library format.
//!
//! The file is plain text. Module instances are separated by lines
//! beginning with four (or more) asterisks; the separators belong to no
//! group. Every retained line inside a group is a field: a 4-letter tag,
//! an optional decimal length prefix, a payload of positional fields, and
//! an optional trailing run of Unit-Separator characters. Variable-width
//! sub-fields inside a payload are delimited by single Unit-Separators.

use crate::error::Diagnostic;

/// Unit Separator (0x1F), the sub-field delimiter of the record format.
pub const UNIT_SEP: char = '\u{1f}';

/// One decoded line: tag plus the stripped payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub tag: String,
    pub raw: String,
}

/// The contiguous fields of one module instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordGroup {
    pub fields: Vec<Field>,
}

impl RecordGroup {
    /// Tag of the first field, which identifies the module kind.
    pub fn first_tag(&self) -> Option<&str> {
        self.fields.first().map(|f| f.tag.as_str())
    }

    /// First field with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// All fields with the given tag, in file order.
    pub fn all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Field> {
        self.fields.iter().filter(move |f| f.tag == tag)
    }
}

/// Split the library text into record groups.
///
/// Blank lines and housekeeping lines consisting solely of digits and
/// whitespace are discarded. A line whose first four characters are not
/// letters is skipped with a warning -- unknown future records must not
/// abort the read.
pub fn read_groups(text: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<RecordGroup> {
    let mut groups = Vec::new();
    let mut fields = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.starts_with("****") {
            if !fields.is_empty() {
                groups.push(RecordGroup {
                    fields: std::mem::take(&mut fields),
                });
            }
            continue;
        }
        if line.is_empty() || line.chars().all(|c| c.is_ascii_digit() || c.is_whitespace()) {
            continue;
        }
        match decode_field(line) {
            Some(field) => fields.push(field),
            None => diagnostics.push(Diagnostic::warning(
                "record",
                format!("line does not start with a 4-letter field tag: {:?}", line),
            )),
        }
    }
    if !fields.is_empty() {
        groups.push(RecordGroup { fields });
    }
    groups
}

fn decode_field(line: &str) -> Option<Field> {
    let tag: String = line.chars().take(4).collect();
    if tag.chars().count() != 4 || !tag.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let payload: String = line.chars().skip(4).collect();
    // Strip the length prefix the legacy format carries after the tag,
    // then the Unit-Separator run that terminates the payload.
    let payload = payload.trim();
    let payload = payload.trim_start_matches(|c: char| c.is_ascii_digit()).trim();
    let payload = payload.trim_end_matches(UNIT_SEP);
    Some(Field {
        tag: tag.to_ascii_uppercase(),
        raw: payload.to_owned(),
    })
}

// ──────────────────────────────────────────────
// Positional payload decoding
// ──────────────────────────────────────────────

/// Width of a variable field, terminated by a Unit-Separator or the end
/// of the payload.
pub const VARIABLE: usize = 0;

/// An ordered field definition: (key, width) pairs consumed left to right.
pub type FieldDef = &'static [(&'static str, usize)];

/// A payload decoded against a [`FieldDef`], in definition order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLine {
    pairs: Vec<(&'static str, String)>,
}

impl DecodedLine {
    /// Value for a key; empty string when the payload ran out early.
    pub fn get(&self, key: &str) -> &str {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// Integer value for a key, zero when missing or unparseable.
    pub fn int(&self, key: &str) -> i32 {
        self.get(key).parse().unwrap_or(0)
    }

    /// Float value for a key, zero when missing or unparseable.
    pub fn float(&self, key: &str) -> f64 {
        self.get(key).parse().unwrap_or(0.0)
    }
}

/// Decode a payload against an ordered field definition. Field boundaries
/// are positional, not self-describing: each fixed slice is taken at its
/// declared width, each variable slice runs to the next Unit-Separator.
/// Extracted slices are whitespace-trimmed.
pub fn decode_line(def: FieldDef, raw: &str) -> DecodedLine {
    let chars: Vec<char> = raw.chars().collect();
    let mut start = 0usize;
    let mut pairs = Vec::with_capacity(def.len());

    for &(key, width) in def {
        let value = if width == VARIABLE {
            let end = chars[start.min(chars.len())..]
                .iter()
                .position(|&c| c == UNIT_SEP)
                .map(|i| start + i)
                .unwrap_or(chars.len());
            let slice: String = chars[start.min(chars.len())..end].iter().collect();
            start = end + 1;
            slice
        } else {
            let end = (start + width).min(chars.len());
            let slice: String = chars[start.min(chars.len())..end].iter().collect();
            start = end;
            slice
        };
        pairs.push((key, value.trim().to_owned()));
    }
    DecodedLine { pairs }
}

/// Split a Unit-Separator-delimited list, dropping one trailing separator.
pub fn us_list(payload: &str) -> Vec<&str> {
    let payload = payload.strip_suffix(UNIT_SEP).unwrap_or(payload);
    payload.split(UNIT_SEP).collect()
}

/// Split off a fixed number of characters from the front of a token.
pub fn take_fixed(token: &str, width: usize) -> (String, String) {
    let chars: Vec<char> = token.chars().collect();
    let cut = width.min(chars.len());
    (
        chars[..cut].iter().collect(),
        chars[cut..].iter().collect(),
    )
}

/// Consecutive fixed-width groups of a payload with no separator between
/// them; a trailing remainder shorter than `width` is ignored.
pub fn fixed_groups(payload: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = payload.chars().collect();
    let mut groups = Vec::new();
    let mut i = 0;
    while i + width <= chars.len() {
        groups.push(chars[i..i + width].iter().collect());
        i += width;
    }
    groups
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_split_on_asterisk_lines() {
        let text = "****\nCOLS 12AB\n****\nLUPT 34CD\nATTC 56EF\n****\n";
        let mut diags = Vec::new();
        let groups = read_groups(text, &mut diags);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].first_tag(), Some("COLS"));
        assert_eq!(groups[1].fields.len(), 2);
        assert!(diags.is_empty());
    }

    #[test]
    fn final_group_without_trailing_separator_is_kept() {
        let mut diags = Vec::new();
        let groups = read_groups("****\nLBID 7XY", &mut diags);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].first_tag(), Some("LBID"));
    }

    #[test]
    fn housekeeping_and_blank_lines_are_discarded() {
        let text = "0001    300001\n\n   \nCOLS 5NIL\n";
        let mut diags = Vec::new();
        let groups = read_groups(text, &mut diags);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].fields.len(), 1);
        assert!(diags.is_empty());
    }

    #[test]
    fn malformed_tag_is_skipped_with_a_warning() {
        let mut diags = Vec::new();
        let groups = read_groups("CO1S 5NIL\nCOLS 5NIL\n", &mut diags);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].fields.len(), 1);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn field_payload_strips_length_prefix_and_unit_separators() {
        let field = decode_field("INST   23AC(DEPMD)\u{1f}\u{1f}").unwrap();
        assert_eq!(field.tag, "INST");
        assert_eq!(field.raw, "AC(DEPMD)");
    }

    #[test]
    fn lowercase_tags_are_uppercased() {
        let field = decode_field("cols 3NIL").unwrap();
        assert_eq!(field.tag, "COLS");
    }

    const DEF: FieldDef = &[("a", 2), ("b", VARIABLE), ("c", 3), ("d", VARIABLE)];

    #[test]
    fn decode_line_consumes_fixed_and_variable_fields_in_order() {
        let line = decode_line(DEF, "XYhello\u{1f} 42rest");
        assert_eq!(line.get("a"), "XY");
        assert_eq!(line.get("b"), "hello");
        assert_eq!(line.get("c"), "42");
        assert_eq!(line.get("d"), "rest");
    }

    #[test]
    fn decode_line_tolerates_short_payloads() {
        let line = decode_line(DEF, "XY");
        assert_eq!(line.get("a"), "XY");
        assert_eq!(line.get("b"), "");
        assert_eq!(line.get("d"), "");
        assert_eq!(line.int("c"), 0);
    }

    #[test]
    fn us_list_drops_one_trailing_separator() {
        assert_eq!(us_list("a\u{1f}b\u{1f}"), vec!["a", "b"]);
        assert_eq!(us_list("a\u{1f}b"), vec!["a", "b"]);
    }

    #[test]
    fn fixed_groups_ignores_short_remainder() {
        assert_eq!(fixed_groups("ACHBLKBCHRED", 6), vec!["ACHBLK", "BCHRED"]);
        assert_eq!(fixed_groups("ACHBLKxx", 6), vec!["ACHBLK"]);
    }
}
