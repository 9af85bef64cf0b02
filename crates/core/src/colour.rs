//! CIE xyY to sRGB conversion and per-table colour palettes.
//!
//! The library defines colours as chromaticity (x, y) plus luminance on a
//! 0-100 scale. Display output wants 8-bit-per-channel hex strings, so the
//! conversion here must be bit-reproducible: same input, same hex, on
//! every platform.

use crate::model::{ColourTable, Library};
use std::collections::HashMap;

/// Convert CIE (x, y, L) to sRGB channels in 0-255.
///
/// y = 0 is a defined edge case (black), not an error.
pub fn cie_to_rgb(x: f64, y: f64, luminance: f64) -> [u8; 3] {
    if y == 0.0 {
        return [0, 0, 0];
    }

    // xyY -> XYZ
    let big_y = luminance / 100.0;
    let big_x = (x / y) * big_y;
    let big_z = ((1.0 - x - y) / y) * big_y;

    // XYZ -> linear RGB
    let linear = [
        3.2406 * big_x - 1.5372 * big_y - 0.4986 * big_z,
        -0.9689 * big_x + 1.8758 * big_y + 0.0415 * big_z,
        0.0557 * big_x - 0.2040 * big_y + 1.0570 * big_z,
    ];

    let mut rgb = [0u8; 3];
    for (out, c) in rgb.iter_mut().zip(linear) {
        let c = c.max(0.0);
        let c = if c <= 0.0031308 {
            12.92 * c
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        };
        *out = (c.min(1.0) * 255.0).round() as u8;
    }
    rgb
}

/// Format channels as "#RRGGBB" with uppercase hex digits.
pub fn rgb_to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

// ──────────────────────────────────────────────
// Palettes
// ──────────────────────────────────────────────

/// The converted colours of one display-mode table: token -> hex string.
///
/// When a table repeats a token, the later entry wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    name: String,
    colours: HashMap<String, String>,
}

impl Palette {
    pub fn from_table(table: &ColourTable) -> Palette {
        let mut colours = HashMap::new();
        for entry in &table.entries {
            colours.insert(
                entry.token.clone(),
                rgb_to_hex(cie_to_rgb(entry.x, entry.y, entry.luminance)),
            );
        }
        Palette {
            name: table.name.clone(),
            colours,
        }
    }

    /// Palette with no colours, for libraries without colour tables.
    pub fn empty(name: &str) -> Palette {
        Palette {
            name: name.to_owned(),
            colours: HashMap::new(),
        }
    }

    /// Palette for the named table, if the library has one.
    pub fn select(library: &Library, name: &str) -> Option<Palette> {
        library.colour_table(name).map(Palette::from_table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hex value for a colour token.
    pub fn hex(&self, token: &str) -> Option<&str> {
        self.colours.get(token).map(String::as_str)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
