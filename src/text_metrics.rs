use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static FONT_CACHE: Lazy<Mutex<FontCache>> = Lazy::new(|| Mutex::new(FontCache::new()));

/// Line height used when no font face is available, as a multiple of the font size.
const FALLBACK_LINE_HEIGHT: f32 = 1.2;
/// Bold glyphs are measured this much wider when falling back to the width table.
const FALLBACK_BOLD_SCALE: f32 = 1.08;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Bold => "bold",
        }
    }

    fn to_fontdb(self) -> Weight {
        match self {
            Self::Normal => Weight::NORMAL,
            Self::Bold => Weight::BOLD,
        }
    }
}

/// Size of a piece of text in points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// Measures text in points. Implementations must be deterministic for a given
/// input so the layout is reproducible.
pub trait TextMeasurer: Send + Sync {
    fn measure(&self, text: &str, font_size: f32, weight: FontWeight) -> TextExtent;
}

/// Measures against a real font face resolved through the system font database,
/// falling back to a calibrated width table when no face matches.
#[derive(Debug, Clone)]
pub struct FontMeasurer {
    font_family: String,
}

impl FontMeasurer {
    pub fn new(font_family: impl Into<String>) -> Self {
        Self {
            font_family: font_family.into(),
        }
    }
}

impl TextMeasurer for FontMeasurer {
    fn measure(&self, text: &str, font_size: f32, weight: FontWeight) -> TextExtent {
        if text.is_empty() || font_size <= 0.0 {
            return TextExtent::default();
        }
        let measured = FONT_CACHE
            .lock()
            .ok()
            .and_then(|mut cache| cache.measure(text, font_size, &self.font_family, weight));
        measured.unwrap_or_else(|| fallback_extent(text, font_size, weight))
    }
}

/// Character-count based measurement with fixed factors; used by tests and
/// anywhere a font database is unwanted.
#[derive(Debug, Clone, Copy)]
pub struct DeterministicMeasurer {
    pub char_width_factor: f32,
    pub line_height_factor: f32,
    pub bold_scale: f32,
}

impl Default for DeterministicMeasurer {
    fn default() -> Self {
        Self {
            char_width_factor: 0.6,
            line_height_factor: FALLBACK_LINE_HEIGHT,
            bold_scale: 1.1,
        }
    }
}

impl TextMeasurer for DeterministicMeasurer {
    fn measure(&self, text: &str, font_size: f32, weight: FontWeight) -> TextExtent {
        if text.is_empty() || font_size <= 0.0 {
            return TextExtent::default();
        }
        let lines: Vec<&str> = text.split('\n').collect();
        let max_chars = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let scale = match weight {
            FontWeight::Normal => 1.0,
            FontWeight::Bold => self.bold_scale,
        };
        TextExtent {
            width: max_chars as f32 * font_size * self.char_width_factor * scale,
            height: lines.len() as f32 * font_size * self.line_height_factor,
        }
    }
}

struct FontCache {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<(String, FontWeight), Option<FontFace>>,
}

impl FontCache {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(
        &mut self,
        text: &str,
        font_size: f32,
        font_family: &str,
        weight: FontWeight,
    ) -> Option<TextExtent> {
        let key = (normalize_family_key(font_family), weight);
        if !self.faces.contains_key(&key) {
            let face = self.load_face(font_family, weight);
            self.faces.insert(key.clone(), face);
        }
        let face = self.faces.get(&key)?.as_ref()?;
        let normalized = text.replace('\t', "    ");
        let lines: Vec<&str> = normalized.split('\n').collect();
        let width = lines
            .iter()
            .map(|line| face.line_width(line, font_size))
            .fold(0.0f32, f32::max);
        Some(TextExtent {
            width,
            height: lines.len() as f32 * face.line_height(font_size),
        })
    }

    fn load_face(&mut self, font_family: &str, weight: FontWeight) -> Option<FontFace> {
        #[derive(Clone, Copy)]
        enum FamilyToken {
            Generic(Family<'static>),
            Name(usize),
        }

        let mut names: Vec<String> = Vec::new();
        let mut order: Vec<FamilyToken> = Vec::new();
        for part in font_family.split(',') {
            let raw = part.trim().trim_matches('"').trim_matches('\'');
            if raw.is_empty() {
                continue;
            }
            match raw.to_ascii_lowercase().as_str() {
                "serif" => order.push(FamilyToken::Generic(Family::Serif)),
                "sans-serif" | "system-ui" => order.push(FamilyToken::Generic(Family::SansSerif)),
                "monospace" => order.push(FamilyToken::Generic(Family::Monospace)),
                _ => {
                    order.push(FamilyToken::Name(names.len()));
                    names.push(raw.to_string());
                }
            }
        }
        if order.is_empty() {
            order.push(FamilyToken::Generic(Family::SansSerif));
        }
        let families: Vec<Family<'_>> = order
            .iter()
            .map(|token| match *token {
                FamilyToken::Generic(family) => family,
                FamilyToken::Name(idx) => Family::Name(names[idx].as_str()),
            })
            .collect();

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: weight.to_fontdb(),
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
            .flatten()
    }
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
    ascii_advances: [u16; 128],
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        let units_per_em = face.units_per_em().max(1) as f32;
        let ascender = face.ascender() as f32;
        let descender = face.descender() as f32;
        Some(Self {
            data,
            index,
            units_per_em,
            ascender,
            descender,
            ascii_advances,
        })
    }

    fn line_height(&self, font_size: f32) -> f32 {
        let height = (self.ascender - self.descender) / self.units_per_em * font_size;
        if height > 0.0 {
            height
        } else {
            font_size * FALLBACK_LINE_HEIGHT
        }
    }

    fn line_width(&self, line: &str, font_size: f32) -> f32 {
        let scale = font_size / self.units_per_em;
        let fallback = font_size * 0.56;

        if line.is_ascii() {
            return line
                .bytes()
                .map(|byte| match self.ascii_advances[byte as usize] {
                    0 => fallback,
                    advance => advance as f32 * scale,
                })
                .sum::<f32>()
                .max(0.0);
        }

        let Ok(face) = Face::parse(&self.data, self.index) else {
            return line.chars().count() as f32 * fallback;
        };
        line.chars()
            .map(|ch| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map(|advance| advance as f32 * scale)
                    .unwrap_or(fallback)
            })
            .sum::<f32>()
            .max(0.0)
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

fn fallback_extent(text: &str, font_size: f32, weight: FontWeight) -> TextExtent {
    let scale = match weight {
        FontWeight::Normal => 1.0,
        FontWeight::Bold => FALLBACK_BOLD_SCALE,
    };
    let lines: Vec<&str> = text.split('\n').collect();
    let width = lines
        .iter()
        .map(|line| line.chars().map(char_width_factor).sum::<f32>())
        .fold(0.0f32, f32::max);
    TextExtent {
        width: width * font_size * scale,
        height: lines.len() as f32 * font_size * FALLBACK_LINE_HEIGHT,
    }
}

/// Advance widths, as a fraction of the font size, for a DejaVu-like sans face.
fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.318,
        '.' | ',' | ':' | ';' | '|' | '!' | '\'' => 0.318,
        '(' | ')' | '[' | ']' | '{' | '}' => 0.39,
        'i' | 'j' | 'l' => 0.278,
        'f' | 't' | 'r' => 0.39,
        'I' | 'J' => 0.295,
        'm' | 'w' => 0.85,
        'M' | 'W' => 0.92,
        'A'..='Z' => 0.7,
        'a'..='z' => 0.61,
        '0'..='9' => 0.636,
        '-' | '+' | '=' | '<' | '>' => 0.6,
        '@' | '#' | '%' | '&' => 0.9,
        _ => 0.62,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_measurer_scales_with_font_size() {
        let m = DeterministicMeasurer::default();
        let small = m.measure("Hello", 10.0, FontWeight::Normal);
        let large = m.measure("Hello", 20.0, FontWeight::Normal);
        assert!((large.width - small.width * 2.0).abs() < 1e-4);
        assert!((large.height - small.height * 2.0).abs() < 1e-4);
    }

    #[test]
    fn bold_is_wider_than_normal() {
        let m = DeterministicMeasurer::default();
        let normal = m.measure("A", 18.0, FontWeight::Normal);
        let bold = m.measure("A", 18.0, FontWeight::Bold);
        assert!(bold.width > normal.width);
        assert_eq!(bold.height, normal.height);
    }

    #[test]
    fn empty_text_has_no_extent() {
        let m = DeterministicMeasurer::default();
        assert_eq!(m.measure("", 12.0, FontWeight::Bold), TextExtent::default());
        let font = FontMeasurer::new("sans-serif");
        assert_eq!(font.measure("", 12.0, FontWeight::Normal), TextExtent::default());
    }

    #[test]
    fn multi_line_text_stacks_lines() {
        let m = DeterministicMeasurer::default();
        let one = m.measure("abc", 10.0, FontWeight::Normal);
        let two = m.measure("abc\nab", 10.0, FontWeight::Normal);
        assert_eq!(one.width, two.width);
        assert!((two.height - one.height * 2.0).abs() < 1e-4);
    }

    #[test]
    fn fallback_distinguishes_narrow_and_wide_glyphs() {
        let narrow = fallback_extent("i", 16.0, FontWeight::Normal);
        let wide = fallback_extent("W", 16.0, FontWeight::Normal);
        assert!(wide.width > narrow.width);
        let bold = fallback_extent("W", 16.0, FontWeight::Bold);
        assert!(bold.width > wide.width);
    }

    #[test]
    fn font_measurer_always_yields_positive_extent() {
        // Works with or without system fonts installed.
        let m = FontMeasurer::new("DejaVu Sans, sans-serif");
        let extent = m.measure("Panel", 12.0, FontWeight::Bold);
        assert!(extent.width > 0.0);
        assert!(extent.height > 0.0);
    }
}
