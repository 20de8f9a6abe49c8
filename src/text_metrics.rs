use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Mutex;
use ttf_parser::Face;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Ink box of a run of text at a given font size, in pixels.
///
/// `ascent`/`descent` are `None` when the measurer cannot report vertical
/// extents; callers then fall back to the font size as the height.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub width: f64,
    pub ascent: Option<f64>,
    pub descent: Option<f64>,
}

impl TextExtent {
    pub fn height_or(&self, font_size: f64) -> f64 {
        match (self.ascent, self.descent) {
            (Some(ascent), Some(descent)) => ascent + descent,
            _ => font_size,
        }
    }

    /// Ascent and descent, splitting `font_size` when the face reported none.
    pub fn vertical_or(&self, font_size: f64) -> (f64, f64) {
        match (self.ascent, self.descent) {
            (Some(ascent), Some(descent)) => (ascent, descent),
            _ => ((1.0 - FALLBACK_DESCENT) * font_size, FALLBACK_DESCENT * font_size),
        }
    }
}

pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: f64, font_family: &str) -> TextExtent;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn measure(&self, text: &str, font_size: f64, font_family: &str) -> TextExtent {
        (**self).measure(text, font_size, font_family)
    }
}

/// Measures against installed system fonts, falling back to
/// [`CharWidthMeasurer`] when no face matches the family list.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontMetrics;

impl TextMeasure for FontMetrics {
    fn measure(&self, text: &str, font_size: f64, font_family: &str) -> TextExtent {
        measure_text(text, font_size, font_family)
            .unwrap_or_else(|| CharWidthMeasurer.measure(text, font_size, font_family))
    }
}

/// Deterministic measurer using per-character width factors calibrated for a
/// sans-serif stack. Needs no font files.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharWidthMeasurer;

const FALLBACK_ASCENT: f64 = 0.75;
const FALLBACK_DESCENT: f64 = 0.21;

impl TextMeasure for CharWidthMeasurer {
    fn measure(&self, text: &str, font_size: f64, _font_family: &str) -> TextExtent {
        if text.is_empty() || font_size <= 0.0 {
            return TextExtent::default();
        }
        let factor: f64 = text.chars().map(char_width_factor).sum();
        TextExtent {
            width: factor * font_size,
            ascent: Some(FALLBACK_ASCENT * font_size),
            descent: Some(FALLBACK_DESCENT * font_size),
        }
    }
}

pub fn measure_text(text: &str, font_size: f64, font_family: &str) -> Option<TextExtent> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(TextExtent::default());
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

pub fn char_width_factor(ch: char) -> f64 {
    match ch {
        ' ' => 0.306,
        '\\' | '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' => 0.321,
        'A' => 0.652,
        'B' => 0.648,
        'C' => 0.734,
        'D' => 0.723,
        'E' => 0.594,
        'F' => 0.575,
        'G' | 'H' => 0.742,
        'I' => 0.272,
        'J' => 0.557,
        'K' => 0.648,
        'L' => 0.559,
        'M' => 0.903,
        'N' => 0.763,
        'O' => 0.754,
        'P' => 0.623,
        'Q' => 0.755,
        'R' => 0.637,
        'S' => 0.633,
        'T' => 0.599,
        'U' => 0.746,
        'V' => 0.661,
        'W' => 0.958,
        'X' => 0.655,
        'Y' => 0.646,
        'Z' => 0.621,
        'a' => 0.550,
        'b' => 0.603,
        'c' => 0.547,
        'd' => 0.609,
        'e' => 0.570,
        'f' => 0.340,
        'g' | 'h' => 0.600,
        'i' => 0.235,
        'j' => 0.227,
        'k' => 0.522,
        'l' => 0.239,
        'm' => 0.867,
        'n' => 0.585,
        'o' => 0.574,
        'p' => 0.595,
        'q' => 0.585,
        'r' => 0.364,
        's' => 0.523,
        't' => 0.305,
        'u' => 0.585,
        'v' => 0.545,
        'w' => 0.811,
        'x' => 0.538,
        'y' => 0.556,
        'z' => 0.550,
        '0' => 0.613,
        '1' => 0.396,
        '2' => 0.609,
        '3' => 0.597,
        '4' => 0.614,
        '5' => 0.586,
        '6' => 0.608,
        '7' => 0.559,
        '8' => 0.611,
        '9' => 0.595,
        '@' | '#' | '%' | '&' => 0.946,
        _ => 0.568,
    }
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    cache: HashMap<String, Option<FontFace>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            cache: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f64, font_family: &str) -> Option<TextExtent> {
        let family_key = normalize_family_key(font_family);
        if !self.cache.contains_key(&family_key) {
            let face = self.load_face(font_family);
            self.cache.insert(family_key.clone(), face);
        }
        let face = self.cache.get_mut(&family_key).and_then(|face| face.as_mut())?;
        face.measure(text, font_size)
    }

    fn load_face(&mut self, font_family: &str) -> Option<FontFace> {
        let family_key = normalize_family_key(font_family);
        if let Some(face) = load_cached_face(&family_key) {
            return Some(face);
        }
        #[derive(Clone, Copy)]
        enum FamilyToken {
            Generic(fontdb::Family<'static>),
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
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    order.push(FamilyToken::Generic(Family::SansSerif))
                }
                "monospace" | "ui-monospace" => order.push(FamilyToken::Generic(Family::Monospace)),
                "cursive" => order.push(FamilyToken::Generic(Family::Cursive)),
                "fantasy" => order.push(FamilyToken::Generic(Family::Fantasy)),
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
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        let mut loaded: Option<FontFace> = None;
        self.db.with_face_data(id, |data, index| {
            let bytes = data.to_vec();
            if Face::parse(&bytes, index).is_ok() {
                if let Some((font_path, meta_path)) = cache_paths(&family_key)
                    && !font_path.exists()
                {
                    if let Some(parent) = font_path.parent() {
                        let _ = fs::create_dir_all(parent);
                    }
                    let _ = fs::write(&font_path, &bytes);
                    let _ = fs::write(&meta_path, index.to_string());
                }
                loaded = FontFace::new(bytes, index);
            }
        });
        if loaded.is_none() {
            tracing::debug!(font_family, "no usable face for font family");
        }
        loaded
    }
}

struct GlyphInfo {
    advance: u16,
    bbox: Option<(i16, i16, i16, i16)>,
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    glyphs: HashMap<char, Option<GlyphInfo>>,
}

impl FontFace {
    fn new(data: Vec<u8>, index: u32) -> Option<Self> {
        let units_per_em = Face::parse(&data, index).ok()?.units_per_em().max(1);
        Some(Self {
            data,
            index,
            units_per_em,
            glyphs: HashMap::new(),
        })
    }

    /// Ink extents of the run, like a canvas `actualBoundingBox*` query.
    fn measure(&mut self, text: &str, font_size: f64) -> Option<TextExtent> {
        let face = Face::parse(&self.data, self.index).ok()?;
        let scale = font_size / self.units_per_em as f64;
        let fallback = font_size * 0.56;

        let mut pen = 0.0f64;
        let mut left = f64::INFINITY;
        let mut right = f64::NEG_INFINITY;
        let mut ascent = 0.0f64;
        let mut descent = 0.0f64;

        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let info = self.glyphs.entry(ch).or_insert_with(|| {
                face.glyph_index(ch).map(|id| GlyphInfo {
                    advance: face.glyph_hor_advance(id).unwrap_or(0),
                    bbox: face
                        .glyph_bounding_box(id)
                        .map(|rect| (rect.x_min, rect.y_min, rect.x_max, rect.y_max)),
                })
            });
            let Some(info) = info else {
                left = left.min(pen);
                right = right.max(pen + fallback);
                ascent = ascent.max(font_size * FALLBACK_ASCENT);
                descent = descent.max(font_size * FALLBACK_DESCENT);
                pen += fallback;
                continue;
            };
            if let Some((x_min, y_min, x_max, y_max)) = info.bbox {
                left = left.min(pen + x_min as f64 * scale);
                right = right.max(pen + x_max as f64 * scale);
                ascent = ascent.max(y_max as f64 * scale);
                descent = descent.max(-(y_min as f64) * scale);
            }
            pen += info.advance as f64 * scale;
        }

        let width = if right > left { right - left } else { pen };
        Some(TextExtent {
            width: width.max(0.0),
            ascent: Some(ascent),
            descent: Some(descent),
        })
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

fn cache_paths(family_key: &str) -> Option<(PathBuf, PathBuf)> {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    family_key.hash(&mut hasher);
    let hash = hasher.finish();
    let dir = base.join("wordcloud").join("font-cache");
    let font_path = dir.join(format!("{hash:x}.font"));
    let meta_path = dir.join(format!("{hash:x}.meta"));
    Some((font_path, meta_path))
}

fn load_cached_face(family_key: &str) -> Option<FontFace> {
    let (font_path, meta_path) = cache_paths(family_key)?;
    if !font_path.exists() || !meta_path.exists() {
        return None;
    }
    let bytes = fs::read(font_path).ok()?;
    let index: u32 = fs::read_to_string(meta_path).ok()?.trim().parse().ok()?;
    FontFace::new(bytes, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_width_factor_returns_positive_values() {
        for ch in ['a', 'Z', ' ', '0', '@', '\u{4e2d}'] {
            assert!(char_width_factor(ch) > 0.0, "char {:?} has zero width", ch);
        }
    }

    #[test]
    fn char_width_measure_scales_with_font_size() {
        let small = CharWidthMeasurer.measure("Hello", 16.0, "sans-serif");
        let large = CharWidthMeasurer.measure("Hello", 32.0, "sans-serif");
        assert!((large.width - small.width * 2.0).abs() < 1e-9);
        assert!((large.height_or(32.0) - small.height_or(16.0) * 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_text_measures_zero() {
        let extent = CharWidthMeasurer.measure("", 16.0, "sans-serif");
        assert_eq!(extent.width, 0.0);
        assert_eq!(extent.height_or(16.0), 16.0);
        let (ascent, descent) = extent.vertical_or(16.0);
        assert!((ascent + descent - 16.0).abs() < 1e-9);
    }

    #[test]
    fn font_metrics_always_produce_an_extent() {
        // Falls back to the calibrated table when no system font is installed.
        let extent = FontMetrics.measure("wordcloud", 40.0, "sans-serif");
        assert!(extent.width > 0.0);
        assert!(extent.height_or(40.0) > 0.0);
    }

    #[test]
    fn family_key_defaults_to_sans_serif() {
        assert_eq!(normalize_family_key("  "), "sans-serif");
        assert_eq!(normalize_family_key(" Impact,sans-serif "), "Impact,sans-serif");
    }
}
