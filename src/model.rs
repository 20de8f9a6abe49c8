use serde::{Deserialize, Serialize};

/// Font size applied to rows when no size axis is bound or the value is missing.
pub const DEFAULT_WORD_SIZE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A canvas that cannot hold a single pixel, or has no finite extent.
    pub fn is_degenerate(&self) -> bool {
        !(self.width >= 1.0
            && self.height >= 1.0
            && self.width.is_finite()
            && self.height.is_finite())
    }

    /// Width rounded up to the next multiple of 32, the row stride of the
    /// occupancy bitmap. `None` when the stride does not fit in `usize`.
    pub fn width32(&self) -> Option<usize> {
        if self.is_degenerate() {
            return Some(0);
        }
        (self.width as usize).checked_add(0x1f).map(|width| width >> 5 << 5)
    }

    pub fn height_px(&self) -> usize {
        if self.is_degenerate() {
            return 0;
        }
        self.height as usize
    }
}

/// One label of the cloud, derived from a source row for a single pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    /// Row identifier of the source row. Marking uses it directly.
    pub id: String,
    pub text: String,
    pub size: f64,
    pub color: String,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedWord {
    pub id: String,
    pub text: String,
    pub size: f64,
    pub color: String,
    pub tooltip: String,
    pub font_family: String,
    pub font_size: f64,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

impl PlacedWord {
    pub fn from_word(
        word: &Word,
        font_family: &str,
        font_size: f64,
        x: f64,
        y: f64,
        rotation: f64,
    ) -> Self {
        Self {
            id: word.id.clone(),
            text: word.text.clone(),
            size: word.size,
            color: word.color.clone(),
            tooltip: word.tooltip.clone(),
            font_family: font_family.to_string(),
            font_size,
            x,
            y,
            rotation,
        }
    }
}

/// How a mark operation combines with the existing marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkMode {
    Replace,
    Toggle,
}

impl MarkMode {
    pub fn from_modifier(modifier: bool) -> Self {
        if modifier { Self::Toggle } else { Self::Replace }
    }
}

/// Integer pixel rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}
