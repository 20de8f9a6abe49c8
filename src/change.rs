//! Change detection between render requests.
//!
//! A request whose watched inputs and word content both match the last
//! committed signature only needs recoloring. Anything else re-runs the
//! packing pass.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::layout::RotationMode;
use crate::model::{CanvasSize, Word};

/// Inputs that affect layout, captured once per render request.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchedInputs {
    pub canvas: CanvasSize,
    pub rotation: RotationMode,
    pub normalize_font: bool,
    pub use_impact_font: bool,
    pub random_placement: bool,
    pub words_axis: bool,
    pub size_axis: bool,
    pub color_axis: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchedField {
    WindowSize,
    Rotation,
    NormalizeFont,
    ImpactFont,
    RandomPlacement,
    WordsAxis,
    SizeAxis,
    ColorAxis,
}

impl WatchedField {
    pub const ALL: [WatchedField; 8] = [
        WatchedField::WindowSize,
        WatchedField::Rotation,
        WatchedField::NormalizeFont,
        WatchedField::ImpactFont,
        WatchedField::RandomPlacement,
        WatchedField::WordsAxis,
        WatchedField::SizeAxis,
        WatchedField::ColorAxis,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

/// Returns `true` when the two snapshots agree on a field.
pub type FieldComparator = fn(&WatchedInputs, &WatchedInputs) -> bool;

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSignature {
    pub content_hash: u64,
    pub watched: WatchedInputs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Cosmetic,
    Structural,
}

/// Hash over the ordered `(text, size)` pairs. Color is left out on purpose
/// so recoloring keeps the hash.
pub fn content_hash<'a>(words: impl IntoIterator<Item = &'a Word>) -> u64 {
    let mut hasher = DefaultHasher::new();
    let mut count = 0usize;
    for word in words {
        word.text.hash(&mut hasher);
        word.size.to_bits().hash(&mut hasher);
        count += 1;
    }
    count.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone)]
pub struct ChangeDetector {
    previous: Option<ChangeSignature>,
    comparators: [FieldComparator; 8],
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self {
            previous: None,
            comparators: [
                |a, b| a.canvas == b.canvas,
                |a, b| a.rotation == b.rotation,
                |a, b| a.normalize_font == b.normalize_font,
                |a, b| a.use_impact_font == b.use_impact_font,
                |a, b| a.random_placement == b.random_placement,
                |a, b| a.words_axis == b.words_axis,
                |a, b| a.size_axis == b.size_axis,
                |a, b| a.color_axis == b.color_axis,
            ],
        }
    }

    /// Replaces the comparison used for one field.
    pub fn with_comparator(mut self, field: WatchedField, comparator: FieldComparator) -> Self {
        self.comparators[field.slot()] = comparator;
        self
    }

    pub fn signature(&self) -> Option<&ChangeSignature> {
        self.previous.as_ref()
    }

    /// Whether any of `fields` differs from the committed snapshot. Every
    /// field counts as changed before the first commit.
    pub fn has_changed(&self, current: &WatchedInputs, fields: &[WatchedField]) -> bool {
        let Some(previous) = self.previous.as_ref() else {
            return true;
        };
        fields
            .iter()
            .any(|field| !(self.comparators[field.slot()])(&previous.watched, current))
    }

    pub fn classify(&self, signature: &ChangeSignature) -> PassKind {
        let unchanged = self.previous.as_ref().is_some_and(|previous| {
            previous.content_hash == signature.content_hash
                && !self.has_changed(&signature.watched, &WatchedField::ALL)
        });
        if unchanged {
            PassKind::Cosmetic
        } else {
            PassKind::Structural
        }
    }

    pub fn commit(&mut self, signature: ChangeSignature) {
        self.previous = Some(signature);
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}
