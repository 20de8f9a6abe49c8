mod bitmap;
mod spiral;
mod sprite;

pub use bitmap::OccupancyBitmap;
pub use spiral::SpiralLayout;
pub use sprite::Sprite;

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::CanvasSize;
use crate::text_metrics::TextMeasure;

/// Occupancy bitmaps above this many cells are refused.
pub const MAX_BITMAP_CELLS: usize = 1 << 26;

/// How many distinct angles words may be rotated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    /// Every word horizontal.
    #[default]
    None,
    /// Horizontal or vertical (-90°).
    Two,
    /// -60°, -30°, 0°, 30° or 60°.
    Five,
}

impl RotationMode {
    /// Draws a rotation in degrees. `None` never touches the rng.
    pub fn draw<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        match self {
            RotationMode::None => 0.0,
            RotationMode::Two => (rng.gen_range(0.0..1.0f64) * 2.0).floor() * 90.0 - 90.0,
            RotationMode::Five => (rng.gen_range(0.0..1.0f64) * 5.0).floor() * 30.0 - 60.0,
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "two" => Some(Self::Two),
            "five" => Some(Self::Five),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutWord {
    pub id: String,
    pub text: String,
    pub font_size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRequest {
    pub words: Vec<LayoutWord>,
    pub font_family: String,
    pub canvas: CanvasSize,
    pub padding: f64,
    pub rotation: RotationMode,
    /// Random start positions when set, otherwise every word starts at the
    /// center and larger words claim it first.
    pub random_placement: bool,
    pub seed: u64,
}

/// Where the engine put one word. `x`/`y` is the center of its box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub id: String,
    pub font_size: f64,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

#[derive(Debug, Clone)]
pub struct LayoutOutput {
    pub placements: Vec<Placement>,
    pub bitmap: OccupancyBitmap,
}

#[derive(Debug)]
pub enum LayoutPoll {
    Pending,
    Ready(LayoutOutput),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LayoutError {
    #[error("layout job polled after completion")]
    Finished,
    #[error("canvas {width}x{height} exceeds the occupancy bitmap limit")]
    CanvasTooLarge { width: usize, height: usize },
    #[error("{0}")]
    Other(String),
}

/// Packs words into the canvas. Implementations may spread the work over
/// many [`LayoutJob::step`] calls.
pub trait LayoutEngine {
    fn start(&self, request: LayoutRequest, measure: &dyn TextMeasure) -> Box<dyn LayoutJob>;
}

pub trait LayoutJob {
    /// Advances the job for roughly `budget`. At least one unit of work is
    /// done per call.
    fn step(&mut self, budget: Duration) -> Result<LayoutPoll, LayoutError>;
}

/// Drives a job to completion in one go.
pub fn run_to_completion(job: &mut dyn LayoutJob) -> Result<LayoutOutput, LayoutError> {
    loop {
        if let LayoutPoll::Ready(output) = job.step(Duration::from_secs(3600))? {
            return Ok(output);
        }
    }
}
