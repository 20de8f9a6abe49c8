//! Font size normalization.
//!
//! Picks the largest font size the cloud can use without packing it first.
//! Every word is measured once at a large trial size; the estimated surface
//! of all padded word boxes is then rescaled until it matches the canvas
//! surface. The result is clamped so the tallest and widest word each fit on
//! their own, and scaled down to leave room for imperfect packing.

use crate::model::CanvasSize;
use crate::text_metrics::TextMeasure;

const TRIAL_FONT_SIZE: f64 = 1000.0;
/// Share of the estimated surface the cloud aims to cover.
const AREA_FILL: f64 = 0.85;
const MAX_AREA_ITERATIONS: usize = 64;
// Sentinels one apart that stay exactly representable in an f64.
const SURFACE_SENTINEL: f64 = 9_007_199_254_740_991.0;

/// Mapping from raw word sizes to pixel font sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontScale {
    Identity,
    Linear { domain: (f64, f64), range: (f64, f64) },
}

impl FontScale {
    pub fn zero() -> Self {
        FontScale::Linear {
            domain: (0.0, 1.0),
            range: (0.0, 0.0),
        }
    }

    pub fn apply(&self, size: f64) -> f64 {
        match *self {
            FontScale::Identity => size,
            FontScale::Linear { domain, range } => {
                let span = domain.1 - domain.0;
                let t = if span == 0.0 || !span.is_finite() {
                    0.5
                } else {
                    (size - domain.0) / span
                };
                range.0 + t * (range.1 - range.0)
            }
        }
    }

    /// Largest font size produced, `None` for the identity mapping.
    pub fn max_font_size(&self) -> Option<f64> {
        match *self {
            FontScale::Identity => None,
            FontScale::Linear { range, .. } => Some(range.1),
        }
    }
}

/// Estimates the font scale for one structural pass.
pub struct FontSizeNormalizer<'a> {
    measure: &'a dyn TextMeasure,
    font_family: &'a str,
    padding: f64,
}

/// Intermediate result of the fit, kept for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitEstimate {
    pub area_fit: f64,
    pub height_fit: f64,
    pub width_fit: f64,
    pub iterations: usize,
}

impl FitEstimate {
    pub fn max_font_size(&self) -> f64 {
        (self.area_fit * AREA_FILL)
            .min(self.height_fit)
            .min(self.width_fit)
            .max(0.0)
    }
}

impl<'a> FontSizeNormalizer<'a> {
    pub fn new(measure: &'a dyn TextMeasure, font_family: &'a str, padding: f64) -> Self {
        Self {
            measure,
            font_family,
            padding,
        }
    }

    pub fn scale<'w, I>(&self, words: I, canvas: CanvasSize, enabled: bool) -> FontScale
    where
        I: IntoIterator<Item = (&'w str, f64)>,
    {
        if !enabled {
            return FontScale::Identity;
        }
        let words: Vec<(&str, f64)> = words.into_iter().collect();
        if words.is_empty() {
            return FontScale::Identity;
        }
        let domain = size_domain(words.iter().map(|(_, size)| *size));
        match self.fit(&words, canvas) {
            Some(estimate) => {
                tracing::debug!(
                    area_fit = estimate.area_fit,
                    height_fit = estimate.height_fit,
                    width_fit = estimate.width_fit,
                    iterations = estimate.iterations,
                    "font size normalized"
                );
                FontScale::Linear {
                    domain,
                    range: (0.0, estimate.max_font_size()),
                }
            }
            None => FontScale::Linear {
                domain,
                range: (0.0, 0.0),
            },
        }
    }

    /// Runs the estimate; `None` when the canvas cannot hold any text.
    pub fn fit(&self, words: &[(&str, f64)], canvas: CanvasSize) -> Option<FitEstimate> {
        if canvas.is_degenerate() {
            return None;
        }
        let win_width = (canvas.width as i64 >> 5 << 5) as f64;
        let win_height = canvas.height.max(0.0).floor();
        if words.is_empty() || win_width <= 0.0 || win_height <= 0.0 {
            return None;
        }
        let win_surface = win_width * win_height;

        let trial = FontScale::Linear {
            domain: size_domain(words.iter().map(|(_, size)| *size)),
            range: (0.0, TRIAL_FONT_SIZE),
        };
        let mut heights = Vec::with_capacity(words.len());
        let mut widths = Vec::with_capacity(words.len());
        for (text, size) in words {
            let font_size = trial.apply(*size);
            let extent = self.measure.measure(text, font_size, self.font_family);
            heights.push(extent.height_or(font_size));
            widths.push(extent.width);
        }

        let (area_fit, iterations) = self.area_fit(&heights, &widths, win_surface);
        let height_fit = self.height_fit(&heights, win_height);
        let width_fit = self.width_fit(&widths, win_width);

        Some(FitEstimate {
            area_fit,
            height_fit,
            width_fit,
            iterations,
        })
    }

    fn round_height(&self, h: f64) -> f64 {
        h + 2.0 * self.padding
    }

    // The layout bitmap packs 32 pixels per cell, so widths snap up to 32.
    fn round_width(&self, w: f64) -> f64 {
        ((((w + 2.0 * self.padding + 31.0) as i64) >> 5) << 5) as f64
    }

    fn estimated_surface(&self, heights: &[f64], widths: &[f64], ratio: f64) -> f64 {
        heights
            .iter()
            .zip(widths)
            .map(|(h, w)| self.round_height(ratio * h) * self.round_width(ratio * w))
            .sum()
    }

    fn area_fit(&self, heights: &[f64], widths: &[f64], win_surface: f64) -> (f64, usize) {
        let mut prev_size = 0.0;
        let mut size = TRIAL_FONT_SIZE;
        let mut prev_surface = SURFACE_SENTINEL;
        let mut surface = SURFACE_SENTINEL - 1.0;
        let mut iterations = 0;

        while (size - prev_size).abs() >= 1.0
            && (win_surface - surface).abs() < (win_surface - prev_surface).abs()
            && iterations < MAX_AREA_ITERATIONS
        {
            let next_surface = self.estimated_surface(heights, widths, size / TRIAL_FONT_SIZE);
            iterations += 1;
            prev_surface = surface;
            surface = next_surface;
            prev_size = size;
            if surface <= 0.0 || !surface.is_finite() {
                break;
            }
            size = prev_size * (win_surface / surface).sqrt();
        }
        (prev_size, iterations)
    }

    fn height_fit(&self, heights: &[f64], win_height: f64) -> f64 {
        let tallest = heights.iter().copied().fold(0.0, f64::max);
        if tallest <= 0.0 {
            return f64::INFINITY;
        }
        let mut size = TRIAL_FONT_SIZE * win_height / self.round_height(tallest);
        while size > 0.0 && self.round_height(size * tallest / TRIAL_FONT_SIZE) >= win_height {
            size -= 1.0;
        }
        size
    }

    fn width_fit(&self, widths: &[f64], win_width: f64) -> f64 {
        let widest = widths.iter().copied().fold(0.0, f64::max);
        if widest <= 0.0 {
            return f64::INFINITY;
        }
        let mut size = TRIAL_FONT_SIZE * win_width / self.round_width(widest);
        while size > 0.0 && self.round_width(size * widest / TRIAL_FONT_SIZE) >= win_width {
            size -= 1.0;
        }
        size
    }
}

fn size_domain(sizes: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = sizes.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), size| {
        (lo.min(size), hi.max(size))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 0.0);
    }
    (min.min(0.0), max)
}
