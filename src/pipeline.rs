//! The render pipeline.
//!
//! One [`RenderPipeline`] owns every piece of render state: the current
//! words and placements, the hit tester, the change detector, the selection
//! controller and the layout pass in flight. Hosts feed it render requests,
//! clock ticks and pointer events; it answers through the [`Host`] trait.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde::Serialize;

use crate::change::{ChangeDetector, ChangeSignature, PassKind, WatchedInputs, content_hash};
use crate::config::{CloudSettings, Config};
use crate::error::CloudError;
use crate::hit_test::HitTester;
use crate::host::{DATA_ERROR_KEY, Host, PIPELINE_ERROR_KEY};
use crate::layout::{
    LayoutEngine, LayoutError, LayoutJob, LayoutOutput, LayoutPoll, LayoutRequest, LayoutWord,
};
use crate::model::{CanvasSize, PlacedWord, Word};
use crate::normalize::FontSizeNormalizer;
use crate::selection::{
    DragRect, HighlightOverlay, PointerEvent, SelectionController, SelectionSignal,
};
use crate::source::{DataRow, DataSource, words_from_rows};
use crate::text_metrics::TextMeasure;

/// Everything besides the data that one render request carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderInputs {
    pub canvas: CanvasSize,
    pub settings: CloudSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Reading was aborted; the previous render stays.
    Aborted,
    /// No words axis; the render was cleared.
    Cleared,
    /// Only colors changed; placements were recolored in place.
    Cosmetic,
    /// A packing pass finished.
    Structural,
    /// A packing pass is running; keep calling [`RenderPipeline::tick`].
    Pending,
    /// Nothing to do.
    Idle,
    /// A completion for a pass that was already superseded.
    Stale,
}

/// The drawable result of the last finished pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedCloud {
    pub canvas: CanvasSize,
    pub font_family: String,
    pub placements: Vec<PlacedWord>,
    /// Words handed to the layout, placed or not.
    pub total_words: usize,
}

impl RenderedCloud {
    fn empty(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            font_family: String::new(),
            placements: Vec::new(),
            total_words: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.placements.len() == self.total_words
    }
}

fn duplicate_ids(rows: &[DataRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| !seen.insert(row.id.as_str()))
        .map(|row| format!("Duplicate row id '{}'", row.id))
        .collect()
}

/// Padding around each word box, in pixels.
pub fn padding_for(canvas: CanvasSize) -> f64 {
    if canvas.width > 400.0 && canvas.height > 400.0 {
        2.0
    } else if canvas.width > 200.0 && canvas.height > 200.0 {
        1.0
    } else {
        0.0
    }
}

/// Notice shown when the layout dropped words.
pub fn under_placement_notice(placed: usize, total: usize, normalize_font: bool) -> String {
    let advice = if normalize_font {
        "Try turning off font size normalization and adjusting the font size manually."
    } else {
        "Try diminishing the font size."
    };
    format!("Only {placed} of {total} words visible. {advice}")
}

struct PendingPass {
    generation: u64,
    job: Box<dyn LayoutJob>,
    started: Instant,
    words: Vec<Word>,
    signature: ChangeSignature,
    canvas: CanvasSize,
    font_family: String,
    normalize_font: bool,
}

pub struct RenderPipeline<M, E> {
    config: Config,
    measure: M,
    engine: E,
    detector: ChangeDetector,
    selection: SelectionController,
    tester: HitTester,
    words: Vec<Word>,
    cloud: RenderedCloud,
    /// Whether `cloud` holds the output of the last committed signature.
    rendered: bool,
    pending: Option<PendingPass>,
    generation: u64,
    busy_shown: bool,
}

impl<M, E> RenderPipeline<M, E>
where
    M: TextMeasure,
    E: LayoutEngine,
{
    pub fn new(config: Config, measure: M, engine: E) -> Self {
        let canvas = config.render.canvas();
        Self {
            config,
            measure,
            engine,
            detector: ChangeDetector::new(),
            selection: SelectionController::new(),
            tester: HitTester::empty(),
            words: Vec::new(),
            cloud: RenderedCloud::empty(canvas),
            rendered: false,
            pending: None,
            generation: 0,
            busy_shown: false,
        }
    }

    /// Swaps the change detector, e.g. for one with custom comparators.
    pub fn with_detector(mut self, detector: ChangeDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cloud(&self) -> &RenderedCloud {
        &self.cloud
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Generation of the newest structural pass.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn hit_test(&self, x: f64, y: f64) -> Option<&str> {
        self.tester.hit_test(x, y)
    }

    pub fn drag_rect(&self) -> Option<DragRect> {
        self.selection.drag_rect()
    }

    /// Handles one render request.
    pub fn render(
        &mut self,
        source: &dyn DataSource,
        inputs: &RenderInputs,
        host: &mut dyn Host,
        now: Instant,
    ) -> Result<PassOutcome, CloudError> {
        host.hide_tooltip();
        self.selection.clear_hover();

        let mut errors = source.errors();
        let rows = source.rows();
        if errors.is_empty() && source.has_words_axis() {
            errors = rows.as_deref().map(duplicate_ids).unwrap_or_default();
        }
        if !errors.is_empty() {
            return Err(self.reject(errors, host));
        }

        host.hide_error(DATA_ERROR_KEY);
        host.hide_notice();

        let Some(rows) = rows else {
            tracing::debug!("row read aborted, keeping previous render");
            self.settle_request(host);
            return Ok(PassOutcome::Aborted);
        };

        if !source.has_words_axis() {
            self.supersede();
            self.clear_render(inputs.canvas, host);
            self.detector.reset();
            self.finish(host);
            return Ok(PassOutcome::Cleared);
        }

        let words =
            words_from_rows(&rows, source.has_size_axis(), &self.config.theme.text_color);
        let signature = ChangeSignature {
            content_hash: content_hash(&words),
            watched: WatchedInputs {
                canvas: inputs.canvas,
                rotation: inputs.settings.rotation,
                normalize_font: inputs.settings.normalize_font,
                use_impact_font: inputs.settings.use_impact_font,
                random_placement: inputs.settings.random_placement,
                words_axis: true,
                size_axis: source.has_size_axis(),
                color_axis: source.has_color_axis(),
            },
        };

        if self.rendered
            && self.pending.is_none()
            && self.detector.classify(&signature) == PassKind::Cosmetic
        {
            self.recolor(words);
            self.finish(host);
            return Ok(PassOutcome::Cosmetic);
        }

        self.start_pass(words, signature, inputs, host, now)?;
        self.drive(host, now)
    }

    /// Advances the running pass by one time slice.
    pub fn tick(&mut self, host: &mut dyn Host, now: Instant) -> Result<PassOutcome, CloudError> {
        self.drive(host, now)
    }

    /// Finishes the pass with the given generation. Completions of passes
    /// that were superseded since are dropped.
    pub fn complete_pass(
        &mut self,
        generation: u64,
        result: Result<LayoutOutput, LayoutError>,
        host: &mut dyn Host,
    ) -> Result<PassOutcome, CloudError> {
        if self.pending.as_ref().map(|pass| pass.generation) != Some(generation) {
            tracing::debug!(
                generation,
                current = self.generation,
                "dropping stale layout completion"
            );
            return Ok(PassOutcome::Stale);
        }
        let Some(pass) = self.pending.take() else {
            return Ok(PassOutcome::Stale);
        };

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                tracing::error!("layout pass {} failed: {}", generation, err);
                host.show_error(PIPELINE_ERROR_KEY, &err.to_string());
                self.finish(host);
                return Err(CloudError::Layout(err));
            }
        };

        let by_id: HashMap<&str, &Word> =
            pass.words.iter().map(|word| (word.id.as_str(), word)).collect();
        let placements: Vec<PlacedWord> = output
            .placements
            .iter()
            .filter_map(|placement| {
                let word = by_id.get(placement.id.as_str())?;
                Some(PlacedWord::from_word(
                    word,
                    &pass.font_family,
                    placement.font_size,
                    placement.x,
                    placement.y,
                    placement.rotation,
                ))
            })
            .collect();

        tracing::info!(
            generation,
            placed = placements.len(),
            total = pass.words.len(),
            elapsed_ms = pass.started.elapsed().as_millis() as u64,
            "layout pass finished"
        );

        if placements.len() < pass.words.len() {
            host.show_notice(&under_placement_notice(
                placements.len(),
                pass.words.len(),
                pass.normalize_font,
            ));
        }

        self.tester = HitTester::new(output.bitmap);
        self.cloud = RenderedCloud {
            canvas: pass.canvas,
            font_family: pass.font_family,
            placements,
            total_words: pass.words.len(),
        };
        self.words = pass.words;
        self.rendered = true;
        self.selection.arm(pass.canvas);
        self.detector.commit(pass.signature);

        host.hide_error(PIPELINE_ERROR_KEY);
        self.finish(host);
        Ok(PassOutcome::Structural)
    }

    pub fn pointer(&mut self, event: PointerEvent, host: &mut dyn Host) -> SelectionSignal {
        self.selection
            .handle(event, &self.tester, &self.cloud.placements, host)
    }

    /// Halo for the hovered word, if any.
    pub fn highlight(&self) -> Option<HighlightOverlay> {
        let id = self.selection.hovered()?;
        let word = self.cloud.placements.iter().find(|word| word.id == id)?;
        Some(HighlightOverlay::for_word(word, &self.config.theme))
    }

    fn start_pass(
        &mut self,
        words: Vec<Word>,
        signature: ChangeSignature,
        inputs: &RenderInputs,
        host: &mut dyn Host,
        now: Instant,
    ) -> Result<(), CloudError> {
        self.supersede();
        self.clear_render(inputs.canvas, host);

        let settings = inputs.settings;
        let font_family = self.config.theme.word_font(settings.use_impact_font).to_string();
        let padding = padding_for(inputs.canvas);
        let scale = FontSizeNormalizer::new(&self.measure, &font_family, padding).scale(
            words.iter().map(|word| (word.text.as_str(), word.size)),
            inputs.canvas,
            settings.normalize_font,
        );
        if let Some(max) = scale.max_font_size()
            && !max.is_finite()
        {
            let err = CloudError::Measure(format!("font size estimate is not finite ({max})"));
            host.show_error(PIPELINE_ERROR_KEY, &err.to_string());
            self.finish(host);
            return Err(err);
        }

        let request = LayoutRequest {
            words: words
                .iter()
                .map(|word| LayoutWord {
                    id: word.id.clone(),
                    text: word.text.clone(),
                    font_size: scale.apply(word.size),
                })
                .collect(),
            font_family: font_family.clone(),
            canvas: inputs.canvas,
            padding,
            rotation: settings.rotation,
            random_placement: settings.random_placement,
            seed: self.config.pipeline.seed,
        };

        self.generation += 1;
        tracing::debug!(
            generation = self.generation,
            words = words.len(),
            width = inputs.canvas.width,
            height = inputs.canvas.height,
            padding,
            "starting layout pass"
        );
        let job = self.engine.start(request, &self.measure);
        self.pending = Some(PendingPass {
            generation: self.generation,
            job,
            started: now,
            words,
            signature,
            canvas: inputs.canvas,
            font_family,
            normalize_font: settings.normalize_font,
        });
        Ok(())
    }

    fn drive(&mut self, host: &mut dyn Host, now: Instant) -> Result<PassOutcome, CloudError> {
        let threshold = self.config.pipeline.busy_threshold();
        let slice = self.config.pipeline.time_slice();
        let Some(pass) = self.pending.as_mut() else {
            return Ok(PassOutcome::Idle);
        };
        if !self.busy_shown && now.saturating_duration_since(pass.started) >= threshold {
            host.show_busy();
            self.busy_shown = true;
        }
        let generation = pass.generation;
        match pass.job.step(slice) {
            Ok(LayoutPoll::Pending) => Ok(PassOutcome::Pending),
            Ok(LayoutPoll::Ready(output)) => self.complete_pass(generation, Ok(output), host),
            Err(err) => self.complete_pass(generation, Err(err), host),
        }
    }

    /// Drops the pass in flight. Its busy indicator carries over.
    fn supersede(&mut self) {
        if let Some(pass) = self.pending.take() {
            tracing::debug!(generation = pass.generation, "superseding layout pass");
        }
    }

    fn clear_render(&mut self, canvas: CanvasSize, host: &mut dyn Host) {
        self.selection.disarm(host);
        self.tester = HitTester::empty();
        self.cloud = RenderedCloud::empty(canvas);
        self.rendered = false;
        self.words.clear();
    }

    fn recolor(&mut self, words: Vec<Word>) {
        let by_id: HashMap<&str, &Word> =
            words.iter().map(|word| (word.id.as_str(), word)).collect();
        for placed in &mut self.cloud.placements {
            if let Some(word) = by_id.get(placed.id.as_str()) {
                placed.color = word.color.clone();
                placed.tooltip = word.tooltip.clone();
            }
        }
        self.words = words;
    }

    fn reject(&mut self, errors: Vec<String>, host: &mut dyn Host) -> CloudError {
        let err = CloudError::Data(errors);
        tracing::warn!("rejecting render request: {}", err);
        host.show_error(DATA_ERROR_KEY, &err.to_string());
        self.settle_request(host);
        err
    }

    /// Ends a request that did not start a pass. A pass still in flight
    /// keeps the busy indicator and signals completion itself.
    fn settle_request(&mut self, host: &mut dyn Host) {
        if self.pending.is_none() {
            self.finish(host);
        }
    }

    fn finish(&mut self, host: &mut dyn Host) {
        host.hide_busy();
        self.busy_shown = false;
        host.render_complete();
    }
}
