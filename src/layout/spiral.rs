//! Greedy spiral packing.
//!
//! Words are placed largest first. Each word starts at its seed position and
//! walks an Archimedean spiral outwards until its footprint lands on empty
//! cells of the occupancy bitmap. Words that run off the spiral are dropped.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::CanvasSize;
use crate::text_metrics::TextMeasure;

use super::{
    LayoutEngine, LayoutError, LayoutJob, LayoutOutput, LayoutPoll, LayoutRequest, OccupancyBitmap,
    Placement, Sprite,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SpiralLayout;

impl LayoutEngine for SpiralLayout {
    fn start(&self, request: LayoutRequest, measure: &dyn TextMeasure) -> Box<dyn LayoutJob> {
        Box::new(SpiralJob::new(request, measure))
    }
}

struct QueuedWord {
    id: String,
    font_size: f64,
    rotation: f64,
    sprite: Sprite,
}

enum JobState {
    Running {
        board: OccupancyBitmap,
        placements: Vec<Placement>,
    },
    Failed(LayoutError),
    Done,
}

struct SpiralJob {
    canvas: CanvasSize,
    random_placement: bool,
    rng: StdRng,
    queue: Vec<QueuedWord>,
    next: usize,
    state: JobState,
}

impl SpiralJob {
    fn new(request: LayoutRequest, measure: &dyn TextMeasure) -> Self {
        let mut rng = StdRng::seed_from_u64(request.seed);
        let mut queue = Vec::with_capacity(request.words.len());
        let words = if request.canvas.is_degenerate() { Vec::new() } else { request.words };
        for word in words {
            // Rotations are drawn in input order, before any placement draw.
            let rotation = request.rotation.draw(&mut rng);
            if word.text.is_empty() || !(word.font_size > 0.0) {
                continue;
            }
            let extent = measure.measure(&word.text, word.font_size, &request.font_family);
            let (ascent, descent) = extent.vertical_or(word.font_size);
            let sprite =
                Sprite::rasterize(extent.width, ascent, descent, request.padding, rotation);
            if sprite.is_empty() {
                continue;
            }
            queue.push(QueuedWord {
                id: word.id,
                font_size: word.font_size,
                rotation,
                sprite,
            });
        }
        queue.sort_by(|a, b| b.font_size.total_cmp(&a.font_size));

        let state = match OccupancyBitmap::new(request.canvas) {
            Ok(board) => JobState::Running {
                board,
                placements: Vec::with_capacity(queue.len()),
            },
            Err(err) => JobState::Failed(err),
        };

        Self {
            canvas: request.canvas,
            random_placement: request.random_placement,
            rng,
            queue,
            next: 0,
            state,
        }
    }

    fn draw(&mut self) -> f64 {
        if self.random_placement {
            self.rng.gen_range(0.0..1.0)
        } else {
            0.5
        }
    }

    fn place_next(&mut self) {
        let idx = self.next;
        self.next += 1;
        let start_x = ((self.canvas.width * (self.draw() + 0.5)) as i64) >> 1;
        let start_y = ((self.canvas.height * (self.draw() + 0.5)) as i64) >> 1;
        let dt = if self.draw() < 0.5 { 1.0 } else { -1.0 };

        let JobState::Running { board, placements } = &mut self.state else {
            return;
        };
        let word = &self.queue[idx];
        let found = spiral_search(board, &word.sprite, self.canvas, start_x, start_y, dt);
        if let Some((x, y)) = found {
            board.stamp(&word.sprite, x, y, &word.id);
            placements.push(Placement {
                id: word.id.clone(),
                font_size: word.font_size,
                x: x as f64,
                y: y as f64,
                rotation: word.rotation,
            });
        } else {
            tracing::trace!(id = %word.id, "word did not fit");
        }
    }
}

impl LayoutJob for SpiralJob {
    fn step(&mut self, budget: Duration) -> Result<LayoutPoll, LayoutError> {
        match &self.state {
            JobState::Failed(err) => return Err(err.clone()),
            JobState::Done => return Err(LayoutError::Finished),
            JobState::Running { .. } => {}
        }

        let started = Instant::now();
        while self.next < self.queue.len() {
            self.place_next();
            if started.elapsed() >= budget {
                break;
            }
        }
        if self.next < self.queue.len() {
            return Ok(LayoutPoll::Pending);
        }

        match std::mem::replace(&mut self.state, JobState::Done) {
            JobState::Running { board, placements } => Ok(LayoutPoll::Ready(LayoutOutput {
                placements,
                bitmap: board,
            })),
            _ => Err(LayoutError::Finished),
        }
    }
}

fn spiral_search(
    board: &OccupancyBitmap,
    sprite: &Sprite,
    canvas: CanvasSize,
    start_x: i64,
    start_y: i64,
    dt: f64,
) -> Option<(i64, i64)> {
    let eccentricity = canvas.width / canvas.height;
    let max_delta = (canvas.width * canvas.width + canvas.height * canvas.height).sqrt();
    let mut t = -dt;
    loop {
        t += dt;
        let tt = t * 0.1;
        let dx = (eccentricity * tt * tt.cos()) as i64;
        let dy = (tt * tt.sin()) as i64;
        if dx.abs().min(dy.abs()) as f64 >= max_delta {
            return None;
        }
        let x = start_x.saturating_add(dx);
        let y = start_y.saturating_add(dy);
        if board.fits(sprite, x, y) {
            return Some((x, y));
        }
    }
}
