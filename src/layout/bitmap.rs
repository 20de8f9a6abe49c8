use crate::model::CanvasSize;

use super::{LayoutError, MAX_BITMAP_CELLS, Sprite};

/// Per-pixel record of which placed word covers the canvas.
///
/// Rows are padded to a multiple of 32 pixels. Each cell is empty or holds
/// the slot of a word stamped into this bitmap; slots only ever resolve to
/// ids stamped here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccupancyBitmap {
    width: usize,
    width32: usize,
    height: usize,
    cells: Vec<Option<u32>>,
    ids: Vec<String>,
}

impl OccupancyBitmap {
    pub fn new(canvas: CanvasSize) -> Result<Self, LayoutError> {
        let height = canvas.height_px();
        let Some(width32) = canvas.width32() else {
            return Err(LayoutError::CanvasTooLarge {
                width: usize::MAX,
                height,
            });
        };
        let cells = width32.checked_mul(height).unwrap_or(usize::MAX);
        if cells > MAX_BITMAP_CELLS {
            return Err(LayoutError::CanvasTooLarge {
                width: width32,
                height,
            });
        }
        Ok(Self {
            width: if canvas.is_degenerate() { 0 } else { canvas.width as usize },
            width32,
            height,
            cells: vec![None; cells],
            ids: Vec::new(),
        })
    }

    pub fn width32(&self) -> usize {
        self.width32
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width32 || y as usize >= self.height {
            return None;
        }
        Some(x as usize + y as usize * self.width32)
    }

    pub fn get(&self, x: i64, y: i64) -> Option<&str> {
        let slot = (*self.cells.get(self.index(x, y)?)?)?;
        self.ids.get(slot as usize).map(String::as_str)
    }

    /// Whether the sprite centered at `(cx, cy)` stays on the canvas and
    /// covers only empty cells.
    pub fn fits(&self, sprite: &Sprite, cx: i64, cy: i64) -> bool {
        if cx + sprite.x0 < 0
            || cy + sprite.y0 < 0
            || cx + sprite.x0 + sprite.width > self.width as i64
            || cy + sprite.y0 + sprite.height > self.height as i64
        {
            return false;
        }
        for (dy, start, end) in sprite.spans() {
            let row = ((cy + dy) as usize) * self.width32;
            let from = row + (cx + start) as usize;
            let to = row + (cx + end) as usize;
            if self.cells[from..to].iter().any(Option::is_some) {
                return false;
            }
        }
        true
    }

    /// Records `id` in every cell the sprite covers. Cells off the canvas are
    /// skipped.
    pub fn stamp(&mut self, sprite: &Sprite, cx: i64, cy: i64, id: &str) {
        let slot = self.ids.len() as u32;
        self.ids.push(id.to_string());
        for (dy, start, end) in sprite.spans() {
            for x in (cx + start)..(cx + end) {
                if let Some(idx) = self.index(x, cy + dy) {
                    self.cells[idx] = Some(slot);
                }
            }
        }
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamped_cells_resolve_to_id() {
        let mut bitmap = OccupancyBitmap::new(CanvasSize::new(100.0, 50.0)).unwrap();
        assert_eq!(bitmap.width32(), 128);
        let sprite = Sprite::rasterize(10.0, 2.0, 2.0, 0.0, 0.0);
        assert!(bitmap.fits(&sprite, 20, 20));
        bitmap.stamp(&sprite, 20, 20, "w1");
        assert_eq!(bitmap.get(20, 20), Some("w1"));
        assert_eq!(bitmap.get(15, 18), Some("w1"));
        assert_eq!(bitmap.get(26, 20), None);
        assert!(!bitmap.fits(&sprite, 22, 21));
        assert_eq!(bitmap.occupied_cells(), 40);
    }

    #[test]
    fn sprite_must_stay_on_canvas() {
        let bitmap = OccupancyBitmap::new(CanvasSize::new(100.0, 50.0)).unwrap();
        let sprite = Sprite::rasterize(10.0, 2.0, 2.0, 0.0, 0.0);
        assert!(!bitmap.fits(&sprite, 2, 20));
        // Padding columns past the canvas width are not placeable.
        assert!(!bitmap.fits(&sprite, 98, 20));
        assert!(!bitmap.fits(&sprite, 50, 49));
    }

    #[test]
    fn out_of_range_lookups_are_empty() {
        let bitmap = OccupancyBitmap::new(CanvasSize::new(64.0, 64.0)).unwrap();
        assert_eq!(bitmap.get(-1, 0), None);
        assert_eq!(bitmap.get(0, 64), None);
        assert_eq!(bitmap.get(64, 0), None);
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let err = OccupancyBitmap::new(CanvasSize::new(100_000.0, 100_000.0)).unwrap_err();
        assert!(matches!(err, LayoutError::CanvasTooLarge { .. }));
        let err = OccupancyBitmap::new(CanvasSize::new(1e20, 10.0)).unwrap_err();
        assert!(matches!(err, LayoutError::CanvasTooLarge { .. }));
    }
}
