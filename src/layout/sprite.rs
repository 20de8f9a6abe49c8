/// Rasterized footprint of a rotated, padded text box.
///
/// Coordinates are relative to the text anchor: horizontally centered, on
/// the baseline. The box runs from `-ascent` to `descent` vertically before
/// rotation. A rotated rectangle is convex, so each row is stored as a single
/// half-open span of columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub x0: i64,
    pub y0: i64,
    pub width: i64,
    pub height: i64,
    rows: Vec<Option<(i64, i64)>>,
}

impl Sprite {
    pub fn rasterize(
        text_width: f64,
        ascent: f64,
        descent: f64,
        padding: f64,
        rotation_deg: f64,
    ) -> Self {
        let hw = text_width / 2.0 + padding;
        let top = -(ascent + padding);
        let bottom = descent + padding;
        let (sin, cos) = rotation_deg.to_radians().sin_cos();
        // Snap away float noise so axis-aligned angles keep exact extents.
        let snap = |v: f64| (v * 1e6).round() / 1e6;
        let corners = [(-hw, top), (hw, top), (-hw, bottom), (hw, bottom)]
            .map(|(u, v)| (snap(u * cos - v * sin), snap(u * sin + v * cos)));
        let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

        let x0 = min_x.floor() as i64;
        let x1 = max_x.ceil() as i64;
        let y0 = min_y.floor() as i64;
        let y1 = max_y.ceil() as i64;

        let mut rows = Vec::with_capacity((y1 - y0).max(0) as usize);
        for py in y0..y1 {
            let cy = py as f64 + 0.5;
            let mut span: Option<(i64, i64)> = None;
            for px in x0..x1 {
                let cx = px as f64 + 0.5;
                let u = cx * cos + cy * sin;
                let v = -cx * sin + cy * cos;
                if u.abs() <= hw && v >= top && v <= bottom {
                    span = Some(match span {
                        Some((start, _)) => (start, px + 1),
                        None => (px, px + 1),
                    });
                }
            }
            rows.push(span);
        }

        Self {
            x0,
            y0,
            width: x1 - x0,
            height: y1 - y0,
            rows,
        }
    }

    /// Covered cells as `(row offset, first column, end column)` relative to
    /// the center.
    pub fn spans(&self) -> impl Iterator<Item = (i64, i64, i64)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(idx, span)| span.map(|(start, end)| (self.y0 + idx as i64, start, end)))
    }

    pub fn area(&self) -> i64 {
        self.spans().map(|(_, start, end)| end - start).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrotated_box_covers_padded_rectangle() {
        let sprite = Sprite::rasterize(20.0, 7.0, 3.0, 1.0, 0.0);
        assert_eq!(sprite.width, 22);
        assert_eq!(sprite.height, 12);
        assert_eq!(sprite.area(), 22 * 12);
    }

    #[test]
    fn box_hangs_from_the_baseline() {
        let sprite = Sprite::rasterize(20.0, 15.0, 4.0, 0.0, 0.0);
        assert_eq!(sprite.y0, -15);
        assert_eq!(sprite.y0 + sprite.height, 4);
        assert!(sprite.spans().all(|(_, start, end)| start == -10 && end == 10));
    }

    #[test]
    fn vertical_rotation_swaps_extents() {
        let sprite = Sprite::rasterize(40.0, 8.0, 2.0, 0.0, -90.0);
        assert_eq!(sprite.width, 10);
        assert_eq!(sprite.height, 40);
        // rotate(-90) turns the ascent towards -x.
        assert_eq!(sprite.x0, -8);
    }

    #[test]
    fn diagonal_rotation_covers_less_than_its_bounds() {
        let sprite = Sprite::rasterize(60.0, 5.0, 5.0, 0.0, 30.0);
        assert!(sprite.area() < sprite.width * sprite.height);
        assert!((sprite.area() - 600).abs() < 60, "area {}", sprite.area());
    }

    #[test]
    fn zero_box_is_empty() {
        assert!(Sprite::rasterize(0.0, 0.0, 0.0, 0.0, 0.0).is_empty());
    }
}
