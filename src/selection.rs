//! Pointer interaction: click marking, hover highlight and rectangle
//! selection.
//!
//! The controller is a small state machine. It ignores every event until a
//! structural pass arms it, captures the pointer only while a drag is in
//! flight, and releases the capture on every way out of the drag.

use serde::Serialize;

use crate::hit_test::HitTester;
use crate::host::Host;
use crate::model::{CanvasSize, MarkMode, PixelRect, PlacedWord};
use crate::theme::Theme;

/// Rectangles must exceed this many pixels in both dimensions to select.
pub const MIN_SELECTION_SIZE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64, modifier: bool },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Click { x: f64, y: f64, modifier: bool },
    Leave,
}

/// Drag rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DragRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DragRect {
    fn spanning(anchor: (f64, f64), point: (f64, f64)) -> Self {
        Self {
            x: anchor.0.min(point.0),
            y: anchor.1.min(point.1),
            width: (anchor.0 - point.0).abs(),
            height: (anchor.1 - point.1).abs(),
        }
    }

    pub fn to_pixels(&self) -> PixelRect {
        PixelRect {
            x: self.x.floor() as i64,
            y: self.y.floor() as i64,
            width: self.width.floor() as i64,
            height: self.height.floor() as i64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionSignal {
    /// Nothing happened, or the controller is disarmed.
    None,
    /// A drag selection began.
    DragStarted,
    DragUpdated(DragRect),
    /// A click or a rectangle marked rows.
    Marked { ids: Vec<String>, mode: MarkMode },
    /// A click on empty space cleared the marking.
    Cleared,
    /// The drag ended below the selection threshold; nothing was marked.
    InactiveDrag,
    HoverChanged(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Disarmed,
    Idle,
    Dragging {
        anchor: (f64, f64),
        current: (f64, f64),
        modifier: bool,
    },
}

#[derive(Debug, Clone)]
pub struct SelectionController {
    state: State,
    viewport: CanvasSize,
    hovered: Option<String>,
    swallow_click: bool,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionController {
    pub fn new() -> Self {
        Self {
            state: State::Disarmed,
            viewport: CanvasSize::new(0.0, 0.0),
            hovered: None,
            swallow_click: false,
        }
    }

    pub fn arm(&mut self, viewport: CanvasSize) {
        self.viewport = viewport;
        if self.state == State::Disarmed {
            self.state = State::Idle;
        }
    }

    /// Stops reacting to pointer input. Releases a running drag's capture.
    pub fn disarm(&mut self, host: &mut dyn Host) {
        if matches!(self.state, State::Dragging { .. }) {
            host.release_pointer();
        }
        self.state = State::Disarmed;
        self.hovered = None;
        self.swallow_click = false;
    }

    pub fn is_armed(&self) -> bool {
        self.state != State::Disarmed
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, State::Dragging { .. })
    }

    /// Forgets the hovered word without touching the host. The next move
    /// over any word shows its tooltip again.
    pub fn clear_hover(&mut self) {
        self.hovered = None;
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn drag_rect(&self) -> Option<DragRect> {
        match self.state {
            State::Dragging { anchor, current, .. } => Some(DragRect::spanning(anchor, current)),
            _ => None,
        }
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        tester: &HitTester,
        placements: &[PlacedWord],
        host: &mut dyn Host,
    ) -> SelectionSignal {
        if !self.is_armed() {
            return SelectionSignal::None;
        }
        let swallow_click = std::mem::take(&mut self.swallow_click);

        match (self.state, event) {
            (State::Idle, PointerEvent::Click { x, y, modifier }) => {
                if swallow_click {
                    return SelectionSignal::None;
                }
                self.click(x, y, modifier, tester, host)
            }
            (State::Idle, PointerEvent::Move { x, y }) => {
                self.hover(tester.hit_test(x, y), placements, host)
            }
            (State::Idle, PointerEvent::Leave) => self.hover(None, placements, host),
            (State::Idle, PointerEvent::Down { x, y, modifier }) => {
                self.state = State::Dragging {
                    anchor: (x, y),
                    current: (x, y),
                    modifier,
                };
                host.capture_pointer();
                SelectionSignal::DragStarted
            }
            (State::Dragging { anchor, modifier, .. }, PointerEvent::Move { x, y }) => {
                let current = self.clamp(x, y);
                self.state = State::Dragging {
                    anchor,
                    current,
                    modifier,
                };
                SelectionSignal::DragUpdated(DragRect::spanning(anchor, current))
            }
            (State::Dragging { anchor, modifier, .. }, PointerEvent::Up { x, y }) => {
                self.state = State::Idle;
                host.release_pointer();
                let rect = DragRect::spanning(anchor, self.clamp(x, y));
                if rect.width > MIN_SELECTION_SIZE && rect.height > MIN_SELECTION_SIZE {
                    self.swallow_click = true;
                    let ids = tester.ids_in_rect(rect.to_pixels());
                    let mode = MarkMode::from_modifier(modifier);
                    if !ids.is_empty() {
                        host.mark_rows(&ids, mode);
                    }
                    SelectionSignal::Marked { ids, mode }
                } else {
                    SelectionSignal::InactiveDrag
                }
            }
            _ => SelectionSignal::None,
        }
    }

    fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.max(0.0).min(self.viewport.width - 2.0),
            y.max(0.0).min(self.viewport.height - 2.0),
        )
    }

    fn click(
        &mut self,
        x: f64,
        y: f64,
        modifier: bool,
        tester: &HitTester,
        host: &mut dyn Host,
    ) -> SelectionSignal {
        match tester.hit_test(x, y) {
            Some(id) => {
                let ids = vec![id.to_string()];
                let mode = MarkMode::from_modifier(modifier);
                host.mark_rows(&ids, mode);
                SelectionSignal::Marked { ids, mode }
            }
            None if !modifier => {
                host.clear_marking();
                SelectionSignal::Cleared
            }
            None => SelectionSignal::None,
        }
    }

    fn hover(
        &mut self,
        hit: Option<&str>,
        placements: &[PlacedWord],
        host: &mut dyn Host,
    ) -> SelectionSignal {
        if self.hovered.as_deref() == hit {
            return SelectionSignal::None;
        }
        if self.hovered.take().is_some() {
            host.hide_tooltip();
        }
        match hit {
            Some(id) => {
                if let Some(word) = placements.iter().find(|word| word.id == id) {
                    host.show_tooltip(&word.tooltip);
                }
                self.hovered = Some(id.to_string());
            }
            None => host.hide_tooltip(),
        }
        SelectionSignal::HoverChanged(self.hovered.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HaloStroke {
    pub color: String,
    pub width: f64,
}

/// Outline painted beneath the hovered word, derived from its geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightOverlay {
    pub id: String,
    pub text: String,
    pub font_family: String,
    pub font_size: f64,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    /// Bottom-most stroke first.
    pub strokes: Vec<HaloStroke>,
}

impl HighlightOverlay {
    pub fn for_word(word: &PlacedWord, theme: &Theme) -> Self {
        let stroke = |color: &str, width: f64| HaloStroke {
            color: color.to_string(),
            width,
        };
        Self {
            id: word.id.clone(),
            text: word.text.clone(),
            font_family: word.font_family.clone(),
            font_size: word.font_size,
            x: word.x,
            y: word.y,
            rotation: word.rotation,
            strokes: vec![
                stroke(&theme.halo_light, 10.0),
                stroke(&theme.halo_dark, 9.0),
                stroke(&theme.halo_light, 8.0),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RecordingHost;
    use crate::layout::{OccupancyBitmap, Sprite};

    fn placed(id: &str, x: f64, y: f64) -> PlacedWord {
        PlacedWord {
            id: id.to_string(),
            text: id.to_string(),
            size: 10.0,
            color: "#000".to_string(),
            tooltip: format!("tip {id}"),
            font_family: "sans-serif".to_string(),
            font_size: 12.0,
            x,
            y,
            rotation: 0.0,
        }
    }

    /// Three 20x10 words on a 200x100 canvas: `a` and `b` side by side, `c`
    /// alone in the upper right.
    struct Rig {
        tester: HitTester,
        placements: Vec<PlacedWord>,
        host: RecordingHost,
        controller: SelectionController,
    }

    impl Rig {
        fn new() -> Self {
            let mut rig = Self::disarmed();
            rig.controller.arm(CanvasSize::new(200.0, 100.0));
            rig
        }

        fn disarmed() -> Self {
            let mut bitmap = OccupancyBitmap::new(CanvasSize::new(200.0, 100.0)).unwrap();
            let sprite = Sprite::rasterize(20.0, 5.0, 5.0, 0.0, 0.0);
            bitmap.stamp(&sprite, 40, 50, "a");
            bitmap.stamp(&sprite, 60, 50, "b");
            bitmap.stamp(&sprite, 150, 20, "c");
            Self {
                tester: HitTester::new(bitmap),
                placements: vec![
                    placed("a", 40.0, 50.0),
                    placed("b", 60.0, 50.0),
                    placed("c", 150.0, 20.0),
                ],
                host: RecordingHost::default(),
                controller: SelectionController::new(),
            }
        }

        fn send(&mut self, event: PointerEvent) -> SelectionSignal {
            self.controller
                .handle(event, &self.tester, &self.placements, &mut self.host)
        }

        fn click(&mut self, x: f64, y: f64, modifier: bool) -> SelectionSignal {
            self.send(PointerEvent::Click { x, y, modifier })
        }

        fn down(&mut self, x: f64, y: f64, modifier: bool) -> SelectionSignal {
            self.send(PointerEvent::Down { x, y, modifier })
        }

        fn move_to(&mut self, x: f64, y: f64) -> SelectionSignal {
            self.send(PointerEvent::Move { x, y })
        }

        fn up(&mut self, x: f64, y: f64) -> SelectionSignal {
            self.send(PointerEvent::Up { x, y })
        }
    }

    #[test]
    fn disarmed_controller_ignores_events() {
        let mut rig = Rig::disarmed();
        assert_eq!(rig.click(40.0, 50.0, false), SelectionSignal::None);
        assert!(rig.host.marks.is_empty());
    }

    #[test]
    fn click_marks_hit_and_clears_on_empty_space() {
        let mut rig = Rig::new();
        rig.click(41.0, 50.0, false);
        rig.click(61.0, 50.0, true);
        assert_eq!(
            rig.host.marks,
            vec![
                (vec!["a".to_string()], MarkMode::Replace),
                (vec!["b".to_string()], MarkMode::Toggle)
            ]
        );

        assert_eq!(rig.click(5.0, 5.0, true), SelectionSignal::None);
        assert_eq!(rig.host.cleared, 0);
        assert_eq!(rig.click(5.0, 5.0, false), SelectionSignal::Cleared);
        assert_eq!(rig.host.cleared, 1);
    }

    #[test]
    fn hover_tracks_the_word_under_the_pointer() {
        let mut rig = Rig::new();
        let first = rig.move_to(40.0, 50.0);
        assert_eq!(first, SelectionSignal::HoverChanged(Some("a".to_string())));
        assert_eq!(rig.move_to(42.0, 51.0), SelectionSignal::None);
        rig.move_to(60.0, 50.0);
        assert_eq!(rig.controller.hovered(), Some("b"));
        assert_eq!(rig.host.tooltips, vec!["tip a".to_string(), "tip b".to_string()]);

        assert_eq!(rig.move_to(5.0, 5.0), SelectionSignal::HoverChanged(None));
        assert!(rig.host.tooltip.is_none());
    }

    #[test]
    fn cleared_hover_shows_tooltip_again() {
        let mut rig = Rig::new();
        rig.move_to(40.0, 50.0);
        rig.host.hide_tooltip();
        rig.controller.clear_hover();
        assert_eq!(rig.controller.hovered(), None);

        let again = rig.move_to(40.0, 50.0);
        assert_eq!(again, SelectionSignal::HoverChanged(Some("a".to_string())));
        assert_eq!(rig.host.tooltip.as_deref(), Some("tip a"));
    }

    #[test]
    fn leave_clears_hover() {
        let mut rig = Rig::new();
        rig.move_to(150.0, 20.0);
        rig.send(PointerEvent::Leave);
        assert_eq!(rig.controller.hovered(), None);
        assert!(rig.host.tooltip.is_none());
    }

    #[test]
    fn tiny_drag_is_inactive() {
        let mut rig = Rig::new();
        assert_eq!(rig.down(40.0, 50.0, false), SelectionSignal::DragStarted);
        assert!(rig.host.captured);
        assert_eq!(rig.up(41.0, 51.0), SelectionSignal::InactiveDrag);
        assert!(rig.host.marks.is_empty());
        assert!(!rig.host.captured);
        assert!(!rig.controller.is_dragging());
    }

    #[test]
    fn rectangle_marks_every_word_it_touches() {
        let mut rig = Rig::new();
        rig.down(45.0, 45.0, true);
        let update = rig.move_to(50.0, 52.0);
        assert!(matches!(
            update,
            SelectionSignal::DragUpdated(rect) if rect.width == 5.0 && rect.height == 7.0
        ));
        let signal = rig.up(55.0, 55.0);

        let expected = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            signal,
            SelectionSignal::Marked {
                ids: expected.clone(),
                mode: MarkMode::Toggle
            }
        );
        assert_eq!(rig.host.marks, vec![(expected, MarkMode::Toggle)]);

        // The click delivered right after the drag must not clear the marking.
        assert_eq!(rig.click(55.0, 55.0, false), SelectionSignal::None);
        assert_eq!(rig.host.cleared, 0);
    }

    #[test]
    fn drag_rect_is_clamped_to_viewport() {
        let mut rig = Rig::new();
        rig.down(190.0, 90.0, false);
        rig.move_to(500.0, -20.0);
        let rect = rig.controller.drag_rect().unwrap();
        assert_eq!((rect.x, rect.y), (190.0, 0.0));
        assert_eq!((rect.width, rect.height), (8.0, 90.0));
    }

    #[test]
    fn disarm_releases_pointer_capture() {
        let mut rig = Rig::new();
        rig.down(10.0, 10.0, false);
        assert!(rig.host.captured);
        rig.controller.disarm(&mut rig.host);
        assert!(!rig.host.captured);
        assert!(!rig.controller.is_armed());
        assert_eq!(rig.host.capture_balance(), 0);
    }

    #[test]
    fn overlay_follows_word_geometry() {
        let mut word = placed("a", 12.0, 34.0);
        word.rotation = -90.0;
        let overlay = HighlightOverlay::for_word(&word, &Theme::default());
        assert_eq!((overlay.x, overlay.y, overlay.rotation), (12.0, 34.0, -90.0));
        let widths: Vec<f64> = overlay.strokes.iter().map(|s| s.width).collect();
        assert_eq!(widths, vec![10.0, 9.0, 8.0]);
    }
}
