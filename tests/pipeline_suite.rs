use std::path::Path;
use std::time::Instant;

use wordcloud_rs::layout::RotationMode;
use wordcloud_rs::text_metrics::CharWidthMeasurer;
use wordcloud_rs::{
    CanvasSize, CloudSettings, Config, MarkMode, PassOutcome, PointerEvent, RecordingHost,
    RenderInputs, RenderPipeline, RowSet, SelectionSignal, SpiralLayout, render_svg,
};

type Pipeline = RenderPipeline<CharWidthMeasurer, SpiralLayout>;

fn fixture(name: &str) -> RowSet {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    RowSet::parse(&input).expect("fixture parse failed")
}

fn pipeline() -> Pipeline {
    RenderPipeline::new(Config::default(), CharWidthMeasurer, SpiralLayout)
}

fn inputs(width: f64, height: f64, settings: CloudSettings) -> RenderInputs {
    RenderInputs {
        canvas: CanvasSize::new(width, height),
        settings,
    }
}

fn render_to_end(
    pipeline: &mut Pipeline,
    rows: &RowSet,
    inputs: &RenderInputs,
    host: &mut RecordingHost,
) -> PassOutcome {
    let mut outcome = pipeline.render(rows, inputs, host, Instant::now()).expect("render failed");
    while outcome == PassOutcome::Pending {
        outcome = pipeline.tick(host, Instant::now()).expect("tick failed");
    }
    outcome
}

#[test]
fn render_all_fixtures() {
    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = ["languages.json", "unsized.json5", "single.json", "unicode.json"];

    for name in candidates {
        let rows = fixture(name);
        for rotation in [RotationMode::None, RotationMode::Two, RotationMode::Five] {
            let mut pipeline = pipeline();
            let mut host = RecordingHost::default();
            let settings = CloudSettings {
                rotation,
                ..CloudSettings::default()
            };
            let inputs = inputs(600.0, 400.0, settings);
            let outcome = render_to_end(&mut pipeline, &rows, &inputs, &mut host);
            assert_eq!(outcome, PassOutcome::Structural, "{name}: unexpected outcome");
            let cloud = pipeline.cloud();
            assert!(!cloud.placements.is_empty(), "{name}: nothing placed");
            assert_eq!(cloud.total_words, rows.rows.len(), "{name}: word count");

            for word in &cloud.placements {
                // Halfway up the ascent of the painted glyphs, rotated with the word.
                let (sin, cos) = word.rotation.to_radians().sin_cos();
                let rise = 0.375 * word.font_size;
                assert_eq!(
                    pipeline.hit_test(word.x + rise * sin, word.y - rise * cos),
                    Some(word.id.as_str()),
                    "{name}: painted ink of {} does not hit it",
                    word.id
                );
            }

            let svg = render_svg(cloud, None, None, &Config::default().theme);
            assert!(svg.contains("<svg"), "{name}: missing <svg tag");
            assert!(svg.contains("</svg>"), "{name}: missing </svg tag");
        }
    }
}

#[test]
fn broken_fixture_reports_data_error() {
    let mut pipeline = pipeline();
    let mut host = RecordingHost::default();
    let err = pipeline
        .render(
            &fixture("broken.json"),
            &inputs(400.0, 300.0, CloudSettings::default()),
            &mut host,
            Instant::now(),
        )
        .unwrap_err();
    assert!(err.is_data());
    assert_eq!(
        host.errors.get("data").map(String::as_str),
        Some("Words axis expression is invalid")
    );
    assert!(pipeline.cloud().placements.is_empty());
}

#[test]
fn font_sizes_follow_raw_sizes() {
    let rows = fixture("languages.json");
    let mut pipeline = pipeline();
    let mut host = RecordingHost::default();
    render_to_end(&mut pipeline, &rows, &inputs(900.0, 600.0, CloudSettings::default()), &mut host);

    let mut placed: Vec<(f64, f64)> = pipeline
        .cloud()
        .placements
        .iter()
        .map(|word| (word.size, word.font_size))
        .collect();
    placed.sort_by(|a, b| a.0.total_cmp(&b.0));
    for pair in placed.windows(2) {
        assert!(pair[0].1 <= pair[1].1, "font size not monotonic: {pair:?}");
    }
}

#[test]
fn smaller_canvas_gets_smaller_fonts() {
    let rows = fixture("languages.json");
    let largest = |width: f64, height: f64| {
        let mut pipeline = pipeline();
        let mut host = RecordingHost::default();
        let inputs = inputs(width, height, CloudSettings::default());
        render_to_end(&mut pipeline, &rows, &inputs, &mut host);
        pipeline
            .cloud()
            .placements
            .iter()
            .map(|word| word.font_size)
            .fold(0.0, f64::max)
    };
    let big = largest(800.0, 600.0);
    let small = largest(300.0, 200.0);
    assert!(small > 0.0);
    assert!(small < big, "expected {small} < {big}");
}

#[test]
fn identical_requests_are_deterministic() {
    let rows = fixture("languages.json");
    let settings = CloudSettings {
        rotation: RotationMode::Five,
        random_placement: true,
        ..CloudSettings::default()
    };
    let run = || {
        let mut pipeline = pipeline();
        let mut host = RecordingHost::default();
        render_to_end(&mut pipeline, &rows, &inputs(640.0, 480.0, settings), &mut host);
        pipeline.cloud().clone()
    };
    assert_eq!(run(), run());
}

#[test]
fn recolor_then_resize() {
    let mut rows = fixture("languages.json");
    let mut pipeline = pipeline();
    let mut host = RecordingHost::default();
    let request = inputs(640.0, 480.0, CloudSettings::default());
    render_to_end(&mut pipeline, &rows, &request, &mut host);
    let generation = pipeline.generation();

    for row in &mut rows.rows {
        row.color = Some("#101010".to_string());
    }
    assert_eq!(render_to_end(&mut pipeline, &rows, &request, &mut host), PassOutcome::Cosmetic);
    assert_eq!(pipeline.generation(), generation);
    assert!(pipeline.cloud().placements.iter().all(|word| word.color == "#101010"));

    rows.rows[0].size = Some(99.0);
    assert_eq!(render_to_end(&mut pipeline, &rows, &request, &mut host), PassOutcome::Structural);

    let resized = inputs(700.0, 480.0, CloudSettings::default());
    assert_eq!(render_to_end(&mut pipeline, &rows, &resized, &mut host), PassOutcome::Structural);
    assert_eq!(pipeline.generation(), generation + 2);
}

#[test]
fn full_canvas_drag_marks_every_placed_word() {
    let rows = fixture("languages.json");
    let mut pipeline = pipeline();
    let mut host = RecordingHost::default();
    render_to_end(&mut pipeline, &rows, &inputs(640.0, 480.0, CloudSettings::default()), &mut host);

    pipeline.pointer(PointerEvent::Down { x: 0.0, y: 0.0, modifier: true }, &mut host);
    pipeline.pointer(PointerEvent::Move { x: 320.0, y: 240.0 }, &mut host);
    assert!(pipeline.drag_rect().is_some());
    let signal = pipeline.pointer(PointerEvent::Up { x: 900.0, y: 900.0 }, &mut host);

    let SelectionSignal::Marked { ids, mode } = signal else {
        panic!("expected a marking, got {signal:?}");
    };
    assert_eq!(mode, MarkMode::Toggle);
    let mut marked = ids.clone();
    marked.sort();
    let mut placed: Vec<String> =
        pipeline.cloud().placements.iter().map(|word| word.id.clone()).collect();
    placed.sort();
    assert_eq!(marked, placed);
    assert_eq!(host.marks.len(), 1);
    assert_eq!(host.capture_balance(), 0);
}

#[test]
fn click_on_word_marks_its_row() {
    let rows = fixture("single.json");
    let mut pipeline = pipeline();
    let mut host = RecordingHost::default();
    render_to_end(&mut pipeline, &rows, &inputs(400.0, 300.0, CloudSettings::default()), &mut host);

    let word = pipeline.cloud().placements[0].clone();
    pipeline.pointer(
        PointerEvent::Click {
            x: word.x,
            y: word.y,
            modifier: false,
        },
        &mut host,
    );
    assert_eq!(host.marks, vec![(vec!["only".to_string()], MarkMode::Replace)]);

    pipeline.pointer(PointerEvent::Click { x: 1.0, y: 1.0, modifier: false }, &mut host);
    assert_eq!(host.cleared, 1);
}

#[test]
fn degenerate_canvas_renders_nothing() {
    let rows = fixture("languages.json");
    for (width, height) in [(0.0, 300.0), (f64::INFINITY, 300.0), (400.0, f64::INFINITY)] {
        let mut pipeline = pipeline();
        let mut host = RecordingHost::default();
        let inputs = inputs(width, height, CloudSettings::default());
        let outcome = render_to_end(&mut pipeline, &rows, &inputs, &mut host);
        assert_eq!(outcome, PassOutcome::Structural, "{width}x{height}");
        assert!(pipeline.cloud().placements.is_empty());
        assert_eq!(pipeline.hit_test(0.0, 0.0), None);
    }
}

#[test]
fn oversized_canvas_fails_the_pass() {
    let rows = fixture("languages.json");
    let mut pipeline = pipeline();
    let mut host = RecordingHost::default();
    let inputs = inputs(1e20, 300.0, CloudSettings::default());
    let err = pipeline.render(&rows, &inputs, &mut host, Instant::now()).unwrap_err();
    assert!(!err.is_data(), "{err}");
    assert!(host.errors.contains_key("pipeline"));
}
