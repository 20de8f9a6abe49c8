use crate::config::RenderConfig;
use crate::model::PlacedWord;
use crate::pipeline::RenderedCloud;
use crate::selection::{DragRect, HighlightOverlay};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// Paints a finished cloud. The hovered word gets its halo strokes painted
/// right below it; an active drag rectangle is painted on top.
pub fn render_svg(
    cloud: &RenderedCloud,
    highlight: Option<&HighlightOverlay>,
    drag: Option<DragRect>,
    theme: &Theme,
) -> String {
    let mut svg = String::new();
    let width = cloud.canvas.width.max(1.0);
    let height = cloud.canvas.height.max(1.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<g>");
    for word in &cloud.placements {
        if let Some(overlay) = highlight.filter(|overlay| overlay.id == word.id) {
            for stroke in &overlay.strokes {
                svg.push_str(&word_svg(
                    word,
                    &format!(
                        "fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\" class=\"hover\"",
                        escape_xml(&word.color),
                        escape_xml(&stroke.color),
                        stroke.width
                    ),
                ));
            }
        }
        svg.push_str(&word_svg(word, &format!("fill=\"{}\"", escape_xml(&word.color))));
    }
    svg.push_str("</g>");

    if let Some(rect) = drag {
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            escape_xml(&theme.selection_fill),
            escape_xml(&theme.selection_border)
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn word_svg(word: &PlacedWord, paint: &str) -> String {
    format!(
        "<text text-anchor=\"middle\" transform=\"translate({:.2},{:.2})rotate({})\" font-family=\"{}\" font-size=\"{:.2}px\" {}>{}</text>",
        word.x,
        word.y,
        word.rotation,
        escape_xml(&word.font_family),
        word.font_size,
        paint,
        escape_xml(&word.text)
    )
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(
    svg: &str,
    output: &Path,
    render_cfg: &RenderConfig,
    theme: &Theme,
) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme.font_family.clone();
    opt.fontdb_mut().load_system_fonts();
    opt.default_size = usvg::Size::from_wh(render_cfg.width as f32, render_cfg.height as f32)
        .or_else(|| usvg::Size::from_wh(800.0, 600.0))
        .ok_or_else(|| anyhow::anyhow!("Invalid output size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(
    _svg: &str,
    _output: &Path,
    _render_cfg: &RenderConfig,
    _theme: &Theme,
) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the 'png' feature"))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
