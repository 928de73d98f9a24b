use crate::config::RenderConfig;
use crate::error::Result;
use crate::figure::{Axes, Figure, PlacedText};
use crate::geometry::{HAlign, Rect};
use crate::oracle::POINTS_PER_INCH;
use crate::theme::Theme;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Figure-fraction to pixel mapping, y flipped.
struct Canvas {
    width: f32,
    height: f32,
    px_per_pt: f32,
}

impl Canvas {
    fn new(render: &RenderConfig) -> Self {
        let (width, height) = render.size_pixels();
        Self {
            width,
            height,
            px_per_pt: render.dpi / POINTS_PER_INCH,
        }
    }

    fn x(&self, fx: f32) -> f32 {
        fx * self.width
    }

    fn y(&self, fy: f32) -> f32 {
        (1.0 - fy) * self.height
    }

    fn rect(&self, rect: &Rect) -> (f32, f32, f32, f32) {
        (
            self.x(rect.x0),
            self.y(rect.y1),
            rect.width() * self.width,
            rect.height() * self.height,
        )
    }
}

/// Serializes the last render pass of `figure` as SVG. Fails if the figure
/// changed since it was drawn.
pub fn render_svg(figure: &Figure) -> Result<String> {
    let state = figure.rendered()?;
    let config = figure.config();
    let theme = &config.theme;
    let canvas = Canvas::new(&config.render);
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w:.0}\" height=\"{h:.0}\" viewBox=\"0 0 {w:.2} {h:.2}\">",
        w = canvas.width,
        h = canvas.height,
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        config.render.background
    ));

    for axes in figure.all_axes().filter(|axes| axes.axis_visible) {
        svg.push_str(&axes_svg(axes, theme, config.layout.tick_length, &canvas));
    }

    for text in &state.texts {
        svg.push_str(&text_svg(text, theme, &canvas));
    }

    svg.push_str("</svg>");
    Ok(svg)
}

fn axes_svg(axes: &Axes, theme: &Theme, tick_length: f32, canvas: &Canvas) -> String {
    let mut out = String::new();
    let position = axes.position();
    let (x, y, w, h) = canvas.rect(&position);
    out.push_str(&format!(
        "<g id=\"panel-{}\">",
        escape_xml(&axes.token().to_string())
    ));
    out.push_str(&format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" fill=\"{}\" stroke=\"none\"/>",
        theme.background
    ));

    for line in &axes.lines {
        let points: Vec<(f32, f32)> = line
            .points
            .iter()
            .map(|point| {
                let (fx, fy) = axes.to_figure(*point);
                (canvas.x(fx), canvas.y(fy))
            })
            .collect();
        let d = points_to_path(&points);
        if d.is_empty() {
            continue;
        }
        let color = line.color.as_deref().unwrap_or(&theme.line_color);
        out.push_str(&format!(
            "<path d=\"{d}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\" stroke-linejoin=\"round\"/>"
        ));
    }

    let tick = tick_length * canvas.px_per_pt;
    let mut marks = String::new();
    for t in &axes.yticks {
        let (_, fy) = axes.to_figure((axes.xlim.0, t.value));
        let py = canvas.y(fy);
        marks.push_str(&format!(" M {:.2} {py:.2} L {:.2} {py:.2}", x - tick, x));
    }
    for t in &axes.xticks {
        let (fx, _) = axes.to_figure((t.value, axes.ylim.0));
        let px = canvas.x(fx);
        marks.push_str(&format!(" M {px:.2} {:.2} L {px:.2} {:.2}", y + h, y + h + tick));
    }
    if !marks.is_empty() {
        out.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"0.8\"/>",
            marks.trim_start(),
            theme.frame_color
        ));
    }

    out.push_str(&format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"0.8\"/>",
        theme.frame_color
    ));
    out.push_str("</g>");
    out
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

/// Text is placed from its measured box so the SVG agrees with the layout.
fn text_svg(text: &PlacedText, theme: &Theme, canvas: &Canvas) -> String {
    let (cx, cy) = text.bbox.center();
    let y = canvas.y(cy);
    let (x, anchor) = if text.rotation != 0.0 {
        (canvas.x(cx), "middle")
    } else {
        match text.ha {
            HAlign::Left => (canvas.x(text.bbox.x0), "start"),
            HAlign::Center => (canvas.x(cx), "middle"),
            HAlign::Right => (canvas.x(text.bbox.x1), "end"),
        }
    };
    let transform = if text.rotation != 0.0 {
        format!(" transform=\"rotate({:.2} {x:.2} {y:.2})\"", -text.rotation)
    } else {
        String::new()
    };
    format!(
        "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"{anchor}\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{:.2}\" font-weight=\"{}\" fill=\"{}\"{transform}>{}</text>",
        escape_xml(&theme.font_family),
        text.font_size * canvas.px_per_pt,
        text.weight.as_css(),
        theme.text_color,
        escape_xml(&text.text)
    )
}

/// Creates `path` for writing, along with any missing parent directories.
pub fn create_output_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            create_output_file(path)?.write_all(svg.as_bytes())?;
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
) -> anyhow::Result<()> {
    let mut opt = usvg::Options::default();
    if let Some(family) = theme.font_family.split(',').next() {
        opt.font_family = family.trim().to_string();
    }
    let (width, height) = render_cfg.size_pixels();
    if let Some(size) = usvg::Size::from_wh(width, height) {
        opt.default_size = size;
    }
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    let png = pixmap.encode_png()?;
    create_output_file(output)?.write_all(&png)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
