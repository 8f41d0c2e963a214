use crate::config::RenderConfig;
use crate::document::{DocumentStore, Scene};
use crate::layout::{BBox, Point};
use crate::model::{ElementLocation, Label};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

const ANCHOR_RADIUS: f64 = 3.0;

/// Maps drawing millimetres (Y up) to SVG pixels (Y down).
struct Frame {
    min: Point,
    max_y: f64,
    scale: f64,
    padding: f64,
}

impl Frame {
    fn map(&self, p: Point) -> (f64, f64) {
        (
            (p.x - self.min.x) * self.scale + self.padding,
            (self.max_y - p.y) * self.scale + self.padding,
        )
    }
}

/// Preview of a scene: anchors, label boxes and leaders.
pub fn render_svg(scene: &Scene, theme: &Theme, config: &RenderConfig) -> String {
    let content = content_bounds(scene).unwrap_or(BBox::degenerate(Point::default()));
    let scale = config.scale.max(f64::EPSILON);
    let frame = Frame {
        min: content.min,
        max_y: content.max.y,
        scale,
        padding: config.padding,
    };
    let width = (content.width() * scale + config.padding * 2.0).max(config.min_width);
    let height = (content.height() * scale + config.padding * 2.0).max(config.min_height);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    for element in scene.elements() {
        match &element.location {
            ElementLocation::Point(p) => {
                let (x, y) = frame.map(*p);
                svg.push_str(&format!(
                    "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{ANCHOR_RADIUS}\" fill=\"{}\"/>",
                    theme.anchor_color
                ));
            }
            ElementLocation::Curve(points) if !points.is_empty() => {
                let mapped: Vec<(f64, f64)> = points.iter().map(|p| frame.map(*p)).collect();
                svg.push_str(&format!(
                    "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.2\"/>",
                    points_to_path(&mapped),
                    theme.anchor_color
                ));
                let (x, y) = mapped[0];
                svg.push_str(&format!(
                    "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{ANCHOR_RADIUS}\" fill=\"{}\"/>",
                    theme.anchor_color
                ));
            }
            _ => {}
        }
    }

    for label in scene.labels() {
        if let Some(path) = leader_path(label) {
            let mapped: Vec<(f64, f64)> = path.iter().map(|p| frame.map(*p)).collect();
            svg.push_str(&format!(
                "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1\"/>",
                points_to_path(&mapped),
                theme.leader_color
            ));
        }
    }

    for label in scene.labels() {
        let bbox = scene
            .bounding_box(label.id)
            .unwrap_or(BBox::degenerate(label.head));
        let (x0, y0) = frame.map(Point::xy(bbox.min.x, bbox.max.y));
        let w = bbox.width() * scale;
        let h = bbox.height() * scale;
        svg.push_str(&format!(
            "<rect x=\"{x0:.2}\" y=\"{y0:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" rx=\"2\" ry=\"2\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
            theme.label_fill,
            theme.label_stroke
        ));
        if config.show_ids {
            let (cx, cy) = frame.map(bbox.center());
            svg.push_str(&format!(
                "<text x=\"{cx:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                cy + theme.font_size * 0.35,
                theme.font_family,
                theme.font_size,
                theme.label_text,
                escape_xml(&label_caption(scene, label))
            ));
        }
    }

    svg.push_str("</svg>");
    svg
}

fn label_caption(scene: &Scene, label: &Label) -> String {
    label
        .primary_element()
        .and_then(|id| scene.element(id))
        .and_then(|element| element.name)
        .unwrap_or_else(|| label.id.to_string())
}

/// Head, optional elbow, end. `None` when the label draws no leader.
fn leader_path(label: &Label) -> Option<Vec<Point>> {
    if !label.has_leader {
        return None;
    }
    let leader = label.leader.as_ref()?;
    let end = leader.end?;
    let mut path = vec![label.head];
    path.extend(leader.elbow);
    path.push(end);
    Some(path)
}

fn content_bounds(scene: &Scene) -> Option<BBox> {
    let mut bounds: Option<BBox> = None;
    let mut grow = |b: BBox| {
        bounds = Some(match bounds {
            Some(current) => current.union(&b),
            None => b,
        });
    };
    for element in scene.elements() {
        match &element.location {
            ElementLocation::Point(p) => grow(BBox::degenerate(*p)),
            ElementLocation::Curve(points) => {
                for p in points {
                    grow(BBox::degenerate(*p));
                }
            }
            ElementLocation::Unlocated => {}
        }
    }
    for label in scene.labels() {
        grow(
            scene
                .bounding_box(label.id)
                .unwrap_or(BBox::degenerate(label.head)),
        );
        if let Some(path) = leader_path(label) {
            for p in path {
                grow(BBox::degenerate(p));
            }
        }
    }
    bounds
}

fn points_to_path(points: &[(f64, f64)]) -> String {
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
pub fn write_output_png(svg: &str, output: &Path, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|family| family.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| "Inter".to_string());

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
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
