use serde_json::{Map, Value};
use tiny_skia::{Color, FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::error::Result;
use crate::render::camera::{Camera, CameraPose};
use crate::render::frontend::Size;
use crate::render::geojson::{Geometry, Position};
use crate::render::paint;
use crate::render::projection::Projector;
use crate::render::style::{Layer, LayerKind, Style};

const DEFAULT_LINE_WIDTH: f32 = 1.0;
const DEFAULT_CIRCLE_RADIUS: f32 = 5.0;

/// A loaded style plus a camera, drawn one still frame at a time.
pub struct StaticMap {
    style: Style,
    camera: Camera,
    size: Size,
}

impl StaticMap {
    /// The initial camera comes from the style's `center`/`zoom`/`bearing`/`pitch`.
    pub fn new(style: Style, size: Size) -> Self {
        let [lon, lat] = style.center.unwrap_or([0.0, 0.0]);
        let pose = CameraPose::new(
            lon,
            lat,
            style.zoom.unwrap_or(0.0),
            style.bearing.unwrap_or(0.0),
            style.pitch.unwrap_or(0.0),
        );
        let camera = Camera::from_pose(&pose).unwrap_or_default();
        Self { style, camera, size }
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn jump_to(&mut self, pose: &CameraPose) -> Result<()> {
        self.camera = Camera::from_pose(pose)?;
        Ok(())
    }

    /// Paint every visible layer bottom to top. Pitch is drawn as a plan view.
    pub fn draw(&self, pixmap: &mut Pixmap, transform: Transform) {
        let projector = Projector::new(&self.camera, self.size.width as f64, self.size.height as f64);
        for layer in &self.style.layers {
            if !layer.is_visible() || !layer.covers_zoom(self.camera.zoom) {
                continue;
            }
            let mut painter = LayerPainter {
                layer,
                style: &self.style,
                projector: &projector,
                pixmap: &mut *pixmap,
                transform,
            };
            match layer.kind {
                LayerKind::Background => painter.background(self.size),
                LayerKind::Fill => painter.fill(),
                LayerKind::Line => painter.line(),
                LayerKind::Circle => painter.circle(),
                other => log::trace!("layer {:?}: {other:?} layers are not drawn", layer.id),
            }
        }
    }
}

struct LayerPainter<'a> {
    layer: &'a Layer,
    style: &'a Style,
    projector: &'a Projector,
    pixmap: &'a mut Pixmap,
    transform: Transform,
}

impl<'a> LayerPainter<'a> {
    fn background(&mut self, size: Size) {
        let color = paint::color_with_opacity(
            self.paint(),
            "background-color",
            "background-opacity",
            Color::BLACK,
        );
        if let Some(rect) = Rect::from_xywh(0.0, 0.0, size.width as f32, size.height as f32) {
            self.pixmap.fill_rect(rect, &solid(color), self.transform, None);
        }
    }

    fn fill(&mut self) {
        let mut pb = PathBuilder::new();
        for geometry in self.geometries() {
            for polygon in geometry.polygons() {
                for ring in polygon {
                    self.trace(&mut pb, ring, true);
                }
            }
        }
        let Some(path) = pb.finish() else { return };

        let p = self.paint();
        let color = paint::color_with_opacity(p, "fill-color", "fill-opacity", Color::BLACK);
        self.pixmap.fill_path(&path, &solid(color), FillRule::EvenOdd, self.transform, None);

        if p.contains_key("fill-outline-color") {
            let outline = paint::color_with_opacity(p, "fill-outline-color", "fill-opacity", color);
            self.stroke(&path, outline, 1.0);
        }
    }

    fn line(&mut self) {
        let mut pb = PathBuilder::new();
        for geometry in self.geometries() {
            for line in geometry.lines() {
                self.trace(&mut pb, line, false);
            }
            for polygon in geometry.polygons() {
                for ring in polygon {
                    self.trace(&mut pb, ring, true);
                }
            }
        }
        let Some(path) = pb.finish() else { return };

        let p = self.paint();
        let color = paint::color_with_opacity(p, "line-color", "line-opacity", Color::BLACK);
        let width = paint::number(p, "line-width", DEFAULT_LINE_WIDTH);
        self.stroke(&path, color, width);
    }

    fn circle(&mut self) {
        let p = self.paint();
        let color = paint::color_with_opacity(p, "circle-color", "circle-opacity", Color::BLACK);
        let radius = paint::number(p, "circle-radius", DEFAULT_CIRCLE_RADIUS);
        let stroke_width = paint::number(p, "circle-stroke-width", 0.0);
        let stroke_color = paint::color(p, "circle-stroke-color", Color::BLACK);

        let centers: Vec<(f32, f32)> = self
            .geometries()
            .iter()
            .flat_map(|g| g.points())
            .filter(|pos| pos.len() >= 2)
            .map(|pos| self.projector.to_screen(pos[0], pos[1]))
            .collect();

        let fill = solid(color);
        for (x, y) in centers {
            let Some(path) = PathBuilder::from_circle(x, y, radius) else { continue };
            self.pixmap.fill_path(&path, &fill, FillRule::Winding, self.transform, None);
            if stroke_width > 0.0 {
                self.stroke(&path, stroke_color, stroke_width);
            }
        }
    }

    fn paint(&self) -> &'a Map<String, Value> {
        &self.layer.paint
    }

    fn geometries(&self) -> &'a [Geometry] {
        match self.layer.source.as_deref() {
            Some(id) => self.style.geometries(id),
            None => &[],
        }
    }

    fn trace(&self, pb: &mut PathBuilder, positions: &[Position], close: bool) {
        let mut points = positions
            .iter()
            .filter(|pos| pos.len() >= 2)
            .map(|pos| self.projector.to_screen(pos[0], pos[1]));
        let Some((x, y)) = points.next() else { return };
        pb.move_to(x, y);
        for (x, y) in points {
            pb.line_to(x, y);
        }
        if close {
            pb.close();
        }
    }

    fn stroke(&mut self, path: &Path, color: Color, width: f32) {
        if width <= 0.0 {
            return;
        }
        let stroke = Stroke { width, ..Stroke::default() };
        self.pixmap.stroke_path(path, &solid(color), &stroke, self.transform, None);
    }
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}
