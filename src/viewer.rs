//! # Viewer
//!
//! Headless toolpath preview: a top down camera over a range of layers,
//! rendered to SVG

use crate::{
    gcode::{parse, Layer, Toolpath},
    geo::BoundingBox,
    toolpaths::GcodeFile,
};
use log::debug;
use simplesvg::{Attr, Color, Fig, Svg};
use ultraviolet::Vec2;

const ZOOM_STEP: f32 = 1.25;
const MIN_ZOOM: f32 = 0.05;
const MAX_ZOOM: f32 = 200.;
/// share of the viewport a fitted view fills
const FIT_MARGIN: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// model point shown at the center of the viewport
    pub center: Vec2,
    /// pixels per mm
    pub zoom: f32,
}

pub struct Viewer {
    toolpath: Toolpath,
    camera: Camera,
    first_layer: usize,
    last_layer: usize,
    width: u32,
    height: u32,
}

impl Viewer {
    pub fn new(toolpath: Toolpath, width: u32, height: u32) -> Viewer {
        let last_layer = toolpath.layer_count().saturating_sub(1);
        let mut viewer = Viewer {
            toolpath,
            camera: Camera {
                center: Vec2::zero(),
                zoom: 1.,
            },
            first_layer: 0,
            last_layer,
            width: width.max(1),
            height: height.max(1),
        };
        viewer.reset_camera();
        viewer
    }

    pub fn from_file(file: &GcodeFile, width: u32, height: u32) -> Viewer {
        let toolpath = parse(&file.text());
        debug!("{} has {} layers", file.name, toolpath.layer_count());
        Viewer::new(toolpath, width, height)
    }

    pub fn toolpath(&self) -> &Toolpath { &self.toolpath }

    pub fn camera(&self) -> Camera { self.camera }

    /// Inclusive range of layers drawn
    pub fn layer_range(&self) -> (usize, usize) { (self.first_layer, self.last_layer) }

    /// Show layers `first..=last`, clamped to the layers that exist
    pub fn set_layer_range(&mut self, first: usize, last: usize) {
        let top = self.toolpath.layer_count().saturating_sub(1);
        let last = last.min(top);
        self.first_layer = first.min(last);
        self.last_layer = last;
    }

    pub fn visible_layers(&self) -> &[Layer] {
        if self.toolpath.layers.is_empty() {
            return &[];
        }
        &self.toolpath.layers[self.first_layer..=self.last_layer]
    }

    pub fn zoom_in(&mut self) { self.set_zoom(self.camera.zoom * ZOOM_STEP); }

    pub fn zoom_out(&mut self) { self.set_zoom(self.camera.zoom / ZOOM_STEP); }

    fn set_zoom(&mut self, zoom: f32) { self.camera.zoom = zoom.max(MIN_ZOOM).min(MAX_ZOOM); }

    /// Move the view by a screen space offset in pixels
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.camera.center.x -= dx / self.camera.zoom;
        self.camera.center.y += dy / self.camera.zoom;
    }

    /// Frame the whole toolpath
    pub fn reset_camera(&mut self) {
        let bounds = self.toolpath.total_bounds();
        self.frame(bounds);
    }

    /// Frame the visible layers only
    pub fn fit(&mut self) {
        let bounds = self.toolpath.bounds(self.visible_layers());
        self.frame(bounds);
    }

    fn frame(&mut self, bounds: Option<BoundingBox>) {
        let bounds = match bounds {
            Some(bounds) => bounds,
            None => {
                self.camera = Camera {
                    center: Vec2::zero(),
                    zoom: 1.,
                };
                return;
            },
        };
        let size = bounds.size();
        let center = bounds.center();
        let zoom_x = if size.x > 0. { self.width as f32 / size.x } else { MAX_ZOOM };
        let zoom_y = if size.y > 0. { self.height as f32 / size.y } else { MAX_ZOOM };
        self.camera.center = Vec2::new(center.x, center.y);
        self.set_zoom(zoom_x.min(zoom_y) * FIT_MARGIN);
    }

    /// Screen position of a model point, y grows downwards on screen
    pub fn project(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.camera.center.x) * self.camera.zoom + self.width as f32 / 2.,
            (self.camera.center.y - y) * self.camera.zoom + self.height as f32 / 2.,
        )
    }

    /// Draw the extrusion moves of the visible layers
    pub fn render_svg(&self) -> String {
        let top = self.last_layer;
        let lines: Vec<Fig> = self
            .visible_layers()
            .iter()
            .enumerate()
            .flat_map(|(index, layer)| {
                // highlight the layer on top
                let (r, g, b) = if self.first_layer + index == top {
                    (0x3b, 0x82, 0xf6)
                } else {
                    (0x94, 0xa3, 0xb8)
                };
                layer
                    .extrusions()
                    .map(|segment| {
                        let (x1, y1) = self.project(segment.from.x, segment.from.y);
                        let (x2, y2) = self.project(segment.to.x, segment.to.y);
                        Fig::Line(x1, y1, x2, y2).styled(Attr::default().stroke(Color(r, g, b)).stroke_width(1.0))
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        debug!("rendering {} segments", lines.len());
        Svg(lines, self.width, self.height).to_string()
    }
}
