//! Freehand sketch canvas
//!
//! Collects pen strokes as point lists while the user draws, and rasterizes
//! them into the fixed-size bitmap the vision layer consumes: white
//! background, black strokes, 8-bit RGB.

use egui::{Color32, Pos2, Sense, Stroke, Vec2};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::config::CanvasSettings;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Interactive drawing surface backed by stroke point lists
pub struct SketchCanvas {
    strokes: Vec<Vec<Pos2>>,
    current: Vec<Pos2>,
    width: u32,
    height: u32,
    stroke_width: f32,
}

impl SketchCanvas {
    /// Create a canvas with the configured dimensions and pen width
    pub fn new(settings: &CanvasSettings) -> Self {
        Self {
            strokes: Vec::new(),
            current: Vec::new(),
            width: settings.width,
            height: settings.height,
            stroke_width: settings.stroke_width,
        }
    }

    /// Whether nothing has been drawn yet
    pub fn is_blank(&self) -> bool {
        self.strokes.is_empty() && self.current.is_empty()
    }

    /// Discard all strokes
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.current.clear();
    }

    /// Show the canvas and record pointer input
    pub fn ui(&mut self, ui: &mut egui::Ui) -> egui::Response {
        let size = Vec2::new(self.width as f32, self.height as f32);
        let (response, painter) = ui.allocate_painter(size, Sense::drag());
        let rect = response.rect;

        painter.rect_filled(rect, 2.0, Color32::WHITE);
        painter.rect_stroke(rect, 2.0, Stroke::new(1.0, Color32::GRAY));

        if let Some(pointer_pos) = response.interact_pointer_pos() {
            let canvas_pos = Pos2::new(
                (pointer_pos.x - rect.min.x).clamp(0.0, size.x),
                (pointer_pos.y - rect.min.y).clamp(0.0, size.y),
            );
            if self.current.last() != Some(&canvas_pos) {
                self.current.push(canvas_pos);
            }
        } else if !self.current.is_empty() {
            // Pointer released: the stroke is finished
            self.strokes.push(std::mem::take(&mut self.current));
        }

        let pen = Stroke::new(self.stroke_width, Color32::BLACK);
        for stroke in self.strokes.iter().chain(std::iter::once(&self.current)) {
            if stroke.len() >= 2 {
                let points: Vec<Pos2> = stroke
                    .iter()
                    .map(|p| Pos2::new(rect.min.x + p.x, rect.min.y + p.y))
                    .collect();
                painter.add(egui::Shape::line(points, pen));
            } else if let Some(p) = stroke.first() {
                painter.circle_filled(
                    Pos2::new(rect.min.x + p.x, rect.min.y + p.y),
                    self.stroke_width / 2.0,
                    Color32::BLACK,
                );
            }
        }

        response
    }

    /// Rasterize the sketch into the bitmap the pipeline consumes
    pub fn rasterize(&self) -> RgbImage {
        let all: Vec<&Vec<Pos2>> = self
            .strokes
            .iter()
            .chain(std::iter::once(&self.current))
            .collect();
        rasterize_strokes(&all, self.width, self.height, self.stroke_width)
    }
}

/// Stamp filled circles along each stroke so lines carry the pen's width
fn rasterize_strokes(strokes: &[&Vec<Pos2>], width: u32, height: u32, stroke_width: f32) -> RgbImage {
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);
    let radius = (stroke_width / 2.0).round().max(1.0) as i32;

    for stroke in strokes {
        match stroke.as_slice() {
            [] => {}
            [p] => stamp(&mut image, *p, radius),
            points => {
                for pair in points.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    let steps = a.distance(b).ceil().max(1.0) as usize;
                    for i in 0..=steps {
                        let t = i as f32 / steps as f32;
                        let p = Pos2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
                        stamp(&mut image, p, radius);
                    }
                }
            }
        }
    }

    image
}

fn stamp(image: &mut RgbImage, p: Pos2, radius: i32) {
    draw_filled_circle_mut(image, (p.x.round() as i32, p.y.round() as i32), radius, INK);
}
