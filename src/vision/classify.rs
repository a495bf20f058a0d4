//! Silhouette shape classification
//!
//! Reduces a freehand sketch to a coarse geometric label by binarizing the
//! drawing, tracing the external contours, and approximating each contour
//! as a polygon. The vertex count of the approximation stands in for the
//! dominant shape: many vertices read as a circle, a handful as an ellipse.

use image::RgbImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use tracing::debug;

/// Intensity cutoff separating pen strokes from the background (0-255)
const INK_THRESHOLD: u8 = 150;

/// Polygon approximation tolerance as a fraction of the contour perimeter
const APPROX_TOLERANCE: f64 = 0.04;

/// Coarse geometric category of a sketched pill silhouette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeLabel {
    /// Near-circular outline
    Circle,
    /// Oval or capsule-like outline
    Ellipse,
    /// Anything else, including an empty sketch
    Other,
}

impl ShapeLabel {
    /// English display name for the UI
    pub fn display_name(&self) -> &'static str {
        match self {
            ShapeLabel::Circle => "Circle",
            ShapeLabel::Ellipse => "Ellipse",
            ShapeLabel::Other => "Other",
        }
    }

    /// Numeric shape code expected by the SOAP service variant
    pub fn code(&self) -> &'static str {
        match self {
            ShapeLabel::Circle => "1",
            ShapeLabel::Ellipse => "2",
            ShapeLabel::Other => "",
        }
    }

    /// Localized shape label expected by the REST service variant
    pub fn service_label(&self) -> &'static str {
        match self {
            ShapeLabel::Circle => "원형",
            ShapeLabel::Ellipse => "타원형",
            ShapeLabel::Other => "기타",
        }
    }
}

impl std::fmt::Display for ShapeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Classify the sketched silhouette in `image`.
///
/// Pure function of the bitmap and the two module constants. Every external
/// contour is evaluated in traversal order with no early exit; the label of
/// the last contour wins. An image with no foreground contours classifies
/// as [`ShapeLabel::Other`].
pub fn classify(image: &RgbImage) -> ShapeLabel {
    let gray = image::imageops::grayscale(image);
    // Invert so dark pen strokes become foreground
    let binary = threshold(&gray, INK_THRESHOLD, ThresholdType::BinaryInverted);

    let mut label = ShapeLabel::Other;
    for contour in find_contours::<u32>(&binary) {
        // Nested/hole contours are ignored
        if contour.border_type != BorderType::Outer {
            continue;
        }
        label = classify_contour(&contour.points);
    }

    debug!("Classified sketch as {:?}", label);
    label
}

/// Label a single closed contour by its approximated vertex count
fn classify_contour(points: &[Point<u32>]) -> ShapeLabel {
    if points.len() < 2 {
        return ShapeLabel::Other;
    }

    let perimeter = arc_length(points, true);
    let approx = approximate_polygon_dp(points, APPROX_TOLERANCE * perimeter, true);

    match approx.len() {
        n if n > 6 => ShapeLabel::Circle,
        4..=6 => ShapeLabel::Ellipse,
        _ => ShapeLabel::Other,
    }
}
